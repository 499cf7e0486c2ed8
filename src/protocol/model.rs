//! Values reported by the dispenser: its operating mode and the three
//! independently tracked sub-statuses shown next to it.

use std::fmt;

// =============================================================================
// Public Interface
// =============================================================================

/// How a value should stand out when rendered. Surfaces are free to map it to
/// colours, icons or nothing at all.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Tone {
    Good,
    Warning,
    Error,
    Busy,
}

/// The machine's operating mode as last reported by the device.
///
/// `Disconnected` and `Connecting` are owned by the connection lifecycle; every
/// other value only ever comes out of [`interpret`](super::interpret).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SystemState {
    Disconnected,
    Connecting,
    Ready,
    AwaitingPickup,
    StockEmpty,
    OutputBusy,
    InOperation,
    Verifying,
}
impl SystemState {
    /// Dispensing is only offered when the device reports it is ready.
    pub fn allows_dispense(self) -> bool {
        self == SystemState::Ready
    }

    pub fn tone(self) -> Tone {
        match self {
            SystemState::Disconnected | SystemState::StockEmpty | SystemState::OutputBusy => {
                Tone::Error
            }
            SystemState::Connecting | SystemState::InOperation | SystemState::Verifying => {
                Tone::Busy
            }
            SystemState::Ready => Tone::Good,
            SystemState::AwaitingPickup => Tone::Warning,
        }
    }
}
impl Default for SystemState {
    fn default() -> Self {
        SystemState::Disconnected
    }
}
impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SystemState::Disconnected => "DISCONNECTED",
            SystemState::Connecting => "CONNECTING...",
            SystemState::Ready => "READY",
            SystemState::AwaitingPickup => "AWAITING PICKUP",
            SystemState::StockEmpty => "STOCK EMPTY",
            SystemState::OutputBusy => "OUTPUT BUSY",
            SystemState::InOperation => "IN OPERATION",
            SystemState::Verifying => "VERIFYING",
        })
    }
}

/// Envelope stock.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stock {
    Empty,
    Loaded,
}

/// Output slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Output {
    Busy,
    Free,
}

/// Envelope position sensor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Position {
    Present,
    Free,
}

/// Names one of the display fields, independently of its value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Field {
    Stock,
    Output,
    Position,
}
impl Field {
    pub const ALL: [Field; 3] = [Field::Stock, Field::Output, Field::Position];
}
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Stock => "Stock",
            Field::Output => "Output",
            Field::Position => "Position",
        })
    }
}

/// A known value for one of the display fields.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FieldValue {
    Stock(Stock),
    Output(Output),
    Position(Position),
}
impl FieldValue {
    pub fn field(self) -> Field {
        match self {
            FieldValue::Stock(_) => Field::Stock,
            FieldValue::Output(_) => Field::Output,
            FieldValue::Position(_) => Field::Position,
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            FieldValue::Stock(Stock::Empty) => Tone::Error,
            FieldValue::Output(Output::Busy) => Tone::Warning,
            FieldValue::Position(Position::Present) => Tone::Busy,
            FieldValue::Stock(Stock::Loaded)
            | FieldValue::Output(Output::Free)
            | FieldValue::Position(Position::Free) => Tone::Good,
        }
    }
}
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldValue::Stock(Stock::Empty) => "EMPTY",
            FieldValue::Stock(Stock::Loaded) => "LOADED",
            FieldValue::Output(Output::Busy) => "BUSY",
            FieldValue::Output(Output::Free) => "FREE",
            FieldValue::Position(Position::Present) => "ENVELOPE PRESENT",
            FieldValue::Position(Position::Free) => "FREE",
        })
    }
}

/// Last known value of every display field. `None` means unknown, which is
/// what all fields read while disconnected.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct DisplayFields {
    pub stock: Option<Stock>,
    pub output: Option<Output>,
    pub position: Option<Position>,
}
impl DisplayFields {
    /// Overwrite the field targeted by `value`, leaving the others untouched.
    pub fn apply(&mut self, value: FieldValue) {
        match value {
            FieldValue::Stock(v) => self.stock = Some(v),
            FieldValue::Output(v) => self.output = Some(v),
            FieldValue::Position(v) => self.position = Some(v),
        }
    }

    pub fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Stock => self.stock.map(FieldValue::Stock),
            Field::Output => self.output.map(FieldValue::Output),
            Field::Position => self.position.map(FieldValue::Position),
        }
    }

    pub fn clear(&mut self) {
        *self = DisplayFields::default();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
