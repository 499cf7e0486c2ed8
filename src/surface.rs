//! The presentation side of the control panel.
//!
//! A [`Surface`] renders what the [`ControlPanel`](crate::ControlPanel) pushes
//! to it and turns operator actions into [`Intent`]s that the panel handles.
//! The panel never reads anything back from the surface.

use crate::protocol::{Field, FieldValue, SystemState};
use crate::transport::PortInfo;

pub mod keyboard;
mod terminal;

pub use terminal::TerminalSurface;

// =============================================================================
// Public Interface
// =============================================================================

/// What the operator asked for.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Intent {
    /// Connect to the named port.
    Connect(String),
    Disconnect,
    Dispense,
    Status,
    Reset,
    ListPorts,
}

/// Receives the updates pushed by the control panel.
pub trait Surface {
    /// Append a line to the operator log.
    fn log(&mut self, message: &str);

    /// A display field changed; `None` means it is unknown again.
    fn field_update(&mut self, field: Field, value: Option<FieldValue>);

    /// The system state changed, or the dispense action was locked.
    fn state_update(&mut self, state: SystemState, dispense_enabled: bool);

    fn connection_update(&mut self, connected: bool);

    /// Tell the operator about a failed action they asked for. May block until
    /// acknowledged.
    fn notify_error(&mut self, title: &str, message: &str);

    fn show_ports(&mut self, ports: &[PortInfo]);
}
