//! `dispenser-panel` is a control panel for an envelope dispenser driven by a
//! microcontroller over a serial link. It connects to the board, sends it the
//! dispense, status and reset commands, and turns the free-text status lines
//! the firmware prints into a system state and three display fields (stock,
//! output and envelope position).
//!
//! The crate is organized around a [`ControlPanel`], which owns the whole
//! application state:
//!
//! * a single connection to the device, opened through a
//!   [`Connector`](transport::Connector) and read by a background thread that
//!   queues every received line,
//! * the status interpreter, applied to the queued lines each time the front
//!   end calls [`ControlPanel::poll`],
//! * a [`Surface`](surface::Surface), the presentation side, to which every
//!   state, field and connection change is pushed along with the operator log.
//!
//! The operator may only dispense when the device reports it is ready. Once a
//! dispense command is sent, the action stays locked until the device reports
//! its next state; no timer is involved.
//!
//! The [`TerminalSurface`](surface::TerminalSurface) and the `dispenser-panel`
//! binary provide a terminal front end. [`FakeDevice`](transport::FakeDevice)
//! simulates the dispenser so the panel can be used without hardware.

mod error;
mod panel;
mod settings;

pub mod protocol;
pub mod surface;
pub mod transport;

pub use error::{Error, Result};
pub use panel::ControlPanel;
pub use settings::{Settings, SettingsBuilder, BAUD_RATE, IO_TIMEOUT};
