//! Byte-level access to the dispenser link.
//!
//! A [`Transport`] is one end of an open, configured link. It can be cloned so
//! that the reader thread and the command sender each own a handle on the same
//! full-duplex port. A [`Connector`] opens transports and enumerates the ports
//! that could be opened.
//!
//! Two implementations are provided:
//!
//!  * [`SerialConnector`] / [`SerialTransport`] over a real serial port,
//!  * [`FakeDevice`] and its [`FakeConnector`], an in-memory device used by the
//!    tests and by the simulated dispenser.

use std::{fmt, io};

use crate::settings::Settings;

mod fake;
mod framing;
mod serial;

pub use fake::{FakeConnector, FakeDevice, FakeTransport};
pub use framing::{LineReader, RawLine};
pub use serial::{SerialConnector, SerialTransport};

// =============================================================================
// Public Interface
// =============================================================================

/// An open link to the device.
pub trait Transport: Send {
    /// Name of the port this transport is attached to.
    fn name(&self) -> String;

    /// Number of received bytes that can be read without blocking.
    fn bytes_to_read(&mut self) -> io::Result<usize>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `bytes`, failing on timeout.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Drop whatever was received but not read yet.
    fn discard_input(&mut self) -> io::Result<()>;

    /// Get another handle on the same link.
    fn try_clone(&self) -> io::Result<Box<dyn Transport>>;
}

/// Opens transports and lists the ports that can be opened.
pub trait Connector {
    /// Open the port named in `settings`, wait for the device to settle and
    /// discard any stale input.
    fn open(&self, settings: &Settings) -> io::Result<Box<dyn Transport>>;

    fn available_ports(&self) -> io::Result<Vec<PortInfo>>;
}

/// A port that is currently present on the system.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PortInfo {
    /// Device name, the value to use as the port path.
    pub name: String,
    pub description: String,
}
impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.description)
    }
}
