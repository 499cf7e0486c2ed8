//! States and events of the connection lifecycle.
//!
//! ```text
//!                  connect                 open ok
//!  .--------------.  ---->  .------------.  ---->  .-----------.
//!  | Disconnected |         | Connecting |         | Connected |
//!  '--------------'  <----  '------------'         '-----------'
//!        ^          open                                 |
//!        |          failed        disconnect requested   |
//!        '------------------------ or read failure ------'
//! ```
//!
//! `Connecting` only lasts for the duration of [`open`], so it is not stored
//! as a [`Link`] variant. Transitions follow the `From`/`Into` pattern: an
//! event is consumed to build the next state, and only the transitions that
//! have a `From` implementation can happen.

use std::{fmt, sync::mpsc::Receiver};

use log::{debug, info};

use super::reader::{Incoming, ReaderLoop};
use crate::{
    error::{Error, Result},
    settings::Settings,
    transport::{Connector, Transport},
};

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Why the link went down.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum DisconnectCause {
    /// Never connected yet.
    Initial,
    Requested,
    ReadFailure,
}
impl fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisconnectCause::Initial => "never connected",
            DisconnectCause::Requested => "requested",
            DisconnectCause::ReadFailure => "read failure",
        })
    }
}

/// Current state of the single connection of the panel.
pub(crate) enum Link {
    Disconnected(DisconnectedState),
    Connected(ConnectionHandle),
}
impl Link {
    pub(crate) fn new() -> Self {
        Link::Disconnected(DisconnectedState {
            cause: DisconnectCause::Initial,
        })
    }

    pub(crate) fn handle_mut(&mut self) -> Option<&mut ConnectionHandle> {
        match self {
            Link::Connected(handle) => Some(handle),
            Link::Disconnected(_) => None,
        }
    }

    pub(crate) fn handle(&self) -> Option<&ConnectionHandle> {
        match self {
            Link::Connected(handle) => Some(handle),
            Link::Disconnected(_) => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct DisconnectedState {
    pub cause: DisconnectCause,
}

/// An open connection: the write end of the transport, the reader thread that
/// owns the read end, and the queue the reader fills.
pub(crate) struct ConnectionHandle {
    pub port: String,
    pub writer: Box<dyn Transport>,
    pub incoming: Receiver<Incoming>,
    reader: ReaderLoop,
}
impl ConnectionHandle {
    /// Stop the reader, then close the transport.
    pub(crate) fn close(mut self) {
        self.reader.stop();
        debug!("closing {}", self.port);
    }
}
impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("port", &self.port)
            .field("reader", &self.reader)
            .finish()
    }
}

// ConnectedEvent ==============================================================

/// Fired once the port is open, settled and has its reader running.
pub(crate) struct ConnectedEvent {
    pub port: String,
    pub writer: Box<dyn Transport>,
    pub reader: ReaderLoop,
    pub incoming: Receiver<Incoming>,
}

// DisconnectedEvent ===========================================================

/// Fired after a connection was torn down.
#[derive(Debug)]
pub(crate) struct DisconnectedEvent {
    pub cause: DisconnectCause,
}

/// Open the port named in `settings` and start its reader.
///
/// This is the `Connecting` phase: it blocks for the device settle time. Any
/// failure leaves nothing open behind.
pub(crate) fn open(connector: &dyn Connector, settings: &Settings) -> Result<ConnectedEvent> {
    let connection_error = |source| Error::Connection {
        port: settings.path.clone(),
        source,
    };

    let writer = connector.open(settings).map_err(connection_error)?;
    let read_end = writer.try_clone().map_err(connection_error)?;
    let (reader, incoming) =
        ReaderLoop::spawn(read_end, settings.poll_interval).map_err(connection_error)?;

    info!("link to {} is up", settings.path);
    Ok(ConnectedEvent {
        port: settings.path.clone(),
        writer,
        reader,
        incoming,
    })
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<ConnectedEvent> for ConnectionHandle {
    fn from(event: ConnectedEvent) -> ConnectionHandle {
        ConnectionHandle {
            port: event.port,
            writer: event.writer,
            incoming: event.incoming,
            reader: event.reader,
        }
    }
}

impl From<DisconnectedEvent> for DisconnectedState {
    fn from(event: DisconnectedEvent) -> DisconnectedState {
        DisconnectedState { cause: event.cause }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
