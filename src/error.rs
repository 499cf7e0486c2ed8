//! Errors reported by the control panel.
//!
//! None of these are fatal: they end up in the operator log and, when the
//! operator triggered the failing action, in an error notification.

use std::io;

use thiserror::Error;

use crate::protocol::Command;

#[derive(Debug, Error)]
pub enum Error {
    /// The port could not be opened or prepared. The panel stays disconnected.
    #[error("could not connect to `{port}`: {source}")]
    Connection {
        port: String,
        #[source]
        source: io::Error,
    },

    /// A command could not be written. The connection stays open.
    #[error("failed to send command `{command}`: {source}")]
    Write {
        command: Command,
        #[source]
        source: io::Error,
    },

    /// The reader lost the port while the connection was still expected to be
    /// up.
    #[error("read failure: {0}")]
    Read(String),

    #[error("already connected to `{0}`")]
    AlreadyConnected(String),

    #[error("could not list serial ports: {0}")]
    Enumeration(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
