//! Background thread forwarding received lines to the control panel.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, trace, warn};

use crate::transport::{LineReader, RawLine, Transport};

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// What the reader hands over to the consumer.
#[derive(Debug)]
pub(crate) enum Incoming {
    Line(RawLine),
    /// The port failed while the connection was still active. Always the last
    /// message of a reader.
    Failed(String),
}

/// A running reader thread. Dropping it stops the thread.
#[derive(Debug)]
pub(crate) struct ReaderLoop {
    active: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}
impl ReaderLoop {
    /// Start reading from `transport` every `poll_interval`. The returned
    /// receiver is the only consumer of what this reader produces.
    pub(crate) fn spawn(
        transport: Box<dyn Transport>,
        poll_interval: Duration,
    ) -> io::Result<(ReaderLoop, Receiver<Incoming>)> {
        let (tx, rx) = mpsc::channel();
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let thread = thread::Builder::new()
            .name(format!("reader:{}", transport.name()))
            .spawn(move || run(LineReader::new(transport), &tx, &flag, poll_interval))?;
        Ok((
            ReaderLoop {
                active,
                thread: Some(thread),
            },
            rx,
        ))
    }

    /// Ask the thread to stop and wait until it has, which takes at most one
    /// poll interval. The thread's transport handle is closed when it returns.
    pub(crate) fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("reader thread panicked");
            }
        }
    }
}
impl Drop for ReaderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Private stuff
// =============================================================================

fn run(
    mut reader: LineReader,
    tx: &Sender<Incoming>,
    active: &AtomicBool,
    poll_interval: Duration,
) {
    debug!("reader started");
    while active.load(Ordering::SeqCst) {
        loop {
            match reader.read_line() {
                Ok(Some(line)) => {
                    trace!("<< {}", line);
                    if !active.load(Ordering::SeqCst) || tx.send(Incoming::Line(line)).is_err() {
                        debug!("reader stopped while lines were pending");
                        return;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    // An error after the connection was closed is the normal
                    // disconnect race; only report it otherwise.
                    if active.load(Ordering::SeqCst) {
                        warn!("read error: {}", err);
                        let _ = tx.send(Incoming::Failed(err.to_string()));
                    } else {
                        debug!("read error after close: {}", err);
                    }
                    return;
                }
            }
        }
        thread::sleep(poll_interval);
    }
    debug!("reader stopped");
}

// =============================================================================
// Unit Tests
// =============================================================================
