//! The control panel: connection lifecycle, command sending and the
//! consumer side of the status line queue.
//!
//! All application state lives in a [`ControlPanel`], owned by the front end.
//! The front end forwards operator [`Intent`]s with [`ControlPanel::handle`]
//! and calls [`ControlPanel::poll`] on a fixed interval (every
//! [`Settings::poll_interval`]) to drain the lines received since the last
//! tick. Every change is pushed to the panel's [`Surface`].
//!
//! **Example** - Driving the panel against the simulated dispenser:
//! ```
//! use std::{thread, time::Duration};
//! use dispenser_panel::{
//!     protocol::SystemState, surface::TerminalSurface, transport::FakeDevice, ControlPanel,
//!     SettingsBuilder,
//! };
//!
//! let device = FakeDevice::dispenser("sim0");
//! let settings = SettingsBuilder::new()
//!     .path("sim0")
//!     .settle_time(Duration::from_millis(0))
//!     .finalize();
//! let mut panel = ControlPanel::new(
//!     settings,
//!     Box::new(device.connector()),
//!     TerminalSurface::new(),
//! );
//! panel.start().unwrap();
//! while panel.state() != SystemState::Ready {
//!     panel.poll();
//!     thread::sleep(Duration::from_millis(10));
//! }
//! assert!(panel.dispense_enabled());
//! ```

use log::{debug, error, info, trace, warn};

use crate::{
    error::{Error, Result},
    protocol::{interpret, Command, DisplayFields, Field, SystemState},
    settings::Settings,
    surface::{Intent, Surface},
    transport::{Connector, PortInfo},
};

mod link;
mod reader;

use link::{DisconnectCause, DisconnectedEvent, Link};
use reader::Incoming;

// =============================================================================
// Public Interface
// =============================================================================

pub struct ControlPanel<S: Surface> {
    settings: Settings,
    connector: Box<dyn Connector>,
    surface: S,
    link: Link,
    state: SystemState,
    fields: DisplayFields,
    /// Set after a dispense command until the device reports a new state.
    dispense_locked: bool,
}
impl<S: Surface> ControlPanel<S> {
    pub fn new(settings: Settings, connector: Box<dyn Connector>, surface: S) -> Self {
        ControlPanel {
            settings,
            connector,
            surface,
            link: Link::new(),
            state: SystemState::Disconnected,
            fields: DisplayFields::default(),
            dispense_locked: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn fields(&self) -> DisplayFields {
        self.fields
    }

    pub fn is_connected(&self) -> bool {
        self.link.handle().is_some()
    }

    /// Name of the connected port.
    pub fn port(&self) -> Option<&str> {
        self.link.handle().map(|handle| handle.port.as_str())
    }

    /// Whether the dispense action should be offered to the operator.
    pub fn dispense_enabled(&self) -> bool {
        self.is_connected() && self.state.allows_dispense() && !self.dispense_locked
    }

    /// Attempt the start-up connection if the settings ask for it. This is
    /// the only connection attempt the panel makes on its own.
    pub fn start(&mut self) -> Result<()> {
        if !self.settings.auto_connect {
            return Ok(());
        }
        let path = self.settings.path.clone();
        self.surface
            .log(&format!("Trying automatic connection to {}...", path));
        self.connect(&path)
    }

    /// Carry out an operator intent.
    ///
    /// Failures are reported to the surface before being returned, so callers
    /// may ignore them.
    pub fn handle(&mut self, intent: Intent) -> Result<()> {
        debug!("intent: {:?}", intent);
        match intent {
            Intent::Connect(port) => self.connect(&port),
            Intent::Disconnect => {
                self.disconnect();
                Ok(())
            }
            Intent::Dispense => self.dispense(),
            Intent::Status => self.request_status(),
            Intent::Reset => self.reset(),
            Intent::ListPorts => self.list_ports().map(|_| ()),
        }
    }

    /// Open `port`, start its reader and ask the device for its status.
    ///
    /// Blocks for the device settle time. On failure the panel stays
    /// disconnected; there is no retry.
    pub fn connect(&mut self, port: &str) -> Result<()> {
        if let Some(handle) = self.link.handle() {
            let err = Error::AlreadyConnected(handle.port.clone());
            self.surface.log(&format!("ERROR: {}", err));
            return Err(err);
        }
        if let Link::Disconnected(previous) = &self.link {
            debug!("connecting (previous link: {})", previous.cause);
        }

        let mut target = self.settings.clone();
        target.path = port.into();
        self.surface.log(&format!("Connecting to {}...", port));
        self.set_state(SystemState::Connecting);

        match link::open(self.connector.as_ref(), &target) {
            Ok(event) => {
                self.settings = target;
                self.link = Link::Connected(event.into());
                self.surface.connection_update(true);
                self.surface
                    .log(&format!("Successfully connected to {}", port));
                if let Err(err) = self.send(Command::Status) {
                    debug!("initial status request failed: {}", err);
                }
                Ok(())
            }
            Err(err) => {
                error!("{}", err);
                self.surface.log(&format!("Connection ERROR: {}", err));
                self.surface.notify_error(
                    "Connection error",
                    &format!("Could not connect to {}\n\nError: {}", port, err),
                );
                self.set_state(SystemState::Disconnected);
                Err(err)
            }
        }
    }

    /// Stop the reader, close the port and forget everything the device told.
    pub fn disconnect(&mut self) {
        if !self.is_connected() {
            debug!("disconnect requested while not connected");
            return;
        }
        self.close(DisconnectCause::Requested);
    }

    /// Ask the device to dispense an envelope. Only honoured while the device
    /// is ready; the action then stays locked until the device reports its
    /// next state.
    pub fn dispense(&mut self) -> Result<()> {
        if !self.dispense_enabled() {
            info!("dispense refused in state {:?}", self.state);
            self.surface
                .log(&format!("Dispense not available ({})", self.state));
            return Ok(());
        }
        self.send(Command::Dispense)?;
        self.dispense_locked = true;
        self.publish_state();
        Ok(())
    }

    pub fn request_status(&mut self) -> Result<()> {
        self.send(Command::Status)
    }

    /// Reset the device. Nothing is locked, the device reports its new state.
    pub fn reset(&mut self) -> Result<()> {
        self.send(Command::Reset)
    }

    /// Write `command` to the device. Does nothing but log when not connected.
    ///
    /// This is the raw path: it does not check whether the command makes sense
    /// in the current state.
    pub fn send(&mut self, command: Command) -> Result<()> {
        let handle = match self.link.handle_mut() {
            Some(handle) => handle,
            None => {
                debug!("not connected, dropping command {}", command);
                self.surface
                    .log(&format!("Not connected - command {} not sent", command));
                return Ok(());
            }
        };

        match handle.writer.write_all(&command.frame()) {
            Ok(()) => {
                trace!(">> {}", command);
                self.surface.log(&format!("Command sent: {}", command));
                Ok(())
            }
            Err(source) => {
                let err = Error::Write { command, source };
                warn!("{}", err);
                self.surface.log(&format!("ERROR: {}", err));
                self.surface
                    .notify_error("Error", &format!("Failed to send command: {}", err));
                Err(err)
            }
        }
    }

    /// List the ports present on the system and show them on the surface.
    pub fn list_ports(&mut self) -> Result<Vec<PortInfo>> {
        match self.connector.available_ports() {
            Ok(ports) => {
                debug!("{} port(s) found", ports.len());
                self.surface.show_ports(&ports);
                Ok(ports)
            }
            Err(source) => {
                let err = Error::Enumeration(source);
                self.surface.log(&format!("ERROR: {}", err));
                self.surface.notify_error("Serial ports", &err.to_string());
                Err(err)
            }
        }
    }

    /// Drain everything the reader queued since the last call, without
    /// blocking. Returns the number of lines processed.
    pub fn poll(&mut self) -> usize {
        let received: Vec<Incoming> = match self.link.handle() {
            Some(handle) => handle.incoming.try_iter().collect(),
            None => return 0,
        };

        let mut lines = 0;
        for incoming in received {
            match incoming {
                Incoming::Line(line) => {
                    self.handle_line(line.as_str());
                    lines += 1;
                }
                Incoming::Failed(reason) => self.on_read_failure(reason),
            }
        }
        lines
    }

    /// Log a status line and apply its interpretation.
    pub fn handle_line(&mut self, line: &str) {
        self.surface.log(line);

        let result = interpret(line);
        if result.is_empty() {
            trace!("no rule for {:?}", line);
        }
        for value in result.fields.iter().copied() {
            self.fields.apply(value);
            self.surface.field_update(value.field(), Some(value));
        }
        if let Some(state) = result.state {
            self.dispense_locked = false;
            self.set_state(state);
        }
        if let Some(note) = result.note {
            self.surface.log(note);
        }
    }

    // -------------------------------------------------------------------------
    // Private stuff
    // -------------------------------------------------------------------------

    fn on_read_failure(&mut self, reason: String) {
        let err = Error::Read(reason);
        error!("{}", err);
        self.surface.log(&format!("ERROR: {}", err));
        self.close(DisconnectCause::ReadFailure);
    }

    fn close(&mut self, cause: DisconnectCause) {
        let previous = std::mem::replace(
            &mut self.link,
            Link::Disconnected(DisconnectedEvent { cause }.into()),
        );
        if let Link::Connected(handle) = previous {
            info!("closing {} ({:?})", handle.port, cause);
            handle.close();
        }

        self.fields.clear();
        for field in Field::ALL.iter().copied() {
            self.surface.field_update(field, None);
        }
        self.dispense_locked = false;
        self.surface.connection_update(false);
        self.set_state(SystemState::Disconnected);
        self.surface
            .log(&format!("Serial connection closed ({})", cause));
    }

    fn set_state(&mut self, state: SystemState) {
        self.state = state;
        self.publish_state();
    }

    fn publish_state(&mut self) {
        let enabled = self.dispense_enabled();
        self.surface.state_update(self.state, enabled);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
