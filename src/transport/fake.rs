//! An in-memory dispenser link.
//!
//! A [`FakeDevice`] plays the part of the board on the other side of the
//! cable: bytes it sends are queued for the panel to read, bytes the panel
//! writes are recorded. Failures (unplugged device, write timeouts) can be
//! switched on at any time. Given a responder, the device answers every
//! command it receives; [`FakeDevice::dispenser`] wires in a small simulation
//! of the real firmware.

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex, MutexGuard},
    thread,
};

use log::debug;

use super::{Connector, PortInfo, Transport};
use crate::settings::Settings;

type Responder = Box<dyn FnMut(&str) -> Vec<String> + Send>;

// =============================================================================
// Public Interface
// =============================================================================

/// Shared handle on the fake device. Clones refer to the same device.
#[derive(Clone)]
pub struct FakeDevice {
    wire: Arc<Mutex<Wire>>,
}
impl FakeDevice {
    /// A silent device reachable as `name`.
    pub fn new<'a>(name: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        FakeDevice {
            wire: Arc::new(Mutex::new(Wire {
                name: name.into().into_owned(),
                ..Wire::default()
            })),
        }
    }

    /// A device answering commands like the dispenser firmware does.
    pub fn dispenser<'a>(name: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        let device = FakeDevice::new(name);
        let mut simulator = Simulator::new();
        device.wire().responder = Some(Box::new(move |command| simulator.respond(command)));
        device
    }

    pub fn name(&self) -> String {
        self.wire().name.clone()
    }

    /// Queue a line for the panel, terminated by `\n`.
    pub fn send_line(&self, line: &str) {
        let mut wire = self.wire();
        wire.incoming.extend(line.as_bytes());
        wire.incoming.push_back(b'\n');
    }

    /// Queue raw bytes for the panel.
    pub fn send_bytes(&self, bytes: &[u8]) {
        self.wire().incoming.extend(bytes);
    }

    /// Number of queued bytes the panel has not read yet.
    pub fn unread(&self) -> usize {
        self.wire().incoming.len()
    }

    /// Everything the panel wrote so far.
    pub fn written(&self) -> Vec<u8> {
        self.wire().written.clone()
    }

    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.wire().written).into_owned()
    }

    /// Make every read fail, as when the cable is pulled.
    pub fn fail_reads(&self, fail: bool) {
        self.wire().fail_reads = fail;
    }

    /// Make every write time out.
    pub fn fail_writes(&self, fail: bool) {
        self.wire().fail_writes = fail;
    }

    /// Make the device disappear from the system (or come back).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.wire().unavailable = unavailable;
    }

    /// Number of transports currently open on this device.
    pub fn open_handles(&self) -> usize {
        self.wire().handles
    }

    /// Open a transport directly, bypassing the connector.
    pub fn transport(&self) -> FakeTransport {
        self.wire().handles += 1;
        FakeTransport {
            device: self.clone(),
        }
    }

    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            device: self.clone(),
        }
    }

    fn wire(&self) -> MutexGuard<'_, Wire> {
        self.wire.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Opens transports on a [`FakeDevice`], which is listed as the only port.
#[derive(Clone)]
pub struct FakeConnector {
    device: FakeDevice,
}
impl Connector for FakeConnector {
    fn open(&self, settings: &Settings) -> io::Result<Box<dyn Transport>> {
        let name = self.device.name();
        if self.device.wire().unavailable || settings.path != name {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such device `{}`", settings.path),
            ));
        }
        debug!("Opening fake device {}", name);
        thread::sleep(settings.settle_time);
        let mut transport = self.device.transport();
        transport.discard_input()?;
        Ok(Box::new(transport))
    }

    fn available_ports(&self) -> io::Result<Vec<PortInfo>> {
        if self.device.wire().unavailable {
            return Ok(Vec::new());
        }
        Ok(vec![PortInfo {
            name: self.device.name(),
            description: "Simulated envelope dispenser".into(),
        }])
    }
}

/// One handle on a [`FakeDevice`].
pub struct FakeTransport {
    device: FakeDevice,
}
impl Transport for FakeTransport {
    fn name(&self) -> String {
        self.device.name()
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        let wire = self.device.wire();
        wire.check_reads()?;
        Ok(wire.incoming.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut wire = self.device.wire();
        wire.check_reads()?;
        let count = buf.len().min(wire.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(wire.incoming.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut wire = self.device.wire();
        if wire.fail_writes {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"));
        }
        wire.written.extend_from_slice(bytes);
        wire.receive(bytes);
        Ok(())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.device.wire().incoming.clear();
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Box<dyn Transport>> {
        Ok(Box::new(self.device.transport()))
    }
}
impl Drop for FakeTransport {
    fn drop(&mut self) {
        self.device.wire().handles -= 1;
    }
}

// =============================================================================
// Private stuff
// =============================================================================

#[derive(Default)]
struct Wire {
    name: String,
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    /// Bytes of the command being received, up to its `\n`.
    command: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
    unavailable: bool,
    handles: usize,
    responder: Option<Responder>,
}
impl Wire {
    fn check_reads(&self) -> io::Result<()> {
        if self.fail_reads {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"))
        } else {
            Ok(())
        }
    }

    /// Feed written bytes to the responder, one command line at a time.
    fn receive(&mut self, bytes: &[u8]) {
        let Wire {
            command,
            incoming,
            responder,
            ..
        } = self;
        let responder = match responder {
            Some(responder) => responder,
            None => return,
        };
        for &byte in bytes {
            if byte != b'\n' {
                command.push(byte);
                continue;
            }
            let text = String::from_utf8_lossy(command).into_owned();
            command.clear();
            for line in responder(text.trim()) {
                incoming.extend(line.as_bytes());
                incoming.extend(b"\r\n");
            }
        }
    }
}

const CAPACITY: u32 = 5;

/// Mimics the dispenser firmware closely enough to drive the panel through a
/// full cycle. A status request while an envelope waits in the output counts
/// as the operator taking it.
struct Simulator {
    stock: u32,
    envelope_waiting: bool,
}
impl Simulator {
    fn new() -> Self {
        Simulator {
            stock: CAPACITY,
            envelope_waiting: false,
        }
    }

    fn respond(&mut self, command: &str) -> Vec<String> {
        let lines: Vec<&str> = match command {
            "S" => {
                let mut lines = Vec::new();
                if self.envelope_waiting {
                    self.envelope_waiting = false;
                    lines.push("Envelope retirado - Sistema pronto");
                }
                lines.push(self.stock_line());
                lines.push("Saída: livre");
                lines.push("Posição: livre");
                lines.push(self.idle_line());
                lines
            }
            "D" => {
                if self.envelope_waiting {
                    vec!["ERRO - Saída ocupada", "Saída: ocupada"]
                } else if self.stock == 0 {
                    vec!["ERRO - Estoque vazio", "Estoque: vazio"]
                } else {
                    self.stock -= 1;
                    self.envelope_waiting = true;
                    vec![
                        "Verificando condições...",
                        "Avançando envelope",
                        "Ejetando envelope",
                        "Posição: envelope presente",
                        "Saída: ocupada",
                        self.stock_line(),
                        "Aguardando retirada",
                    ]
                }
            }
            "R" => {
                self.envelope_waiting = false;
                vec![
                    "Sistema resetado - pronto para uso",
                    "Saída: livre",
                    "Posição: livre",
                    self.stock_line(),
                ]
            }
            _ => vec!["Comando desconhecido"],
        };
        lines.into_iter().map(String::from).collect()
    }

    fn stock_line(&self) -> &'static str {
        if self.stock == 0 {
            "Estoque: vazio"
        } else {
            "Estoque: com envelopes"
        }
    }

    fn idle_line(&self) -> &'static str {
        if self.stock == 0 {
            "ERRO - Estoque vazio"
        } else {
            "Repouso - pronto para uso"
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettingsBuilder;
    use std::time::Duration;

    fn settings(path: &str) -> Settings {
        SettingsBuilder::new()
            .path(path)
            .settle_time(Duration::from_millis(0))
            .finalize()
    }

    fn drain(transport: &mut dyn Transport) -> String {
        let mut buf = vec![0; transport.bytes_to_read().unwrap()];
        let count = transport.read(&mut buf).unwrap();
        String::from_utf8(buf[..count].to_vec()).unwrap()
    }

    #[test]
    fn records_writes_and_queues_reads() {
        let device = FakeDevice::new("fake0");
        let mut transport = device.transport();
        transport.write_all(b"S\n").unwrap();
        assert_eq!(device.written(), b"S\n");

        device.send_line("hello");
        assert_eq!(drain(&mut transport), "hello\n");
        assert_eq!(transport.bytes_to_read().unwrap(), 0);
    }

    #[test]
    fn counts_open_handles() {
        let device = FakeDevice::new("fake0");
        let first = device.transport();
        let second = first.try_clone().unwrap();
        assert_eq!(device.open_handles(), 2);
        drop(first);
        drop(second);
        assert_eq!(device.open_handles(), 0);
    }

    #[test]
    fn connector_only_opens_its_own_port() {
        let device = FakeDevice::new("fake0");
        let connector = device.connector();
        assert!(connector.open(&settings("other")).is_err());

        device.send_line("stale boot banner");
        let mut transport = connector.open(&settings("fake0")).unwrap();
        assert_eq!(transport.bytes_to_read().unwrap(), 0);
        assert_eq!(transport.name(), "fake0");

        device.set_unavailable(true);
        assert!(connector.open(&settings("fake0")).is_err());
        assert!(connector.available_ports().unwrap().is_empty());
    }

    #[test]
    fn failures_can_be_injected() {
        let device = FakeDevice::new("fake0");
        let mut transport = device.transport();
        device.fail_writes(true);
        assert_eq!(
            transport.write_all(b"D\n").unwrap_err().kind(),
            io::ErrorKind::TimedOut
        );
        device.fail_reads(true);
        assert!(transport.bytes_to_read().is_err());
    }

    #[test]
    fn simulated_dispense_cycle() {
        let device = FakeDevice::dispenser("sim0");
        let mut transport = device.transport();

        transport.write_all(b"S\n").unwrap();
        assert!(drain(&mut transport).contains("Repouso - pronto para uso"));

        transport.write_all(b"D\n").unwrap();
        let answer = drain(&mut transport);
        assert!(answer.contains("Ejetando envelope"));
        assert!(answer.ends_with("Aguardando retirada\r\n"));

        transport.write_all(b"D\n").unwrap();
        assert!(drain(&mut transport).contains("ERRO - Saída ocupada"));

        transport.write_all(b"S\n").unwrap();
        assert!(drain(&mut transport).starts_with("Envelope retirado - Sistema pronto"));
    }

    #[test]
    fn simulator_runs_out_of_envelopes() {
        let mut simulator = Simulator::new();
        for _ in 0..CAPACITY {
            simulator.respond("D");
            simulator.respond("S");
        }
        assert_eq!(
            simulator.respond("D"),
            vec!["ERRO - Estoque vazio", "Estoque: vazio"]
        );
    }
}
