use std::{
    thread,
    time::{Duration, Instant},
};

use dispenser_panel::{
    protocol::{Field, FieldValue, Output, Position, Stock, SystemState},
    surface::{Intent, Surface},
    transport::{FakeDevice, PortInfo},
    ControlPanel, Error, SettingsBuilder,
};

#[derive(Default)]
struct Log {
    lines: Vec<String>,
    states: Vec<(SystemState, bool)>,
    errors: usize,
}
impl Surface for Log {
    fn log(&mut self, message: &str) {
        self.lines.push(message.into());
    }
    fn field_update(&mut self, _field: Field, _value: Option<FieldValue>) {}
    fn state_update(&mut self, state: SystemState, dispense_enabled: bool) {
        self.states.push((state, dispense_enabled));
    }
    fn connection_update(&mut self, _connected: bool) {}
    fn notify_error(&mut self, _title: &str, _message: &str) {
        self.errors += 1;
    }
    fn show_ports(&mut self, _ports: &[PortInfo]) {}
}

fn panel(device: &FakeDevice) -> ControlPanel<Log> {
    let settings = SettingsBuilder::new()
        .path("sim0")
        .settle_time(Duration::from_millis(0))
        .poll_interval(Duration::from_millis(1))
        .finalize();
    ControlPanel::new(settings, Box::new(device.connector()), Log::default())
}

fn wait_until(panel: &mut ControlPanel<Log>, done: impl Fn(&ControlPanel<Log>) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !done(panel) {
        assert!(
            Instant::now() < deadline,
            "stuck in {:?}",
            panel.state()
        );
        panel.poll();
        thread::sleep(Duration::from_millis(1));
    }
}

fn wait_for(panel: &mut ControlPanel<Log>, state: SystemState) {
    wait_until(panel, |p| p.state() == state);
}

#[test]
fn full_dispense_cycle() {
    let device = FakeDevice::dispenser("sim0");
    let mut panel = panel(&device);

    panel.start().unwrap();
    wait_for(&mut panel, SystemState::Ready);
    assert!(panel.dispense_enabled());
    assert_eq!(panel.fields().stock, Some(Stock::Loaded));
    assert_eq!(panel.fields().output, Some(Output::Free));

    panel.handle(Intent::Dispense).unwrap();
    assert!(!panel.dispense_enabled());
    wait_for(&mut panel, SystemState::AwaitingPickup);
    assert!(!panel.dispense_enabled());
    assert_eq!(panel.fields().position, Some(Position::Present));
    assert!(panel.surface().states.contains(&(SystemState::InOperation, false)));
    assert!(panel.surface().states.contains(&(SystemState::Verifying, false)));

    // the simulator takes a status request as the envelope being picked up
    panel.handle(Intent::Status).unwrap();
    wait_until(&mut panel, |p| p.fields().position == Some(Position::Free));
    assert_eq!(panel.state(), SystemState::Ready);
    assert!(panel.dispense_enabled());

    panel.handle(Intent::Disconnect).unwrap();
    assert_eq!(panel.state(), SystemState::Disconnected);
    assert_eq!(device.written_text(), "S\nD\nS\n");
    assert_eq!(device.open_handles(), 0);
    assert_eq!(panel.surface().errors, 0);
}

#[test]
fn reset_recovers_from_a_waiting_envelope() {
    let device = FakeDevice::dispenser("sim0");
    let mut panel = panel(&device);
    panel.handle(Intent::Connect("sim0".into())).unwrap();
    wait_for(&mut panel, SystemState::Ready);

    panel.handle(Intent::Dispense).unwrap();
    wait_for(&mut panel, SystemState::AwaitingPickup);

    // raw dispense while the output is busy
    panel.send(dispenser_panel::protocol::Command::Dispense).unwrap();
    wait_for(&mut panel, SystemState::OutputBusy);

    panel.handle(Intent::Reset).unwrap();
    wait_for(&mut panel, SystemState::Ready);
    assert!(panel
        .surface()
        .lines
        .iter()
        .any(|l| l == "System reset successfully"));
}

#[test]
fn unplugged_device_cannot_be_opened() {
    let device = FakeDevice::dispenser("sim0");
    device.set_unavailable(true);
    let mut panel = panel(&device);

    match panel.handle(Intent::Connect("sim0".into())) {
        Err(Error::Connection { port, .. }) => assert_eq!(port, "sim0"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(panel.state(), SystemState::Disconnected);
    assert_eq!(panel.surface().errors, 1);
    assert!(panel.list_ports().unwrap().is_empty());

    device.set_unavailable(false);
    panel.handle(Intent::Connect("sim0".into())).unwrap();
    wait_for(&mut panel, SystemState::Ready);
}

#[test]
fn unplugging_while_connected_disconnects() {
    let device = FakeDevice::dispenser("sim0");
    let mut panel = panel(&device);
    panel.start().unwrap();
    wait_for(&mut panel, SystemState::Ready);

    device.fail_reads(true);
    wait_for(&mut panel, SystemState::Disconnected);
    assert!(!panel.is_connected());
    assert_eq!(device.open_handles(), 0);
}
