//! Settings related to the dispenser serial link and the control panel.
//!
//! Use the [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values. The line parameters are dictated by
//! the firmware and are not configurable: 9600 baud, 8N1, no flow control and
//! one second read/write timeouts.

use std::time::Duration;

/// Baud rate of the dispenser firmware.
pub const BAUD_RATE: u32 = 9600;

/// Read and write timeout on the serial port.
pub const IO_TIMEOUT: Duration = Duration::from_secs(1);

#[cfg(windows)]
const DEFAULT_PATH: &str = "COM5";
#[cfg(not(windows))]
const DEFAULT_PATH: &str = "/dev/ttyACM0";

// =============================================================================
// Public Interface
// =============================================================================

/// Groups all settings used by the control panel and acts as a
/// [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// The port name, usually the device path.
    pub path: String,
    /// Connect once to `path` as soon as the panel starts.
    pub auto_connect: bool,
    /// Time given to the board to boot after the port is opened (opening the
    /// port resets most Arduino-style boards). Whatever the board printed
    /// during that time is discarded.
    pub settle_time: Duration,
    /// Interval at which the reader checks the port for new data and the
    /// front end drains received lines.
    pub poll_interval: Duration,

    /// Restrict creation of `Settings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}
impl Settings {
    pub fn baud_rate(&self) -> u32 {
        BAUD_RATE
    }

    pub fn timeout(&self) -> Duration {
        IO_TIMEOUT
    }
}

/// The builder for the `Settings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// use dispenser_panel::SettingsBuilder;
///
/// let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
/// assert_eq!(settings.path, "/dev/ttyUSB0");
/// ```
pub struct SettingsBuilder {
    settings: Settings,
}
impl SettingsBuilder {
    /// Start building the settings using default values.
    pub fn new() -> Self {
        SettingsBuilder {
            settings: Settings {
                path: DEFAULT_PATH.into(),
                auto_connect: true,
                settle_time: Duration::from_secs(2),
                poll_interval: Duration::from_millis(100),
                _private_use_builder: (),
            },
        }
    }

    /// Set the path to the serial port
    pub fn path<'a>(mut self, path: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.path = path.into().into_owned();
        self
    }

    /// Connect (or not) to the port at start-up
    pub fn auto_connect(mut self, auto_connect: bool) -> Self {
        self.settings.auto_connect = auto_connect;
        self
    }

    /// Set the time to wait for the board to boot after opening the port
    pub fn settle_time(mut self, settle_time: Duration) -> Self {
        self.settings.settle_time = settle_time;
        self
    }

    /// Set the reader polling interval
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.settings.poll_interval = poll_interval;
        self
    }

    pub fn finalize(self) -> Settings {
        self.settings
    }
}
impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        Settings {
            path: DEFAULT_PATH.into(),
            auto_connect: true,
            settle_time: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
            _private_use_builder: (),
        }
    );
    assert_eq!(settings.baud_rate(), 9600);
    assert_eq!(settings.timeout(), Duration::from_secs(1));
}

#[test]
fn path() {
    let settings = SettingsBuilder::new().path("COM7").finalize();
    assert_eq!(settings.path, "COM7");
}

#[test]
fn auto_connect() {
    let settings = SettingsBuilder::new().auto_connect(false).finalize();
    assert!(!settings.auto_connect);
}

#[test]
fn settle_time() {
    let settings = SettingsBuilder::new()
        .settle_time(Duration::from_millis(500))
        .finalize();
    assert_eq!(settings.settle_time, Duration::from_millis(500));
}

#[test]
fn poll_interval() {
    let settings = SettingsBuilder::new()
        .poll_interval(Duration::from_millis(10))
        .finalize();
    assert_eq!(settings.poll_interval, Duration::from_millis(10));
}
