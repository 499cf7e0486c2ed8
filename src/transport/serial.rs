//! Serial port device manipulation.

use std::{
    io::{self, Read, Write},
    thread,
};

use log::{debug, info};
use serialport::{
    available_ports, ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortType,
    StopBits,
};

use super::{Connector, PortInfo, Transport};
use crate::settings::Settings;

//==============================================================================
// Public Interface
//==============================================================================

/// Opens the dispenser's serial port.
#[derive(Debug, Default, Copy, Clone)]
pub struct SerialConnector;
impl Connector for SerialConnector {
    fn open(&self, settings: &Settings) -> io::Result<Box<dyn Transport>> {
        debug!("Opening {}", settings.path);
        let port = serialport::new(settings.path.as_str(), settings.baud_rate())
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(settings.timeout())
            .open()?;

        info!(
            "Connected to {} at {} baud",
            port.name().unwrap_or_else(|| settings.path.clone()),
            port.baud_rate()?
        );

        // Opening the port resets the board. Let it boot then throw away
        // whatever it printed meanwhile.
        debug!("Waiting {:?} for the device to settle", settings.settle_time);
        thread::sleep(settings.settle_time);

        let mut transport = SerialTransport { port };
        transport.discard_input()?;
        Ok(Box::new(transport))
    }

    fn available_ports(&self) -> io::Result<Vec<PortInfo>> {
        let ports = available_ports()?;
        Ok(ports
            .into_iter()
            .map(|p| PortInfo {
                description: describe(&p.port_type),
                name: p.port_name,
            })
            .collect())
    }
}

/// A configured and open serial port.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}
impl Transport for SerialTransport {
    fn name(&self) -> String {
        self.port.name().unwrap_or_else(|| "serial".into())
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Box<dyn Transport>> {
        Ok(Box::new(SerialTransport {
            port: self.port.try_clone()?,
        }))
    }
}

//==============================================================================
// Private stuff
//==============================================================================

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        // USB ports give us more info about the connected serial controller
        SerialPortType::UsbPort(info) => {
            let label = info
                .product
                .as_ref()
                .or_else(|| info.manufacturer.as_ref())
                .map_or("USB serial device", String::as_str);
            format!("{} ({:04x}:{:04x})", label, info.vid, info.pid)
        }
        SerialPortType::PciPort => "PCI serial device".into(),
        SerialPortType::BluetoothPort => "Bluetooth serial device".into(),
        SerialPortType::Unknown => "n/a".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    #[test]
    fn usb_description_prefers_the_product() {
        let info = UsbPortInfo {
            vid: 0x2341,
            pid: 0x0043,
            serial_number: None,
            manufacturer: Some("Arduino (www.arduino.cc)".into()),
            product: Some("Arduino Uno".into()),
        };
        assert_eq!(
            describe(&SerialPortType::UsbPort(info)),
            "Arduino Uno (2341:0043)"
        );
    }

    #[test]
    fn usb_description_falls_back() {
        let info = UsbPortInfo {
            vid: 0x1a86,
            pid: 0x7523,
            serial_number: None,
            manufacturer: None,
            product: None,
        };
        assert_eq!(
            describe(&SerialPortType::UsbPort(info)),
            "USB serial device (1a86:7523)"
        );
        assert_eq!(describe(&SerialPortType::Unknown), "n/a");
    }
}
