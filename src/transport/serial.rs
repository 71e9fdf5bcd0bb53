//! Serial port transport
//!
//! Real-hardware implementation of [`Transport`] on top of the `serialport`
//! crate, plus port enumeration for shells that present a device picker.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io::{Read, Write};
use std::time::Duration;

use crate::config::DEFAULT_BAUD_RATE;
use crate::error::{Result, ScopeError};

use super::Transport;

/// Read timeout for the underlying port
///
/// Reads are only issued when `bytes_to_read` reports pending data, so this
/// is a safety margin, not a polling interval.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb_info) => {
                (Some(usb_info.vid), Some(usb_info.pid), usb_info.product)
            }
            _ => (None, None, None),
        };

        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

/// Helper used to sort port names so that:
///  - ttyACM* ports come first (sorted numerically by suffix)
///  - then ttyUSB* ports (sorted numerically)
///  - then other ports (sorted by name)
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

/// List available serial ports in deterministic order
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by_key(|p| port_sort_key(&p.name));
    ports
}

/// Serial implementation of [`Transport`]
///
/// Configured 8N1 with no flow control at the given baud rate. The handle is
/// held only between a successful `open` and the matching `close`.
pub struct SerialTransport {
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
    /// Name of the currently open port, for log messages
    port_name: Option<String>,
}

impl SerialTransport {
    /// Create a transport that opens ports at the given baud rate
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            port: None,
            port_name: None,
        }
    }

    /// Configured baud rate
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE)
    }
}

impl Transport for SerialTransport {
    fn open(&mut self, selector: &str) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(selector, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;

        tracing::info!("Serial port {} opened at {} baud", selector, self.baud_rate);
        self.port = Some(port);
        self.port_name = Some(selector.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(port) = self.port.take() {
            // Dropping the handle releases the OS file descriptor
            drop(port);
            if let Some(name) = self.port_name.take() {
                tracing::info!("Serial port {} closed", name);
            }
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        let port = self.port.as_mut().ok_or(ScopeError::NotConnected)?;

        let pending = port.bytes_to_read()?;
        if pending == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; pending as usize];
        let read = port.read(&mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(ScopeError::NotConnected)?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }
}
