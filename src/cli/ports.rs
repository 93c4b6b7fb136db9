use eyre::{Context, Result};
use tokio_serial::{SerialPortInfo, SerialPortType, available_ports};

pub fn list() -> Result<()> {
    let mut ports = available_ports().wrap_err("Failed to enumerate serial ports")?;
    ports.sort_by(|a, b| a.port_name.cmp(&b.port_name));

    match ports.is_empty() {
        true => println!("No serial ports found."),
        false => {
            for port in &ports {
                println!("{}  {}", port.port_name, describe(port));
            }
        }
    }

    Ok(())
}

fn describe(port: &SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(info) => {
            let product = info.product.as_deref().unwrap_or("USB serial device");
            format!("{product} [{:04x}:{:04x}]", info.vid, info.pid)
        }
        SerialPortType::PciPort => "PCI serial port".into(),
        SerialPortType::BluetoothPort => "Bluetooth serial port".into(),
        SerialPortType::Unknown => "Unknown device".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describes_non_usb_ports() {
        let port = SerialPortInfo {
            port_name: "/dev/ttyS0".into(),
            port_type: SerialPortType::Unknown,
        };

        assert_eq!(describe(&port), "Unknown device");

        let port = SerialPortInfo {
            port_name: "/dev/rfcomm0".into(),
            port_type: SerialPortType::BluetoothPort,
        };

        assert_eq!(describe(&port), "Bluetooth serial port");
    }
}
