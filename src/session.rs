use std::fmt::Write as _;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use hidapi::HidApi;

use crate::cli::{HidOpts, SendOpts, ServeOpts};
use crate::command::{Axis, Command, Direction};
use crate::device::{self, CommandSink, Device};
use crate::dispatch;
use crate::relay;

/// How long a command that expects a readback waits for the device.
const RESPONSE_POLL_MS: i32 = 250;

pub fn list(opts: &HidOpts) -> Result<()> {
    let api = HidApi::new().context("initializing hidapi")?;
    let paths = device::list_devices(&api, opts.vid, opts.pid);
    if paths.is_empty() {
        bail!("no device with id {:04x}:{:04x} attached", opts.vid, opts.pid);
    }
    for path in &paths {
        println!("{}", path.to_string_lossy());
    }
    Ok(())
}

pub fn send(opts: &SendOpts) -> Result<()> {
    let line = opts.line.join(" ");
    let command = dispatch::parse_line(&line)?;
    let mut dev = open_first(&opts.hid)?;
    query(&mut dev, &command, "reply")?;
    dev.close();
    Ok(())
}

/// Bring-up plus one demonstration stroke: full-strength outward movement on
/// the up axis for one second.
pub fn demo(opts: &HidOpts) -> Result<()> {
    let mut dev = open_first(opts)?;
    startup(&mut dev)?;
    let stroke = Command::VectorMovement {
        axis: Axis::Up,
        direction: Direction::Out,
        magnitude: 255,
        duration_ms: 1000,
        inbound: None,
        outbound: None,
    };
    query(&mut dev, &stroke, "vector")?;
    dev.close();
    Ok(())
}

pub fn serve(opts: &ServeOpts) -> Result<()> {
    let mut dev = open_first(&opts.hid)?;
    startup(&mut dev)?;
    let addr = SocketAddr::new(opts.bind, opts.port);
    let listener =
        TcpListener::bind(addr).with_context(|| format!("binding relay on {addr}"))?;
    relay::run(listener, Duration::from_millis(opts.idle_timeout_ms), &mut dev)
}

/// Open the first attached device matching the configured ids. Failure here
/// is fatal to the process; there is nothing to drive without a device.
fn open_first(opts: &HidOpts) -> Result<Device> {
    let api = HidApi::new().context("initializing hidapi")?;
    let paths = device::list_devices(&api, opts.vid, opts.pid);
    let Some(path) = paths.first() else {
        bail!("no device with id {:04x}:{:04x} attached", opts.vid, opts.pid);
    };
    let dev = Device::open(&api, path)?;
    eprintln!("[hid] opened {}", dev.path());
    Ok(dev)
}

/// Fixed bring-up sequence: serial number query, then firmware version.
fn startup(dev: &mut Device) -> Result<()> {
    query(dev, &Command::GetSerial, "serial")?;
    query(dev, &Command::GetFirmwareVersion, "firmware")?;
    Ok(())
}

/// Fire one command and print whatever report the device sends back within
/// the poll window. No response is not an error; the protocol has no
/// mandatory acknowledgements.
fn query(dev: &mut Device, command: &Command, label: &str) -> Result<()> {
    dev.send(command)?;
    match dev.read_report_timeout(RESPONSE_POLL_MS)? {
        Some(report) => println!("[{label}] {}", hex_line(&report)),
        None => eprintln!("[hid] no {label} response within {RESPONSE_POLL_MS}ms"),
    }
    Ok(())
}

fn hex_line(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 5);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "0x{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_line_matches_device_dump_format() {
        assert_eq!(hex_line(&[0x00, 0x0a, 0xff]), "0x00 0x0a 0xff");
        assert_eq!(hex_line(&[]), "");
    }
}
