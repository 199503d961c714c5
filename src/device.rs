use std::ffi::{CStr, CString};

use hidapi::{HidApi, HidDevice};
use thiserror::Error;

use crate::command::Command;
use crate::report::{REPORT_LEN, Report, encode};

pub const VENDOR_ID: u16 = 0x1f54;
pub const PRODUCT_ID: u16 = 0x0001;

/// Product strings carrying this marker report the first-generation firmware,
/// which speaks a different protocol and is excluded from enumeration.
const OUTDATED_FIRMWARE_MARKER: &str = "v1";

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: hidapi::HidError,
    },
    #[error("device handle is closed")]
    Closed,
    #[error("report write failed: {0}")]
    Write(#[source] hidapi::HidError),
    #[error("short write: {0} of 64 bytes")]
    ShortWrite(usize),
    #[error("report read failed: {0}")]
    Read(#[source] hidapi::HidError),
}

/// Paths of attached devices matching `vid:pid`, skipping units that still
/// run the outdated firmware (warned, not fatal).
pub fn list_devices(api: &HidApi, vid: u16, pid: u16) -> Vec<CString> {
    let mut paths = Vec::new();
    for info in api.device_list() {
        if info.vendor_id() != vid || info.product_id() != pid {
            continue;
        }
        if let Some(product) = info.product_string()
            && product.contains(OUTDATED_FIRMWARE_MARKER)
        {
            eprintln!(
                "[hid] skipping {}: outdated firmware ({product}), please update to v2",
                info.path().to_string_lossy()
            );
            continue;
        }
        paths.push(info.path().to_owned());
    }
    paths
}

/// Exclusively owned handle to one opened device. Reads are non-blocking;
/// `read_report` returning `None` means "no data yet", not an error.
pub struct Device {
    handle: Option<HidDevice>,
    path: String,
}

impl Device {
    pub fn open(api: &HidApi, path: &CStr) -> Result<Self, DeviceError> {
        let display = path.to_string_lossy().into_owned();
        let handle = api.open_path(path).map_err(|source| DeviceError::Open {
            path: display.clone(),
            source,
        })?;
        handle
            .set_blocking_mode(false)
            .map_err(|source| DeviceError::Open {
                path: display.clone(),
                source,
            })?;
        Ok(Self {
            handle: Some(handle),
            path: display,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn handle(&self) -> Result<&HidDevice, DeviceError> {
        self.handle.as_ref().ok_or(DeviceError::Closed)
    }

    /// Send one 64-byte report.
    pub fn write_report(&self, report: &Report) -> Result<(), DeviceError> {
        let n = self
            .handle()?
            .write(report.as_bytes())
            .map_err(DeviceError::Write)?;
        if n != REPORT_LEN {
            return Err(DeviceError::ShortWrite(n));
        }
        Ok(())
    }

    /// Fetch one pending report, or `None` if the device has nothing queued.
    pub fn read_report(&self) -> Result<Option<[u8; REPORT_LEN]>, DeviceError> {
        let mut buf = [0u8; REPORT_LEN];
        let n = self.handle()?.read(&mut buf).map_err(DeviceError::Read)?;
        Ok((n > 0).then_some(buf))
    }

    /// Like `read_report`, but waits up to `timeout_ms` for data.
    pub fn read_report_timeout(
        &self,
        timeout_ms: i32,
    ) -> Result<Option<[u8; REPORT_LEN]>, DeviceError> {
        let mut buf = [0u8; REPORT_LEN];
        let n = self
            .handle()?
            .read_timeout(&mut buf, timeout_ms)
            .map_err(DeviceError::Read)?;
        Ok((n > 0).then_some(buf))
    }

    /// Release the handle. Later operations fail with [`DeviceError::Closed`].
    pub fn close(&mut self) {
        self.handle = None;
    }
}

/// Seam between the dispatcher and the transport: anything that can consume
/// an encoded command. Lets the relay and dispatcher be exercised without
/// hardware.
pub trait CommandSink {
    fn send(&mut self, command: &Command) -> Result<(), DeviceError>;
}

impl CommandSink for Device {
    fn send(&mut self, command: &Command) -> Result<(), DeviceError> {
        self.write_report(&encode(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_device() -> Device {
        Device {
            handle: None,
            path: "mock-path".into(),
        }
    }

    #[test]
    fn every_operation_on_a_closed_handle_fails_with_closed() {
        let mut dev = closed_device();
        assert!(matches!(
            dev.write_report(&Report::new()),
            Err(DeviceError::Closed)
        ));
        assert!(matches!(dev.read_report(), Err(DeviceError::Closed)));
        assert!(matches!(
            dev.read_report_timeout(10),
            Err(DeviceError::Closed)
        ));
        assert!(matches!(
            dev.send(&Command::GetSerial),
            Err(DeviceError::Closed)
        ));
    }
}

#[cfg(test)]
pub mod mock {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// In-memory sink recording every dispatched command.
    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: Vec<Command>,
        pub fail_next: bool,
    }

    impl CommandSink for RecordingSink {
        fn send(&mut self, command: &Command) -> Result<(), DeviceError> {
            if self.fail_next {
                self.fail_next = false;
                return Err(DeviceError::Closed);
            }
            self.sent.push(command.clone());
            Ok(())
        }
    }

    impl CommandSink for Arc<Mutex<RecordingSink>> {
        fn send(&mut self, command: &Command) -> Result<(), DeviceError> {
            self.lock().unwrap().send(command)
        }
    }
}
