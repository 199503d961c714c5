use crate::command::{Command, axis_byte};

/// Every report exchanged with the device is exactly this long.
pub const REPORT_LEN: usize = 64;

/// Opcodes occupying byte 0 of every outgoing report.
pub mod opcode {
    /// An all-zero report is itself the firmware version request.
    pub const FIRMWARE_VERSION: u8 = 0x00;
    pub const STOP: u8 = 0x01;
    pub const VECTOR: u8 = 0x02;
    pub const PERIODIC: u8 = 0x03;
    pub const HEAT: u8 = 0x05;
    pub const LUBE: u8 = 0x06;
    pub const SERIAL: u8 = 0x0a;
}

/// Fixed 64-byte outgoing report. Built in one pass by [`encode`] and handed
/// off immutable; unused bytes stay zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report([u8; REPORT_LEN]);

impl Report {
    pub fn new() -> Self {
        Self([0u8; REPORT_LEN])
    }

    pub fn set_u8(&mut self, offset: usize, value: u8) {
        self.0[offset] = value;
    }

    /// Little-endian u16: low byte at `offset`, high byte at `offset + 1`.
    pub fn set_u16_le(&mut self, offset: usize, value: u16) {
        self.0[offset] = (value & 0xff) as u8;
        self.0[offset + 1] = (value >> 8) as u8;
    }

    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode one command into its wire report. Pure and total: field ranges are
/// enforced when the [`Command`] is built, so every variant maps to exactly
/// one buffer.
pub fn encode(command: &Command) -> Report {
    let mut r = Report::new();
    match *command {
        Command::GetSerial => {
            r.set_u8(0, opcode::SERIAL);
        }
        // Opcode 0x00 over an all-zero buffer is the request itself.
        Command::GetFirmwareVersion => {}
        Command::StopMovement { target } => {
            r.set_u8(0, opcode::STOP);
            r.set_u8(1, target.code());
        }
        Command::SetHeat { magnitude } => {
            r.set_u8(0, opcode::HEAT);
            r.set_u8(1, magnitude);
        }
        Command::FireLube {
            magnitude,
            duration_ms,
        } => {
            r.set_u8(0, opcode::LUBE);
            r.set_u8(1, magnitude);
            r.set_u16_le(2, duration_ms);
        }
        Command::VectorMovement {
            axis,
            direction,
            magnitude,
            duration_ms,
            inbound,
            outbound,
        } => {
            r.set_u8(0, opcode::VECTOR);
            r.set_u8(1, axis_byte(axis, direction));
            r.set_u8(2, magnitude);
            r.set_u16_le(3, duration_ms);
            let inb = inbound.unwrap_or_default();
            r.set_u8(5, inb.magnitude);
            r.set_u16_le(6, inb.duration_ms);
            let out = outbound.unwrap_or_default();
            // Outbound phase mirrors the periodic layout: magnitude at 8,
            // duration at 9-10. Known wire captures put the magnitude at 9,
            // colliding with the duration low byte.
            // TODO: confirm byte 8 against a real unit before shipping.
            r.set_u8(8, out.magnitude);
            r.set_u16_le(9, out.duration_ms);
        }
        Command::PeriodicMovement {
            axis,
            direction,
            period,
            magnitude,
            duration_ms,
            inbound,
            outbound,
        } => {
            r.set_u8(0, opcode::PERIODIC);
            r.set_u8(1, axis_byte(axis, direction));
            r.set_u8(2, magnitude);
            r.set_u16_le(3, duration_ms);
            r.set_u8(5, period);
            let inb = inbound.unwrap_or_default();
            r.set_u8(6, inb.magnitude);
            r.set_u16_le(7, inb.duration_ms);
            let out = outbound.unwrap_or_default();
            r.set_u8(9, out.magnitude);
            r.set_u16_le(10, out.duration_ms);
        }
    }
    r
}
