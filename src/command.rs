use std::str::FromStr;

use thiserror::Error;

/// A field value does not fit its wire slot. Raised at construction time so
/// the encoder never sees an out-of-range value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    #[error("{field} {value} does not fit in one byte")]
    Byte { field: &'static str, value: u64 },
    #[error("{field} {value} exceeds the 16-bit millisecond limit")]
    Duration { field: &'static str, value: u64 },
}

pub fn byte(field: &'static str, value: u64) -> Result<u8, RangeError> {
    u8::try_from(value).map_err(|_| RangeError::Byte { field, value })
}

pub fn duration_ms(field: &'static str, value: u64) -> Result<u16, RangeError> {
    u16::try_from(value).map_err(|_| RangeError::Duration { field, value })
}

/// Motion channel selectable by the vector/periodic commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Tip,
    Base,
    Up,
    Side,
}

impl Axis {
    pub fn code(self) -> u8 {
        match self {
            Axis::Tip => 0x00,
            Axis::Base => 0x10,
            Axis::Up => 0x20,
            Axis::Side => 0x30,
        }
    }
}

impl FromStr for Axis {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "T" => Ok(Axis::Tip),
            "B" => Ok(Axis::Base),
            "U" => Ok(Axis::Up),
            "S" => Ok(Axis::Side),
            _ => Err(()),
        }
    }
}

/// Target of a stop command: the four motion axes plus heat, lube, or
/// everything at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopTarget {
    Tip,
    Base,
    Up,
    Side,
    Heat,
    Lube,
    All,
}

impl StopTarget {
    pub fn code(self) -> u8 {
        match self {
            StopTarget::Tip => 0x00,
            StopTarget::Base => 0x10,
            StopTarget::Up => 0x20,
            StopTarget::Side => 0x30,
            StopTarget::Heat => 0x40,
            StopTarget::Lube => 0x50,
            StopTarget::All => 0x60,
        }
    }
}

impl FromStr for StopTarget {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "T" => Ok(StopTarget::Tip),
            "B" => Ok(StopTarget::Base),
            "U" => Ok(StopTarget::Up),
            "S" => Ok(StopTarget::Side),
            "H" => Ok(StopTarget::Heat),
            "L" => Ok(StopTarget::Lube),
            "A" => Ok(StopTarget::All),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl FromStr for Direction {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Ok(Direction::In),
            "OUT" => Ok(Direction::Out),
            _ => Err(()),
        }
    }
}

/// Axis byte as it appears on the wire: base axis code, with bit 0x80 set
/// for outward motion.
pub fn axis_byte(axis: Axis, direction: Direction) -> u8 {
    match direction {
        Direction::In => axis.code(),
        Direction::Out => axis.code() | 0x80,
    }
}

/// Secondary magnitude/duration pair for the inbound or outbound phase of a
/// movement. Absent sub-pulses encode as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubPulse {
    pub magnitude: u8,
    pub duration_ms: u16,
}

impl SubPulse {
    pub fn new(magnitude: u64, duration: u64) -> Result<Self, RangeError> {
        Ok(Self {
            magnitude: byte("sub-pulse magnitude", magnitude)?,
            duration_ms: duration_ms("sub-pulse duration", duration)?,
        })
    }
}

/// One device command. Immutable once constructed; field ranges are enforced
/// by the types, so encoding can never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetSerial,
    GetFirmwareVersion,
    SetHeat {
        magnitude: u8,
    },
    FireLube {
        magnitude: u8,
        duration_ms: u16,
    },
    StopMovement {
        target: StopTarget,
    },
    VectorMovement {
        axis: Axis,
        direction: Direction,
        magnitude: u8,
        duration_ms: u16,
        inbound: Option<SubPulse>,
        outbound: Option<SubPulse>,
    },
    PeriodicMovement {
        axis: Axis,
        direction: Direction,
        period: u8,
        magnitude: u8,
        duration_ms: u16,
        inbound: Option<SubPulse>,
        outbound: Option<SubPulse>,
    },
}
