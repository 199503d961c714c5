use std::str::FromStr;

use thiserror::Error;

use crate::command::{Axis, Command, Direction, RangeError, StopTarget, SubPulse, byte, duration_ms};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("empty line")]
    Empty,
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),
    #[error("missing argument: {0}")]
    MissingArg(&'static str),
    #[error("invalid integer for {0}: {1}")]
    BadInt(&'static str, String),
    #[error("invalid {0}: {1}")]
    BadEnum(&'static str, String),
    #[error("sub-pulse arguments come in magnitude/duration pairs")]
    DanglingSubPulse,
    #[error("too many arguments for {opcode}: expected at most {max}, got {got}")]
    ExtraArgs { opcode: char, max: usize, got: usize },
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Parse one whitespace-delimited text command into a [`Command`].
///
/// The first token selects the variant (`V`, `P`, `S`, `H`, `L`); the rest
/// are positional, validated against a fixed per-opcode schema before the
/// variant is built. A trailing newline is tolerated.
pub fn parse_line(line: &str) -> Result<Command, DispatchError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((op, args)) = tokens.split_first() else {
        return Err(DispatchError::Empty);
    };
    match op.to_ascii_uppercase().as_str() {
        "V" => vector(args),
        "P" => periodic(args),
        "S" => stop(args),
        "H" => heat(args),
        "L" => lube(args),
        other => Err(DispatchError::UnknownOpcode(other.to_string())),
    }
}

/* ---------- per-opcode schemas ---------- */

// V <magnitude> <axis> <direction> <duration> [inMag inDur [outMag outDur]]
fn vector(args: &[&str]) -> Result<Command, DispatchError> {
    let magnitude = byte_arg(args, 0, "magnitude")?;
    let axis: Axis = enum_arg(args, 1, "axis")?;
    let direction: Direction = enum_arg(args, 2, "direction")?;
    let duration = duration_arg(args, 3, "duration")?;
    let (inbound, outbound) = sub_pulses('V', args, 4)?;
    Ok(Command::VectorMovement {
        axis,
        direction,
        magnitude,
        duration_ms: duration,
        inbound,
        outbound,
    })
}

// P <period> <magnitude> <axis> <direction> <duration> [inMag inDur [outMag outDur]]
fn periodic(args: &[&str]) -> Result<Command, DispatchError> {
    let period = byte_arg(args, 0, "period")?;
    let magnitude = byte_arg(args, 1, "magnitude")?;
    let axis: Axis = enum_arg(args, 2, "axis")?;
    let direction: Direction = enum_arg(args, 3, "direction")?;
    let duration = duration_arg(args, 4, "duration")?;
    let (inbound, outbound) = sub_pulses('P', args, 5)?;
    Ok(Command::PeriodicMovement {
        axis,
        direction,
        period,
        magnitude,
        duration_ms: duration,
        inbound,
        outbound,
    })
}

// S <target>
fn stop(args: &[&str]) -> Result<Command, DispatchError> {
    let target: StopTarget = enum_arg(args, 0, "stop target")?;
    max_arity('S', args, 1)?;
    Ok(Command::StopMovement { target })
}

// H <magnitude>
fn heat(args: &[&str]) -> Result<Command, DispatchError> {
    let magnitude = byte_arg(args, 0, "magnitude")?;
    max_arity('H', args, 1)?;
    Ok(Command::SetHeat { magnitude })
}

// L <magnitude> <duration>
fn lube(args: &[&str]) -> Result<Command, DispatchError> {
    let magnitude = byte_arg(args, 0, "magnitude")?;
    let duration = duration_arg(args, 1, "duration")?;
    max_arity('L', args, 2)?;
    Ok(Command::FireLube {
        magnitude,
        duration_ms: duration,
    })
}

/* ---------- argument helpers ---------- */

fn req<'a>(args: &[&'a str], idx: usize, field: &'static str) -> Result<&'a str, DispatchError> {
    args.get(idx).copied().ok_or(DispatchError::MissingArg(field))
}

fn int_arg(args: &[&str], idx: usize, field: &'static str) -> Result<u64, DispatchError> {
    let raw = req(args, idx, field)?;
    raw.parse::<u64>()
        .map_err(|_| DispatchError::BadInt(field, raw.to_string()))
}

fn byte_arg(args: &[&str], idx: usize, field: &'static str) -> Result<u8, DispatchError> {
    Ok(byte(field, int_arg(args, idx, field)?)?)
}

fn duration_arg(args: &[&str], idx: usize, field: &'static str) -> Result<u16, DispatchError> {
    Ok(duration_ms(field, int_arg(args, idx, field)?)?)
}

fn enum_arg<T: FromStr>(args: &[&str], idx: usize, field: &'static str) -> Result<T, DispatchError> {
    let raw = req(args, idx, field)?;
    raw.parse::<T>()
        .map_err(|_| DispatchError::BadEnum(field, raw.to_string()))
}

fn max_arity(opcode: char, args: &[&str], max: usize) -> Result<(), DispatchError> {
    if args.len() > max {
        return Err(DispatchError::ExtraArgs {
            opcode,
            max,
            got: args.len(),
        });
    }
    Ok(())
}

/// Optional inbound/outbound sub-pulses after the fixed arguments. Each
/// phase needs both a magnitude and a duration token.
fn sub_pulses(
    opcode: char,
    args: &[&str],
    start: usize,
) -> Result<(Option<SubPulse>, Option<SubPulse>), DispatchError> {
    let extra = args.len().saturating_sub(start);
    match extra {
        0 => Ok((None, None)),
        2 => Ok((Some(sub_pulse(args, start)?), None)),
        4 => Ok((
            Some(sub_pulse(args, start)?),
            Some(sub_pulse(args, start + 2)?),
        )),
        1 | 3 => Err(DispatchError::DanglingSubPulse),
        _ => Err(DispatchError::ExtraArgs {
            opcode,
            max: start + 4,
            got: args.len(),
        }),
    }
}

fn sub_pulse(args: &[&str], idx: usize) -> Result<SubPulse, DispatchError> {
    let magnitude = int_arg(args, idx, "sub-pulse magnitude")?;
    let duration = int_arg(args, idx + 1, "sub-pulse duration")?;
    Ok(SubPulse::new(magnitude, duration)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_all() {
        let cmd = parse_line("S A").unwrap();
        assert_eq!(
            cmd,
            Command::StopMovement {
                target: StopTarget::All
            }
        );
    }

    #[test]
    fn heat() {
        let cmd = parse_line("H 200\n").unwrap();
        assert_eq!(cmd, Command::SetHeat { magnitude: 200 });
    }

    #[test]
    fn lube() {
        let cmd = parse_line("L 255 1000").unwrap();
        assert_eq!(
            cmd,
            Command::FireLube {
                magnitude: 255,
                duration_ms: 1000
            }
        );
    }

    #[test]
    fn vector_minimal() {
        let cmd = parse_line("V 255 U OUT 1000").unwrap();
        assert_eq!(
            cmd,
            Command::VectorMovement {
                axis: Axis::Up,
                direction: Direction::Out,
                magnitude: 255,
                duration_ms: 1000,
                inbound: None,
                outbound: None,
            }
        );
    }

    #[test]
    fn vector_with_both_sub_pulses() {
        let cmd = parse_line("V 100 T IN 500 10 20 30 40").unwrap();
        match cmd {
            Command::VectorMovement {
                inbound, outbound, ..
            } => {
                assert_eq!(
                    inbound,
                    Some(SubPulse {
                        magnitude: 10,
                        duration_ms: 20
                    })
                );
                assert_eq!(
                    outbound,
                    Some(SubPulse {
                        magnitude: 30,
                        duration_ms: 40
                    })
                );
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn periodic_with_inbound_only() {
        let cmd = parse_line("P 5 80 B OUT 2000 15 300").unwrap();
        match cmd {
            Command::PeriodicMovement {
                period,
                magnitude,
                inbound,
                outbound,
                ..
            } => {
                assert_eq!(period, 5);
                assert_eq!(magnitude, 80);
                assert_eq!(
                    inbound,
                    Some(SubPulse {
                        magnitude: 15,
                        duration_ms: 300
                    })
                );
                assert_eq!(outbound, None);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn opcode_and_symbols_are_case_insensitive() {
        let cmd = parse_line("v 10 t in 500").unwrap();
        assert!(matches!(
            cmd,
            Command::VectorMovement {
                axis: Axis::Tip,
                direction: Direction::In,
                ..
            }
        ));
    }

    #[test]
    fn whitespace_only_lines_are_empty_not_a_panic() {
        for line in ["", "\r\n", "\t", " \t ", "\n\t\n"] {
            assert!(
                matches!(parse_line(line), Err(DispatchError::Empty)),
                "line {line:?}"
            );
        }
    }

    #[test]
    fn error_cases() {
        assert!(matches!(parse_line(""), Err(DispatchError::Empty)));
        assert!(matches!(parse_line("\r\n"), Err(DispatchError::Empty)));
        assert!(matches!(
            parse_line("Z 1 2"),
            Err(DispatchError::UnknownOpcode(_))
        ));
        assert!(matches!(
            parse_line("H"),
            Err(DispatchError::MissingArg("magnitude"))
        ));
        assert!(matches!(
            parse_line("L 100 soon"),
            Err(DispatchError::BadInt("duration", _))
        ));
        assert!(matches!(
            parse_line("V 100 Q OUT 500"),
            Err(DispatchError::BadEnum("axis", _))
        ));
        assert!(matches!(
            parse_line("V 100 U SIDEWAYS 500"),
            Err(DispatchError::BadEnum("direction", _))
        ));
        assert!(matches!(
            parse_line("S A A"),
            Err(DispatchError::ExtraArgs { opcode: 'S', .. })
        ));
        assert!(matches!(
            parse_line("V 100 U OUT 500 10"),
            Err(DispatchError::DanglingSubPulse)
        ));
    }

    #[test]
    fn parsed_lines_encode_to_the_documented_wire_bytes() {
        let cases: [(&str, &[u8]); 3] = [
            ("S A", &[0x01, 0x60]),
            ("H 200", &[0x05, 0xc8]),
            ("L 255 1000", &[0x06, 0xff, 0xe8, 0x03]),
        ];
        for (line, prefix) in cases {
            let report = crate::report::encode(&parse_line(line).unwrap());
            let bytes = report.as_bytes();
            assert_eq!(&bytes[..prefix.len()], prefix, "line {line:?}");
            assert!(
                bytes[prefix.len()..].iter().all(|&b| b == 0),
                "line {line:?} left trailing bytes"
            );
        }
    }

    #[test]
    fn range_violations_surface_as_dispatch_errors() {
        assert!(matches!(
            parse_line("H 300"),
            Err(DispatchError::Range(RangeError::Byte { value: 300, .. }))
        ));
        assert!(matches!(
            parse_line("L 100 70000"),
            Err(DispatchError::Range(RangeError::Duration { value: 70_000, .. }))
        ));
        // 0xffff is the last representable duration
        assert!(parse_line("L 100 65535").is_ok());
    }
}
