use std::net::IpAddr;

use clap::{Args, Parser, Subcommand};

use crate::relay::DEFAULT_PORT;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "realtouch",
    about = "RealTouch HID controller (direct commands & network relay)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// List attached device paths
    List(HidOpts),
    /// Send one text command, e.g. `send V 255 U OUT 1000`
    Send(SendOpts),
    /// Run the bring-up sequence plus one demonstration stroke
    Demo(HidOpts),
    /// Relay newline-delimited text commands from a TCP client
    Serve(ServeOpts),
}

#[derive(Args, Debug, Clone)]
pub struct HidOpts {
    /// Vendor id (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0x1f54", value_parser = parse_id)]
    pub vid: u16,
    /// Product id (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0x0001", value_parser = parse_id)]
    pub pid: u16,
}

#[derive(Args, Debug, Clone)]
pub struct SendOpts {
    #[command(flatten)]
    pub hid: HidOpts,
    /// Command tokens: opcode letter followed by its arguments
    #[arg(required = true, trailing_var_arg = true)]
    pub line: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeOpts {
    #[command(flatten)]
    pub hid: HidOpts,
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: IpAddr,
    /// TCP port for the relay
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Drop a client that sends nothing for this long
    #[arg(long, default_value_t = 30_000)]
    pub idle_timeout_ms: u64,
}

fn parse_id(s: &str) -> Result<u16, String> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => t.parse(),
    };
    parsed.map_err(|_| format!("invalid device id: {s}"))
}
