use anyhow::Result;
use clap::Parser;

mod cli;
mod command;
mod device;
mod dispatch;
mod relay;
mod report;
mod session;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    match args.cmd {
        cli::Cmd::List(opts) => session::list(&opts),
        cli::Cmd::Send(opts) => session::send(&opts),
        cli::Cmd::Demo(opts) => session::demo(&opts),
        cli::Cmd::Serve(opts) => session::serve(&opts),
    }
}
