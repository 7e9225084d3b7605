use clap::{Args, Subcommand};
use pickwire_session::{ActionRequest, DEFAULT_BRAND};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod actions;
pub mod request;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one catalog request and print the decoded response.
    Request(RequestArgs),
    /// List the action catalog.
    Actions(ActionsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Request(args) => request::run(args, connection, format),
        Command::Actions(args) => actions::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Controller connection settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Controller address (host, host:port or ip:port). Default port 11003.
    #[arg(
        long,
        env = "PICKWIRE_ADDR",
        default_value = "127.0.0.1:11003",
        global = true
    )]
    pub addr: String,

    /// Connect and I/O timeout (e.g. 5s, 500ms).
    #[arg(long, env = "PICKWIRE_TIMEOUT", default_value = "5s", global = true)]
    pub timeout: String,

    /// Decode header, sub-header and info integers from their low 3 bytes only.
    #[arg(long, env = "PICKWIRE_LEGACY_INT24", global = true)]
    pub legacy_int24: bool,

    /// Brand identification sent after connect.
    #[arg(long, env = "PICKWIRE_BRAND", default_value = DEFAULT_BRAND, global = true)]
    pub brand: String,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Action name (see `pickwire actions`) or numeric id.
    pub action: ActionRequest,
    /// Integer argument, repeatable (vision system id, solution id, ...).
    #[arg(long = "int", value_name = "N", allow_negative_numbers = true)]
    pub ints: Vec<i32>,
    /// Comma-separated float vector, repeatable (pose or joint values).
    #[arg(long = "floats", value_name = "A,B,...", allow_hyphen_values = true)]
    pub floats: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct ActionsArgs {
    /// Only list one family (binpicking, locator, calibration, solution).
    #[arg(long)]
    pub family: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
