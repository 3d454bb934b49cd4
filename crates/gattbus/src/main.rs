mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use gattbus_gateway::DEFAULT_GATEWAY_URL;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "gattbus", version, about = "BLE gateway and I2C expander CLI")]
struct Cli {
    /// Base URL of the BLE gateway.
    #[arg(
        long,
        env = "GATTBUS_GATEWAY_URL",
        default_value = DEFAULT_GATEWAY_URL,
        global = true
    )]
    gateway_url: String,

    /// Adapter on the gateway that reaches the peripherals.
    #[arg(long, env = "GATTBUS_ADAPTER", default_value = "hci0", global = true)]
    adapter: String,

    /// Per-command GATT timeout (e.g. 5s, 500ms).
    #[arg(
        long,
        env = "GATTBUS_TIMEOUT",
        value_name = "DURATION",
        default_value = "5s",
        global = true
    )]
    timeout: String,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::parse_duration(&cli.timeout).and_then(|timeout| {
        let ctx = Context {
            gateway_url: cli.gateway_url,
            adapter: cli.adapter,
            timeout,
            format,
        };
        cmd::run(cli.command, &ctx)
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
