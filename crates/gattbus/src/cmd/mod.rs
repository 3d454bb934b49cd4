use std::time::Duration;

use clap::{Args, Subcommand};
use gattbus_expander::{Expander, ExpanderConfig};
use gattbus_gateway::{GatewayConfig, HttpGateway};
use gattbus_services::SwitchBotCommand;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod adapters;
pub mod bus;
pub mod calibrate;
pub mod describe;
pub mod sample;
pub mod switchbot;
pub mod timeouts;
pub mod version;

const HTTP_MARGIN: Duration = Duration::from_secs(5);

/// Settings shared by every subcommand.
#[derive(Debug)]
pub struct Context {
    pub gateway_url: String,
    pub adapter: String,
    /// Per-command GATT timeout.
    pub timeout: Duration,
    pub format: OutputFormat,
}

impl Context {
    /// An HTTP client whose timeout outlives `longest_exchange` on the gateway side.
    pub fn gateway(&self, longest_exchange: Duration) -> HttpGateway {
        let timeout = GatewayConfig::default()
            .timeout
            .max(longest_exchange + HTTP_MARGIN);
        HttpGateway::with_config(GatewayConfig {
            base_url: self.gateway_url.clone(),
            timeout,
        })
    }

    pub fn expander(&self, target: &PeripheralArgs) -> Expander<HttpGateway> {
        // A bundle round trip is a write and a result read.
        let gateway = self.gateway(self.timeout * 2);
        Expander::with_config(
            gateway,
            &self.adapter,
            &target.peripheral,
            ExpanderConfig {
                timeout: self.timeout,
                power_wait: target.power_wait,
            },
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the gateway's BLE adapters.
    Adapters(AdaptersArgs),
    /// Describe discovered peripherals and their GATT services.
    Describe(DescribeArgs),
    /// Scan the expander's I2C bus for devices.
    Scan(ScanArgs),
    /// Read bytes from an I2C device.
    Read(ReadArgs),
    /// Write bytes to an I2C device.
    Write(WriteArgs),
    /// Write bytes then read the reply in one bus transaction.
    WriteRead(WriteReadArgs),
    /// Set notification timeouts on every sensor-hub service.
    Timeouts(TimeoutsArgs),
    /// Calibrate BME280 offsets against reference values.
    Calibrate(CalibrateArgs),
    /// Sample BME280 humidity, temperature and pressure.
    Sample(SampleArgs),
    /// Send a command to a SwitchBot device.
    Switchbot(SwitchbotArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Adapters(args) => adapters::run(args, ctx),
        Command::Describe(args) => describe::run(args, ctx),
        Command::Scan(args) => bus::scan(args, ctx),
        Command::Read(args) => bus::read(args, ctx),
        Command::Write(args) => bus::write(args, ctx),
        Command::WriteRead(args) => bus::write_read(args, ctx),
        Command::Timeouts(args) => timeouts::run(args, ctx),
        Command::Calibrate(args) => calibrate::run(args, ctx),
        Command::Sample(args) => sample::run(args, ctx),
        Command::Switchbot(args) => switchbot::run(args, ctx),
        Command::Version(args) => version::run(args, ctx),
    }
}

#[derive(Args, Debug, Default)]
pub struct AdaptersArgs {}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Only show this peripheral.
    #[arg(long)]
    pub peripheral: Option<String>,
}

#[derive(Args, Debug)]
pub struct PeripheralArgs {
    /// Expander peripheral address (e.g. FA:6F:EC:EE:4B:36).
    pub peripheral: String,
    /// Power settle time sent with powered write, transfer and scan frames.
    #[arg(long, default_value_t = 1)]
    pub power_wait: u8,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub target: PeripheralArgs,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub target: PeripheralArgs,
    /// 7-bit device address (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_address)]
    pub address: u8,
    /// Number of bytes to read.
    #[arg(long)]
    pub size: usize,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub target: PeripheralArgs,
    /// 7-bit device address (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_address)]
    pub address: u8,
    /// Bytes to write as hex (e.g. "21b1" or "21 b1").
    #[arg(long, value_parser = parse_hex)]
    pub data: HexData,
}

#[derive(Args, Debug)]
pub struct WriteReadArgs {
    #[command(flatten)]
    pub target: PeripheralArgs,
    /// 7-bit device address (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_address)]
    pub address: u8,
    /// Bytes to write as hex.
    #[arg(long, value_parser = parse_hex)]
    pub data: HexData,
    /// Number of bytes to read back.
    #[arg(long)]
    pub size: usize,
}

#[derive(Args, Debug)]
pub struct TimeoutsArgs {
    /// Sensor-hub peripheral addresses.
    #[arg(required = true)]
    pub peripherals: Vec<String>,
    /// Notification timeout to write, in milliseconds.
    #[arg(long)]
    pub notification_timeout_ms: u32,
}

#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Sensor-hub peripheral addresses.
    #[arg(required = true)]
    pub peripherals: Vec<String>,
    /// Reference relative humidity, percent (default 72.0).
    #[arg(long)]
    pub humidity: Option<f64>,
    /// Reference pressure, pascals (default 102400).
    #[arg(long)]
    pub pressure: Option<f64>,
    /// Reference temperature, degrees Celsius (default 21.9).
    #[arg(long)]
    pub temperature: Option<f64>,
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Sensor-hub peripheral addresses.
    #[arg(required = true)]
    pub peripherals: Vec<String>,
    /// Print Prometheus text exposition instead of the normal output.
    #[arg(long)]
    pub prometheus: bool,
    /// Value of the `scope` metric label.
    #[arg(long, default_value = "bme280")]
    pub scope: String,
}

#[derive(Args, Debug)]
pub struct SwitchbotArgs {
    /// SwitchBot peripheral address.
    pub peripheral: String,
    /// press, on, off, open, close or pause.
    #[arg(long, default_value = "press")]
    pub command: SwitchBotCommand,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Raw bytes parsed from a hex argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexData(pub Vec<u8>);

pub fn parse_address(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let value = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    }
    .map_err(|_| format!("invalid address: {input}"))?;

    if value > 0x7F {
        return Err(format!("address {value:#04x} is not a 7-bit address"));
    }
    Ok(value)
}

pub fn parse_hex(input: &str) -> Result<HexData, String> {
    let input = input.trim();
    let input = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits)
        .map(HexData)
        .map_err(|err| format!("invalid hex data: {err}"))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
