use gattbus_expander::{BusSession, Expander, ExpanderError};
use gattbus_gateway::HttpGateway;
use serde::Serialize;

use crate::cmd::{Context, ReadArgs, ScanArgs, WriteArgs, WriteReadArgs};
use crate::exit::{expander_error, CliResult, SUCCESS};
use crate::output::{hex_address, hex_bytes, print_json, print_raw, print_table, OutputFormat};

#[derive(Serialize)]
struct ScanOutput<'a> {
    peripheral: &'a str,
    addresses: Vec<u8>,
}

#[derive(Serialize)]
struct DataOutput<'a> {
    peripheral: &'a str,
    address: u8,
    /// Bytes read, lowercase hex.
    data: String,
    len: usize,
}

#[derive(Serialize)]
struct WriteOutput<'a> {
    peripheral: &'a str,
    address: u8,
    written: usize,
}

/// Run `op` inside a bus session and release the device lock afterwards.
fn with_session<T>(
    bus: &Expander<HttpGateway>,
    context: &str,
    op: impl FnOnce(&BusSession<'_, HttpGateway>) -> Result<T, ExpanderError>,
) -> CliResult<T> {
    let session = bus.session();
    let value = op(&session).map_err(|err| expander_error(context, err))?;
    session
        .release()
        .map_err(|err| expander_error("release lock failed", err))?;
    Ok(value)
}

pub fn scan(args: ScanArgs, ctx: &Context) -> CliResult<i32> {
    let bus = ctx.expander(&args.target);
    let addresses = with_session(&bus, "scan failed", |bus| bus.scan_i2c())?;

    match ctx.format {
        OutputFormat::Json => print_json(&ScanOutput {
            peripheral: bus.peripheral_address(),
            addresses,
        }),
        OutputFormat::Table => print_table(
            &["ADDRESS"],
            addresses.iter().map(|&a| vec![hex_address(a)]),
        ),
        OutputFormat::Pretty => {
            let list: Vec<String> = addresses.iter().map(|&a| hex_address(a)).collect();
            println!(
                "{} device(s) on {}: {}",
                addresses.len(),
                bus.peripheral_address(),
                list.join(", ")
            );
        }
        OutputFormat::Raw => print_raw(&addresses),
    }
    Ok(SUCCESS)
}

pub fn read(args: ReadArgs, ctx: &Context) -> CliResult<i32> {
    let bus = ctx.expander(&args.target);
    let data = with_session(&bus, "read failed", |bus| {
        bus.read(args.address, args.size)
    })?;
    print_data(&bus, args.address, &data, ctx.format);
    Ok(SUCCESS)
}

pub fn write(args: WriteArgs, ctx: &Context) -> CliResult<i32> {
    let bus = ctx.expander(&args.target);
    let payload = args.data.0;
    with_session(&bus, "write failed", |bus| bus.write(args.address, &payload))?;

    match ctx.format {
        OutputFormat::Json => print_json(&WriteOutput {
            peripheral: bus.peripheral_address(),
            address: args.address,
            written: payload.len(),
        }),
        OutputFormat::Table => print_table(
            &["ADDRESS", "WRITTEN"],
            [vec![hex_address(args.address), payload.len().to_string()]],
        ),
        OutputFormat::Pretty => println!(
            "wrote {} byte(s) to {}",
            payload.len(),
            hex_address(args.address)
        ),
        OutputFormat::Raw => {}
    }
    Ok(SUCCESS)
}

pub fn write_read(args: WriteReadArgs, ctx: &Context) -> CliResult<i32> {
    let bus = ctx.expander(&args.target);
    let payload = args.data.0;
    let data = with_session(&bus, "write-read failed", |bus| {
        bus.write_read(args.address, &payload, args.size)
    })?;
    print_data(&bus, args.address, &data, ctx.format);
    Ok(SUCCESS)
}

fn print_data(bus: &Expander<HttpGateway>, address: u8, data: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&DataOutput {
            peripheral: bus.peripheral_address(),
            address,
            data: hex::encode(data),
            len: data.len(),
        }),
        OutputFormat::Table => print_table(
            &["ADDRESS", "LEN", "DATA"],
            [vec![
                hex_address(address),
                data.len().to_string(),
                hex_bytes(data),
            ]],
        ),
        OutputFormat::Pretty => println!("{}: {}", hex_address(address), hex_bytes(data)),
        OutputFormat::Raw => print_raw(data),
    }
}
