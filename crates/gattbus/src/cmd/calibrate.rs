use gattbus_services::{Bme280Calibrator, CalibrationReport, CalibrationTarget};

use crate::cmd::{CalibrateArgs, Context};
use crate::exit::{service_error, CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

pub fn run(args: CalibrateArgs, ctx: &Context) -> CliResult<i32> {
    let defaults = CalibrationTarget::default();
    let target = CalibrationTarget {
        humidity: args.humidity.unwrap_or(defaults.humidity),
        temperature: args.temperature.unwrap_or(defaults.temperature),
        pressure: args.pressure.unwrap_or(defaults.pressure),
    };

    let calibrator = Bme280Calibrator::new(ctx.gateway(ctx.timeout * 2), &ctx.adapter)
        .with_command_timeout(ctx.timeout);
    let reports = calibrator
        .calibrate(&args.peripherals, &target)
        .map_err(|err| service_error("calibration failed", err))?;

    match ctx.format {
        OutputFormat::Json => print_json(&reports),
        OutputFormat::Table => print_table(
            &["PERIPHERAL", "QUANTITY", "CURRENT", "OFFSET", "NEXT OFFSET"],
            reports.iter().flat_map(report_rows),
        ),
        OutputFormat::Pretty | OutputFormat::Raw => {
            for r in &reports {
                println!(
                    "{}: humidity offset {:.2} -> {:.2}, temperature offset {:.2} -> {:.2}, \
                     pressure offset {:.1} -> {:.1}",
                    r.peripheral,
                    r.current_offsets.humidity,
                    r.next_offsets.humidity,
                    r.current_offsets.temperature,
                    r.next_offsets.temperature,
                    r.current_offsets.pressure,
                    r.next_offsets.pressure,
                );
            }
        }
    }
    Ok(SUCCESS)
}

fn report_rows(r: &CalibrationReport) -> [Vec<String>; 3] {
    let (current, offsets, next) = (r.current, r.current_offsets, r.next_offsets);
    [
        ("humidity", current.humidity, offsets.humidity, next.humidity),
        ("temperature", current.temperature, offsets.temperature, next.temperature),
        ("pressure", current.pressure, offsets.pressure, next.pressure),
    ]
    .map(|(quantity, current, offset, next)| {
        vec![
            r.peripheral.clone(),
            quantity.to_string(),
            format!("{current:.2}"),
            format!("{offset:.2}"),
            format!("{next:.2}"),
        ]
    })
}
