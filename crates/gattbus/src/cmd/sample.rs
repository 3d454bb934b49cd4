use gattbus_services::{Bme280Calibrator, SensorMetrics};

use crate::cmd::{Context, SampleArgs};
use crate::exit::{service_error, CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

pub fn run(args: SampleArgs, ctx: &Context) -> CliResult<i32> {
    let calibrator = Bme280Calibrator::new(ctx.gateway(ctx.timeout * 2), &ctx.adapter)
        .with_command_timeout(ctx.timeout);
    let readings = calibrator
        .read_environment(&args.peripherals)
        .map_err(|err| service_error("sample failed", err))?;

    if args.prometheus {
        let metrics =
            SensorMetrics::new().map_err(|err| service_error("metrics setup failed", err))?;
        for r in &readings {
            metrics.record_environment(&r.peripheral, &args.scope, &r.reading);
        }
        let text = metrics
            .render()
            .map_err(|err| service_error("metrics render failed", err))?;
        print!("{text}");
        return Ok(SUCCESS);
    }

    match ctx.format {
        OutputFormat::Json => print_json(&readings),
        OutputFormat::Table => print_table(
            &["PERIPHERAL", "HUMIDITY %", "TEMPERATURE C", "PRESSURE PA"],
            readings.iter().map(|r| {
                vec![
                    r.peripheral.clone(),
                    format!("{:.2}", r.reading.humidity),
                    format!("{:.2}", r.reading.temperature),
                    format!("{:.1}", r.reading.pressure),
                ]
            }),
        ),
        OutputFormat::Pretty | OutputFormat::Raw => {
            for r in &readings {
                println!(
                    "{}: {:.2} %rH, {:.2} C, {:.1} Pa",
                    r.peripheral, r.reading.humidity, r.reading.temperature, r.reading.pressure
                );
            }
        }
    }
    Ok(SUCCESS)
}
