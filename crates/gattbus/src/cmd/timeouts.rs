use gattbus_services::TimeoutSetter;

use crate::cmd::{Context, TimeoutsArgs};
use crate::exit::{service_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

pub fn run(args: TimeoutsArgs, ctx: &Context) -> CliResult<i32> {
    // Each peripheral batch writes every service; the gateway may run them in turn.
    let setter = TimeoutSetter::new(ctx.gateway(ctx.timeout * 5), &ctx.adapter)
        .with_command_timeout(ctx.timeout);
    let outcomes = setter
        .set_all_timeouts(&args.peripherals, args.notification_timeout_ms)
        .map_err(|err| service_error("set timeouts failed", err))?;

    match ctx.format {
        OutputFormat::Json => print_json(&outcomes),
        OutputFormat::Table => print_table(
            &["PERIPHERAL", "SERVICE", "RESULT"],
            outcomes.iter().map(|o| {
                vec![
                    o.peripheral.clone(),
                    o.service.to_string(),
                    o.error.clone().unwrap_or_else(|| "ok".to_string()),
                ]
            }),
        ),
        OutputFormat::Pretty | OutputFormat::Raw => {
            for o in &outcomes {
                match &o.error {
                    None => println!("{} {}: ok", o.peripheral, o.service),
                    Some(err) => println!("{} {}: {err}", o.peripheral, o.service),
                }
            }
        }
    }

    if outcomes.iter().all(|o| o.is_ok()) {
        Ok(SUCCESS)
    } else {
        Ok(FAILURE)
    }
}
