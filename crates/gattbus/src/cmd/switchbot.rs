use gattbus_services::switchbot::SWITCHBOT_TIMEOUT;
use gattbus_services::SwitchBot;
use serde::Serialize;

use crate::cmd::{Context, SwitchbotArgs};
use crate::exit::{service_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct SwitchbotOutput<'a> {
    peripheral: &'a str,
    command: &'static str,
    sent: bool,
}

pub fn run(args: SwitchbotArgs, ctx: &Context) -> CliResult<i32> {
    let bot = SwitchBot::new(ctx.gateway(SWITCHBOT_TIMEOUT), &ctx.adapter, &args.peripheral);
    bot.send(args.command)
        .map_err(|err| service_error("switchbot command failed", err))?;

    match ctx.format {
        OutputFormat::Json => print_json(&SwitchbotOutput {
            peripheral: &args.peripheral,
            command: args.command.name(),
            sent: true,
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("sent {} to {}", args.command, args.peripheral)
        }
        OutputFormat::Raw => {}
    }
    Ok(SUCCESS)
}
