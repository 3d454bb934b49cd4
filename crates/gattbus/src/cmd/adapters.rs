use crate::cmd::{AdaptersArgs, Context};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

pub fn run(_args: AdaptersArgs, ctx: &Context) -> CliResult<i32> {
    let adapters = ctx
        .gateway(ctx.timeout)
        .list_adapters()
        .map_err(|err| transport_error("list adapters failed", err))?;

    match ctx.format {
        OutputFormat::Json => print_json(&adapters),
        OutputFormat::Table => print_table(
            &["ADAPTER", "MODALIAS"],
            adapters
                .iter()
                .map(|a| vec![a.id.clone(), a.modalias.clone()]),
        ),
        OutputFormat::Pretty => {
            for adapter in &adapters {
                println!("{} ({})", adapter.id, adapter.modalias);
            }
        }
        OutputFormat::Raw => {
            for adapter in &adapters {
                println!("{}", adapter.id);
            }
        }
    }
    Ok(SUCCESS)
}
