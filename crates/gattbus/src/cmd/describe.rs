use gattbus_gateway::{Adapter, Peripheral};

use crate::cmd::{Context, DescribeArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

pub fn run(args: DescribeArgs, ctx: &Context) -> CliResult<i32> {
    let mut adapters = ctx
        .gateway(ctx.timeout)
        .describe_adapters()
        .map_err(|err| transport_error("describe adapters failed", err))?;

    if let Some(address) = &args.peripheral {
        for adapter in &mut adapters {
            adapter.peripherals = adapter.peripheral(address).cloned().into_iter().collect();
        }
    }

    match ctx.format {
        OutputFormat::Json => print_json(&adapters),
        OutputFormat::Table => print_table(
            &["ADAPTER", "PERIPHERAL", "NAME", "RSSI", "SERVICES"],
            rows(&adapters).map(|(adapter, p)| {
                vec![
                    adapter.adapter_info.id.clone(),
                    p.address.clone(),
                    local_name(p).to_string(),
                    rssi(p),
                    p.services.len().to_string(),
                ]
            }),
        ),
        OutputFormat::Pretty => {
            for adapter in &adapters {
                println!("{}:", adapter.adapter_info.id);
                for p in &adapter.peripherals {
                    println!("  {} {} rssi={}", p.address, local_name(p), rssi(p));
                    for service in &p.services {
                        println!("    service {}", service.uuid);
                        for ch in &service.characteristics {
                            println!("      characteristic {} {:?}", ch.uuid, ch.properties);
                        }
                    }
                }
            }
        }
        OutputFormat::Raw => {
            for (_, p) in rows(&adapters) {
                println!("{}", p.address);
            }
        }
    }
    Ok(SUCCESS)
}

fn rows(adapters: &[Adapter]) -> impl Iterator<Item = (&Adapter, &Peripheral)> {
    adapters
        .iter()
        .flat_map(|adapter| adapter.peripherals.iter().map(move |p| (adapter, p)))
}

fn local_name(p: &Peripheral) -> &str {
    p.props
        .as_ref()
        .and_then(|props| props.local_name.as_deref())
        .unwrap_or("-")
}

fn rssi(p: &Peripheral) -> String {
    p.props
        .as_ref()
        .and_then(|props| props.rssi)
        .map_or_else(|| "-".to_string(), |rssi| rssi.to_string())
}
