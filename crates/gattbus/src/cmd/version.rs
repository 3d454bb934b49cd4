use crate::cmd::{Context, VersionArgs};
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs, ctx: &Context) -> CliResult<i32> {
    if !args.extended {
        println!("gattbus {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: gattbus");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("GATTBUS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("GATTBUS_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "features: metrics={}, embedded-hal={}, cli=true",
        cfg!(feature = "metrics"),
        cfg!(feature = "embedded-hal")
    );
    println!("gateway_url: {}", ctx.gateway_url);
    println!("adapter: {}", ctx.adapter);

    Ok(SUCCESS)
}
