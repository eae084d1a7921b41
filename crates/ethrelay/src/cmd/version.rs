use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("ethrelay {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: ethrelay");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("ETHRELAY_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "rustc: {}",
        option_env!("ETHRELAY_RUSTC_VERSION").unwrap_or("unknown")
    );
    println!(
        "git_hash: {}",
        option_env!("ETHRELAY_GIT_HASH").unwrap_or("unknown")
    );
    println!("default_port: {}", ethrelay_device::DEFAULT_PORT);
    println!("models: {}", supported_models());

    Ok(SUCCESS)
}

/// Known models as `NAME (id)`, in table order.
fn supported_models() -> String {
    ethrelay_device::MODULE_PROFILES
        .iter()
        .map(|p| format!("{} ({})", p.name, p.model_id))
        .collect::<Vec<_>>()
        .join(", ")
}
