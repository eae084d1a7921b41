use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ethrelay_device::simulator::{SimulatedModule, SimulatorServer};
use ethrelay_device::ModuleProfile;
use serde::Serialize;

use crate::cmd::SimulateArgs;
use crate::exit::{io_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct ListeningOutput {
    listening: String,
    model: &'static str,
    model_id: u8,
    password: bool,
}

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    let (module, profile) = build_module(&args)?;

    let mut server = SimulatorServer::bind(args.addr.as_str(), module)
        .map_err(|err| io_error(&format!("bind {} failed", args.addr), err))?;
    let local = server
        .local_addr()
        .map_err(|err| io_error("local address unavailable", err))?;

    let out = ListeningOutput {
        listening: local.to_string(),
        model: profile.name,
        model_id: profile.model_id,
        password: args.password.is_some(),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        _ => println!("simulating {} on {}", out.model, out.listening),
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    server
        .run(&running)
        .map_err(|err| io_error("simulator failed", err))?;
    tracing::info!("simulator stopped");
    Ok(SUCCESS)
}

fn build_module(args: &SimulateArgs) -> CliResult<(SimulatedModule, &'static ModuleProfile)> {
    let profile = ModuleProfile::lookup(args.model).ok_or_else(|| {
        CliError::new(
            USAGE,
            format!("unknown model id {} (expected 18, 19, 20, 21 or 29)", args.model),
        )
    })?;
    let mut module = SimulatedModule::new(args.model);
    if let Some(password) = &args.password {
        module = module.with_password(password);
    }
    Ok((module, profile))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(model: u8, password: Option<&str>) -> SimulateArgs {
        SimulateArgs {
            addr: "127.0.0.1:0".to_string(),
            model,
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn rejects_unknown_model() {
        let err = build_module(&args(42, None)).unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("42"));
    }

    #[test]
    fn password_locks_module() {
        let (module, profile) = build_module(&args(19, Some("pw"))).unwrap();
        assert!(!module.is_unlocked());
        assert_eq!(profile.name, "ETH008");

        let (module, _) = build_module(&args(19, None)).unwrap();
        assert!(module.is_unlocked());
    }
}
