//! RCL Control - brings up the RCL service container on the utility host
//!
//! Validates the host and the container configuration, persists the merged
//! configuration, and hands over to the sibling installer.

mod cli;
mod logging;
mod output;
mod prompt;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use rcl_common::dns::{SystemResolver, TcpConnector};
use rcl_common::exit_codes::{EXIT_GENERAL_ERROR, EXIT_SUCCESS};
use rcl_common::network::HostInterfaces;
use rcl_common::runtime::PodmanCli;
use rcl_common::sibling::RclmgrCli;
use rcl_common::{preflight, Host, Pipeline, RclError, Settings, StartRequest};
use std::io;
use std::process::ExitCode;
use tracing::{debug, error, info};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("FATAL ERROR: {:#}", e);
            return ExitCode::from(exit_code_of(&e) as u8);
        }
    };

    let stamp = logging::run_stamp();
    let (subscriber, log_path) = match logging::build_subscriber(&settings.log_dir, &stamp, cli.verbose) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("FATAL ERROR: {}", e);
            return ExitCode::from(e.exit_code() as u8);
        }
    };
    output::print_log_location(&settings.log_dir);

    let code = tracing::subscriber::with_default(subscriber, || {
        debug!("Logging to {}", log_path.display());
        match run(&cli, &settings, &stamp) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                let code = exit_code_of(&e);
                error!("{:#}", e);
                info!("Going to terminate with RC {}", code);
                code
            }
        }
    });

    ExitCode::from(code as u8)
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.settings.as_deref()).context("loading settings")?;
    if let Some(config_file) = &cli.config_file {
        settings.config_file = config_file.clone();
    }
    Ok(settings)
}

/// Operational exit code for a failed run
fn exit_code_of(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<RclError>()
        .map(RclError::exit_code)
        .unwrap_or(EXIT_GENERAL_ERROR)
}

fn run(cli: &Cli, settings: &Settings, stamp: &str) -> Result<()> {
    let interfaces = HostInterfaces;
    let resolver = SystemResolver;
    let connector = TcpConnector;
    let runtime = PodmanCli::new(&settings.runtime_bin);
    let tool = RclmgrCli::new(&settings.sibling_tool);

    let host = Host {
        interfaces: &interfaces,
        resolver: &resolver,
        connector: &connector,
        runtime: &runtime,
        tool: &tool,
        hostname: preflight::system_hostname()?,
        username: preflight::current_username(),
    };
    let pipeline = Pipeline::new(settings, host, stamp);
    debug!("Run id {}", pipeline.run_id());

    match cli.command() {
        Commands::Start {
            image_file,
            image_version,
        } => {
            let image_version = match image_version {
                Some(version) => version,
                None => prompt::ask_image_version(&mut io::stdin().lock(), &mut io::stdout())?,
            };
            let outcome = pipeline.start(&StartRequest {
                image_file,
                image_version,
            })?;
            output::print_bring_up(&outcome, &settings.config_file);
        }
        Commands::Check => {
            let report = pipeline.check()?;
            output::print_gates(&report);
        }
        Commands::Status => {
            let running = pipeline.status()?;
            output::print_status(running, &settings.image_match);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_from_domain_error() {
        let err = anyhow::Error::new(RclError::Schema(PathBuf::from("/etc/rcl/rclmgr.yml")));
        assert_eq!(exit_code_of(&err), 13);
    }

    #[test]
    fn test_exit_code_survives_context() {
        let err = anyhow::Error::new(RclError::DomainNotConfigured).context("resolving host domain");
        assert_eq!(exit_code_of(&err), 8);
    }

    #[test]
    fn test_foreign_error_is_general() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_of(&err), EXIT_GENERAL_ERROR);
    }
}
