use clap::Parser;

use contentsync::cli::commands::{dev, generate, init};
use contentsync::cli::{Cli, Commands};
use contentsync::config::Settings;
use contentsync::error::SyncResult;
use contentsync::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Commands::Init { force } = &cli.command {
        init::run_init(*force);
        return;
    }

    let mut settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // -v flags override the configured default level
    match cli.verbose {
        0 => {}
        1 => settings.logging.default = "info".to_string(),
        2 => settings.logging.default = "debug".to_string(),
        _ => settings.logging.default = "trace".to_string(),
    }
    logging::init_with_config(&settings.logging);

    let result: SyncResult<()> = match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Dev {
            port,
            command,
            root_path,
            no_watch,
            no_sdk,
        } => {
            if let Some(root) = root_path {
                settings.root_path = Some(root);
            }
            let port = port.unwrap_or(settings.dev.port);
            dev::run_dev(
                settings,
                dev::DevOptions {
                    port,
                    command,
                    no_watch,
                    no_sdk,
                    config: cli.config,
                },
            )
            .await
        }
        Commands::Generate { root_path, no_sdk } => {
            if let Some(root) = root_path {
                settings.root_path = Some(root);
            }
            generate::run_generate(settings, cli.config, no_sdk).await
        }
        Commands::Config => {
            init::run_config(&settings);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, Box<figment::Error>> {
    match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}
