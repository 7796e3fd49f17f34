mod cli;
mod commands;
mod config;
mod download;
mod error;
mod extract;
mod github;
mod inspect;
mod install;
mod types;
mod ui;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::Cli;
use config::load_settings;
use ui::Ui;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    setup_logging(&cli)?;

    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let ui = Ui::new(cli.quiet);

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            ui.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };
    tracing::debug!("Settings: {:?}", settings);

    if let Err(e) = commands::run(&cli, command, &settings, ui).await {
        commands::report_failure(&e, &settings, &cli.path, &ui);
        std::process::exit(1);
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}
