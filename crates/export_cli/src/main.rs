mod cli;
mod summary;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use export_engine::{DocumentReport, DriveClient, Exporter, LogProgressSink};
use export_logging::{export_error, export_info};

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if !export_logging::initialize(cli.log_destination(), cli.log_level) {
        eprintln!("Warning: logging could not be initialized");
    }

    match run(&cli).await {
        Ok(report) => {
            summary::log_report(&report, cli.github_actions);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            let message = format!("{err:#}");
            export_error!("Export aborted: {}", message);
            if cli.github_actions {
                println!("{}", summary::github_annotation(&message));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<DocumentReport> {
    let config = cli.export_config();
    export_info!(
        "Exporting folder {} to {}",
        config.container_id,
        config.output_root.display()
    );

    let client = DriveClient::new(cli.store_settings(), cli.credentials()?)
        .context("cannot set up the Drive client")?;
    let exporter = Exporter::new(Arc::new(client), config);
    let report = exporter.run(Arc::new(LogProgressSink)).await?;
    Ok(report)
}
