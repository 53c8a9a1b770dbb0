use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use evremixes::app::App;
use evremixes::config::{RunConfig, RunOverrides};
use evremixes::domain::{AudioFormat, TrackOrder};
use evremixes::download::AudioHttpClient;
use evremixes::error::RemixError;
use evremixes::manifest::ManifestHttpClient;
use evremixes::output::{ConsoleOutput, JsonOutput, OutputMode};
use evremixes::tagging::LoftyTagger;

#[derive(Parser)]
#[command(name = "evremixes")]
#[command(about = "Download the Evanescence remix collection")]
#[command(version, author)]
struct Cli {
    /// Destination folder (defaults to ~/Downloads/Evanescence Remixes)
    #[arg(long)]
    output: Option<Utf8PathBuf>,

    /// Download the instrumental versions
    #[arg(long)]
    instrumentals: bool,

    #[arg(long, value_enum)]
    format: Option<AudioFormat>,

    #[arg(long, value_enum)]
    order: Option<TrackOrder>,

    #[arg(long)]
    manifest_url: Option<String>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<RemixError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

/// 3 is reserved for failures reaching the server; a client that could not be
/// built never got that far.
fn map_exit_code(error: &RemixError) -> u8 {
    match error {
        RemixError::Network(_) | RemixError::HttpStatus { .. } => 3,
        RemixError::ManifestParse(_) => 4,
        RemixError::Filesystem(_) | RemixError::HomeDirUnavailable => 5,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Interactive
    };

    let config = RunConfig::resolve(RunOverrides {
        output_folder: cli.output,
        manifest_url: cli.manifest_url,
        instrumentals: cli.instrumentals,
        format: cli.format,
        order: cli.order,
    })?;
    let manifest = ManifestHttpClient::new(config.manifest_url.clone())?;
    let audio = AudioHttpClient::new()?;
    let app = App::new(config, manifest, audio, LoftyTagger);

    match output_mode {
        OutputMode::Interactive => {
            let report = app.run(&ConsoleOutput)?;
            ConsoleOutput::print_summary(&report);
        }
        OutputMode::Json => {
            let report = app.run(&JsonOutput)?;
            JsonOutput::print_report(&report).into_diagnostic()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_kind() {
        assert_eq!(map_exit_code(&RemixError::Network("reset".into())), 3);
        assert_eq!(
            map_exit_code(&RemixError::HttpStatus {
                status: 404,
                message: "Not Found".into()
            }),
            3
        );
        assert_eq!(map_exit_code(&RemixError::ManifestParse("eof".into())), 4);
        assert_eq!(map_exit_code(&RemixError::HomeDirUnavailable), 5);
    }

    #[test]
    fn client_build_failure_is_generic() {
        assert_eq!(
            map_exit_code(&RemixError::ClientBuild("no TLS backend".into())),
            1
        );
    }
}
