//! Command-line flags, each of which can also come from the environment.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::bail;
use chrono::FixedOffset;
use clap::parser::ValueSource;
use clap::{ArgGroup, ArgMatches, CommandFactory, FromArgMatches, Parser};
use export_core::parse_utc_offset;
use export_engine::{Credentials, ExportConfig, StoreSettings, DEFAULT_CONCURRENCY};
use export_logging::LogDestination;
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "gdocs-export")]
#[command(version)]
#[command(about = "Export dated Google Docs from a Drive folder as Markdown pages")]
#[command(group(
    ArgGroup::new("credentials")
        .required(true)
        .multiple(true)
        .args(["access_token", "credentials_file"])
))]
pub struct Cli {
    /// Drive folder whose documents are exported
    #[arg(long, env = "DRIVE_FOLDER")]
    pub folder_id: String,

    /// Directory that receives one `<name>/index.md` per document
    #[arg(long, env = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// OAuth2 bearer token with read access to the folder
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Service-account JSON key file
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials_file: Option<PathBuf>,

    /// Override the Drive API endpoint
    #[arg(long, env = "DRIVE_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Maximum number of exports and document pipelines in flight
    #[arg(long, env = "EXPORT_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Offset used for front-matter timestamps (`Z`, `+HH:MM` or `-HH:MM`)
    #[arg(long, env = "EXPORT_UTC_OFFSET", default_value = "+00:00", value_parser = parse_utc_offset)]
    pub utc_offset: FixedOffset,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, env = "EXPORT_LOG", default_value = "info", value_parser = parse_log_level)]
    pub log_level: LevelFilter,

    /// Also write the log to this file
    #[arg(long, env = "EXPORT_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Emit GitHub Actions `::error::` annotations for failures
    #[arg(long, env = "GITHUB_ACTIONS")]
    pub github_actions: bool,

    #[arg(skip)]
    access_token_source: Option<ValueSource>,

    #[arg(skip)]
    credentials_file_source: Option<ValueSource>,
}

fn from_command_line(source: Option<ValueSource>) -> bool {
    source == Some(ValueSource::CommandLine)
}

fn parse_log_level(raw: &str) -> Result<LevelFilter, String> {
    raw.parse().map_err(|_| format!("unknown log level {raw:?}"))
}

impl Cli {
    /// Parses `args`, remembering whether each credential came from a flag
    /// or from the environment.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_matches(&Self::command().try_get_matches_from(args)?)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let mut cli = Self::from_arg_matches(matches)?;
        cli.access_token_source = matches.value_source("access_token");
        cli.credentials_file_source = matches.value_source("credentials_file");
        Ok(cli)
    }

    pub fn export_config(&self) -> ExportConfig {
        ExportConfig::new(self.folder_id.clone(), self.output_dir.clone())
            .with_concurrency(self.concurrency)
            .with_utc_offset(self.utc_offset)
    }

    pub fn store_settings(&self) -> StoreSettings {
        let mut settings = StoreSettings::default();
        if let Some(base) = &self.api_base_url {
            settings.api_base_url = base.clone();
        }
        settings
    }

    /// A credential given on the command line beats one taken from the
    /// environment. When both come from the environment the token is used.
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        let token = self.access_token.clone().map(Credentials::access_token);
        let key_file = self.credentials_file.clone().map(Credentials::ServiceAccountKey);
        match (token, key_file) {
            (Some(token), None) => Ok(token),
            (None, Some(key_file)) => Ok(key_file),
            (Some(token), Some(key_file)) => match (
                from_command_line(self.access_token_source),
                from_command_line(self.credentials_file_source),
            ) {
                (true, true) => {
                    bail!("--access-token and --credentials-file cannot be used together")
                }
                (false, true) => Ok(key_file),
                _ => Ok(token),
            },
            (None, None) => bail!("one of --access-token or --credentials-file is required"),
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}
