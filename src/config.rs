use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::input::DEFAULT_DEVICE_PATH;

/// Records endpoint of the Fulcrum API, used for both creating and listing.
pub const RECORDS_URL: &str = "https://api.fulcrumapp.com/api/v2/records.json";

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "FULCRUM_TOKEN";

pub const USAGE: &str = "\
Usage: fulcrum-hat [--path <device>]

Options:
  --path <device>  path to the joystick event device [default: /dev/input/event0]
  -h, --help       print this help";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("unexpected argument {0:?}")]
    UnexpectedArgument(String),
    #[error("help requested")]
    HelpRequested,
}

/// Remote service settings shared by the submission and polling clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub records_url: String,
    /// Environment variable the token is read from, on every request
    pub token_env: String,
    /// Must stay below the dashboard poll interval
    pub poll_timeout: Duration,
    pub submit_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            records_url: RECORDS_URL.to_owned(),
            token_env: TOKEN_ENV.to_owned(),
            poll_timeout: Duration::from_millis(1500),
            submit_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input_path: PathBuf,
    pub service: ServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            service: ServiceConfig::default(),
        }
    }
}

impl Config {
    /// Parse the command line, without the program name.
    ///
    /// The only flag is the joystick device path, accepted as `--path <p>`,
    /// `--path=<p>`, or with a single dash.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" | "-help" => return Err(ConfigError::HelpRequested),
                "--path" | "-path" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    config.input_path = PathBuf::from(value);
                }
                _ => {
                    let value = arg
                        .strip_prefix("--path=")
                        .or_else(|| arg.strip_prefix("-path="))
                        .ok_or_else(|| ConfigError::UnexpectedArgument(arg.clone()))?;
                    if value.is_empty() {
                        return Err(ConfigError::MissingValue("--path".into()));
                    }
                    config.input_path = PathBuf::from(value);
                }
            }
        }

        Ok(config)
    }
}
