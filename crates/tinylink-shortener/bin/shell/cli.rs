use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tinylink_shortener::settings::{DEFAULT_BASE_URL, DEFAULT_MAX_CODE_ATTEMPTS};

pub const DATA_DIR_ENV: &str = "TINYLINK_DATA_DIR";
pub const BASE_URL_ENV: &str = "TINYLINK_BASE_URL";
pub const SWEEP_INTERVAL_ENV: &str = "TINYLINK_SWEEP_INTERVAL_SECS";
pub const MAX_CODE_ATTEMPTS_ENV: &str = "TINYLINK_MAX_CODE_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "TINYLINK_LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = ".";
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Text => write!(f, "text"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tinylink", about = "Interactive link shortener with click quotas")]
pub struct CLI {
    /// Directory holding users.json and links.json.
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Public prefix short codes are shown under.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = SWEEP_INTERVAL_ENV,
        default_value_t = DEFAULT_SWEEP_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,

    #[arg(
        long,
        env = MAX_CODE_ATTEMPTS_ENV,
        default_value_t = DEFAULT_MAX_CODE_ATTEMPTS
    )]
    pub max_code_attempts: usize,

    /// Log output format; logs go to stderr.
    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,
}
