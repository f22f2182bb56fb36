use crate::error::{ReportError, Result};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::{info, warn};

pub struct Config {
    pub output_dir: PathBuf,
    pub sheet_name: String,
    pub preview_rows: usize,
    pub group_name: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::load`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            output_dir: try_load(&lookup, "REPORT_OUTPUT_DIR", ".")?,
            sheet_name: try_load(&lookup, "REPORT_SHEET_NAME", "Report")?,
            preview_rows: try_load(&lookup, "REPORT_PREVIEW_ROWS", "5")?,
            group_name: try_load(&lookup, "REPORT_GROUP_NAME", "DLCF")?,
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        ReportError::Config(format!("{key}={raw}: {e}"))
    })
}
