use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::Context;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Activation export to read devices from
    pub input: PathBuf,
    /// Where to write the report; stdout when unset
    pub output: Option<PathBuf>,
    pub format: ReportFormat,
}

/// Report rendering; names are matched case-insensitively in every source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(try_from = "String")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(anyhow::anyhow!("Unknown report format: {}", other)),
        }
    }
}

impl TryFrom<String> for ReportFormat {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Values given on the command line; they win over everything else
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub logging_level: Option<String>,
    pub report_input: Option<PathBuf>,
    pub report_output: Option<PathBuf>,
    pub report_format: Option<ReportFormat>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Environment variable consulted for a dotted config key
    ///
    /// `report.input` → `REPORT_INPUT`
    pub fn env_name(key: &str) -> String {
        key.to_ascii_uppercase().replace(['.', '-'], "_")
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(&Self::env_name(key)).filter(|v| !v.is_empty());

        if let Some(level) = get("logging.level") {
            self.logging.level = level;
        }
        if let Some(input) = get("report.input") {
            self.report.input = input.into();
        }
        if let Some(output) = get("report.output") {
            self.report.output = Some(output.into());
        }
        if let Some(format) = get("report.format") {
            self.report.format = format
                .parse()
                .with_context(|| format!("Invalid {}", Self::env_name("report.format")))?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = &overrides.logging_level {
            self.logging.level = level.clone();
        }
        if let Some(input) = &overrides.report_input {
            self.report.input = input.clone();
        }
        if let Some(output) = &overrides.report_output {
            self.report.output = Some(output.clone());
        }
        if let Some(format) = overrides.report_format {
            self.report.format = format;
        }
    }

    /// File (or defaults when missing) < environment < command line
    pub fn resolve(path: &Path, overrides: &Overrides) -> anyhow::Result<Self> {
        Self::resolve_with(path, overrides, |name| std::env::var(name).ok())
    }

    /// [`Config::resolve`] with the environment read through `lookup`
    pub fn resolve_with<F>(path: &Path, overrides: &Overrides, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            eprintln!("Warning: config file {:?} not found, using defaults", path);
            Self::default()
        };
        config.apply_env(lookup)?;
        config.apply_overrides(overrides);
        Ok(config)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("devices.txt"),
            output: None,
            format: ReportFormat::Text,
        }
    }
}
