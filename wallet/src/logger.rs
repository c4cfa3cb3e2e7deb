use anyhow::{Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};

use crate::config::LogConfig;

pub fn default_logs_datetime_format() -> String {
    String::from("[%Y-%m-%d] (%H:%M:%S%.3f)")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(value)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "error" => Self::Error,
            "warn" => Self::Warn,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => return Err(format!("Invalid log level '{}'", s)),
        })
    }
}

// Level override for one module, written `module=level`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub module: String,
    pub level: LogLevel,
}

impl FromStr for ModuleConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, level) = s
            .split_once('=')
            .ok_or_else(|| format!("Invalid module log config '{}', expected module=level", s))?;
        if module.is_empty() {
            return Err(format!("Missing module name in '{}'", s));
        }
        Ok(Self {
            module: module.to_owned(),
            level: level.parse()?,
        })
    }
}

fn colors() -> ColoredLevelConfig {
    ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack)
}

// Terminal output goes to stderr, stdout is kept for command results
pub fn setup_logger(config: &LogConfig) -> Result<()> {
    let console_level = LevelFilter::from(config.log_level);
    let file_level = LevelFilter::from(config.file_log_level.unwrap_or(config.log_level));
    let max_level = if config.disable_file_logging {
        console_level
    } else {
        console_level.max(file_level)
    };

    let mut base = fern::Dispatch::new().level(max_level);
    for module in &config.logs_modules {
        base = base.level_for(module.module.clone(), module.level.into());
    }

    let colors = colors();
    let use_color = !config.disable_log_color;
    let datetime_format = config.datetime_format.clone();
    let console = fern::Dispatch::new()
        .level(console_level)
        .format(move |out, message, record| {
            let date = chrono::Local::now().format(&datetime_format);
            if use_color {
                out.finish(format_args!(
                    "{} {} > {}: {}",
                    date,
                    colors.color(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "{} {} > {}: {}",
                    date,
                    record.level(),
                    record.target(),
                    message
                ))
            }
        })
        .chain(std::io::stderr());
    base = base.chain(console);

    if !config.disable_file_logging {
        fs::create_dir_all(&config.logs_path).context("Error while creating logs directory")?;
        let output: fern::Output = if config.disable_file_log_date_based {
            fern::log_file(Path::new(&config.logs_path).join(&config.filename_log))
                .context("Error while opening log file")?
                .into()
        } else {
            fern::DateBased::new(&config.logs_path, format!("%Y-%m-%d.{}", config.filename_log))
                .into()
        };

        let datetime_format = config.datetime_format.clone();
        let file = fern::Dispatch::new()
            .level(file_level)
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "{} {} > {}: {}",
                    chrono::Local::now().format(&datetime_format),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .chain(output);
        base = base.chain(file);
    }

    base.apply().context("Error while setting up the logger")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_config() {
        let config: ModuleConfig = "tickwire_wallet::node_api=trace".parse().unwrap();
        assert_eq!(config.module, "tickwire_wallet::node_api");
        assert_eq!(config.level, LogLevel::Trace);

        assert!("node_api".parse::<ModuleConfig>().is_err());
        assert!("=debug".parse::<ModuleConfig>().is_err());
        assert!("sled=loud".parse::<ModuleConfig>().is_err());
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::Off);
        assert_eq!(LevelFilter::from(LogLevel::default()), LevelFilter::Info);
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
    }
}
