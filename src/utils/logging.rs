//! # 日志初始化
//!
//! `log` 门面 + `env_logger` 后端。默认级别 warn，`-v` info，`-vv` debug，
//! `-vvv` trace；设置了 `RUST_LOG` 时以其为准。
//! 指定 `--log-file` 时日志追加写入该文件，否则写到 stderr。
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用

use anyhow::Context;
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// 日志去向，用于错误提示中指引用户查看日志
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    Stderr,
    File(PathBuf),
}

impl fmt::Display for LogDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogDestination::Stderr => f.write_str("stderr (raise verbosity with -v for details)"),
            LogDestination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// 详细程度 → 默认日志级别
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn init_logging(verbosity: u8, log_file: Option<&Path>) -> anyhow::Result<LogDestination> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level_for(verbosity)));

    let destination = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            builder
                .target(env_logger::Target::Pipe(Box::new(file)))
                .write_style(env_logger::WriteStyle::Never);
            LogDestination::File(path.to_path_buf())
        }
        None => LogDestination::Stderr,
    };

    builder
        .try_init()
        .context("A logger has already been installed")?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(7), "trace");
    }

    #[test]
    fn test_destination_display() {
        let destination = LogDestination::File(PathBuf::from("/tmp/crystex.log"));
        assert_eq!(destination.to_string(), "/tmp/crystex.log");
    }
}
