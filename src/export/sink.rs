//! # 导出目标
//!
//! 文件或标准输出（`-`）。写出前的检查：
//! - 文件已存在且未要求覆盖 → `SinkConflict`，不写入任何内容
//! - 要求覆盖 → 先删除旧文件，再以独占方式创建新文件
//!
//! 导出失败后的处理由 `FailurePolicy` 决定。
//!
//! ## 依赖关系
//! - 被 `commands/export.rs` 使用

use crate::error::{CrystexError, Result};

use log::{info, warn};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// 导出目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

/// 导出失败后如何处理已写出的部分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 删除不完整的输出文件
    #[default]
    Discard,
    /// 保留（已闭合但可能不完整的）输出
    Keep,
}

impl OutputTarget {
    /// `-` 表示标准输出
    pub fn from_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(path.to_path_buf())
        }
    }

    /// 输出是否为不可回退的流（管道）
    pub fn is_pipe(&self) -> bool {
        matches!(self, OutputTarget::Stdout)
    }

    /// 写出前检查；返回是否删除了已存在的文件
    pub fn prepare(&self, overwrite: bool) -> Result<bool> {
        let OutputTarget::File(path) = self else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }
        if !overwrite {
            return Err(CrystexError::SinkConflict {
                path: path.display().to_string(),
            });
        }

        warn!("Removing existing file at {}", path.display());
        fs::remove_file(path).map_err(|e| CrystexError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        if path.exists() {
            return Err(CrystexError::Other(format!(
                "Removed file at {}, but it still registers as existing",
                path.display()
            )));
        }
        Ok(true)
    }

    /// 打开输出；文件必须不存在
    pub fn open(&self) -> Result<Box<dyn Write>> {
        match self {
            OutputTarget::Stdout => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
            OutputTarget::File(path) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(path)
                    .map_err(|e| match e.kind() {
                        io::ErrorKind::AlreadyExists => CrystexError::SinkConflict {
                            path: path.display().to_string(),
                        },
                        _ => CrystexError::FileWriteError {
                            path: path.display().to_string(),
                            source: e,
                        },
                    })?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }

    /// 输出文件大小（字节）
    pub fn size(&self) -> Option<u64> {
        match self {
            OutputTarget::File(path) => fs::metadata(path).ok().map(|m| m.len()),
            OutputTarget::Stdout => None,
        }
    }

    /// 按失败策略处理不完整的输出；返回是否删除了文件
    pub fn handle_failure(&self, policy: FailurePolicy) -> Result<bool> {
        match (self, policy) {
            (OutputTarget::File(path), FailurePolicy::Discard) if path.exists() => {
                info!("Discarding incomplete output {}", path.display());
                fs::remove_file(path).map_err(|e| CrystexError::FileWriteError {
                    path: path.display().to_string(),
                    source: e,
                })?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::File(path) => write!(f, "{}", path.display()),
            OutputTarget::Stdout => f.write_str("stdout"),
        }
    }
}
