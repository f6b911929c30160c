//! # 统一错误处理模块
//!
//! 定义 Crystex 的所有错误类型，使用 `thiserror` 派生。
//!
//! 派生/编码错误不重试、不跳过：任何一条记录出错都会中止整个导出。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use std::error::Error as StdError;
use thiserror::Error;

/// Crystex 统一错误类型
#[derive(Error, Debug)]
pub enum CrystexError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 记录存储错误
    // ─────────────────────────────────────────────────────────────
    #[error("Could not find a unique structure record with immutable_id {immutable_id}")]
    NotFound { immutable_id: String },

    // ─────────────────────────────────────────────────────────────
    // 属性派生错误
    // ─────────────────────────────────────────────────────────────
    #[error("Integrity violation: {0}")]
    IntegrityError(String),

    #[error("Cannot deduce '{attribute}': {reason}")]
    DeductionError { attribute: String, reason: String },

    #[error("Vacancy concentration {value} of species '{species}' is outside [0, 1]")]
    RangeError { species: String, value: f64 },

    // ─────────────────────────────────────────────────────────────
    // 编码 / 输出错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed float payload: {0}")]
    CodecError(String),

    #[error("{path} already exists! (Use --force if you wish to overwrite the file.)")]
    SinkConflict { path: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Export interrupted by user")]
    Interrupted,

    #[error("An error occurred trying outputting to {target} (see the log at {log} for more details):\n{source}")]
    ExportFailed {
        target: String,
        log: String,
        #[source]
        source: Box<CrystexError>,
    },

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl CrystexError {
    /// 构造派生错误
    pub fn deduction(attribute: &str, reason: impl Into<String>) -> Self {
        CrystexError::DeductionError {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }

    /// 是否为写出前即可发现的冲突（不会产生任何输出）
    pub fn is_preflight(&self) -> bool {
        matches!(self, CrystexError::SinkConflict { .. })
    }

    /// 完整错误链，每层一行 `caused by`
    ///
    /// `ExportFailed` 的消息已包含其原因，链从原因开始展开。
    pub fn chain(&self) -> String {
        let root: &dyn StdError = match self {
            CrystexError::ExportFailed { source, .. } => &**source,
            other => other,
        };

        let mut chain = root.to_string();
        let mut cause = root.source();
        while let Some(e) = cause {
            chain.push_str(&format!("\n  caused by: {}", e));
            cause = e.source();
        }
        chain
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, CrystexError>;
