//! # export 子命令 CLI 定义
//!
//! 由记录存储生成 MongoDB 可导入的 JSON 数组
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/export.rs`

use super::parse_batch_size;
use clap::Args;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// export 子命令参数
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Record store (JSON Lines, one structure per line)
    pub store: PathBuf,

    /// Name (including suffix) of the JSON file to create; use '-' for stdout/piping
    pub filename: PathBuf,

    /// Overwrite an existing FILENAME (not relevant when piping)
    #[arg(short, long, default_value_t = false)]
    pub force: bool,

    /// Records fetched per cursor page and written per fragment
    #[arg(long, default_value = "100", env = "CRYSTEX_BATCH_SIZE", value_parser = parse_batch_size)]
    pub batch_size: NonZeroUsize,

    /// Export the derived fields as is, e.g., do not normalize species.mass
    #[arg(long, default_value_t = false)]
    pub as_is: bool,

    /// Store newly derived attributes in the record store's extras
    #[arg(long, default_value_t = false)]
    pub store_attributes: bool,

    /// Keep a partially written file if the export fails
    #[arg(long, default_value_t = false)]
    pub keep_partial: bool,
}
