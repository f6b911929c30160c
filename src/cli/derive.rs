//! # derive 子命令 CLI 定义
//!
//! 派生全部记录的属性并持久化到附加数据
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/derive.rs`

use super::parse_batch_size;
use clap::Args;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// derive 子命令参数
#[derive(Args, Debug)]
pub struct DeriveArgs {
    /// Record store (JSON Lines, one structure per line)
    pub store: PathBuf,

    /// Records fetched per cursor page
    #[arg(long, default_value = "100", env = "CRYSTEX_BATCH_SIZE", value_parser = parse_batch_size)]
    pub batch_size: NonZeroUsize,
}
