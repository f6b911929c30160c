//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `store/`, `derive/`, `export/`, `utils/`
//! - 子模块: derive, export, show

pub mod derive;
pub mod export;
pub mod show;

use crate::cli::Commands;
use crate::error::Result;
use crate::utils::logging::LogDestination;

/// 执行命令
pub fn run(cmd: Commands, log: &LogDestination) -> Result<()> {
    match cmd {
        Commands::Export(args) => export::execute(args, log),
        Commands::Derive(args) => derive::execute(args),
        Commands::Show(args) => show::execute(args),
    }
}
