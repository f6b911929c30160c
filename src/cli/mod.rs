//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `export`: 派生属性并写出 MongoDB 可导入的 JSON 数组
//! - `derive`: 派生全部记录的属性并存入附加数据
//! - `show`: 以表格显示单条记录的派生属性
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: derive, export, show

pub mod derive;
pub mod export;
pub mod show;

use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Crystex - 晶体结构标准化属性导出工具
#[derive(Parser)]
#[command(name = "crystex")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Derive standardized crystal-structure attributes and export them as a MongoDB-importable JSON array",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write the log to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Export all structures as a single JSON array (use '-' for stdout/piping)
    Export(export::ExportArgs),

    /// Derive and store the attributes of every structure in the record store
    Derive(derive::DeriveArgs),

    /// Show the derived attributes of a single structure
    Show(show::ShowArgs),
}

/// 批大小：正整数
pub fn parse_batch_size(value: &str) -> Result<NonZeroUsize, String> {
    value
        .parse::<NonZeroUsize>()
        .map_err(|_| format!("'{}' is not a positive integer", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_command() {
        let cli = Cli::try_parse_from([
            "crystex", "-vv", "export", "structures.jsonl", "-", "--batch-size", "25", "--as-is",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.filename, PathBuf::from("-"));
                assert_eq!(args.batch_size.get(), 25);
                assert!(args.as_is);
                assert!(!args.force);
            }
            _ => panic!("expected the export command"),
        }
    }

    #[test]
    fn test_batch_size_must_be_positive() {
        assert!(parse_batch_size("0").is_err());
        assert!(parse_batch_size("-3").is_err());
        assert_eq!(parse_batch_size("100").unwrap().get(), 100);

        let result = Cli::try_parse_from(["crystex", "export", "s.jsonl", "out.json", "--batch-size", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_batch_size() {
        let cli = Cli::try_parse_from(["crystex", "derive", "structures.jsonl"]).unwrap();
        match cli.command {
            Commands::Derive(args) => assert_eq!(args.batch_size.get(), 100),
            _ => panic!("expected the derive command"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
