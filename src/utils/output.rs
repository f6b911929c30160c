//! # 美化输出工具
//!
//! 提供统一的终端输出样式。导出到标准输出（管道）时，
//! 人类可读的提示必须静默，否则会混入 JSON 数据流，
//! 因此提示统一经由 `Console` 输出，由调用方决定是否静默。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块和 `main.rs` 使用
//! - 使用 `colored` crate

use colored::Colorize;

/// 打印错误消息（总是输出到 stderr）
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 终端提示输出
#[derive(Debug, Clone, Copy, Default)]
pub struct Console {
    quiet: bool,
}

impl Console {
    pub fn new(quiet: bool) -> Self {
        Console { quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// 打印成功消息
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", "[OK]".green().bold(), msg);
        }
    }

    /// 打印警告消息（stderr，不受静默影响）
    pub fn warning(&self, msg: &str) {
        eprintln!("{} {}", "[WARN]".yellow().bold(), msg);
    }

    /// 打印信息消息
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", "[*]".blue().bold(), msg);
        }
    }

    /// 打印 "键: 值"
    pub fn field(&self, key: &str, value: impl std::fmt::Display) {
        if !self.quiet {
            println!("{} {}: {}", "[*]".blue().bold(), key.bold(), value);
        }
    }

    /// 打印标题栏
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let line = "─".repeat(60);
        println!("\n{}", line.dimmed());
        println!("  {}", title.bold());
        println!("{}\n", line.dimmed());
    }

    /// 打印任意块（如表格）
    pub fn block(&self, text: impl std::fmt::Display) {
        if !self.quiet {
            println!("{}", text);
        }
    }
}
