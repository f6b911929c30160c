//! # Crystex - 晶体结构标准化属性导出工具
//!
//! 从记录存储中读取晶体结构，派生标准化属性（元素、化学式、物种、
//! 结构特征等），并流式写出为一个可直接 `mongoimport --jsonArray` 的 JSON 数组。
//!
//! ## 子命令
//! - `export` - 导出全部结构（`-` 表示写到标准输出）
//! - `derive` - 派生并持久化全部结构的属性
//! - `show`   - 显示单条结构的派生属性
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── store/    (记录游标与附加数据)
//!   │     ├── derive/   (属性派生与缓存)
//!   │     ├── codec/    (十六进制浮点与质量归一化)
//!   │     ├── export/   (分批写出与导出编排)
//!   │     └── models/   (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod codec;
mod commands;
mod derive;
mod error;
mod export;
mod models;
mod store;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let log = match utils::logging::init_logging(cli.verbose, cli.log_file.as_deref()) {
        Ok(destination) => destination,
        Err(e) => {
            utils::output::print_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = commands::run(cli.command, &log) {
        if !e.is_preflight() {
            log::error!("Full error from 'crystex':\n{}", e.chain());
        }
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
