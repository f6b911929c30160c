//! # 工具函数模块
//!
//! 提供美化输出、进度条、日志、中断信号、耗时格式化与浮点容差等工具。
//!
//! ## 依赖关系
//! - 被 `commands/`, `derive/`, `export/` 模块使用
//! - 子模块: interrupt, logging, output, progress, timing, tolerance

pub mod interrupt;
pub mod logging;
pub mod output;
pub mod progress;
pub mod timing;
pub mod tolerance;
