//! # 导出模块
//!
//! 将记录存储中的全部结构流式写出为一个可直接 `mongoimport --jsonArray`
//! 的 JSON 数组。
//!
//! ## 依赖关系
//! - 被 `commands/export.rs` 使用
//! - 子模块: orchestrator, sink, writer

pub mod orchestrator;
pub mod sink;
pub mod writer;

pub use orchestrator::{ExportConfig, ExportOrchestrator, ExportSummary};
pub use sink::{FailurePolicy, OutputTarget};
