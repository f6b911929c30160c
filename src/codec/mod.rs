//! # 记录编解码模块
//!
//! 持久化负载与导出文档之间的归一化处理。
//!
//! ## 子模块
//! - `floats`: 十六进制浮点数组的编码与解码
//! - `mass`: 物种质量表示的归一化
//!
//! ## 依赖关系
//! - 被 `models/attributes.rs`, `derive/cache.rs`, `export/orchestrator.rs` 使用

pub mod floats;
pub mod mass;

pub use floats::decode_float_fields;
pub use mass::normalize_species_mass;
