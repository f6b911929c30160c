//! # 数据模型模块
//!
//! 定义原始结构记录与派生属性的数据模型。
//!
//! ## 依赖关系
//! - 被 `derive/`, `codec/`, `store/`, `export/` 使用
//! - 子模块: record, attributes

pub mod attributes;
pub mod record;

pub use attributes::{DerivedAttributes, Document, Species, StructureFeature};
pub use record::{Kind, RawStructureRecord};
