//! # 记录存储模块
//!
//! 导出流程消费的两个外部接口：
//! - `RecordCursor`：只进、可重新发起的记录游标，按页拉取
//! - `ExtrasStore`：挂在记录上的键值附加数据，用于跨运行缓存派生属性
//!
//! ## 实现
//! - `jsonl`: JSON Lines 记录文件 + `<file>.extras.json` 附加数据
//! - `memory`: 内存实现（测试用）
//!
//! ## 依赖关系
//! - 被 `derive/cache.rs`, `export/orchestrator.rs`, `commands/` 使用

pub mod jsonl;
#[cfg(test)]
pub mod memory;

pub use jsonl::JsonlStore;

use crate::error::Result;
use crate::models::RawStructureRecord;

use serde_json::Value;

/// 派生属性在附加数据中的键名
pub const ATTRIBUTES_KEY: &str = "optimade";

/// 记录游标的默认页大小
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// 惰性记录序列
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<RawStructureRecord>> + 'a>;

/// 记录游标
pub trait RecordCursor {
    /// 记录总数
    fn count(&self) -> Result<usize>;

    /// 从头开始的惰性遍历，每次向存储拉取 `page_size` 条
    fn iterate(&self, page_size: usize) -> Result<RecordIter<'_>>;
}

/// 记录附加数据
pub trait ExtrasStore {
    fn get(&self, immutable_id: &str, key: &str) -> Result<Option<Value>>;

    /// 写入附加数据；标识不能唯一对应一条记录时返回 `NotFound`
    fn set(&mut self, immutable_id: &str, key: &str, value: Value) -> Result<()>;
}
