//! # 内存记录存储
//!
//! 测试与小规模数据使用的内存游标和附加数据存储。

use super::{ExtrasStore, RecordCursor, RecordIter};
use crate::error::{CrystexError, Result};
use crate::models::{Document, RawStructureRecord};

use serde_json::Value;
use std::collections::HashMap;

/// 内存记录游标
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
    records: Vec<RawStructureRecord>,
}

impl MemoryCursor {
    pub fn new(records: Vec<RawStructureRecord>) -> Self {
        MemoryCursor { records }
    }
}

impl RecordCursor for MemoryCursor {
    fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn iterate(&self, _page_size: usize) -> Result<RecordIter<'_>> {
        Ok(Box::new(self.records.iter().cloned().map(Ok)))
    }
}

/// 内存附加数据存储
#[derive(Debug, Clone, Default)]
pub struct MemoryExtras {
    /// immutable_id → 记录数
    identities: HashMap<String, usize>,
    extras: HashMap<String, Document>,
}

impl MemoryExtras {
    /// 为给定记录集合建立附加数据存储
    pub fn for_records(records: &[RawStructureRecord]) -> Self {
        let mut identities = HashMap::new();
        for record in records {
            *identities.entry(record.immutable_id.clone()).or_insert(0) += 1;
        }
        MemoryExtras {
            identities,
            extras: HashMap::new(),
        }
    }

    /// 模拟记录从存储中消失；已有的附加数据保留
    pub fn remove_record(&mut self, immutable_id: &str) {
        self.identities.remove(immutable_id);
    }
}

impl ExtrasStore for MemoryExtras {
    fn get(&self, immutable_id: &str, key: &str) -> Result<Option<Value>> {
        Ok(self
            .extras
            .get(immutable_id)
            .and_then(|extras| extras.get(key))
            .cloned())
    }

    fn set(&mut self, immutable_id: &str, key: &str, value: Value) -> Result<()> {
        if self.identities.get(immutable_id) != Some(&1) {
            return Err(CrystexError::NotFound {
                immutable_id: immutable_id.to_string(),
            });
        }
        self.extras
            .entry(immutable_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::fixtures::*;
    use serde_json::json;

    #[test]
    fn test_cursor_yields_in_order() {
        let cursor = MemoryCursor::new(vec![pure_fe("1"), rock_salt("2")]);
        assert_eq!(cursor.count().unwrap(), 2);
        let ids: Vec<String> = cursor
            .iterate(1)
            .unwrap()
            .map(|r| r.unwrap().id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_extras_roundtrip() {
        let record = pure_fe("1");
        let mut extras = MemoryExtras::for_records(std::slice::from_ref(&record));
        assert_eq!(extras.get(&record.immutable_id, "k").unwrap(), None);
        extras.set(&record.immutable_id, "k", json!({"a": 1})).unwrap();
        assert_eq!(
            extras.get(&record.immutable_id, "k").unwrap(),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn test_set_requires_unique_identity() {
        let mut extras = MemoryExtras::for_records(&[pure_fe("1"), pure_fe("1")]);
        assert!(matches!(
            extras.set(&pure_fe("1").immutable_id, "k", json!(1)),
            Err(CrystexError::NotFound { .. })
        ));
        assert!(matches!(
            extras.set("missing", "k", json!(1)),
            Err(CrystexError::NotFound { .. })
        ));
    }
}
