//! # show 命令实现
//!
//! 派生单条结构的属性并以表格显示（浮点字段已解码）。
//!
//! ## 依赖关系
//! - 使用 `cli/show.rs` 定义的参数
//! - 使用 `store/`, `derive/`, `codec/`, `utils/`

use crate::cli::show::ShowArgs;
use crate::codec::decode_float_fields;
use crate::derive::{Attribute, AttributeCache};
use crate::error::{CrystexError, Result};
use crate::models::{Document, RawStructureRecord};
use crate::store::{JsonlStore, RecordCursor, DEFAULT_PAGE_SIZE};
use crate::utils::output::Console;

use serde_json::Value;
use tabled::{Table, Tabled};

/// 属性表行
#[derive(Debug, Clone, Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    attribute: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: &'static str,
}

/// 执行 show 命令
pub fn execute(args: ShowArgs) -> Result<()> {
    let console = Console::default();
    let JsonlStore { cursor, extras } = JsonlStore::open(&args.store)?;

    let record = find_unique(&cursor, &args.immutable_id)?;
    console.header(&format!("Structure {} (id {})", record.immutable_id, record.id));

    let cache = AttributeCache::load(record, &extras)?;
    let attributes = cache.finish()?;
    let fresh = cache.fresh_attributes();

    let mut payload = attributes.to_payload()?;
    decode_float_fields(&mut payload)?;

    console.block(Table::new(attribute_rows(&payload, &fresh)));
    console.info(&format!(
        "Partial occupancy: {}",
        if cache.has_partial_occupancy() { "yes" } else { "no" }
    ));
    Ok(())
}

/// 按 immutable_id 查找唯一的一条记录
fn find_unique(cursor: &dyn RecordCursor, immutable_id: &str) -> Result<RawStructureRecord> {
    let mut found = None;
    for record in cursor.iterate(DEFAULT_PAGE_SIZE)? {
        let record = record?;
        if record.immutable_id != immutable_id {
            continue;
        }
        if found.is_some() {
            return Err(CrystexError::NotFound {
                immutable_id: immutable_id.to_string(),
            });
        }
        found = Some(record);
    }

    found.ok_or_else(|| CrystexError::NotFound {
        immutable_id: immutable_id.to_string(),
    })
}

fn attribute_rows(payload: &Document, fresh: &[Attribute]) -> Vec<AttributeRow> {
    Attribute::ALL
        .iter()
        .map(|attribute| AttributeRow {
            attribute: attribute.as_str(),
            value: payload
                .get(attribute.as_str())
                .map(Value::to_string)
                .unwrap_or_else(|| "-".to_string()),
            source: if fresh.contains(attribute) {
                "derived"
            } else {
                "stored"
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::fixtures::*;
    use crate::store::memory::MemoryCursor;

    #[test]
    fn test_find_unique() {
        let cursor = MemoryCursor::new(vec![pure_fe("1"), rock_salt("2"), rock_salt("2")]);
        assert_eq!(find_unique(&cursor, &pure_fe("1").immutable_id).unwrap().id, "1");
        assert!(matches!(
            find_unique(&cursor, &rock_salt("2").immutable_id),
            Err(CrystexError::NotFound { .. })
        ));
        assert!(matches!(
            find_unique(&cursor, "missing"),
            Err(CrystexError::NotFound { .. })
        ));
    }

    #[test]
    fn test_rows_follow_attribute_order() {
        let cache = AttributeCache::new(rock_salt("1"));
        let mut payload = cache.finish().unwrap().to_payload().unwrap();
        decode_float_fields(&mut payload).unwrap();

        let rows = attribute_rows(&payload, &cache.fresh_attributes());
        assert_eq!(rows.len(), Attribute::ALL.len());
        assert_eq!(rows[0].attribute, "elements");
        assert_eq!(rows[0].value, r#"["Cl","Na"]"#);
        assert_eq!(rows[2].value, "[0.5,0.5]");
        assert!(rows.iter().all(|row| row.source == "derived"));
    }
}
