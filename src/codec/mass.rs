//! # 物种质量归一化
//!
//! 将 `species[].mass` 由单个标量转换为与 `chemical_symbols` 对齐的列表：
//! - 两个符号且其一为 `vacancy`：在空位下标处插入 `0.0`
//! - 一个符号：包装为单元素列表
//! - 其他情况（两个及以上非空位符号）：无法确定每个元素的质量，置为 `null`
//!
//! 已是列表或为 `null` 的质量不做处理；`as_is` 模式下完全跳过。
//!
//! ## 依赖关系
//! - 被 `export/orchestrator.rs` 调用

use crate::derive::species::VACANCY_SYMBOL;
use crate::models::Document;

use log::debug;
use serde_json::{json, Value};

/// 对文档中的全部物种执行质量归一化
pub fn normalize_species_mass(document: &mut Document, as_is: bool) {
    if as_is {
        return;
    }

    let Some(Value::Array(species)) = document.get_mut("species") else {
        return;
    };

    for entry in species.iter_mut().filter_map(Value::as_object_mut) {
        let mass = match entry.get("mass") {
            Some(Value::Number(number)) => number.clone(),
            _ => continue,
        };

        let symbols: Vec<&str> = entry
            .get("chemical_symbols")
            .and_then(Value::as_array)
            .map(|symbols| symbols.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let normalized = match symbols.as_slice() {
            [_] => json!([mass]),
            [_, _] if symbols.contains(&VACANCY_SYMBOL) => {
                let vacancy_index = symbols
                    .iter()
                    .position(|symbol| *symbol == VACANCY_SYMBOL)
                    .unwrap_or(0);
                let mut masses = vec![Value::Number(mass)];
                masses.insert(vacancy_index, json!(0.0));
                Value::Array(masses)
            }
            _ => {
                debug!(
                    "Dropping scalar mass of species {:?}: ambiguous for symbols {:?}",
                    entry.get("name"),
                    symbols
                );
                Value::Null
            }
        };

        entry.insert("mass".to_string(), normalized);
    }
}
