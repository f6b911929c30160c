//! # 物种派生
//!
//! 每个 kind 生成一个物种记录；含空位的 kind 追加 `vacancy` 伪符号，
//! 其浓度为 `1 - sum(weights)`。
//!
//! 空位判定：优先使用 kind 上的显式 `vacancy` 标记；没有标记时沿用
//! 记录存储的命名约定（名称匹配 `^\w*X\d*`）。注意该约定会把 `Xe`
//! 这类名称也识别为空位。
//!
//! ## 依赖关系
//! - 被 `derive/cache.rs` 调用
//! - 使用 `models/`, `utils/tolerance.rs`

use crate::error::{CrystexError, Result};
use crate::models::{Kind, RawStructureRecord, Species};
use crate::utils::tolerance;

use regex::Regex;
use std::sync::OnceLock;

/// 空位伪符号
pub const VACANCY_SYMBOL: &str = "vacancy";

fn vacancy_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\w*X\d*").expect("vacancy name pattern is valid"))
}

/// 判断 kind 是否包含空位
pub fn is_vacancy_kind(kind: &Kind) -> bool {
    kind.vacancy
        .unwrap_or_else(|| vacancy_name_pattern().is_match(&kind.name))
}

/// 派生所有物种
pub fn species(record: &RawStructureRecord) -> Result<Vec<Species>> {
    record.kinds.iter().map(species_of_kind).collect()
}

fn species_of_kind(kind: &Kind) -> Result<Species> {
    let mut species = Species {
        name: kind.name.clone(),
        chemical_symbols: kind.chemical_symbols.clone(),
        concentration: kind.weights.clone(),
        mass: kind.mass.clone(),
        original_name: kind.name.clone(),
    };

    if is_vacancy_kind(kind) {
        let remainder = tolerance::snap(1.0 - kind.weight_sum());
        if !(0.0..=1.0).contains(&remainder) {
            return Err(CrystexError::RangeError {
                species: kind.name.clone(),
                value: remainder,
            });
        }
        species.chemical_symbols.push(VACANCY_SYMBOL.to_string());
        species.concentration.push(remainder);
    }

    Ok(species)
}
