//! # 化学式派生
//!
//! 由 kinds 与 sites 聚合元素占据量，计算元素列表、元素比例，
//! 以及四种化学式表示（描述式、约化式、Hill 式、匿名式）。
//!
//! ## 规则
//! - 聚合占据量：`weights[i] × 该 kind 的位点数`，按符号累加
//! - 化学式中的计量数取四舍五入（偶数舍入）后的整数，0 与 1 不写出
//! - 匿名式只省略计量数 1，标签序列 A..Z, Aa..Za, Ab..Zb, ...
//!
//! ## 依赖关系
//! - 被 `derive/cache.rs` 调用
//! - 使用 `models/record.rs`, `utils/tolerance.rs`

use crate::error::{CrystexError, Result};
use crate::models::RawStructureRecord;
use crate::utils::tolerance;

use std::collections::BTreeMap;

/// 记录存储中代表空位的元素符号
pub const VACANCY_MARKER: &str = "X";

/// 匿名标签最多可区分的元素数 (26 + 26 × 26)
pub const MAX_ANONYMOUS_ELEMENTS: usize = 702;

const UPPERCASE: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// 元素符号 → 聚合占据量（按符号排序）
pub type SymbolWeights = BTreeMap<String, f64>;

/// 聚合每个符号的占据量
pub fn symbol_weights(record: &RawStructureRecord) -> SymbolWeights {
    let mut occupation: SymbolWeights = record
        .kinds
        .iter()
        .flat_map(|kind| kind.chemical_symbols.iter())
        .map(|symbol| (symbol.clone(), 0.0))
        .collect();

    for kind in &record.kinds {
        let number_of_sites = record.site_count_of(&kind.name) as f64;
        for (symbol, weight) in kind.chemical_symbols.iter().zip(&kind.weights) {
            if let Some(total) = occupation.get_mut(symbol) {
                *total += weight * number_of_sites;
            }
        }
    }

    occupation
}

/// 是否存在部分占据：先看空位，再看聚合占据量是否为整数
pub fn has_partial_occupancy(record: &RawStructureRecord, weights: &SymbolWeights) -> bool {
    record.has_vacancies() || weights.values().any(|weight| weight.fract() != 0.0)
}

/// 按字母排序的元素列表，不含空位标记
pub fn elements(weights: &SymbolWeights) -> Vec<String> {
    weights
        .keys()
        .filter(|symbol| symbol.as_str() != VACANCY_MARKER)
        .cloned()
        .collect()
}

/// 各元素占总占据量的比例，与 `elements` 顺序对齐；必须在容差内和为 1
pub fn elements_ratios(weights: &SymbolWeights, elements: &[String]) -> Result<Vec<f64>> {
    let total_weight: f64 = weights.values().sum();
    let ratios: Vec<f64> = elements
        .iter()
        .map(|symbol| weights.get(symbol).copied().unwrap_or(0.0) / total_weight)
        .collect();

    let sum: f64 = ratios.iter().sum();
    if !tolerance::is_zero(1.0 - sum) {
        return Err(CrystexError::deduction(
            "elements_ratios",
            format!("calculated ratios do not sum to 1: {}", sum),
        ));
    }

    Ok(ratios)
}

/// 占据量取整（偶数舍入）
pub fn rounded_weight(weight: f64) -> i64 {
    weight.round_ties_even() as i64
}

/// 单个 "符号 + 计量数" 项
fn term(symbol: &str, count: i64, omit_zero: bool) -> String {
    if count == 1 || (omit_zero && count == 0) {
        symbol.to_string()
    } else {
        format!("{}{}", symbol, count)
    }
}

fn formula_in_order<'a>(
    symbols: impl IntoIterator<Item = &'a String>,
    weights: &SymbolWeights,
) -> String {
    symbols
        .into_iter()
        .map(|symbol| {
            let count = rounded_weight(weights.get(symbol).copied().unwrap_or(0.0));
            term(symbol, count, true)
        })
        .collect()
}

/// 约化化学式：元素按字母排序
pub fn chemical_formula_reduced(weights: &SymbolWeights, elements: &[String]) -> String {
    formula_in_order(elements, weights)
}

/// Hill 化学式：含 C 时 C、H 在前，其余按字母；部分占据时为 None
pub fn chemical_formula_hill(
    weights: &SymbolWeights,
    elements: &[String],
    partial_occupancy: bool,
) -> Option<String> {
    if partial_occupancy {
        return None;
    }
    Some(formula_in_order(hill_order(elements), weights))
}

/// Hill 排序
pub fn hill_order(elements: &[String]) -> Vec<&String> {
    let has_carbon = elements.iter().any(|e| e == "C");
    if !has_carbon {
        return elements.iter().collect();
    }

    let mut ordered: Vec<&String> = Vec::with_capacity(elements.len());
    ordered.extend(elements.iter().filter(|e| *e == "C"));
    ordered.extend(elements.iter().filter(|e| *e == "H"));
    ordered.extend(elements.iter().filter(|e| *e != "C" && *e != "H"));
    ordered
}

/// 描述化学式：按存储顺序（位点遍历中首次出现的顺序）
pub fn chemical_formula_descriptive(record: &RawStructureRecord, weights: &SymbolWeights) -> String {
    let mut order: Vec<&String> = Vec::new();

    let kinds_by_site = record
        .sites
        .iter()
        .filter_map(|site| record.kind(&site.kind_name));
    for kind in kinds_by_site.chain(record.kinds.iter()) {
        for symbol in &kind.chemical_symbols {
            if symbol != VACANCY_MARKER && !order.contains(&symbol) {
                order.push(symbol);
            }
        }
    }

    formula_in_order(order, weights)
}

/// 第 index 个匿名标签
pub fn anonymous_label(index: usize) -> String {
    let mut label = String::with_capacity(2);
    label.push(UPPERCASE[index % 26] as char);
    if index >= 26 {
        label.push(LOWERCASE[((index - 26) / 26) % 26] as char);
    }
    label
}

/// 匿名化学式：元素按 `elements` 顺序替换为匿名标签
pub fn chemical_formula_anonymous(weights: &SymbolWeights, elements: &[String]) -> Result<String> {
    if elements.len() > MAX_ANONYMOUS_ELEMENTS {
        return Err(CrystexError::deduction(
            "chemical_formula_anonymous",
            format!(
                "{} elements exceed the {} available anonymous labels",
                elements.len(),
                MAX_ANONYMOUS_ELEMENTS
            ),
        ));
    }

    Ok(elements
        .iter()
        .enumerate()
        .map(|(index, symbol)| {
            let count = rounded_weight(weights.get(symbol).copied().unwrap_or(0.0));
            term(&anonymous_label(index), count, false)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::fixtures::*;
    use crate::models::record::Site;
    use crate::models::Kind;
    use proptest::prelude::*;

    fn weights_of(pairs: &[(&str, f64)]) -> SymbolWeights {
        pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect()
    }

    fn names(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_symbol_weights_counts_sites() {
        let rec = record(
            "1",
            vec![
                Kind::new("Ti", &["Ti"], &[1.0]),
                Kind::new("O", &["O"], &[1.0]),
            ],
            vec![
                Site::new("Ti", [0.0, 0.0, 0.0]),
                Site::new("O", [0.5, 0.5, 0.0]),
                Site::new("O", [0.5, 0.0, 0.5]),
            ],
        );
        let weights = symbol_weights(&rec);
        assert_eq!(weights["Ti"], 1.0);
        assert_eq!(weights["O"], 2.0);
    }

    #[test]
    fn test_symbol_weights_shared_symbol_across_kinds() {
        let rec = record(
            "1",
            vec![
                Kind::new("Fe1", &["Fe"], &[1.0]),
                Kind::new("FeNi", &["Fe", "Ni"], &[0.25, 0.75]),
            ],
            vec![
                Site::new("Fe1", [0.0, 0.0, 0.0]),
                Site::new("FeNi", [0.5, 0.5, 0.5]),
                Site::new("FeNi", [0.5, 0.0, 0.0]),
            ],
        );
        let weights = symbol_weights(&rec);
        assert!((weights["Fe"] - 1.5).abs() < 1e-12);
        assert!((weights["Ni"] - 1.5).abs() < 1e-12);
        assert!(has_partial_occupancy(&rec, &weights));
    }

    #[test]
    fn test_partial_occupancy() {
        let fe = pure_fe("1");
        assert!(!has_partial_occupancy(&fe, &symbol_weights(&fe)));

        let vacancy = fe_with_vacancy("2");
        assert!(has_partial_occupancy(&vacancy, &symbol_weights(&vacancy)));
    }

    #[test]
    fn test_elements_excludes_vacancy_marker() {
        let weights = weights_of(&[("X", 1.0), ("Na", 1.0), ("Cl", 1.0)]);
        assert_eq!(elements(&weights), names(&["Cl", "Na"]));
    }

    #[test]
    fn test_elements_ratios() {
        let weights = weights_of(&[("Ti", 1.0), ("O", 2.0)]);
        let ratios = elements_ratios(&weights, &elements(&weights)).unwrap();
        assert!((ratios[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((ratios[1] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_elements_ratios_deduction_error() {
        // 空位标记计入总量却不计入元素，比例之和不为 1
        let weights = weights_of(&[("X", 1.0), ("Fe", 1.0)]);
        let result = elements_ratios(&weights, &elements(&weights));
        assert!(matches!(result, Err(CrystexError::DeductionError { .. })));
    }

    #[test]
    fn test_elements_ratios_empty_structure() {
        let weights = SymbolWeights::new();
        assert!(elements_ratios(&weights, &[]).is_err());
    }

    #[test]
    fn test_reduced_formula_omits_zero_and_one() {
        let weights = weights_of(&[("O", 2.0), ("Ti", 1.0)]);
        assert_eq!(chemical_formula_reduced(&weights, &elements(&weights)), "O2Ti");

        let weights = weights_of(&[("Fe", 0.5)]);
        assert_eq!(chemical_formula_reduced(&weights, &elements(&weights)), "Fe");
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        assert_eq!(rounded_weight(0.5), 0);
        assert_eq!(rounded_weight(1.5), 2);
        assert_eq!(rounded_weight(2.5), 2);
        assert_eq!(rounded_weight(2.6), 3);
    }

    #[test]
    fn test_hill_formula_carbon_first() {
        let weights = weights_of(&[("C", 2.0), ("H", 6.0), ("O", 1.0), ("Br", 1.0)]);
        let elements = elements(&weights);
        assert_eq!(
            chemical_formula_hill(&weights, &elements, false).as_deref(),
            Some("C2H6BrO")
        );
    }

    #[test]
    fn test_hill_formula_without_carbon_is_alphabetical() {
        let weights = weights_of(&[("H", 2.0), ("O", 1.0), ("S", 1.0)]);
        let elements = elements(&weights);
        assert_eq!(
            chemical_formula_hill(&weights, &elements, false).as_deref(),
            Some("H2OS")
        );
        assert_eq!(chemical_formula_hill(&weights, &elements, true), None);
    }

    #[test]
    fn test_descriptive_formula_follows_storage_order() {
        let rec = record(
            "1",
            vec![
                Kind::new("Ti", &["Ti"], &[1.0]),
                Kind::new("O", &["O"], &[1.0]),
                Kind::new("Sr", &["Sr"], &[1.0]),
            ],
            vec![
                Site::new("Sr", [0.0, 0.0, 0.0]),
                Site::new("Ti", [0.5, 0.5, 0.5]),
                Site::new("O", [0.5, 0.5, 0.0]),
                Site::new("O", [0.5, 0.0, 0.5]),
                Site::new("O", [0.0, 0.5, 0.5]),
            ],
        );
        let weights = symbol_weights(&rec);
        assert_eq!(chemical_formula_descriptive(&rec, &weights), "SrTiO3");
    }

    #[test]
    fn test_anonymous_labels() {
        assert_eq!(anonymous_label(0), "A");
        assert_eq!(anonymous_label(25), "Z");
        assert_eq!(anonymous_label(26), "Aa");
        assert_eq!(anonymous_label(51), "Za");
        assert_eq!(anonymous_label(52), "Ab");
        assert_eq!(anonymous_label(701), "Zz");
    }

    #[test]
    fn test_anonymous_formula() {
        let weights = weights_of(&[("O", 2.0), ("Ti", 1.0)]);
        assert_eq!(
            chemical_formula_anonymous(&weights, &elements(&weights)).unwrap(),
            "A2B"
        );

        let weights = weights_of(&[("Fe", 1.0)]);
        assert_eq!(
            chemical_formula_anonymous(&weights, &elements(&weights)).unwrap(),
            "A"
        );
    }

    #[test]
    fn test_anonymous_formula_many_elements() {
        let symbols: Vec<String> = (0..53).map(|i| format!("E{:03}", i)).collect();
        let weights: SymbolWeights = symbols.iter().map(|s| (s.clone(), 1.0)).collect();
        let formula = chemical_formula_anonymous(&weights, &symbols).unwrap();
        assert!(formula.starts_with("ABCDEFGHIJKLMNOPQRSTUVWXYZAaBa"));
        assert!(formula.ends_with("ZaAb"));
    }

    #[test]
    fn test_anonymous_formula_too_many_elements() {
        let symbols: Vec<String> = (0..703).map(|i| format!("E{:04}", i)).collect();
        let weights: SymbolWeights = symbols.iter().map(|s| (s.clone(), 1.0)).collect();
        assert!(matches!(
            chemical_formula_anonymous(&weights, &symbols),
            Err(CrystexError::DeductionError { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_elements_sorted_unique_and_ratios_sum_to_one(
            counts in proptest::collection::btree_map("[A-WYZ][a-z]?", 1usize..8, 1..12)
        ) {
            let kinds: Vec<Kind> = counts
                .keys()
                .map(|symbol| Kind::new(symbol.as_str(), &[symbol.as_str()], &[1.0]))
                .collect();
            let sites: Vec<Site> = counts
                .iter()
                .flat_map(|(symbol, n)| (0..*n).map(move |i| Site::new(symbol.as_str(), [i as f64, 0.0, 0.0])))
                .collect();
            let rec = record("p", kinds, sites);

            let weights = symbol_weights(&rec);
            let elements = elements(&weights);
            prop_assert!(elements.windows(2).all(|pair| pair[0] < pair[1]));
            prop_assert!(!elements.iter().any(|e| e == VACANCY_MARKER));

            let ratios = elements_ratios(&weights, &elements).unwrap();
            prop_assert_eq!(ratios.len(), elements.len());
            prop_assert!(tolerance::is_zero(1.0 - ratios.iter().sum::<f64>()));

            let reduced = chemical_formula_reduced(&weights, &elements);
            let token = regex::Regex::new(r"([A-Z][a-z]*)(\d*)").unwrap();
            for capture in token.captures_iter(&reduced) {
                prop_assert_ne!(&capture[2], "1");
                let count = if capture[2].is_empty() { 1 } else { capture[2].parse::<usize>().unwrap() };
                prop_assert_eq!(count, counts[&capture[1]]);
            }
        }
    }
}
