//! # 结构特征检测
//!
//! 只有存在部分占据时才会报告特征：
//! - `disorder`：某个物种含多于一个化学符号（含 `vacancy`）
//! - `unknown_positions`：某个位点坐标分量未知
//!
//! ## 依赖关系
//! - 被 `derive/cache.rs` 调用

use crate::models::{Species, StructureFeature};

/// 检测结构特征，结果按固定顺序排列
pub fn structure_features(
    species: &[Species],
    positions: &[[Option<f64>; 3]],
    partial_occupancy: bool,
) -> Vec<StructureFeature> {
    let mut features = Vec::new();
    if !partial_occupancy {
        return features;
    }

    if species.iter().any(|s| s.chemical_symbols.len() > 1) {
        features.push(StructureFeature::Disorder);
    }

    if positions
        .iter()
        .flatten()
        .any(|component| component.is_none())
    {
        features.push(StructureFeature::UnknownPositions);
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(symbols: &[&str]) -> Species {
        Species {
            name: symbols.concat(),
            chemical_symbols: symbols.iter().map(|s| s.to_string()).collect(),
            concentration: vec![1.0 / symbols.len() as f64; symbols.len()],
            mass: None,
            original_name: symbols.concat(),
        }
    }

    #[test]
    fn test_no_features_without_partial_occupancy() {
        let features = structure_features(
            &[species(&["Fe", "Ni"])],
            &[[Some(0.0), None, Some(0.0)]],
            false,
        );
        assert!(features.is_empty());
    }

    #[test]
    fn test_disorder() {
        let features = structure_features(
            &[species(&["Fe"]), species(&["Fe", "vacancy"])],
            &[[Some(0.0); 3]],
            true,
        );
        assert_eq!(features, vec![StructureFeature::Disorder]);
    }

    #[test]
    fn test_unknown_positions() {
        let features = structure_features(
            &[species(&["Fe"])],
            &[[Some(0.0); 3], [Some(1.0), Some(1.0), None]],
            true,
        );
        assert_eq!(features, vec![StructureFeature::UnknownPositions]);
    }

    #[test]
    fn test_both_features() {
        let features = structure_features(&[species(&["Cu", "Au"])], &[[None; 3]], true);
        assert_eq!(
            features,
            vec![StructureFeature::Disorder, StructureFeature::UnknownPositions]
        );
    }
}
