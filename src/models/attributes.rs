//! # 派生属性模型
//!
//! 每条记录派生出的标准化属性集合（元素、比例、四种化学式、周期性、
//! 晶格、位点、物种与结构特征），以及导出用的 JSON 文档类型。
//!
//! ## 依赖关系
//! - 被 `derive/cache.rs` 构建
//! - 被 `export/`, `commands/show.rs` 使用
//! - 使用 `codec/floats.rs` 生成持久化形式

use crate::codec::floats::{encode_floats, FLOAT_FIELDS};
use crate::error::{CrystexError, Result};
use crate::models::record::Mass;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 导出 / 持久化使用的 JSON 对象
pub type Document = serde_json::Map<String, Value>;

/// 结构特征标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureFeature {
    Disorder,
    UnknownPositions,
}

impl std::fmt::Display for StructureFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructureFeature::Disorder => write!(f, "disorder"),
            StructureFeature::UnknownPositions => write!(f, "unknown_positions"),
        }
    }
}

/// 物种：一个 kind 的化学占据描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    pub chemical_symbols: Vec<String>,
    pub concentration: Vec<f64>,
    pub mass: Option<Mass>,
    pub original_name: String,
}

/// 一条记录的完整派生属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedAttributes {
    pub elements: Vec<String>,
    pub nelements: usize,
    pub elements_ratios: Vec<f64>,
    pub chemical_formula_descriptive: String,
    pub chemical_formula_reduced: String,
    pub chemical_formula_hill: Option<String>,
    pub chemical_formula_anonymous: String,
    pub dimension_types: [u8; 3],
    pub lattice_vectors: [[f64; 3]; 3],
    pub cartesian_site_positions: Vec<[Option<f64>; 3]>,
    pub nsites: usize,
    pub species_at_sites: Vec<String>,
    pub species: Vec<Species>,
    pub structure_features: Vec<StructureFeature>,
}

impl DerivedAttributes {
    /// 校验跨字段不变量
    pub fn validate(&self) -> Result<()> {
        if self.nelements != self.elements.len() {
            return Err(CrystexError::IntegrityError(format!(
                "nelements ({}) does not match the number of elements ({})",
                self.nelements,
                self.elements.len()
            )));
        }

        if self.elements_ratios.len() != self.elements.len() {
            return Err(CrystexError::IntegrityError(format!(
                "elements_ratios has {} entries for {} elements",
                self.elements_ratios.len(),
                self.elements.len()
            )));
        }

        if self.nsites != self.cartesian_site_positions.len() {
            return Err(CrystexError::IntegrityError(format!(
                "nsites ({}) does not match the number of cartesian_site_positions ({})",
                self.nsites,
                self.cartesian_site_positions.len()
            )));
        }

        if self.nsites != self.species_at_sites.len() {
            return Err(CrystexError::IntegrityError(format!(
                "nsites ({}) does not match the number of species_at_sites ({})",
                self.nsites,
                self.species_at_sites.len()
            )));
        }

        for species in &self.species {
            if species.chemical_symbols.len() != species.concentration.len() {
                return Err(CrystexError::IntegrityError(format!(
                    "species '{}' has {} chemical_symbols but {} concentration values",
                    species.name,
                    species.chemical_symbols.len(),
                    species.concentration.len()
                )));
            }
        }

        if let Some(site) = self
            .species_at_sites
            .iter()
            .find(|name| !self.species.iter().any(|s| &s.name == *name))
        {
            return Err(CrystexError::IntegrityError(format!(
                "site species '{}' is not declared in species",
                site
            )));
        }

        Ok(())
    }

    /// 持久化形式：浮点字段编码为十六进制字符串
    pub fn to_payload(&self) -> Result<Document> {
        let mut document = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            other => {
                return Err(CrystexError::Other(format!(
                    "derived attributes serialized to a non-object: {}",
                    other
                )))
            }
        };

        for field in FLOAT_FIELDS {
            if let Some(value) = document.get_mut(*field) {
                *value = encode_floats(value);
            }
        }

        Ok(document)
    }
}
