//! # 属性派生模块
//!
//! 由原始结构记录派生标准化属性。每个属性是依赖图中的一个节点，
//! 每条记录内至多计算一次（见 `cache.rs`）。
//!
//! ## 依赖图
//! 方括号为不输出的中间量，`partial_occupancy` 依赖 `symbol_weights`。
//! ```text
//! [symbol_weights] ──┬── elements ──┬── nelements
//!                    │              ├── elements_ratios ◄── [symbol_weights]
//!                    │              ├── chemical_formula_reduced ◄── [symbol_weights]
//!                    │              ├── chemical_formula_hill ◄── [symbol_weights], [partial_occupancy]
//!                    │              └── chemical_formula_anonymous ◄── [symbol_weights]
//!                    └── chemical_formula_descriptive
//! cartesian_site_positions ──┬── nsites
//!                            └── structure_features ◄── species, [partial_occupancy]
//! ```
//!
//! ## 依赖关系
//! - 被 `export/`, `commands/` 使用
//! - 子模块: cache, features, formula, species

pub mod cache;
pub mod features;
pub mod formula;
pub mod species;

pub use cache::AttributeCache;

use std::fmt;

/// 多个属性共享、但不单独输出的中间量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intermediate {
    SymbolWeights,
    PartialOccupancy,
}

/// 派生属性，按拓扑顺序声明
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Elements,
    Nelements,
    ElementsRatios,
    ChemicalFormulaDescriptive,
    ChemicalFormulaReduced,
    ChemicalFormulaHill,
    ChemicalFormulaAnonymous,
    DimensionTypes,
    LatticeVectors,
    CartesianSitePositions,
    Nsites,
    SpeciesAtSites,
    Species,
    StructureFeatures,
}

impl Attribute {
    /// 全部属性；任何属性都排在它的依赖之后
    pub const ALL: [Attribute; 14] = [
        Attribute::Elements,
        Attribute::Nelements,
        Attribute::ElementsRatios,
        Attribute::ChemicalFormulaDescriptive,
        Attribute::ChemicalFormulaReduced,
        Attribute::ChemicalFormulaHill,
        Attribute::ChemicalFormulaAnonymous,
        Attribute::DimensionTypes,
        Attribute::LatticeVectors,
        Attribute::CartesianSitePositions,
        Attribute::Nsites,
        Attribute::SpeciesAtSites,
        Attribute::Species,
        Attribute::StructureFeatures,
    ];

    /// 输出 / 持久化负载中的字段名
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Elements => "elements",
            Attribute::Nelements => "nelements",
            Attribute::ElementsRatios => "elements_ratios",
            Attribute::ChemicalFormulaDescriptive => "chemical_formula_descriptive",
            Attribute::ChemicalFormulaReduced => "chemical_formula_reduced",
            Attribute::ChemicalFormulaHill => "chemical_formula_hill",
            Attribute::ChemicalFormulaAnonymous => "chemical_formula_anonymous",
            Attribute::DimensionTypes => "dimension_types",
            Attribute::LatticeVectors => "lattice_vectors",
            Attribute::CartesianSitePositions => "cartesian_site_positions",
            Attribute::Nsites => "nsites",
            Attribute::SpeciesAtSites => "species_at_sites",
            Attribute::Species => "species",
            Attribute::StructureFeatures => "structure_features",
        }
    }

    /// 直接依赖的其他属性
    pub fn dependencies(&self) -> &'static [Attribute] {
        match self {
            Attribute::Nelements
            | Attribute::ElementsRatios
            | Attribute::ChemicalFormulaReduced
            | Attribute::ChemicalFormulaHill
            | Attribute::ChemicalFormulaAnonymous => &[Attribute::Elements],
            Attribute::Nsites => &[Attribute::CartesianSitePositions],
            Attribute::StructureFeatures => {
                &[Attribute::Species, Attribute::CartesianSitePositions]
            }
            _ => &[],
        }
    }

    /// 直接依赖的中间量
    pub fn intermediates(&self) -> &'static [Intermediate] {
        match self {
            Attribute::Elements
            | Attribute::ElementsRatios
            | Attribute::ChemicalFormulaDescriptive
            | Attribute::ChemicalFormulaReduced
            | Attribute::ChemicalFormulaAnonymous => &[Intermediate::SymbolWeights],
            Attribute::ChemicalFormulaHill => {
                &[Intermediate::SymbolWeights, Intermediate::PartialOccupancy]
            }
            Attribute::StructureFeatures => &[Intermediate::PartialOccupancy],
            _ => &[],
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
