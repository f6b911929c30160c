//! # 单条记录的属性缓存
//!
//! 每个派生属性对应一个 `OnceCell`，依赖图中的节点至多计算一次。
//! 若附加数据中已有上次持久化的负载，则优先取用其中的值，
//! 只有缺失的属性才会重新派生；新派生的属性由 `store_attributes`
//! 合并回附加数据。
//!
//! ## 依赖关系
//! - 被 `export/orchestrator.rs`, `commands/` 使用
//! - 使用 `derive/{formula,species,features}.rs`, `codec/`, `store/`

use super::formula::{self, SymbolWeights};
use super::{features, species, Attribute};
use crate::codec::decode_float_fields;
use crate::error::{CrystexError, Result};
use crate::models::{DerivedAttributes, Document, RawStructureRecord, Species, StructureFeature};
use crate::store::{ExtrasStore, ATTRIBUTES_KEY};
use crate::utils::tolerance;

use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::{OnceCell, RefCell};

/// 单条记录的派生属性缓存
pub struct AttributeCache {
    record: RawStructureRecord,
    prior: Option<Document>,
    fresh: RefCell<Vec<Attribute>>,

    weights: OnceCell<SymbolWeights>,
    partial_occupancy: OnceCell<bool>,

    elements: OnceCell<Vec<String>>,
    nelements: OnceCell<usize>,
    elements_ratios: OnceCell<Vec<f64>>,
    chemical_formula_descriptive: OnceCell<String>,
    chemical_formula_reduced: OnceCell<String>,
    chemical_formula_hill: OnceCell<Option<String>>,
    chemical_formula_anonymous: OnceCell<String>,
    dimension_types: OnceCell<[u8; 3]>,
    lattice_vectors: OnceCell<[[f64; 3]; 3]>,
    cartesian_site_positions: OnceCell<Vec<[Option<f64>; 3]>>,
    nsites: OnceCell<usize>,
    species_at_sites: OnceCell<Vec<String>>,
    species: OnceCell<Vec<Species>>,
    structure_features: OnceCell<Vec<StructureFeature>>,
}

impl AttributeCache {
    /// 不带历史负载的缓存
    #[cfg(test)]
    pub fn new(record: RawStructureRecord) -> Self {
        Self::with_prior(record, None)
    }

    fn with_prior(record: RawStructureRecord, prior: Option<Document>) -> Self {
        AttributeCache {
            record,
            prior,
            fresh: RefCell::new(Vec::new()),
            weights: OnceCell::new(),
            partial_occupancy: OnceCell::new(),
            elements: OnceCell::new(),
            nelements: OnceCell::new(),
            elements_ratios: OnceCell::new(),
            chemical_formula_descriptive: OnceCell::new(),
            chemical_formula_reduced: OnceCell::new(),
            chemical_formula_hill: OnceCell::new(),
            chemical_formula_anonymous: OnceCell::new(),
            dimension_types: OnceCell::new(),
            lattice_vectors: OnceCell::new(),
            cartesian_site_positions: OnceCell::new(),
            nsites: OnceCell::new(),
            species_at_sites: OnceCell::new(),
            species: OnceCell::new(),
            structure_features: OnceCell::new(),
        }
    }

    /// 加载记录及其已持久化的派生属性（浮点字段先解码）
    pub fn load(record: RawStructureRecord, extras: &dyn ExtrasStore) -> Result<Self> {
        let prior = match extras.get(&record.immutable_id, ATTRIBUTES_KEY)? {
            None | Some(Value::Null) => None,
            Some(Value::Object(mut payload)) => {
                decode_float_fields(&mut payload)?;
                Some(payload)
            }
            Some(other) => {
                return Err(CrystexError::IntegrityError(format!(
                    "stored attributes of record {} are not an object: {}",
                    record.immutable_id, other
                )))
            }
        };
        Ok(Self::with_prior(record, prior))
    }

    pub fn record(&self) -> &RawStructureRecord {
        &self.record
    }

    /// 本次新派生（未取自历史负载）的属性
    pub fn fresh_attributes(&self) -> Vec<Attribute> {
        self.fresh.borrow().clone()
    }

    fn reuse<T: DeserializeOwned>(&self, attribute: Attribute) -> Result<Option<T>> {
        let Some(value) = self
            .prior
            .as_ref()
            .and_then(|prior| prior.get(attribute.as_str()))
        else {
            return Ok(None);
        };

        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| {
                CrystexError::IntegrityError(format!(
                    "stored '{}' of record {} is unusable: {}",
                    attribute, self.record.immutable_id, e
                ))
            })
    }

    fn memo<'a, T: DeserializeOwned>(
        &'a self,
        attribute: Attribute,
        cell: &'a OnceCell<T>,
        compute: impl FnOnce() -> Result<T>,
    ) -> Result<&'a T> {
        if let Some(value) = cell.get() {
            return Ok(value);
        }

        let value = match self.reuse(attribute)? {
            Some(value) => value,
            None => {
                trace!(
                    "Deriving {} of record {} (depends on {:?}, {:?})",
                    attribute,
                    self.record.immutable_id,
                    attribute.dependencies(),
                    attribute.intermediates()
                );
                let value = compute()?;
                self.fresh.borrow_mut().push(attribute);
                value
            }
        };
        Ok(cell.get_or_init(|| value))
    }

    // ─────────────────────────────────────────────────────────────
    // 中间量
    // ─────────────────────────────────────────────────────────────

    fn symbol_weights(&self) -> &SymbolWeights {
        self.weights
            .get_or_init(|| formula::symbol_weights(&self.record))
    }

    /// 是否存在部分占据
    pub fn has_partial_occupancy(&self) -> bool {
        *self.partial_occupancy.get_or_init(|| {
            formula::has_partial_occupancy(&self.record, self.symbol_weights())
        })
    }

    // ─────────────────────────────────────────────────────────────
    // 化学组成
    // ─────────────────────────────────────────────────────────────

    pub fn elements(&self) -> Result<&Vec<String>> {
        self.memo(Attribute::Elements, &self.elements, || {
            Ok(formula::elements(self.symbol_weights()))
        })
    }

    pub fn nelements(&self) -> Result<usize> {
        self.memo(Attribute::Nelements, &self.nelements, || {
            Ok(self.elements()?.len())
        })
        .copied()
    }

    pub fn elements_ratios(&self) -> Result<&Vec<f64>> {
        self.memo(Attribute::ElementsRatios, &self.elements_ratios, || {
            formula::elements_ratios(self.symbol_weights(), self.elements()?)
        })
    }

    pub fn chemical_formula_descriptive(&self) -> Result<&String> {
        self.memo(
            Attribute::ChemicalFormulaDescriptive,
            &self.chemical_formula_descriptive,
            || {
                Ok(formula::chemical_formula_descriptive(
                    &self.record,
                    self.symbol_weights(),
                ))
            },
        )
    }

    pub fn chemical_formula_reduced(&self) -> Result<&String> {
        self.memo(
            Attribute::ChemicalFormulaReduced,
            &self.chemical_formula_reduced,
            || {
                Ok(formula::chemical_formula_reduced(
                    self.symbol_weights(),
                    self.elements()?,
                ))
            },
        )
    }

    pub fn chemical_formula_hill(&self) -> Result<&Option<String>> {
        self.memo(
            Attribute::ChemicalFormulaHill,
            &self.chemical_formula_hill,
            || {
                Ok(formula::chemical_formula_hill(
                    self.symbol_weights(),
                    self.elements()?,
                    self.has_partial_occupancy(),
                ))
            },
        )
    }

    pub fn chemical_formula_anonymous(&self) -> Result<&String> {
        self.memo(
            Attribute::ChemicalFormulaAnonymous,
            &self.chemical_formula_anonymous,
            || formula::chemical_formula_anonymous(self.symbol_weights(), self.elements()?),
        )
    }

    // ─────────────────────────────────────────────────────────────
    // 几何
    // ─────────────────────────────────────────────────────────────

    pub fn dimension_types(&self) -> Result<[u8; 3]> {
        self.memo(Attribute::DimensionTypes, &self.dimension_types, || {
            Ok(self.record.pbc.map(u8::from))
        })
        .copied()
    }

    pub fn lattice_vectors(&self) -> Result<&[[f64; 3]; 3]> {
        self.memo(Attribute::LatticeVectors, &self.lattice_vectors, || {
            Ok(tolerance::snap(self.record.cell))
        })
    }

    /// 位点坐标；NaN 分量视为未知
    pub fn cartesian_site_positions(&self) -> Result<&Vec<[Option<f64>; 3]>> {
        self.memo(
            Attribute::CartesianSitePositions,
            &self.cartesian_site_positions,
            || {
                Ok(self
                    .record
                    .sites
                    .iter()
                    .map(|site| {
                        tolerance::snap(
                            site.position
                                .map(|component| component.filter(|value| !value.is_nan())),
                        )
                    })
                    .collect())
            },
        )
    }

    pub fn nsites(&self) -> Result<usize> {
        self.memo(Attribute::Nsites, &self.nsites, || {
            Ok(self.cartesian_site_positions()?.len())
        })
        .copied()
    }

    pub fn species_at_sites(&self) -> Result<&Vec<String>> {
        self.memo(Attribute::SpeciesAtSites, &self.species_at_sites, || {
            Ok(self
                .record
                .sites
                .iter()
                .map(|site| site.kind_name.clone())
                .collect())
        })
    }

    // ─────────────────────────────────────────────────────────────
    // 物种与结构特征
    // ─────────────────────────────────────────────────────────────

    pub fn species(&self) -> Result<&Vec<Species>> {
        self.memo(Attribute::Species, &self.species, || {
            species::species(&self.record)
        })
    }

    pub fn structure_features(&self) -> Result<&Vec<StructureFeature>> {
        self.memo(Attribute::StructureFeatures, &self.structure_features, || {
            Ok(features::structure_features(
                self.species()?,
                self.cartesian_site_positions()?,
                self.has_partial_occupancy(),
            ))
        })
    }

    /// 按拓扑顺序求出全部属性并校验跨字段不变量
    pub fn finish(&self) -> Result<DerivedAttributes> {
        let attributes = DerivedAttributes {
            elements: self.elements()?.clone(),
            nelements: self.nelements()?,
            elements_ratios: self.elements_ratios()?.clone(),
            chemical_formula_descriptive: self.chemical_formula_descriptive()?.clone(),
            chemical_formula_reduced: self.chemical_formula_reduced()?.clone(),
            chemical_formula_hill: self.chemical_formula_hill()?.clone(),
            chemical_formula_anonymous: self.chemical_formula_anonymous()?.clone(),
            dimension_types: self.dimension_types()?,
            lattice_vectors: *self.lattice_vectors()?,
            cartesian_site_positions: self.cartesian_site_positions()?.clone(),
            nsites: self.nsites()?,
            species_at_sites: self.species_at_sites()?.clone(),
            species: self.species()?.clone(),
            structure_features: self.structure_features()?.clone(),
        };

        attributes.validate()?;
        Ok(attributes)
    }

    /// 将新派生的属性合并进附加数据（新值优先）并释放记录
    ///
    /// 没有新属性时也会写回，记录不再唯一存在时返回 `NotFound`。
    pub fn store_attributes(self, extras: &mut dyn ExtrasStore) -> Result<DerivedAttributes> {
        let attributes = self.finish()?;
        let fresh = self.fresh.into_inner();
        let immutable_id = self.record.immutable_id;

        let payload = attributes.to_payload()?;
        let mut merged = match extras.get(&immutable_id, ATTRIBUTES_KEY)? {
            Some(Value::Object(existing)) => existing,
            _ => Document::new(),
        };
        for attribute in &fresh {
            if let Some(value) = payload.get(attribute.as_str()) {
                merged.insert(attribute.as_str().to_string(), value.clone());
            }
        }

        debug!(
            "Storing {} new attribute(s) for record {}",
            fresh.len(),
            immutable_id
        );
        extras.set(&immutable_id, ATTRIBUTES_KEY, Value::Object(merged))?;
        Ok(attributes)
    }
}
