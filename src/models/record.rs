//! # 原始结构记录模型
//!
//! 记录存储中的晶体结构原始数据：身份信息、kinds（占据模式）、sites（位点）、
//! 周期性边界与晶胞。该结构只读，生命周期长于单次导出。
//!
//! ## 依赖关系
//! - 被 `derive/`, `store/`, `export/` 使用
//! - 使用 `utils/tolerance.rs`

use crate::utils::tolerance;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 原子质量：单个标量，或每个化学符号一个值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mass {
    Scalar(f64),
    List(Vec<f64>),
}

/// Kind：一组位点共享的化学占据分布
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kind {
    pub name: String,
    pub chemical_symbols: Vec<String>,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub mass: Option<Mass>,
    /// 显式空位标记；缺省时按名称约定推断
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy: Option<bool>,
}

impl Kind {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, chemical_symbols: &[&str], weights: &[f64]) -> Self {
        Kind {
            name: name.into(),
            chemical_symbols: chemical_symbols.iter().map(|s| s.to_string()).collect(),
            weights: weights.to_vec(),
            mass: None,
            vacancy: None,
        }
    }

    #[cfg(test)]
    pub fn with_mass(mut self, mass: Mass) -> Self {
        self.mass = Some(mass);
        self
    }

    /// 占据权重之和
    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// 权重之和在容差外小于 1，即存在空位
    pub fn has_vacancies(&self) -> bool {
        tolerance::snap(1.0 - self.weight_sum()) > 0.0
    }
}

/// 位点：笛卡尔坐标（Å），分量可能未知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub kind_name: String,
    pub position: [Option<f64>; 3],
}

#[cfg(test)]
impl Site {
    pub fn new(kind_name: impl Into<String>, position: [f64; 3]) -> Self {
        Site {
            kind_name: kind_name.into(),
            position: position.map(Some),
        }
    }
}

/// 原始晶体结构记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStructureRecord {
    pub id: String,
    pub immutable_id: String,
    pub last_modified: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub kinds: Vec<Kind>,
    pub sites: Vec<Site>,
    pub pbc: [bool; 3],
    pub cell: [[f64; 3]; 3],
}

impl RawStructureRecord {
    /// 引用该 kind 的位点数
    pub fn site_count_of(&self, kind_name: &str) -> usize {
        self.sites
            .iter()
            .filter(|site| site.kind_name == kind_name)
            .count()
    }

    /// 按名称查找 kind
    pub fn kind(&self, name: &str) -> Option<&Kind> {
        self.kinds.iter().find(|kind| kind.name == name)
    }

    /// 是否有任何 kind 含空位
    pub fn has_vacancies(&self) -> bool {
        self.kinds.iter().any(Kind::has_vacancies)
    }
}
