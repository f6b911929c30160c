//! # 浮点容差工具
//!
//! 将绝对值小于 epsilon 的浮点数归零，递归作用于向量与矩阵并保持结构。
//! 所有几何派生（晶格向量、笛卡尔坐标）以及比例求和校验都经过这里。
//!
//! ## 依赖关系
//! - 被 `derive/`, `models/record.rs` 使用
//! - 无外部模块依赖

/// 默认容差：1e-8 Å 可以视为 0 Å
pub const EPSILON: f64 = 1e-8;

/// 可以"近零归零"的数值结构
pub trait SnapNearZero: Sized {
    fn snap_near_zero_with(self, epsilon: f64) -> Self;

    fn snap_near_zero(self) -> Self {
        self.snap_near_zero_with(EPSILON)
    }
}

impl SnapNearZero for f64 {
    fn snap_near_zero_with(self, epsilon: f64) -> Self {
        if self.abs() < epsilon {
            0.0
        } else {
            self
        }
    }
}

impl<T: SnapNearZero> SnapNearZero for Option<T> {
    fn snap_near_zero_with(self, epsilon: f64) -> Self {
        self.map(|value| value.snap_near_zero_with(epsilon))
    }
}

impl<T: SnapNearZero, const N: usize> SnapNearZero for [T; N] {
    fn snap_near_zero_with(self, epsilon: f64) -> Self {
        self.map(|value| value.snap_near_zero_with(epsilon))
    }
}

impl<T: SnapNearZero> SnapNearZero for Vec<T> {
    fn snap_near_zero_with(self, epsilon: f64) -> Self {
        self.into_iter()
            .map(|value| value.snap_near_zero_with(epsilon))
            .collect()
    }
}

/// 使用默认容差归零
pub fn snap<T: SnapNearZero>(value: T) -> T {
    value.snap_near_zero()
}

/// 判断数值在默认容差下是否为 0
pub fn is_zero(value: f64) -> bool {
    snap(value) == 0.0
}
