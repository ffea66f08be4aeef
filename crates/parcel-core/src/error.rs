//! 计算引擎错误定义
//!
//! 构建错误不会中断计算，而是作为数据随结果返回。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 导线构建过程中的可恢复问题
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BuildError {
    #[error("course {index}: from point {from_id} has not been computed")]
    MissingFromPoint { index: usize, from_id: u32 },

    #[error("course {index}: zero length")]
    ZeroLength { index: usize },

    #[error("course {index}: coordinate is not finite")]
    NonFinite { index: usize },
}

impl BuildError {
    /// 出问题的边序号
    pub fn course_index(&self) -> usize {
        match *self {
            BuildError::MissingFromPoint { index, .. } => index,
            BuildError::ZeroLength { index } => index,
            BuildError::NonFinite { index } => index,
        }
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidFactor { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    NegativeThreshold { name: &'static str, value: f64 },

    #[error("unknown unit keyword: {0}")]
    UnknownUnit(String),
}
