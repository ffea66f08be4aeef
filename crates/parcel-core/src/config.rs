//! 导线计算配置
//!
//! 单位换算系数（每单位米数）、捕捉与闭合差阈值、默认方位角记法。
//! 单位字段在文档中既可写数值，也可写单位关键字（如 `"foot_us"`）。

use crate::bearing::BearingFormat;
use crate::error::ConfigError;
use crate::units::{DistanceUnit, UnitContext};
use serde::{Deserialize, Deserializer, Serialize};

/// 单位系数：数值或单位关键字
#[derive(Deserialize)]
#[serde(untagged)]
enum FactorRepr {
    Number(f64),
    Keyword(String),
}

fn deserialize_factor<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match FactorRepr::deserialize(deserializer)? {
        FactorRepr::Number(value) => Ok(value),
        FactorRepr::Keyword(keyword) => parse_unit_keyword(&keyword).map_err(serde::de::Error::custom),
    }
}

/// 单位关键字转换为每单位米数
pub fn parse_unit_keyword(keyword: &str) -> Result<f64, ConfigError> {
    DistanceUnit::from_keyword(keyword.trim())
        .map(DistanceUnit::meters_per_unit)
        .ok_or_else(|| ConfigError::UnknownUnit(keyword.to_string()))
}

/// 导线计算配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverseConfig {
    /// 录入单位（每单位米数）
    #[serde(deserialize_with = "deserialize_factor")]
    pub entry_units_per_meter: f64,
    /// 输出（空间参考）单位
    #[serde(deserialize_with = "deserialize_factor")]
    pub output_units_per_meter: f64,
    /// 地图单位
    #[serde(deserialize_with = "deserialize_factor")]
    pub map_units_per_meter: f64,
    /// 捕捉搜索距离
    pub snap_tolerance: f64,
    /// 闭合差不超过此距离时自动平差
    pub misclose_distance_snap: f64,
    /// 精度比不低于此值时自动平差
    pub misclose_ratio_snap: f64,
    /// 导线统一的方位角记法
    pub bearing_format: BearingFormat,
}

impl Default for TraverseConfig {
    fn default() -> Self {
        Self {
            entry_units_per_meter: 1.0,
            output_units_per_meter: 1.0,
            map_units_per_meter: 1.0,
            snap_tolerance: 10.0,
            misclose_distance_snap: 5.0,
            misclose_ratio_snap: 5000.0,
            bearing_format: BearingFormat::Dms,
        }
    }
}

impl TraverseConfig {
    /// 检查数值合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let factors = [
            ("entry_units_per_meter", self.entry_units_per_meter),
            ("output_units_per_meter", self.output_units_per_meter),
            ("map_units_per_meter", self.map_units_per_meter),
        ];
        for (name, value) in factors {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidFactor { name, value });
            }
        }

        let thresholds = [
            ("snap_tolerance", self.snap_tolerance),
            ("misclose_distance_snap", self.misclose_distance_snap),
            ("misclose_ratio_snap", self.misclose_ratio_snap),
        ];
        for (name, value) in thresholds {
            if value < 0.0 || value.is_nan() {
                return Err(ConfigError::NegativeThreshold { name, value });
            }
        }
        Ok(())
    }

    /// 录入与输出单位的换算上下文
    pub fn units(&self) -> UnitContext {
        UnitContext::new(self.entry_units_per_meter, self.output_units_per_meter)
    }

    /// 空间参考修正系数：输出单位相对地图单位的比例
    ///
    /// 提供了 Web Mercator 比例修正（且不为 1）时改用该修正乘以输出单位。
    pub fn spatial_reference_scale(&self, web_mercator_scale: Option<f64>) -> f64 {
        match web_mercator_scale {
            Some(k) if k != 1.0 && k.is_finite() && k > 0.0 => k * self.output_units_per_meter,
            _ if self.map_units_per_meter > 0.0 => {
                self.output_units_per_meter / self.map_units_per_meter
            }
            _ => 1.0,
        }
    }
}
