//! 距离单位解析
//!
//! 输入文本可带单位后缀，如 `100.5ft`、`20ch`、`12"`。单位部分从第一个字母
//! （或引号）开始，大小写不敏感。换算系数统一表示为“每单位的米数”。

use serde::{Deserialize, Serialize};

/// 美国测量英尺（米）
const US_SURVEY_FOOT: f64 = 1200.0 / 3937.0;

/// 单位匹配容差
const FACTOR_EPSILON: f64 = 1e-4;

/// 距离单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceUnit {
    Meters,
    Millimeters,
    Centimeters,
    Kilometers,
    Feet,
    Yards,
    Inches,
    Miles,
    Chains,
    Links,
    Rods,
    SurveyFeet,
    SurveyYards,
    SurveyMiles,
    SurveyChains,
    SurveyLinks,
    SurveyRods,
    RomanMiles,
    NauticalMiles,
}

impl DistanceUnit {
    /// 从后缀记号识别单位（已转小写）
    pub fn from_token(token: &str) -> Option<Self> {
        let unit = match token {
            "m" => DistanceUnit::Meters,
            "mm" => DistanceUnit::Millimeters,
            "cm" => DistanceUnit::Centimeters,
            "km" => DistanceUnit::Kilometers,
            "ft" | "'" => DistanceUnit::Feet,
            "yd" => DistanceUnit::Yards,
            "in" | "\"" => DistanceUnit::Inches,
            "mi" => DistanceUnit::Miles,
            "ch" => DistanceUnit::Chains,
            "k" => DistanceUnit::Links,
            "rd" => DistanceUnit::Rods,
            "ftus" => DistanceUnit::SurveyFeet,
            "ydus" => DistanceUnit::SurveyYards,
            "mius" => DistanceUnit::SurveyMiles,
            "chus" => DistanceUnit::SurveyChains,
            "kus" => DistanceUnit::SurveyLinks,
            "rdus" => DistanceUnit::SurveyRods,
            "rmi" => DistanceUnit::RomanMiles,
            "nm" => DistanceUnit::NauticalMiles,
            _ => return None,
        };
        Some(unit)
    }

    /// 每单位的米数
    pub fn meters_per_unit(self) -> f64 {
        match self {
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Millimeters => 0.001,
            DistanceUnit::Centimeters => 0.01,
            DistanceUnit::Kilometers => 1000.0,
            DistanceUnit::Feet => 0.3048,
            DistanceUnit::Yards => 0.9144,
            DistanceUnit::Inches => 0.0254,
            DistanceUnit::Miles => 1609.344,
            DistanceUnit::Chains => 20.1168,
            DistanceUnit::Links => 0.201168,
            DistanceUnit::Rods => 5.0292,
            DistanceUnit::SurveyFeet => US_SURVEY_FOOT,
            DistanceUnit::SurveyYards => US_SURVEY_FOOT * 3.0,
            DistanceUnit::SurveyMiles => US_SURVEY_FOOT * 5280.0,
            DistanceUnit::SurveyChains => US_SURVEY_FOOT * 66.0,
            DistanceUnit::SurveyLinks => US_SURVEY_FOOT * 0.66,
            DistanceUnit::SurveyRods => US_SURVEY_FOOT * 16.5,
            DistanceUnit::RomanMiles => 2375.0 / 1.5,
            DistanceUnit::NauticalMiles => 1852.0,
        }
    }

    /// 从配置关键字识别单位，支持常用英文名与 `esri*` 枚举名
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let unit = match keyword {
            "esriCentimeters" => DistanceUnit::Centimeters,
            "esriFeet" => DistanceUnit::Feet,
            "esriInches" => DistanceUnit::Inches,
            "esriKilometers" => DistanceUnit::Kilometers,
            "esriMeters" => DistanceUnit::Meters,
            "esriMiles" => DistanceUnit::Miles,
            "esriMillimeters" => DistanceUnit::Millimeters,
            "esriNauticalMiles" => DistanceUnit::NauticalMiles,
            "esriYards" => DistanceUnit::Yards,
            other => match other.to_lowercase().as_str() {
                "foot" | "feet" => DistanceUnit::Feet,
                "foot_us" | "feet_us" => DistanceUnit::SurveyFeet,
                "meter" | "metre" | "meters" | "metres" => DistanceUnit::Meters,
                "link" | "links" => DistanceUnit::Links,
                _ => return None,
            },
        };
        Some(unit)
    }
}

/// 拆分数值与单位后缀
///
/// 返回 `(数值部分, 小写单位记号)`，两者均去除首尾空白。
pub fn split_value(text: &str) -> (&str, String) {
    let start = text
        .char_indices()
        .find(|(_, ch)| ch.is_alphabetic() || *ch == '\'' || *ch == '"')
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(start);
    (number.trim(), unit.trim().to_lowercase())
}

/// 单位解析结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedValue {
    /// 数值（输入单位下）
    pub value: f64,
    /// 实际采用的每单位米数
    pub factor: f64,
    /// 后缀单位是否命中单位表
    pub matched: bool,
    /// 存在后缀但无法识别
    pub unknown_unit: bool,
}

/// 解析带单位的数值，从不失败
///
/// 命中单位表时使用该单位系数，否则使用 `default_factor`；数值无法解析时取 0。
pub fn resolve(text: &str, default_factor: f64) -> ResolvedValue {
    let (number, token) = split_value(text);
    let value = number.parse::<f64>().unwrap_or(0.0);
    match DistanceUnit::from_token(&token) {
        Some(unit) => ResolvedValue {
            value,
            factor: unit.meters_per_unit(),
            matched: true,
            unknown_unit: false,
        },
        None => ResolvedValue {
            value,
            factor: default_factor,
            matched: false,
            unknown_unit: !token.is_empty(),
        },
    }
}

/// 将输入文本换算为输出（空间参考）单位
///
/// 返回 `(数值, 是否有单位错误)`。空文本返回 `(0, false)`。
pub fn to_base_units(text: &str, entry_factor: f64, output_factor: f64) -> (f64, bool) {
    if text.trim().is_empty() {
        return (0.0, false);
    }
    let resolved = resolve(text, entry_factor);
    let output_factor = if output_factor > 0.0 { output_factor } else { 1.0 };
    (resolved.value * (resolved.factor / output_factor), resolved.unknown_unit)
}

/// 单位换算上下文：录入单位与输出单位（均为每单位米数）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitContext {
    pub entry_factor: f64,
    pub output_factor: f64,
}

impl Default for UnitContext {
    fn default() -> Self {
        Self {
            entry_factor: 1.0,
            output_factor: 1.0,
        }
    }
}

impl UnitContext {
    pub fn new(entry_factor: f64, output_factor: f64) -> Self {
        Self {
            entry_factor,
            output_factor,
        }
    }

    /// 将录入文本换算为输出单位
    pub fn to_output(&self, text: &str) -> (f64, bool) {
        to_base_units(text, self.entry_factor, self.output_factor)
    }

    /// 输出单位数值换回录入单位（用于显示）
    pub fn output_to_entry(&self, value: f64) -> f64 {
        if self.entry_factor > 0.0 {
            value * self.output_factor / self.entry_factor
        } else {
            value
        }
    }
}

/// CE-XML 数据包支持的距离单位名称
///
/// 仅支持 meter / foot_us / foot / link，其余回落为 meter。
pub fn packet_unit_label(factor: f64) -> &'static str {
    let candidates = [
        (DistanceUnit::Meters, "meter"),
        (DistanceUnit::SurveyFeet, "foot_us"),
        (DistanceUnit::Feet, "foot"),
        (DistanceUnit::Links, "link"),
    ];
    candidates
        .iter()
        .map(|(unit, label)| ((factor - unit.meters_per_unit()).abs(), *label))
        .filter(|(diff, _)| *diff < FACTOR_EPSILON)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, label)| label)
        .unwrap_or("meter")
}

/// 面积单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AreaUnit {
    #[default]
    SquareMeter,
    SquareFoot,
    SquareUsFoot,
}

impl AreaUnit {
    /// 按输出单位推断默认面积单位，无法识别时为平方米
    pub fn for_factor(factor: f64) -> Self {
        match packet_unit_label(factor) {
            "foot" => AreaUnit::SquareFoot,
            "foot_us" => AreaUnit::SquareUsFoot,
            _ => AreaUnit::SquareMeter,
        }
    }

    /// CE-XML 面积单位名称
    pub fn packet_label(self) -> &'static str {
        match self {
            AreaUnit::SquareMeter => "Square Meter",
            AreaUnit::SquareFoot => "SquareFoot",
            AreaUnit::SquareUsFoot => "SquareUSFoot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_area_unit_for_factor() {
        assert_eq!(AreaUnit::for_factor(1.0), AreaUnit::SquareMeter);
        assert_eq!(AreaUnit::for_factor(0.3048), AreaUnit::SquareFoot);
        assert_eq!(AreaUnit::for_factor(1200.0 / 3937.0), AreaUnit::SquareUsFoot);
        assert_eq!(AreaUnit::for_factor(20.1168).packet_label(), "Square Meter");
    }

    #[test]
    fn test_split_value() {
        assert_eq!(split_value("100.5ft"), ("100.5", "ft".to_string()));
        assert_eq!(split_value("100.5 FTUS"), ("100.5", "ftus".to_string()));
        assert_eq!(split_value("12\""), ("12", "\"".to_string()));
        assert_eq!(split_value("42"), ("42", String::new()));
    }

    #[test]
    fn test_resolve_overrides_default() {
        let r = resolve("10ch", 1.0);
        assert!(r.matched);
        assert_relative_eq!(r.factor, 20.1168);
        assert_relative_eq!(r.value, 10.0);
    }

    #[test]
    fn test_resolve_default_factor() {
        let r = resolve("25", 0.3048);
        assert!(!r.matched);
        assert!(!r.unknown_unit);
        assert_relative_eq!(r.factor, 0.3048);
    }

    #[test]
    fn test_resolve_unknown_token() {
        let r = resolve("25furlong", 1.0);
        assert!(!r.matched);
        assert!(r.unknown_unit);
        assert_relative_eq!(r.value, 25.0);
    }

    #[test]
    fn test_resolve_unparsable_numeric() {
        let r = resolve("abc", 1.0);
        assert_eq!(r.value, 0.0);
    }

    #[test]
    fn test_to_base_units() {
        let (v, err) = to_base_units("100ft", 1.0, 1.0);
        assert!(!err);
        assert_relative_eq!(v, 30.48, epsilon = 1e-9);

        let (v, _) = to_base_units("100", 0.3048, 0.3048);
        assert_relative_eq!(v, 100.0, epsilon = 1e-9);

        let (_, err) = to_base_units("100zz", 1.0, 1.0);
        assert!(err);
    }

    #[test]
    fn test_survey_units() {
        assert_relative_eq!(DistanceUnit::SurveyChains.meters_per_unit(), 1200.0 / 3937.0 * 66.0);
        assert_eq!(DistanceUnit::from_token("ftus"), Some(DistanceUnit::SurveyFeet));
        assert_eq!(DistanceUnit::from_token("'"), Some(DistanceUnit::Feet));
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(DistanceUnit::from_keyword("Feet_US"), Some(DistanceUnit::SurveyFeet));
        assert_eq!(DistanceUnit::from_keyword("esriMeters"), Some(DistanceUnit::Meters));
        assert_eq!(DistanceUnit::from_keyword("cubits"), None);
    }

    #[test]
    fn test_packet_unit_label() {
        assert_eq!(packet_unit_label(1.0), "meter");
        assert_eq!(packet_unit_label(0.3048), "foot");
        assert_eq!(packet_unit_label(1200.0 / 3937.0), "foot_us");
        assert_eq!(packet_unit_label(0.201168), "link");
        assert_eq!(packet_unit_label(5.0292), "meter");
    }
}
