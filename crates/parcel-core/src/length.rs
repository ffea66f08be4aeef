//! 边长字段解析
//!
//! 一条边的长度可以由四个文本字段之一给出：距离、弧长、半径与第二参数（弦长）。
//! 半径存在时“距离”栏的内容改按第二参数解释，清除半径时再移回距离栏，
//! 文本与错误标志随之迁移。解析结果统一为 [`LengthSpec`]。

use crate::bearing::strip_marker;
use crate::units::UnitContext;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// 弧长标记
const ARC_MARKER: char = 'a';
/// 弧长标记（备用）
const ARC_MARKER_ALT: char = '*';
/// 大弧标记
const MAJOR_MARKER: char = '-';

/// 弧长换算弦长的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcChord {
    pub chord_length: f64,
    pub is_minor: bool,
    /// 换算是否成功；失败时弦长等于输入弧长
    pub converted: bool,
}

/// 由半径与弧长计算弦长
///
/// θ = 弧长 / |半径|，弦长 = |2·r·sin(θ/2)|。半径或弧长为 0、或 θ > 2π 时失败。
pub fn arc_to_chord(radius: f64, arc_length: f64) -> ArcChord {
    let failed = ArcChord {
        chord_length: arc_length,
        is_minor: true,
        converted: false,
    };
    if arc_length == 0.0 || radius == 0.0 {
        return failed;
    }

    let theta = arc_length / radius.abs();
    if theta > TAU {
        return failed;
    }

    ArcChord {
        chord_length: (2.0 * radius * (theta / 2.0).sin()).abs(),
        is_minor: theta < PI,
        converted: true,
    }
}

/// 规范化后的长度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LengthSpec {
    /// 直线弦长
    Chord(f64),
    /// 弧长及其换算出的弦长
    ArcLength { arc: f64, chord: f64 },
    /// 曲线的第二参数（弦长），需配合半径
    Parameter2(f64),
}

impl LengthSpec {
    /// 弦长
    pub fn chord(&self) -> f64 {
        match *self {
            LengthSpec::Chord(chord) => chord,
            LengthSpec::ArcLength { chord, .. } => chord,
            LengthSpec::Parameter2(chord) => chord,
        }
    }
}

/// 边长相关的原始文本字段及派生数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthFields {
    distance: Option<String>,
    arc_length: Option<String>,
    radius: Option<String>,
    parameter2: Option<String>,

    distance_error: bool,
    radius_error: bool,
    parameter2_error: bool,

    chord_value: Option<f64>,
    arc_value: Option<f64>,
    radius_value: Option<f64>,
    minor_curve: bool,
}

impl Default for LengthFields {
    fn default() -> Self {
        Self {
            distance: None,
            arc_length: None,
            radius: None,
            parameter2: None,
            distance_error: false,
            radius_error: false,
            parameter2_error: false,
            chord_value: None,
            arc_value: None,
            radius_value: None,
            minor_curve: true,
        }
    }
}

fn is_blank(text: Option<&str>) -> bool {
    text.map_or(true, |t| t.trim().is_empty())
}

impl LengthFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置距离栏
    pub fn set_distance(&mut self, text: &str, units: &UnitContext) {
        self.parameter2 = None;
        self.update_length(text, true, units);
    }

    /// 设置第二参数栏
    pub fn set_parameter2(&mut self, text: &str, units: &UnitContext) {
        self.update_length(text, false, units);
    }

    fn update_length(&mut self, text: &str, is_distance: bool, units: &UnitContext) {
        let (body, is_arc) = match strip_marker(text, ARC_MARKER) {
            (body, true) => (body, true),
            _ => strip_marker(text, ARC_MARKER_ALT),
        };
        let (body, is_major) = strip_marker(body, MAJOR_MARKER);
        let (value, unit_error) = units.to_output(body);

        if is_arc {
            let error = value <= 0.0 || unit_error;
            self.distance = None;
            self.parameter2 = None;
            self.arc_length = Some(body.to_string());
            self.chord_value = None;
            self.arc_value = None;
            // 弧长输入的错误记在第二参数上
            self.distance_error = false;
            self.parameter2_error = error;
            if !error {
                self.calculate_arc_length(value);
            }
            return;
        }

        let error = value <= 0.0 || unit_error;

        if self.radius.is_none() {
            // 空值写入空栏不做处理
            if is_blank(Some(text)) && is_blank(self.parameter2.as_deref()) && !is_distance {
                return;
            }
            self.arc_length = None;
            self.arc_value = None;
            self.distance_error = error;
            self.parameter2_error = false;
            self.distance = Some(body.to_string());
            self.parameter2 = None;
        } else {
            if is_blank(Some(text)) && is_blank(self.distance.as_deref()) && is_distance {
                return;
            }
            self.arc_length = None;
            self.arc_value = None;
            self.distance_error = false;
            self.parameter2_error = error;
            self.distance = None;
            self.parameter2 = Some(body.to_string());
        }
        self.minor_curve = !is_major;
        self.chord_value = (!error).then_some(value);
    }

    /// 设置半径栏
    ///
    /// 半径由空变为非空时，距离栏内容（及错误标志）移入第二参数栏；反之移回。
    pub fn set_radius(&mut self, text: &str, units: &UnitContext) {
        let new_radius = (!text.trim().is_empty()).then(|| text.trim().to_string());

        match (&self.radius, &new_radius) {
            (None, Some(_)) => {
                self.parameter2 = if self.arc_value.is_none() {
                    self.distance.take()
                } else {
                    None
                };
                self.distance = None;
                self.parameter2_error = self.distance_error;
                self.distance_error = false;
            }
            (Some(_), None) => {
                self.distance = self.parameter2.take();
                self.distance_error = self.parameter2_error;
                self.parameter2_error = false;
            }
            _ => {}
        }

        match &new_radius {
            Some(radius) => {
                let (value, unit_error) = units.to_output(radius);
                self.radius_value = Some(value);
                self.radius_error = unit_error || value == 0.0;
            }
            None => {
                self.radius_value = None;
                self.radius_error = false;
            }
        }
        self.radius = new_radius;

        if let Some(arc) = self.arc_value {
            self.calculate_arc_length(arc);
        }
    }

    /// 由当前半径换算弧长；换算失败时弧长按直线弦长处理
    fn calculate_arc_length(&mut self, arc: f64) -> bool {
        if arc == 0.0 {
            return false;
        }
        let result = arc_to_chord(self.radius(), arc);
        self.arc_value = Some(arc);
        self.chord_value = Some(result.chord_length);
        self.minor_curve = result.is_minor;
        result.converted
    }

    /// 直接设置大小弧标志
    pub fn set_minor_curve(&mut self, minor: bool) {
        self.minor_curve = minor;
    }

    /// 弦长（输出单位），缺省为 0
    pub fn chord_length(&self) -> f64 {
        self.chord_value.unwrap_or(0.0)
    }

    /// 带符号半径（输出单位），缺省为 0
    pub fn radius(&self) -> f64 {
        self.radius_value.unwrap_or(0.0)
    }

    pub fn minor_curve(&self) -> bool {
        self.minor_curve
    }

    pub fn arc_length(&self) -> Option<f64> {
        self.arc_value
    }

    /// 第二参数（弦长，输出单位）；仅在曲线按第二参数给出长度时有值
    pub fn parameter2(&self) -> Option<f64> {
        match self.spec()? {
            LengthSpec::Parameter2(chord) => Some(chord),
            _ => None,
        }
    }

    pub fn radius_text(&self) -> Option<&str> {
        self.radius.as_deref()
    }

    pub fn distance_error(&self) -> bool {
        self.distance_error
    }

    pub fn radius_error(&self) -> bool {
        self.radius_error
    }

    pub fn parameter2_error(&self) -> bool {
        self.parameter2_error
    }

    pub fn has_distance(&self) -> bool {
        !self.distance_display().is_empty()
    }

    pub fn has_radius(&self) -> bool {
        !is_blank(self.radius.as_deref())
    }

    pub fn has_parameter2(&self) -> bool {
        !self.parameter2_display().is_empty()
    }

    /// 距离栏显示文本；弧长输入显示为 `<弧长> a`
    pub fn distance_display(&self) -> String {
        match &self.arc_length {
            Some(arc) => format!("{} a", arc),
            None => self.distance.clone().unwrap_or_default(),
        }
    }

    /// 第二参数栏显示文本；大弧前缀 `-`
    pub fn parameter2_display(&self) -> String {
        match self.parameter2.as_deref() {
            Some(p) if !p.is_empty() && !self.minor_curve => format!("-{}", p),
            Some(p) => p.to_string(),
            None => String::new(),
        }
    }

    /// 规范化长度；没有有效长度时返回 `None`
    pub fn spec(&self) -> Option<LengthSpec> {
        let chord = self.chord_value?;
        if let Some(arc) = self.arc_value {
            return Some(LengthSpec::ArcLength { arc, chord });
        }
        if self.radius() != 0.0 {
            Some(LengthSpec::Parameter2(chord))
        } else {
            Some(LengthSpec::Chord(chord))
        }
    }
}
