//! 导线边（一行录入）
//!
//! 每次修改文本字段都立即重新推导数值与错误标志；构建与闭合计算只读取边，不修改它。

use crate::bearing::{self, BearingFormat, TANGENT_MARKER};
use crate::length::{LengthFields, LengthSpec};
use crate::math::to_radians;
use crate::units::UnitContext;
use serde::{Deserialize, Serialize};

/// 边的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LineCategory {
    #[default]
    Boundary,
    Dependent,
    PreciseConnection,
    Connection,
    Radial,
    Road,
    OriginConnection,
    PartConnection,
}

impl LineCategory {
    /// 是否参与闭合差与面积计算
    pub fn is_boundary(self) -> bool {
        matches!(self, LineCategory::Boundary | LineCategory::Road)
    }

    /// 类别名称
    pub fn name(self) -> &'static str {
        match self {
            LineCategory::Boundary => "Boundary",
            LineCategory::Dependent => "Dependent",
            LineCategory::PreciseConnection => "PreciseConnection",
            LineCategory::Connection => "Connection",
            LineCategory::Radial => "Radial",
            LineCategory::Road => "Road",
            LineCategory::OriginConnection => "OriginConnection",
            LineCategory::PartConnection => "PartConnection",
        }
    }
}

/// 导线边
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    /// 起点编号（0 表示未分配）
    pub from_id: u32,
    /// 终点编号（0 表示未分配）
    pub to_id: u32,
    pub category: LineCategory,

    bearing_text: Option<String>,
    bearing_degrees: Option<f64>,
    entered_format: BearingFormat,
    display_format: BearingFormat,
    tangent: bool,
    bearing_error: bool,

    length: LengthFields,

    center_point_id: Option<u32>,
    radial_bearing1: Option<f64>,
    radial_bearing2: Option<f64>,
}

impl Default for Course {
    fn default() -> Self {
        Self::new(LineCategory::Boundary, BearingFormat::Dms)
    }
}

impl Course {
    /// 创建空边；`format` 为导线统一的方位角记法
    pub fn new(category: LineCategory, format: BearingFormat) -> Self {
        Self {
            from_id: 0,
            to_id: 0,
            category,
            bearing_text: None,
            bearing_degrees: None,
            entered_format: BearingFormat::Unknown,
            display_format: format,
            tangent: false,
            bearing_error: false,
            length: LengthFields::new(),
            center_point_id: None,
            radial_bearing1: None,
            radial_bearing2: None,
        }
    }

    // ========== 方位角 ==========

    /// 设置方位角文本；空文本清除方位角
    pub fn set_bearing(&mut self, text: &str) {
        let parsed = bearing::parse(text, self.display_format);
        let (body, _) = bearing::strip_marker(text, TANGENT_MARKER);
        self.tangent = parsed.tangent;
        if body.is_empty() {
            self.bearing_text = None;
            self.bearing_degrees = None;
            self.bearing_error = false;
            return;
        }
        self.bearing_text = Some(body.to_string());
        self.bearing_degrees = Some(parsed.degrees);
        self.entered_format = parsed.format;
        self.bearing_error = parsed.error;
    }

    /// 以数值设置方位角（度），文本按导线记法重新生成
    pub fn set_bearing_degrees(&mut self, degrees: f64) {
        let degrees = bearing::normalize_degrees(degrees);
        self.bearing_degrees = Some(degrees);
        self.bearing_text = Some(bearing::format(degrees, self.display_format));
        self.bearing_error = false;
    }

    /// 方位角显示文本（切线边带 `*` 前缀）
    pub fn bearing_text(&self) -> String {
        let text = self.bearing_text.as_deref().unwrap_or_default();
        if self.tangent {
            format!("{}{}", TANGENT_MARKER, text)
        } else {
            text.to_string()
        }
    }

    pub fn bearing_degrees(&self) -> Option<f64> {
        self.bearing_degrees
    }

    /// 方位角弧度，缺省为 0
    pub fn bearing_radians(&self) -> f64 {
        to_radians(self.bearing_degrees.unwrap_or(0.0))
    }

    pub fn entered_format(&self) -> BearingFormat {
        self.entered_format
    }

    pub fn display_format(&self) -> BearingFormat {
        self.display_format
    }

    pub fn set_display_format(&mut self, format: BearingFormat) {
        self.display_format = format;
    }

    pub fn is_tangent(&self) -> bool {
        self.tangent
    }

    pub fn set_tangent(&mut self, tangent: bool) {
        self.tangent = tangent;
    }

    pub fn bearing_error(&self) -> bool {
        self.bearing_error
    }

    // ========== 长度 ==========

    pub fn set_distance(&mut self, text: &str, units: &UnitContext) {
        self.length.set_distance(text, units);
    }

    pub fn set_radius(&mut self, text: &str, units: &UnitContext) {
        self.length.set_radius(text, units);
    }

    pub fn set_parameter2(&mut self, text: &str, units: &UnitContext) {
        self.length.set_parameter2(text, units);
    }

    pub fn length(&self) -> &LengthFields {
        &self.length
    }

    pub fn length_mut(&mut self) -> &mut LengthFields {
        &mut self.length
    }

    pub fn length_spec(&self) -> Option<LengthSpec> {
        self.length.spec()
    }

    pub fn chord_length(&self) -> f64 {
        self.length.chord_length()
    }

    pub fn radius(&self) -> f64 {
        self.length.radius()
    }

    pub fn minor_curve(&self) -> bool {
        self.length.minor_curve()
    }

    pub fn is_curve(&self) -> bool {
        self.radius() != 0.0
    }

    /// 录入是否完整：有方位角，且有距离或（半径与第二参数）
    pub fn is_complete(&self) -> bool {
        let has_bearing = !self.bearing_text().is_empty();
        has_bearing
            && (self.length.has_distance()
                || (self.length.has_radius() && self.length.has_parameter2()))
    }

    /// 是否已分配起止点编号
    pub fn has_ids(&self) -> bool {
        self.from_id != 0 && self.to_id != 0
    }

    // ========== 曲线属性 ==========

    pub fn center_point_id(&self) -> Option<u32> {
        self.center_point_id
    }

    pub fn set_center_point_id(&mut self, id: Option<u32>) {
        self.center_point_id = id;
    }

    pub fn radial_bearing1(&self) -> Option<f64> {
        self.radial_bearing1
    }

    pub fn radial_bearing2(&self) -> Option<f64> {
        self.radial_bearing2
    }

    /// 记录曲线圆心与两条径向方位角（弧度）
    pub fn set_curve_attributes(&mut self, center_id: u32, bearing1: f64, bearing2: f64) {
        self.center_point_id = Some(center_id);
        self.radial_bearing1 = Some(bearing1);
        self.radial_bearing2 = Some(bearing2);
    }

    pub fn reset_curve_attributes(&mut self) {
        self.center_point_id = None;
        self.radial_bearing1 = None;
        self.radial_bearing2 = None;
    }
}
