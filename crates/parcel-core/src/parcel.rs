//! 宗地导线
//!
//! 持有录入的边、配置、起算点、比例与旋转，每次调用 [`Traverse::recompute`]
//! 都从头重算：重排编号、构建、测闭合差、必要时按罗盘法平差后再构建、求面积。

use crate::bearing::{self, BearingFormat};
use crate::closure::{self, ClosureResult, Misclose};
use crate::config::TraverseConfig;
use crate::course::{Course, LineCategory};
use crate::math::{angle_at, to_degrees, to_radians, Point2};
use crate::snap::{nearest_point, SnapAnchor, SnapCache};
use crate::traverse::{self, BuildOutput, BuildParams};
use crate::units::UnitContext;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use tracing::{debug, warn};

/// 一行录入文本
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseEntry {
    pub category: LineCategory,
    pub bearing: String,
    pub distance: String,
    pub radius: String,
    pub parameter2: String,
}

impl CourseEntry {
    pub fn line(bearing: &str, distance: &str) -> Self {
        Self {
            bearing: bearing.to_string(),
            distance: distance.to_string(),
            ..Default::default()
        }
    }

    pub fn curve(bearing: &str, radius: &str, parameter2: &str) -> Self {
        Self {
            bearing: bearing.to_string(),
            radius: radius.to_string(),
            parameter2: parameter2.to_string(),
            ..Default::default()
        }
    }

    /// 按录入顺序写入一条边：方位角、距离、半径、第二参数
    pub fn to_course(&self, format: BearingFormat, units: &UnitContext) -> Course {
        let mut course = Course::new(self.category, format);
        course.set_bearing(&self.bearing);
        if !self.distance.trim().is_empty() {
            course.set_distance(&self.distance, units);
        }
        course.set_radius(&self.radius, units);
        if !self.parameter2.trim().is_empty() {
            course.set_parameter2(&self.parameter2, units);
        }
        course
    }
}

/// 文档类型附带的扩展属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedAttribute {
    pub field: String,
    pub value: String,
}

/// 文档类型（导出时写入宗地类型与说明）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentType {
    pub name: String,
    pub code: i32,
    pub extended_attribute: Option<ExtendedAttribute>,
}

impl Default for DocumentType {
    fn default() -> Self {
        Self {
            name: "Deed".to_string(),
            code: 7,
            extended_attribute: None,
        }
    }
}

/// 宗地描述信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelInfo {
    pub plan_name: String,
    pub parcel_name: String,
    /// 法定面积文本；为空时导出计算面积
    pub stated_area: String,
    pub document_type: DocumentType,
}

/// 导出用的边记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub from_id: u32,
    pub to_id: u32,
    pub category: LineCategory,
    /// 弦方位角（度）
    pub bearing_deg: f64,
    /// 弦长（输出单位）
    pub chord: f64,
    pub radius: f64,
    pub center_id: Option<u32>,
    /// 起点指向圆心的方位角（度）
    pub radial_bearing1_deg: Option<f64>,
    /// 终点指向圆心的方位角（度）
    pub radial_bearing2_deg: Option<f64>,
}

impl CourseRecord {
    /// 编号或长度缺失的记录不导出
    pub fn is_incomplete(&self) -> bool {
        self.from_id == 0 || self.to_id == 0 || self.chord == 0.0
    }
}

/// 一次重算的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recompute {
    pub build: BuildOutput,
    pub misclose: Option<Misclose>,
    pub closure: ClosureResult,
}

/// 宗地导线
#[derive(Debug, Clone)]
pub struct Traverse {
    courses: Vec<Course>,
    config: TraverseConfig,
    pub info: ParcelInfo,
    origin: Point2,
    scale_text: String,
    scale: f64,
    rotation_text: String,
    /// 弧度，逆时针为正
    rotation: f64,
    rotation_error: bool,
    closing_point: Option<u32>,
    web_mercator_scale: Option<f64>,
    last: Recompute,
}

impl Default for Traverse {
    fn default() -> Self {
        Self::new(TraverseConfig::default())
    }
}

impl Traverse {
    pub fn new(config: TraverseConfig) -> Self {
        Self {
            courses: Vec::new(),
            config,
            info: ParcelInfo::default(),
            origin: Point2::origin(),
            scale_text: "1.0".to_string(),
            scale: 1.0,
            rotation_text: "0.0".to_string(),
            rotation: 0.0,
            rotation_error: false,
            closing_point: None,
            web_mercator_scale: None,
            last: Recompute::default(),
        }
    }

    pub fn config(&self) -> &TraverseConfig {
        &self.config
    }

    pub fn units(&self) -> UnitContext {
        self.config.units()
    }

    pub fn bearing_format(&self) -> BearingFormat {
        self.config.bearing_format
    }

    // ========== 边 ==========

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course_mut(&mut self, index: usize) -> Option<&mut Course> {
        self.courses.get_mut(index)
    }

    pub fn add_course(&mut self, course: Course) {
        self.courses.push(course);
    }

    /// 由录入文本追加一条边
    pub fn add_entry(&mut self, entry: &CourseEntry) {
        let course = entry.to_course(self.config.bearing_format, &self.config.units());
        self.courses.push(course);
    }

    pub fn insert_course(&mut self, index: usize, course: Course) {
        let index = index.min(self.courses.len());
        self.courses.insert(index, course);
    }

    pub fn remove_course(&mut self, index: usize) -> Option<Course> {
        (index < self.courses.len()).then(|| self.courses.remove(index))
    }

    pub fn clear_courses(&mut self) {
        self.courses.clear();
        self.last = Recompute::default();
    }

    /// 修改第 `index` 条边的方位角文本
    pub fn set_bearing(&mut self, index: usize, text: &str) {
        if let Some(course) = self.courses.get_mut(index) {
            course.set_bearing(text);
        }
    }

    pub fn set_distance(&mut self, index: usize, text: &str) {
        let units = self.config.units();
        if let Some(course) = self.courses.get_mut(index) {
            course.set_distance(text, &units);
        }
    }

    pub fn set_radius(&mut self, index: usize, text: &str) {
        let units = self.config.units();
        if let Some(course) = self.courses.get_mut(index) {
            course.set_radius(text, &units);
        }
    }

    pub fn set_parameter2(&mut self, index: usize, text: &str) {
        let units = self.config.units();
        if let Some(course) = self.courses.get_mut(index) {
            course.set_parameter2(text, &units);
        }
    }

    // ========== 起算点、比例、旋转 ==========

    pub fn origin(&self) -> Point2 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point2) {
        self.origin = origin;
    }

    /// 强制最后一条边闭合到指定点
    pub fn set_closing_point(&mut self, id: Option<u32>) {
        self.closing_point = id;
    }

    /// Web Mercator 比例修正，不为 1 时替代地图单位换算
    pub fn set_web_mercator_scale(&mut self, scale: Option<f64>) {
        self.web_mercator_scale = scale;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn scale_text(&self) -> &str {
        &self.scale_text
    }

    /// 比例文本；无法解析或不大于 0 时取 1
    pub fn set_scale_text(&mut self, text: &str) {
        let value = text.trim().parse::<f64>().unwrap_or(0.0);
        self.scale = if value > 0.0 { value } else { 1.0 };
        self.scale_text = text.to_string();
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = if scale > 0.0 { scale } else { 1.0 };
        self.scale_text = format!("{:.3}", self.scale);
    }

    /// 有效比例：用户比例 × 空间参考修正
    pub fn effective_scale(&self) -> f64 {
        self.scale * self.config.spatial_reference_scale(self.web_mercator_scale)
    }

    /// 旋转角（弧度，逆时针为正）
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn rotation_text(&self) -> &str {
        &self.rotation_text
    }

    pub fn rotation_error(&self) -> bool {
        self.rotation_error
    }

    /// 旋转角文本（度，顺时针为正）
    ///
    /// 十进制度记法下直接解析；否则按度分秒解析，出错时保留原值并置错误标志。
    pub fn set_rotation_text(&mut self, text: &str) {
        if self.config.bearing_format == BearingFormat::Dd {
            let degrees = text.trim().parse::<f64>().unwrap_or(0.0);
            self.rotation = -to_radians(degrees);
            self.rotation_text = text.to_string();
            self.rotation_error = false;
            return;
        }

        let (degrees, error) = bearing::parse_angle_dms(text);
        self.rotation_error = error;
        if error {
            warn!(text, "旋转角无法解析");
            return;
        }
        self.rotation = -to_radians(degrees);
        self.rotation_text = bearing::format(degrees, BearingFormat::Dms);
    }

    /// 以弧度设置旋转角，文本按记法重新生成
    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
        self.rotation_error = false;
        let degrees = to_degrees(-rotation);
        self.rotation_text = if self.config.bearing_format == BearingFormat::Dd {
            format!("{:.3}", degrees)
        } else {
            bearing::format(degrees, BearingFormat::Dms)
        };
    }

    pub fn reset_rotation_scale(&mut self) {
        self.set_rotation(0.0);
        self.set_scale(1.0);
    }

    // ========== 重算 ==========

    pub fn build_params(&self) -> BuildParams {
        BuildParams {
            origin: self.origin,
            scale: self.effective_scale(),
            rotation: self.rotation,
        }
    }

    /// 从头重算导线
    ///
    /// 切线边的推算方位角与曲线圆心属性写回边，其余边的方位角文本按导线记法重新生成。
    pub fn recompute(&mut self) -> &Recompute {
        traverse::resequence(&mut self.courses, self.closing_point);
        let params = self.build_params();

        let first = traverse::build(&self.courses, &params, None);
        let misclose = closure::measure(&first);
        let adjustment = misclose
            .filter(|m| m.is_adjustable(&self.config))
            .map(|m| m.adjustment());
        let build = match &adjustment {
            Some(adjustment) => traverse::build(&self.courses, &params, Some(adjustment)),
            None => first,
        };

        let closure = match &misclose {
            Some(m) => {
                let area = closure::parcel_area(&build);
                ClosureResult::from_misclose(m, area, adjustment.is_some(), &self.config.units())
            }
            None => ClosureResult::invalid(),
        };

        self.apply_resolution(&build);

        debug!(
            courses = self.courses.len(),
            valid = closure.valid,
            distance = closure.distance,
            area = closure.area,
            compass = closure.compass_rule_applied,
            "导线重算完成"
        );

        self.last = Recompute {
            build,
            misclose,
            closure,
        };
        &self.last
    }

    fn apply_resolution(&mut self, build: &BuildOutput) {
        let format = self.config.bearing_format;
        for course in &mut self.courses {
            course.set_display_format(format);
            course.reset_curve_attributes();
        }
        for resolved in &build.courses {
            let Some(course) = self.courses.get_mut(resolved.index) else {
                continue;
            };
            if course.is_tangent() {
                course.set_bearing_degrees(to_degrees(resolved.bearing));
            } else if let (Some(degrees), false) = (course.bearing_degrees(), course.bearing_error()) {
                course.set_bearing_degrees(degrees);
            }
            if let (Some(center), Some(b1), Some(b2)) =
                (resolved.center_id, resolved.radial_bearing1, resolved.radial_bearing2)
            {
                course.set_curve_attributes(center, b1, b2);
            }
        }
    }

    /// 最近一次重算结果
    pub fn last(&self) -> &Recompute {
        &self.last
    }

    pub fn closure(&self) -> &ClosureResult {
        &self.last.closure
    }

    /// 导出用的边记录（不含不完整的边）
    pub fn course_records(&self) -> Vec<CourseRecord> {
        self.courses
            .iter()
            .map(|c| CourseRecord {
                from_id: c.from_id,
                to_id: c.to_id,
                category: c.category,
                bearing_deg: c.bearing_degrees().unwrap_or(0.0),
                chord: c.chord_length(),
                radius: c.radius(),
                center_id: c.center_point_id().filter(|_| c.is_curve()),
                radial_bearing1_deg: c.radial_bearing1().map(to_degrees),
                radial_bearing2_deg: c.radial_bearing2().map(to_degrees),
            })
            .filter(|r| !r.is_incomplete())
            .collect()
    }

    // ========== 比例/旋转捕捉 ==========

    /// 拖动旋转：以起算点为中心，从 `grab` 转到 `current` 的角度叠加到 `base_rotation`
    pub fn rotate_by_drag(&mut self, grab: Point2, current: Point2, base_rotation: f64) {
        let mut rotation = angle_at(self.origin, grab, current) + base_rotation;
        while rotation < -PI {
            rotation += TAU;
        }
        while rotation > PI {
            rotation -= TAU;
        }
        self.set_rotation(rotation);
    }

    /// 拖动缩放：起算点到 `current` 与到 `grab` 的距离比乘以 `base_scale`
    pub fn scale_by_drag(&mut self, grab: Point2, current: Point2, base_scale: f64) {
        let grab_distance = (grab - self.origin).norm();
        if grab_distance > 0.0 {
            self.set_scale((current - self.origin).norm() / grab_distance * base_scale);
        }
    }

    /// 在最近一次重算的点中找靠近 `p` 的点，作为捕捉锚点
    pub fn snap_anchor_near(&self, p: Point2) -> Option<SnapAnchor> {
        let (point_id, _) = nearest_point(&self.last.build.points, p, self.config.snap_tolerance)?;
        let (bearing, distance, _) = traverse::bearing_distance_to_point(&self.courses, point_id)?;
        Some(SnapAnchor {
            point_id,
            bearing,
            distance,
        })
    }

    /// 旋转捕捉成功时更新旋转角
    pub fn snap_rotation(&mut self, anchor: &SnapAnchor, cache: &SnapCache, cursor: Point2) -> bool {
        let solved = anchor.solve_rotation(
            cache,
            self.origin,
            self.effective_scale(),
            self.rotation,
            cursor,
            self.config.snap_tolerance,
        );
        match solved {
            Some(rotation) => {
                self.set_rotation(rotation);
                true
            }
            None => false,
        }
    }

    /// 缩放捕捉成功时更新比例
    pub fn snap_scale(&mut self, anchor: &SnapAnchor, cache: &SnapCache, cursor: Point2) -> bool {
        let solved = anchor.solve_scale(
            cache,
            self.origin,
            self.effective_scale(),
            self.rotation,
            cursor,
            self.config.snap_tolerance,
        );
        let reference = self.config.spatial_reference_scale(self.web_mercator_scale);
        match solved {
            Some(scale) if reference > 0.0 => {
                self.set_scale(scale / reference);
                true
            }
            _ => false,
        }
    }
}
