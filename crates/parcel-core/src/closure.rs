//! 闭合差与面积
//!
//! 闭合差在局部坐标系中沿界线（Boundary/Road）边链按方位角与弦长推算，
//! 因此比例和旋转不影响报告值。边链不连续时结果无效，所有数值清零。

use crate::bearing::{self, BearingFormat};
use crate::config::TraverseConfig;
use crate::math::{polar_point, signed_area, to_degrees, wrap_radians, Point2, Vector2};
use crate::traverse::{Adjustment, BuildOutput, ResolvedCourse};
use crate::units::UnitContext;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use tracing::debug;

/// 低于此精度比时不显示
pub const LOW_RATIO: f64 = 10.0;

/// 精度比上限；闭合差为 0 时取此值
pub const HIGH_RATIO: f64 = 100_000.0;

/// 闭合差测量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Misclose {
    /// 边链起点（局部）
    pub start: Point2,
    /// 按方位角与弦长推算出的边链终点（局部）
    pub end: Point2,
    /// 闭合改正向量（起点 − 终点）
    pub vector: Vector2,
    /// 改正向量方位角（弧度）
    pub bearing: f64,
    pub distance: f64,
    /// 边链总弦长
    pub total_length: f64,
    pub ratio: f64,
    pub course_count: usize,
}

impl Misclose {
    /// 是否满足自动平差条件
    pub fn is_adjustable(&self, config: &TraverseConfig) -> bool {
        self.distance > 0.0
            && (self.distance <= config.misclose_distance_snap
                || self.ratio >= config.misclose_ratio_snap)
    }

    pub fn adjustment(&self) -> Adjustment {
        Adjustment {
            vector: self.vector,
            total_length: self.total_length,
        }
    }
}

/// 闭合计算结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClosureResult {
    pub valid: bool,
    /// 闭合差方位角（度）
    pub bearing_deg: f64,
    /// 闭合差（录入单位）
    pub distance: f64,
    /// 面积（输出单位的平方）
    pub area: f64,
    pub ratio: f64,
    pub compass_rule_applied: bool,
}

impl ClosureResult {
    /// 无效结果，所有数值为 0
    pub fn invalid() -> Self {
        Self::default()
    }

    /// 由闭合差测量与面积组装结果
    pub fn from_misclose(misclose: &Misclose, area: f64, applied: bool, units: &UnitContext) -> Self {
        Self {
            valid: true,
            bearing_deg: to_degrees(misclose.bearing),
            distance: units.output_to_entry(misclose.distance),
            area,
            ratio: misclose.ratio,
            compass_rule_applied: applied,
        }
    }

    pub fn is_high_ratio(&self) -> bool {
        self.ratio >= HIGH_RATIO
    }

    /// 精度比显示文本
    pub fn ratio_label(&self) -> String {
        if !self.valid || self.ratio < LOW_RATIO {
            String::new()
        } else if self.is_high_ratio() {
            "High".to_string()
        } else {
            format!("1:{:.0}", self.ratio)
        }
    }

    /// 闭合差方位角文本
    pub fn bearing_text(&self, format: BearingFormat) -> String {
        if !self.valid {
            return String::new();
        }
        bearing::format(self.bearing_deg, format)
    }
}

/// 界线边链：从第一条 Boundary/Road 边起的全部界线边
///
/// 任一边的起点不等于前一边的终点时返回 `None`。
pub fn boundary_chain(courses: &[ResolvedCourse]) -> Option<Vec<&ResolvedCourse>> {
    let chain: Vec<&ResolvedCourse> = courses.iter().filter(|c| c.category.is_boundary()).collect();
    let contiguous = chain.windows(2).all(|pair| pair[1].from_id == pair[0].to_id);
    contiguous.then_some(chain)
}

/// 测量闭合差
///
/// 边链断开或少于两条边时返回 `None`。
pub fn measure(build: &BuildOutput) -> Option<Misclose> {
    let Some(chain) = boundary_chain(&build.courses) else {
        debug!("界线边链不连续，无法计算闭合差");
        return None;
    };
    if chain.len() <= 1 {
        return None;
    }
    let start = *build.local_points.get(&chain[0].from_id)?;

    let mut end = start;
    let mut total_length = 0.0;
    for course in &chain {
        total_length += course.chord;
        end = polar_point(end, course.bearing, course.chord).unwrap_or(end);
    }

    let vector = start - end;
    let distance = vector.norm();
    let bearing = wrap_radians(FRAC_PI_2 - vector.y.atan2(vector.x));
    let ratio = if distance > 0.0 {
        (total_length / distance).min(HIGH_RATIO)
    } else {
        HIGH_RATIO
    };

    Some(Misclose {
        start,
        end,
        vector,
        bearing,
        distance,
        total_length,
        ratio,
        course_count: chain.len(),
    })
}

/// 宗地面积：界线边局部路径首尾相接并闭合回原点后的鞋带面积
pub fn parcel_area(build: &BuildOutput) -> f64 {
    let mut ring: Vec<Point2> = build
        .courses
        .iter()
        .filter(|c| c.category.is_boundary())
        .flat_map(|c| c.local_path.iter().copied())
        .collect();
    if ring.is_empty() {
        return 0.0;
    }
    ring.push(Point2::origin());
    signed_area(&ring).abs()
}
