//! 导线点链构建
//!
//! 按录入顺序逐条推算边的终点坐标。计算在局部坐标系（起点为原点，不缩放、不旋转）
//! 中进行，输出坐标由局部坐标经比例与旋转变换后平移到起算点得到。
//!
//! 每次调用都从头重建点字典，不修改输入的边。

use crate::course::{Course, LineCategory};
use crate::curve::{
    construct_arc, construct_center_point, exit_tangent_bearing, resolve_tangent_bearing,
    SweepDirection,
};
use crate::error::BuildError;
use crate::math::{
    bearing_between, polar_point, rotate_clockwise, wrap_radians, Point2, Vector2,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// 构建参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildParams {
    /// 起算点（输出坐标）
    pub origin: Point2,
    /// 有效比例（用户比例 × 空间参考修正）
    pub scale: f64,
    /// 旋转角（弧度，逆时针为正）；输出方位角 = 方位角 − 旋转角
    pub rotation: f64,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            origin: Point2::origin(),
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

impl BuildParams {
    pub fn new(origin: Point2) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }

    /// 局部向量变换到输出坐标系
    pub fn output_vector(&self, v: Vector2) -> Vector2 {
        rotate_clockwise(v, -self.rotation) * self.scale
    }

    /// 局部坐标变换到输出坐标
    pub fn to_output(&self, local: Point2) -> Point2 {
        self.origin + self.output_vector(local.coords)
    }

    /// 局部方位角变换到输出方位角
    pub fn output_bearing(&self, bearing: f64) -> f64 {
        wrap_radians(bearing - self.rotation)
    }
}

/// 罗盘法平差量（局部坐标系）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    /// 闭合改正向量（起点 − 终点）
    pub vector: Vector2,
    /// 参与平差的总弦长
    pub total_length: f64,
}

impl Adjustment {
    /// 一条边分得的改正量
    pub fn share(&self, chord: f64) -> Vector2 {
        if self.total_length > 0.0 {
            self.vector * (chord / self.total_length)
        } else {
            Vector2::zeros()
        }
    }
}

/// 构建后的单条边
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCourse {
    /// 在输入列表中的序号
    pub index: usize,
    pub from_id: u32,
    pub to_id: u32,
    pub category: LineCategory,
    /// 弦方位角（局部，弧度），切线边为推算结果
    pub bearing: f64,
    /// 输出坐标系中的弦方位角
    pub output_bearing: f64,
    pub chord: f64,
    pub radius: f64,
    pub minor: bool,
    pub tangent: bool,
    pub center_id: Option<u32>,
    /// 局部坐标系中起点指向圆心的方位角
    pub radial_bearing1: Option<f64>,
    /// 局部坐标系中终点指向圆心的方位角
    pub radial_bearing2: Option<f64>,
    /// 终点是否本次新算出（否则为已有点）
    pub fresh: bool,
    pub local_path: Vec<Point2>,
    pub output_path: Vec<Point2>,
}

impl ResolvedCourse {
    pub fn is_curve(&self) -> bool {
        self.radius != 0.0
    }
}

/// 一次构建的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildOutput {
    /// 输出坐标（含圆心点）
    pub points: BTreeMap<u32, Point2>,
    /// 局部坐标（含圆心点）
    pub local_points: BTreeMap<u32, Point2>,
    /// 圆心点编号
    pub center_ids: BTreeSet<u32>,
    pub courses: Vec<ResolvedCourse>,
    /// 被跳过的边
    pub issues: Vec<BuildError>,
}

impl BuildOutput {
    /// 第 `index` 条输入边的构建结果
    pub fn course(&self, index: usize) -> Option<&ResolvedCourse> {
        self.courses.iter().find(|c| c.index == index)
    }

    pub fn is_center(&self, id: u32) -> bool {
        self.center_ids.contains(&id)
    }
}

/// 重新分配点编号
///
/// 跳过弦长为 0 的边（编号清零）；曲线边多占一个编号作为圆心。
/// 给定 `closing_point` 时，最后一条有效边的终点改为该点。
pub fn resequence(courses: &mut [Course], closing_point: Option<u32>) {
    let mut id = 1u32;
    let mut last_valid = None;
    for (index, course) in courses.iter_mut().enumerate() {
        if course.chord_length() == 0.0 {
            course.from_id = 0;
            course.to_id = 0;
            course.set_center_point_id(None);
            continue;
        }

        course.from_id = id;
        id += 1;
        if course.is_curve() {
            course.set_center_point_id(Some(id));
            id += 1;
        } else {
            course.set_center_point_id(None);
        }
        course.to_id = id;
        last_valid = Some(index);
    }

    if let (Some(index), Some(closing)) = (last_valid, closing_point) {
        courses[index].to_id = closing;
    }
}

/// 从 `seed + 1` 起找一个未被占用的编号
fn next_point_id(seed: u32, points: &BTreeMap<u32, Point2>) -> u32 {
    let mut id = seed + 1;
    while points.contains_key(&id) {
        id += 1;
    }
    id
}

/// 构建导线点链
///
/// 第一条有编号的边的起点绑定到起算点；其余边的起点必须已经算出，否则记录问题并跳过。
/// 终点已存在时直接使用已有坐标。给定 `adjustment` 时，每个新算出的终点按本边弦长
/// 比例加上改正量，逐边累积即为罗盘法。
pub fn build(courses: &[Course], params: &BuildParams, adjustment: Option<&Adjustment>) -> BuildOutput {
    let mut out = BuildOutput::default();
    let mut running_tangent = 0.0;
    let mut bound = false;

    for (index, course) in courses.iter().enumerate() {
        if !course.has_ids() {
            continue;
        }

        let start = if !bound {
            bound = true;
            let start = Point2::origin();
            out.local_points.insert(course.from_id, start);
            out.points.insert(course.from_id, params.origin);
            start
        } else {
            match out.local_points.get(&course.from_id) {
                Some(p) => *p,
                None => {
                    warn!(index, from_id = course.from_id, "起点尚未算出，跳过该边");
                    out.issues.push(BuildError::MissingFromPoint {
                        index,
                        from_id: course.from_id,
                    });
                    continue;
                }
            }
        };

        let chord = course.chord_length();
        let radius = course.radius();
        let minor = course.minor_curve();
        let bearing = if course.is_tangent() {
            resolve_tangent_bearing(running_tangent, chord, radius, minor)
        } else {
            course.bearing_radians()
        };

        let (end, fresh) = match out.local_points.get(&course.to_id) {
            Some(existing) => (*existing, false),
            None => {
                let Some(mut end) = polar_point(start, bearing, chord) else {
                    let issue = if chord == 0.0 {
                        BuildError::ZeroLength { index }
                    } else {
                        BuildError::NonFinite { index }
                    };
                    warn!(index, "{}", issue);
                    out.issues.push(issue);
                    continue;
                };
                if let Some(adjustment) = adjustment {
                    end += adjustment.share(chord);
                }
                out.local_points.insert(course.to_id, end);
                out.points.insert(course.to_id, params.to_output(end));
                (end, true)
            }
        };

        let mut resolved = ResolvedCourse {
            index,
            from_id: course.from_id,
            to_id: course.to_id,
            category: course.category,
            bearing,
            output_bearing: params.output_bearing(bearing),
            chord,
            radius,
            minor,
            tangent: course.is_tangent(),
            center_id: None,
            radial_bearing1: None,
            radial_bearing2: None,
            fresh,
            local_path: vec![start, end],
            output_path: Vec::new(),
        };

        if radius != 0.0 {
            resolved.local_path = construct_arc(start, end, radius, minor, SweepDirection::Clockwise);
            if let Some(center) =
                construct_center_point(start, end, radius, minor, SweepDirection::Clockwise)
            {
                let center_id = course
                    .center_point_id()
                    .unwrap_or_else(|| next_point_id(course.from_id, &out.points));
                out.local_points.entry(center_id).or_insert(center.center);
                out.points
                    .entry(center_id)
                    .or_insert_with(|| params.to_output(center.center));
                out.center_ids.insert(center_id);
                resolved.center_id = Some(center_id);
                resolved.radial_bearing1 = Some(center.radial_bearing1);
                resolved.radial_bearing2 = Some(center.radial_bearing2);
            }
            running_tangent = exit_tangent_bearing(bearing, chord, radius, minor);
        } else {
            running_tangent = bearing;
        }

        resolved.output_path = resolved
            .local_path
            .iter()
            .map(|p| params.to_output(*p))
            .collect();
        out.courses.push(resolved);
    }

    debug!(
        courses = out.courses.len(),
        points = out.points.len(),
        issues = out.issues.len(),
        adjusted = adjustment.is_some(),
        "导线构建完成"
    );
    out
}

/// 原始导线（不缩放、不旋转、不平差）中起算点到某点的方位角与距离
///
/// 用于比例/旋转捕捉：按边记录的方位角直接推算。点不存在时返回 `None`。
pub fn bearing_distance_to_point(courses: &[Course], point_id: u32) -> Option<(f64, f64, Point2)> {
    let mut raw: BTreeMap<u32, Point2> = BTreeMap::new();
    let mut bound = false;

    for course in courses.iter().filter(|c| c.has_ids()) {
        let start = if !bound {
            bound = true;
            raw.insert(course.from_id, Point2::origin());
            Point2::origin()
        } else {
            match raw.get(&course.from_id) {
                Some(p) => *p,
                None => continue,
            }
        };

        if !raw.contains_key(&course.to_id) {
            if let Some(next) = polar_point(start, course.bearing_radians(), course.chord_length()) {
                raw.insert(course.to_id, next);
            }
        }

        if let Some(point) = raw.get(&point_id) {
            let distance = point.coords.norm();
            return Some((bearing_between(Point2::origin(), *point), distance, *point));
        }
    }
    None
}
