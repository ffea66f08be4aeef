//! 比例/旋转捕捉
//!
//! 拖动缩放或旋转导线时，把选中的导线点吸附到附近的既有线段上：
//! - 旋转：导线点绕起算点画圆，与候选线段求交
//! - 缩放：起算点指向导线点的射线与候选线段求交
//!
//! 候选线段由调用方提供（外部要素），本模块只做几何判断。

use crate::math::{angle_at, bearing_direction, polar_point, Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 线段求交时排除端点附近的距离
pub const SELF_INTERSECT_TOLERANCE: f64 = 0.01;

/// 候选缓存复用时允许的搜索半径变化
const RECACHE_DISTANCE: f64 = 0.1;

/// 缩放捕捉时射线的延伸倍数
const SCALE_SEARCH_FACTOR: f64 = 1.5;

/// 候选线段
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapSegment {
    /// 外部要素编号
    pub id: u32,
    pub start: Point2,
    pub end: Point2,
}

impl SnapSegment {
    pub fn new(id: u32, start: Point2, end: Point2) -> Self {
        Self { id, start, end }
    }

    /// 线段上离 `p` 最近的点的距离
    pub fn distance_to(&self, p: Point2) -> f64 {
        let d = self.end - self.start;
        let len_sq = d.norm_squared();
        if len_sq < EPSILON {
            return (p - self.start).norm();
        }
        let t = ((p - self.start).dot(&d) / len_sq).clamp(0.0, 1.0);
        (p - (self.start + d * t)).norm()
    }
}

/// 旋转到以 `start → end` 为 x 轴的坐标系，返回 `(线段长度, 点的 x, 点的 y)`
fn to_segment_frame(start: Point2, end: Point2, p: Point2) -> Option<(f64, f64, f64)> {
    let d = end - start;
    if d.x == 0.0 && d.y == 0.0 {
        return None;
    }
    let angle = d.y.atan2(d.x);
    let (s, c) = angle.sin_cos();
    let length = d.x * c + d.y * s;
    let q = p - start;
    Some((length, q.x * c + q.y * s, q.y * c - q.x * s))
}

/// 点到线段的垂距
///
/// 垂足不落在线段范围内时返回 `None`。
pub fn find_perpendicular_distance(start: Point2, end: Point2, p: Point2) -> Option<f64> {
    let (length, x, y) = to_segment_frame(start, end, p)?;
    if x < 0.0 || x > length {
        return None;
    }
    Some(y.abs())
}

/// 两直线交点
///
/// 按无限长直线求交，但交点必须落在 `line1` 内部，且离其两端不小于
/// [`SELF_INTERSECT_TOLERANCE`]。平行时返回 `None`。
pub fn line_line_intersection(line1: (Point2, Point2), line2: (Point2, Point2)) -> Option<Point2> {
    let (p1, p2) = line1;
    let (p3, p4) = line2;
    let divider = (p1.x - p2.x) * (p3.y - p4.y) - (p1.y - p2.y) * (p3.x - p4.x);
    if divider.abs() < EPSILON {
        return None;
    }
    let a = p1.x * p2.y - p1.y * p2.x;
    let b = p3.x * p4.y - p3.y * p4.x;
    let intersection = Point2::new(
        (a * (p3.x - p4.x) - (p1.x - p2.x) * b) / divider,
        (a * (p3.y - p4.y) - (p1.y - p2.y) * b) / divider,
    );

    let (length, x, _) = to_segment_frame(p1, p2, intersection)?;
    if x < SELF_INTERSECT_TOLERANCE || x > length - SELF_INTERSECT_TOLERANCE {
        return None;
    }
    Some(intersection)
}

/// 直线与圆的交点
///
/// 圆以 `center` 为圆心、`radius` 为半径；`bearing` 方向上距圆心 `radius` 的点为投影点，
/// 其垂足必须落在线段内部。两个解中取离投影点较近者。直线与圆不相交时返回 `None`。
pub fn line_circle_intersection(
    line: (Point2, Point2),
    center: Point2,
    bearing: f64,
    radius: f64,
) -> Option<Point2> {
    let (start, end) = line;
    let projected = polar_point(center, bearing, radius)?;
    let (length, px, _) = to_segment_frame(start, end, projected)?;
    if px <= 0.0 || px >= length {
        return None;
    }

    let (_, cx, cy) = to_segment_frame(start, end, center)?;
    let k_sq = radius * radius - cy * cy;
    if k_sq < 0.0 {
        return None;
    }
    let k = k_sq.sqrt();

    let direction = (end - start) / length;
    let solution1 = start + direction * (cx + k);
    let solution2 = start + direction * (cx - k);
    if (solution1 - projected).norm() <= (solution2 - projected).norm() {
        Some(solution1)
    } else {
        Some(solution2)
    }
}

/// 在点字典中找离 `p` 最近且在容差内的点
pub fn nearest_point(points: &BTreeMap<u32, Point2>, p: Point2, tolerance: f64) -> Option<(u32, Point2)> {
    points
        .iter()
        .map(|(id, q)| (*id, *q, (q - p).norm()))
        .filter(|(_, _, d)| *d < tolerance)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(id, q, _)| (id, q))
}

/// 捕捉模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapMode {
    Rotate,
    Scale,
}

/// 候选线段缓存
///
/// 以起算点为中心、按搜索距离收集候选线段；起算点与搜索范围不变时复用。
#[derive(Debug, Clone, Default)]
pub struct SnapCache {
    anchor: Option<Point2>,
    search_distance: f64,
    mode: Option<SnapMode>,
    segments: Vec<SnapSegment>,
}

impl SnapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[SnapSegment] {
        &self.segments
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// 是否需要重新收集候选
    ///
    /// 旋转模式下半径变化超过 0.1 时重建；缩放模式下搜索距离增大时重建。
    pub fn needs_refresh(&self, anchor: Point2, search_distance: f64, mode: SnapMode) -> bool {
        if self.anchor != Some(anchor) || self.mode != Some(mode) {
            return true;
        }
        match mode {
            SnapMode::Rotate => (self.search_distance - search_distance).abs() > RECACHE_DISTANCE,
            SnapMode::Scale => self.search_distance < search_distance,
        }
    }

    /// 收集离 `anchor` 不超过 `search_distance` 的线段
    pub fn collect<I>(&mut self, candidates: I, anchor: Point2, search_distance: f64, mode: SnapMode)
    where
        I: IntoIterator<Item = SnapSegment>,
    {
        self.anchor = Some(anchor);
        self.search_distance = search_distance;
        self.mode = Some(mode);
        self.segments = candidates
            .into_iter()
            .filter(|s| s.distance_to(anchor) <= search_distance)
            .collect();
    }

    /// 找离 `p` 垂距最小且在容差内的线段
    ///
    /// `skip_zero` 时忽略垂距恰为 0 的线段（缩放时避免吸附到起算点所在的线）。
    pub fn snap_line(&self, p: Point2, tolerance: f64, skip_zero: bool) -> Option<&SnapSegment> {
        self.segments
            .iter()
            .filter_map(|s| find_perpendicular_distance(s.start, s.end, p).map(|d| (s, d)))
            .filter(|(_, d)| *d <= tolerance && !(skip_zero && *d == 0.0))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s)
    }
}

/// 参与比例/旋转捕捉的导线点（原始导线中相对起算点的位置）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapAnchor {
    pub point_id: u32,
    /// 起算点到该点的方位角（原始导线）
    pub bearing: f64,
    /// 起算点到该点的距离（原始导线）
    pub distance: f64,
}

impl SnapAnchor {
    /// 当前比例与旋转下该点的输出坐标
    pub fn placed(&self, origin: Point2, scale: f64, rotation: f64) -> Option<Point2> {
        polar_point(origin, self.bearing - rotation, self.distance * scale)
    }

    /// 原始导线中该点相对起算点的向量
    fn raw_vector(&self) -> Vector2 {
        bearing_direction(self.bearing) * self.distance
    }

    /// 旋转捕捉：返回使该点落到候选线段上的新旋转角
    ///
    /// 交点离光标超过容差时不吸附。
    pub fn solve_rotation(
        &self,
        cache: &SnapCache,
        origin: Point2,
        scale: f64,
        rotation: f64,
        cursor: Point2,
        tolerance: f64,
    ) -> Option<f64> {
        let placed = self.placed(origin, scale, rotation)?;
        let line = cache.snap_line(placed, tolerance, false)?;
        let intersection = line_circle_intersection(
            (line.start, line.end),
            origin,
            self.bearing - rotation,
            self.distance * scale,
        )?;
        if (intersection - cursor).norm() > tolerance {
            return None;
        }
        Some(angle_at(origin, origin + self.raw_vector(), intersection))
    }

    /// 缩放捕捉：返回使该点落到候选线段上的新比例
    pub fn solve_scale(
        &self,
        cache: &SnapCache,
        origin: Point2,
        scale: f64,
        rotation: f64,
        cursor: Point2,
        tolerance: f64,
    ) -> Option<f64> {
        let placed = self.placed(origin, scale, rotation)?;
        let line = cache.snap_line(placed, tolerance, true)?;
        let ray_end = polar_point(origin, self.bearing - rotation, self.distance * scale + tolerance)?;
        let intersection = line_line_intersection((line.start, line.end), (origin, ray_end))?;
        if (intersection - cursor).norm() > tolerance {
            return None;
        }
        if self.distance <= 0.0 {
            return None;
        }
        let new_scale = (intersection - origin).norm() / self.distance;
        (new_scale > 0.0).then_some(new_scale)
    }

    /// 候选收集半径
    pub fn search_distance(&self, scale: f64, mode: SnapMode) -> f64 {
        match mode {
            SnapMode::Rotate => self.distance * scale,
            SnapMode::Scale => self.distance * SCALE_SEARCH_FACTOR * scale,
        }
    }
}
