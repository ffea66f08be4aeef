//! 曲线几何
//!
//! 由弦的两端点、半径与大小弧标志构造圆心、径向方位角及加密后的弧线点列，
//! 并推算切线曲线的弦方位角。
//!
//! 半径符号表示曲线方向：正为右转（顺时针），负为左转（逆时针）。
//!
//! # 几何判定真值表
//!
//! 圆心相对弦方向的一侧（[`center_on_left`]）：
//!
//! | 大弧 | 逆时针 | 圆心在左 |
//! |------|--------|----------|
//! | 否   | 否     | 是       |
//! | 否   | 是     | 否       |
//! | 是   | 否     | 否       |
//! | 是   | 是     | 是       |
//!
//! 角度展开（[`needs_angle_unwrap`]）：大弧且两端角差小于 π，或小弧且角差不小于 π 时，
//! 较小的角加 2π。
//!
//! 切线方位反向（[`reverses_tangent`]）：
//!
//! | 左转 | 小弧 | 反向 |
//! |------|------|------|
//! | 是   | 是   | 是   |
//! | 是   | 否   | 否   |
//! | 否   | 是   | 否   |
//! | 否   | 否   | 是   |

use crate::math::{polar_point, wrap_radians, Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// 弧线加密的初始步长（弧长比例）
const INITIAL_STEP: f64 = 1.0 / 50.0;

/// 弧线最大顶点数（含终点）
pub const MAX_ARC_VERTICES: usize = 160;

/// 扫掠方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SweepDirection {
    Clockwise,
    Counterclockwise,
}

impl SweepDirection {
    pub fn reversed(self) -> Self {
        match self {
            SweepDirection::Clockwise => SweepDirection::Counterclockwise,
            SweepDirection::Counterclockwise => SweepDirection::Clockwise,
        }
    }
}

/// 圆心是否位于弦方向左侧
#[inline]
pub fn center_on_left(is_large: bool, is_counterclockwise: bool) -> bool {
    is_large == is_counterclockwise
}

/// 是否需要给较小的角加 2π 以选中正确的弧
#[inline]
pub fn needs_angle_unwrap(is_large: bool, angle_gap_below_pi: bool) -> bool {
    is_large == angle_gap_below_pi
}

/// 切线曲线推算的方位是否需要反向
#[inline]
pub fn reverses_tangent(left_hand: bool, minor: bool) -> bool {
    left_hand == minor
}

/// 圆心与径向方位角
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterPoint {
    pub center: Point2,
    /// 起点指向圆心的方位角（弧度）
    pub radial_bearing1: f64,
    /// 终点指向圆心的方位角（弧度）
    pub radial_bearing2: f64,
    /// 圆心到起点的极角（已展开）
    start_angle: f64,
    /// 圆心到终点的极角（已展开）
    end_angle: f64,
    radius: f64,
}

impl CenterPoint {
    /// 弧上按弧长比例 `fraction`（0..=1）取点
    pub fn point_at(&self, fraction: f64) -> Point2 {
        let angle = self.start_angle + (self.end_angle - self.start_angle) * fraction;
        self.center + Vector2::new(angle.cos(), angle.sin()) * self.radius
    }

    /// 圆心角（弧度，非负）
    pub fn sweep_angle(&self) -> f64 {
        (self.end_angle - self.start_angle).abs()
    }
}

/// 由弦两端点构造圆心
///
/// 正半径时扫掠方向取反（从终点回看）。半径小于半弦长时圆心落在弦中点。
pub fn construct_center_point(
    start: Point2,
    end: Point2,
    radius: f64,
    is_minor: bool,
    sweep: SweepDirection,
) -> Option<CenterPoint> {
    let sweep = if radius > 0.0 { sweep.reversed() } else { sweep };
    let is_large = !is_minor;
    let is_ccw = sweep == SweepDirection::Counterclockwise;

    let chord = end - start;
    let half_chord = chord.norm() / 2.0;
    if half_chord < EPSILON || radius == 0.0 {
        return None;
    }

    let offset = if center_on_left(is_large, is_ccw) {
        Vector2::new(-chord.y, chord.x)
    } else {
        Vector2::new(chord.y, -chord.x)
    }
    .normalize();

    let center_distance = (radius * radius - half_chord * half_chord).max(0.0).sqrt();
    let mid = nalgebra::center(&start, &end);
    let center = mid + offset * center_distance;
    if !center.x.is_finite() || !center.y.is_finite() {
        return None;
    }

    let mut angle1 = (start.y - center.y).atan2(start.x - center.x);
    let mut angle2 = (end.y - center.y).atan2(end.x - center.x);
    if needs_angle_unwrap(is_large, (angle2 - angle1).abs() < PI) {
        if angle1 < angle2 {
            angle1 += TAU;
        } else {
            angle2 += TAU;
        }
    }

    // 极角转方位角后反向，得到端点指向圆心的方位
    let radial_bearing1 = wrap_radians(FRAC_PI_2 - angle1 - PI);
    let radial_bearing2 = wrap_radians(FRAC_PI_2 - angle2 - PI);

    Some(CenterPoint {
        center,
        radial_bearing1,
        radial_bearing2,
        start_angle: angle1,
        end_angle: angle2,
        radius: radius.abs(),
    })
}

/// 由起点、弦方位角与弦长构造圆心
pub fn construct_center_point_polar(
    start: Point2,
    bearing: f64,
    chord: f64,
    radius: f64,
    is_minor: bool,
    sweep: SweepDirection,
) -> Option<CenterPoint> {
    let end = polar_point(start, bearing, chord)?;
    construct_center_point(start, end, radius, is_minor, sweep)
}

/// 构造加密后的弧线点列
///
/// 先以 1/50 弧长比例试探单段长度，按每段约一个长度单位调整细分，
/// 顶点数不超过 [`MAX_ARC_VERTICES`]，末点严格等于 `end`。
/// 圆心无法构造时退化为直线。
pub fn construct_arc(
    start: Point2,
    end: Point2,
    radius: f64,
    is_minor: bool,
    sweep: SweepDirection,
) -> Vec<Point2> {
    let Some(center) = construct_center_point(start, end, radius, is_minor, sweep) else {
        return vec![start, end];
    };

    let mut step = INITIAL_STEP;
    let probe = (center.point_at(step) - center.point_at(0.0)).norm();
    if probe > 1.0 {
        step /= probe;
    }

    let segments = ((1.0 / step - 1e-9).ceil() as usize).clamp(1, MAX_ARC_VERTICES - 1);
    let mut points: Vec<Point2> = (0..segments)
        .map(|k| center.point_at(k as f64 / segments as f64))
        .collect();
    points.push(end);
    points
}

/// 由起点、弦方位角与弦长构造弧线，同时返回终点
pub fn construct_arc_polar(
    start: Point2,
    bearing: f64,
    chord: f64,
    radius: f64,
    is_minor: bool,
    sweep: SweepDirection,
) -> Option<(Vec<Point2>, Point2)> {
    let end = polar_point(start, bearing, chord)?;
    Some((construct_arc(start, end, radius, is_minor, sweep), end))
}

/// 推算切线边的弦方位角
///
/// `incoming` 为前一条边的出射切线方位。直线边直接沿用；曲线边由起点径向方位
/// 偏转 ±π/2 得到切线，再对称得到弦方位。
pub fn resolve_tangent_bearing(incoming: f64, chord: f64, radius: f64, is_minor: bool) -> f64 {
    if radius == 0.0 {
        return incoming;
    }
    let Some(center) = construct_center_point_polar(
        Point2::origin(),
        incoming,
        chord,
        radius,
        is_minor,
        SweepDirection::Clockwise,
    ) else {
        return incoming;
    };

    let tangent = if is_minor {
        center.radial_bearing1 - FRAC_PI_2
    } else {
        center.radial_bearing1 + FRAC_PI_2
    };
    let mut bearing = incoming + (incoming - tangent);
    if reverses_tangent(radius < 0.0, is_minor) {
        bearing += PI;
    }
    wrap_radians(bearing)
}

/// 曲线终点处的出射切线方位
///
/// 终点径向方位减 π/2，左转曲线再反向。圆心无法构造时沿用弦方位。
pub fn exit_tangent_bearing(bearing: f64, chord: f64, radius: f64, is_minor: bool) -> f64 {
    if radius == 0.0 {
        return bearing;
    }
    let Some(center) = construct_center_point_polar(
        Point2::origin(),
        bearing,
        chord,
        radius,
        is_minor,
        SweepDirection::Clockwise,
    ) else {
        return bearing;
    };
    let mut tangent = center.radial_bearing2 - FRAC_PI_2;
    if radius < 0.0 {
        tangent += PI;
    }
    wrap_radians(tangent)
}
