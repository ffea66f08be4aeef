//! 数学基础类型与方位角换算
//!
//! 坐标系约定：x 向东，y 向北。方位角以弧度表示，自北顺时针量取。

use std::f64::consts::{FRAC_PI_2, TAU};

pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;

/// 浮点比较容差
pub const EPSILON: f64 = 1e-10;

/// 角度转弧度
#[inline]
pub fn to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// 弧度转角度
#[inline]
pub fn to_degrees(radians: f64) -> f64 {
    radians.to_degrees()
}

/// 将弧度方位角折算到 [0, 2π)
#[inline]
pub fn wrap_radians(bearing: f64) -> f64 {
    let wrapped = bearing.rem_euclid(TAU);
    // rem_euclid 对极小负数可能返回 TAU
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// 将角度方位角折算到 [0, 360)
#[inline]
pub fn wrap_degrees(bearing: f64) -> f64 {
    let wrapped = bearing.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// 方位角对应的单位方向向量
#[inline]
pub fn bearing_direction(bearing: f64) -> Vector2 {
    let angle = FRAC_PI_2 - bearing;
    Vector2::new(angle.cos(), angle.sin())
}

/// 极坐标推算点：从 `start` 沿 `bearing` 前进 `distance`
///
/// 距离为 0 或结果非有限值时返回 `None`。
pub fn polar_point(start: Point2, bearing: f64, distance: f64) -> Option<Point2> {
    if distance == 0.0 {
        return None;
    }
    let end = start + bearing_direction(bearing) * distance;
    if end.x.is_finite() && end.y.is_finite() {
        Some(end)
    } else {
        None
    }
}

/// 从 `from` 指向 `to` 的方位角，范围 [0, 2π)
pub fn bearing_between(from: Point2, to: Point2) -> f64 {
    let d = to - from;
    wrap_radians(FRAC_PI_2 - d.y.atan2(d.x))
}

/// 以 `center` 为中心，从 `from` 转到 `to` 的角度，范围 (-π, π]
pub fn angle_at(center: Point2, from: Point2, to: Point2) -> f64 {
    let a = from - center;
    let b = to - center;
    let angle = b.y.atan2(b.x) - a.y.atan2(a.x);
    if angle > std::f64::consts::PI {
        angle - TAU
    } else if angle <= -std::f64::consts::PI {
        angle + TAU
    } else {
        angle
    }
}

/// 将向量按方位角旋转：正角度为顺时针（与方位角增加方向一致）
pub fn rotate_clockwise(v: Vector2, angle: f64) -> Vector2 {
    let (s, c) = angle.sin_cos();
    Vector2::new(v.x * c + v.y * s, v.y * c - v.x * s)
}

/// 鞋带公式求多边形有向面积（逆时针为正）
pub fn signed_area(ring: &[Point2]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let p = ring[i];
        let q = ring[(i + 1) % ring.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_polar_point_east() {
        let p = polar_point(Point2::origin(), PI / 2.0, 10.0).unwrap();
        assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_polar_point_zero_distance() {
        assert!(polar_point(Point2::origin(), 1.0, 0.0).is_none());
    }

    #[test]
    fn test_bearing_between() {
        let o = Point2::origin();
        assert_abs_diff_eq!(bearing_between(o, Point2::new(0.0, 5.0)), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_between(o, Point2::new(5.0, 0.0)), PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_between(o, Point2::new(-5.0, 0.0)), 1.5 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap() {
        assert_abs_diff_eq!(wrap_radians(-PI / 2.0), 1.5 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_degrees(370.0), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_degrees(-90.0), 270.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_clockwise() {
        let v = rotate_clockwise(Vector2::new(0.0, 1.0), PI / 2.0);
        assert_abs_diff_eq!(v.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_signed_area_square() {
        let ring = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        assert_abs_diff_eq!(signed_area(&ring), 100.0, epsilon = 1e-12);
    }
}
