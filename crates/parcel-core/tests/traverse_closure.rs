//! 导线重算端到端场景

use approx::assert_abs_diff_eq;
use parcel_core::closure::{self, HIGH_RATIO};
use parcel_core::prelude::*;
use parcel_core::traverse;

fn dd_config() -> TraverseConfig {
    TraverseConfig {
        bearing_format: BearingFormat::Dd,
        ..Default::default()
    }
}

fn square() -> Traverse {
    let mut t = Traverse::new(dd_config());
    for bearing in ["0", "90", "180", "270"] {
        t.add_entry(&CourseEntry::line(bearing, "100"));
    }
    t
}

#[test]
fn test_closed_square() {
    let mut t = square();
    let result = t.recompute().clone();
    assert!(result.closure.valid);
    assert!(result.closure.distance < 1e-9);
    assert_abs_diff_eq!(result.closure.area, 10_000.0, epsilon = 1e-6);
    assert_abs_diff_eq!(result.closure.ratio, HIGH_RATIO);
    assert!(result.closure.is_high_ratio());
    assert_eq!(result.closure.ratio_label(), "High");
    assert!(result.build.issues.is_empty());
}

#[test]
fn test_square_with_origin_scale_and_rotation() {
    let mut t = square();
    t.set_origin(Point2::new(500.0, 500.0));
    t.set_scale(2.0);
    t.set_rotation_text("90");
    let result = t.recompute().clone();

    // 面积与闭合差在局部坐标系中计算，不受比例和旋转影响
    assert_abs_diff_eq!(result.closure.area, 10_000.0, epsilon = 1e-6);
    // 第一条边方位角 0 旋转 90° 后向东，长度加倍
    let p2 = result.build.points[&2];
    assert_abs_diff_eq!(p2.x, 700.0, epsilon = 1e-9);
    assert_abs_diff_eq!(p2.y, 500.0, epsilon = 1e-9);
}

#[test]
fn test_broken_chain_is_invalid() {
    let mut t = Traverse::new(dd_config());
    t.add_entry(&CourseEntry::line("0", "100"));
    t.add_entry(&CourseEntry::line("90", "100"));
    t.add_entry(&CourseEntry::line("180", "100"));
    t.recompute();

    // 第三条边改为从起点出发，边链不再首尾相接
    let mut courses = t.courses().to_vec();
    courses[2].from_id = 1;
    courses[2].to_id = 10;
    let build = traverse::build(&courses, &BuildParams::default(), None);
    assert!(build.issues.is_empty());
    assert!(closure::measure(&build).is_none());

    let result = ClosureResult::invalid();
    assert!(!result.valid);
    assert_eq!(result.bearing_deg, 0.0);
    assert_eq!(result.distance, 0.0);
    assert_eq!(result.area, 0.0);
    assert_eq!(result.ratio, 0.0);
}

#[test]
fn test_connection_between_boundaries_breaks_chain() {
    let mut t = Traverse::new(dd_config());
    t.add_entry(&CourseEntry::line("0", "100"));
    t.add_entry(&CourseEntry {
        category: LineCategory::Connection,
        ..CourseEntry::line("90", "100")
    });
    t.add_entry(&CourseEntry::line("180", "100"));
    let result = t.recompute();
    assert!(!result.closure.valid);
    assert_eq!(result.closure.area, 0.0);
    assert_eq!(result.closure.ratio_label(), "");
}

#[test]
fn test_small_misclose_is_adjusted_by_compass_rule() {
    let mut t = Traverse::new(dd_config());
    t.add_entry(&CourseEntry::line("0", "100"));
    t.add_entry(&CourseEntry::line("90", "100"));
    t.add_entry(&CourseEntry::line("180", "100"));
    t.add_entry(&CourseEntry::line("270", "101"));
    let result = t.recompute().clone();

    assert!(result.closure.valid);
    assert!(result.closure.compass_rule_applied);
    assert_abs_diff_eq!(result.closure.distance, 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.closure.bearing_deg, 90.0, epsilon = 1e-6);
    assert_abs_diff_eq!(result.closure.ratio, 401.0, epsilon = 1e-6);

    // 最后一点被改正回起点，中间点按累计弦长比例改正
    let last = result.build.local_points[&5];
    assert_abs_diff_eq!(last.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(last.y, 0.0, epsilon = 1e-9);
    let p2 = result.build.local_points[&2];
    assert_abs_diff_eq!(p2.x, 100.0 / 401.0, epsilon = 1e-9);
    assert_abs_diff_eq!(p2.y, 100.0, epsilon = 1e-9);
}

#[test]
fn test_large_misclose_is_reported_not_adjusted() {
    let mut t = Traverse::new(dd_config());
    t.add_entry(&CourseEntry::line("0", "100"));
    t.add_entry(&CourseEntry::line("90", "100"));
    t.add_entry(&CourseEntry::line("180", "90"));
    let result = t.recompute();

    assert!(result.closure.valid);
    assert!(!result.closure.compass_rule_applied);
    let expected = (100.0f64.powi(2) + 10.0f64.powi(2)).sqrt();
    assert_abs_diff_eq!(result.closure.distance, expected, epsilon = 1e-9);
}

#[test]
fn test_misclose_in_entry_units() {
    let mut t = Traverse::new(TraverseConfig {
        entry_units_per_meter: 0.3048,
        output_units_per_meter: 1.0,
        bearing_format: BearingFormat::Dd,
        ..Default::default()
    });
    t.add_entry(&CourseEntry::line("0", "100"));
    t.add_entry(&CourseEntry::line("90", "100"));
    t.add_entry(&CourseEntry::line("180", "100"));
    let result = t.recompute();
    // 边长按米计算，闭合差换回英尺显示
    assert_abs_diff_eq!(result.closure.distance, 100.0, epsilon = 1e-9);
}

#[test]
fn test_chord_as_diameter_curve() {
    let mut t = Traverse::new(dd_config());
    t.add_entry(&CourseEntry::curve("0", "50", "100"));
    let result = t.recompute().clone();
    let center = result.build.local_points[&2];
    assert!(result.build.is_center(2));
    assert_abs_diff_eq!(center.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(center.y, 50.0, epsilon = 1e-9);
}

#[test]
fn test_tangent_curve_after_straight() {
    // 北向直线后接右转切线曲线，半径 100，弦长 100（圆心角 60°）
    let mut t = Traverse::new(dd_config());
    t.add_entry(&CourseEntry::line("0", "100"));
    t.add_entry(&CourseEntry::curve("*", "100", "100"));
    let result = t.recompute().clone();

    let curve = result.build.course(1).unwrap();
    assert!(curve.tangent);
    assert_abs_diff_eq!(curve.bearing, 30f64.to_radians(), epsilon = 1e-9);
    assert_abs_diff_eq!(t.courses()[1].bearing_degrees().unwrap(), 30.0, epsilon = 1e-9);

    // 圆心在起点正东
    let center_id = curve.center_id.unwrap();
    let center = result.build.local_points[&center_id];
    assert_abs_diff_eq!(center.x, 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(center.y, 100.0, epsilon = 1e-9);
}

#[test]
fn test_arc_length_entry() {
    let mut t = Traverse::new(dd_config());
    let arc = 100.0 * std::f64::consts::FRAC_PI_3;
    t.add_entry(&CourseEntry {
        bearing: "0".to_string(),
        distance: format!("{} a", arc),
        radius: "100".to_string(),
        ..Default::default()
    });
    t.recompute();
    assert_abs_diff_eq!(t.courses()[0].chord_length(), 100.0, epsilon = 1e-9);
    assert!(t.courses()[0].minor_curve());
}

#[test]
fn test_closing_point_reuses_start() {
    let mut t = square();
    t.set_closing_point(Some(1));
    let result = t.recompute().clone();
    let last = result.build.course(3).unwrap();
    assert_eq!(last.to_id, 1);
    assert!(!last.fresh);
    assert_eq!(result.build.points.len(), 4);
}

#[test]
fn test_recompute_is_idempotent() {
    let mut t = square();
    t.add_entry(&CourseEntry::curve("*", "-80", "60"));
    let first = t.recompute().clone();
    let second = t.recompute().clone();
    assert_eq!(first, second);
}

#[test]
fn test_mixed_notations_are_normalized() {
    let mut t = Traverse::new(TraverseConfig::default());
    t.add_entry(&CourseEntry::line("N45.0000E", "100"));
    t.add_entry(&CourseEntry::line("45-00-00-2", "100"));
    t.add_entry(&CourseEntry::line("S45.0000W", "100"));
    t.add_entry(&CourseEntry::line("315.0000", "100m"));
    let result = t.recompute().clone();

    assert!(result.closure.valid);
    assert_abs_diff_eq!(result.closure.area, 10_000.0, epsilon = 1e-6);
    let texts: Vec<String> = t.courses().iter().map(|c| c.bearing_text()).collect();
    assert_eq!(texts, ["45.0000", "135.0000", "225.0000", "315.0000"]);
}
