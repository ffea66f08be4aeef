//! 宗地导线命令行程序
//!
//! 用法：`parcel-app <document.json> [--xml out.xml] [--verbose]`

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use parcel_core::parcel::Traverse;
use parcel_core::units::AreaUnit;
use parcel_file::{document, save_cexml, ExportOptions};

const USAGE: &str = "Usage: parcel-app <document.json> [--xml out.xml] [--verbose]";

/// 命令行参数
#[derive(Debug, Clone, PartialEq)]
struct CliArgs {
    document: PathBuf,
    xml: Option<PathBuf>,
    verbose: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut document = None;
    let mut xml = None;
    let mut verbose = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--xml" => {
                let Some(path) = args.next() else {
                    bail!("--xml requires an output path\n{}", USAGE);
                };
                xml = Some(PathBuf::from(path));
            }
            "--verbose" | "-v" => verbose = true,
            other if other.starts_with('-') => bail!("Unknown option '{}'\n{}", other, USAGE),
            other => {
                if document.replace(PathBuf::from(other)).is_some() {
                    bail!("Only one document may be given\n{}", USAGE);
                }
            }
        }
    }

    let Some(document) = document else {
        bail!("{}", USAGE);
    };
    Ok(CliArgs {
        document,
        xml,
        verbose,
    })
}

/// 闭合差、边与点的文本报告
fn report(traverse: &Traverse) -> String {
    let result = traverse.last();
    let closure = &result.closure;
    let units = traverse.units();
    let format = traverse.bearing_format();
    let mut lines = Vec::new();

    lines.push(format!(
        "Parcel: {}  Plan: {}",
        traverse.info.parcel_name, traverse.info.plan_name
    ));
    if closure.valid {
        let area_unit = AreaUnit::for_factor(traverse.config().output_units_per_meter);
        lines.push(format!("Misclose bearing:  {}", closure.bearing_text(format)));
        lines.push(format!("Misclose distance: {:.3}", closure.distance));
        lines.push(format!("Ratio:             {}", closure.ratio_label()));
        lines.push(format!("Area:              {:.2} {}", closure.area, area_unit.packet_label()));
        lines.push(format!(
            "Compass rule:      {}",
            if closure.compass_rule_applied { "applied" } else { "not applied" }
        ));
    } else {
        lines.push("Misclose: not available (boundary courses are not connected)".to_string());
    }

    lines.push(String::new());
    lines.push("Courses:".to_string());
    for course in traverse.courses().iter().filter(|c| c.has_ids()) {
        let mut line = format!(
            "  {:>4} -> {:<4} {:<16} {:>12.3}",
            course.from_id,
            course.to_id,
            course.bearing_text(),
            units.output_to_entry(course.chord_length())
        );
        if course.is_curve() {
            line.push_str(&format!("  R {:.3}", units.output_to_entry(course.radius())));
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push("Points:".to_string());
    for (id, point) in &result.build.points {
        let marker = if result.build.is_center(*id) { " (center)" } else { "" };
        lines.push(format!("  {:>4} {:>16.4} {:>16.4}{}", id, point.x, point.y, marker));
    }
    lines.join("\n")
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing::subscriber::set_global_default(FmtSubscriber::builder().with_max_level(level).finish())?;

    let document = document::load(&args.document)
        .with_context(|| format!("Failed to load {}", args.document.display()))?;
    let options = ExportOptions {
        spatial_reference_wkt: document.spatial_reference_wkt.clone(),
        ..Default::default()
    };
    let mut traverse = document.into_traverse()?;
    traverse.recompute();

    for issue in &traverse.last().build.issues {
        warn!("Course {} skipped: {}", issue.course_index() + 1, issue);
    }
    println!("{}", report(&traverse));

    if let Some(path) = &args.xml {
        save_cexml(&traverse, &options, path)
            .with_context(|| format!("Failed to export {}", path.display()))?;
        info!("CE-XML written to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::prelude::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(args(&["lot.json", "--xml", "lot.xml", "-v"])).unwrap();
        assert_eq!(parsed.document, PathBuf::from("lot.json"));
        assert_eq!(parsed.xml, Some(PathBuf::from("lot.xml")));
        assert!(parsed.verbose);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["lot.json", "--xml"])).is_err());
        assert!(parse_args(args(&["lot.json", "--bogus"])).is_err());
        assert!(parse_args(args(&["a.json", "b.json"])).is_err());
    }

    #[test]
    fn test_report_closed_square() {
        let mut traverse = Traverse::new(TraverseConfig {
            bearing_format: BearingFormat::Dd,
            ..Default::default()
        });
        for bearing in ["0", "90", "180", "270"] {
            traverse.add_entry(&CourseEntry::line(bearing, "100"));
        }
        traverse.recompute();

        let text = report(&traverse);
        assert!(text.contains("Ratio:             High"));
        assert!(text.contains("Area:              10000.00 Square Meter"));
        assert!(text.contains("Points:"));
    }

    #[test]
    fn test_report_broken_chain() {
        let mut traverse = Traverse::new(TraverseConfig {
            bearing_format: BearingFormat::Dd,
            ..Default::default()
        });
        traverse.add_entry(&CourseEntry::line("0", "100"));
        traverse.add_entry(&CourseEntry {
            category: LineCategory::Connection,
            ..CourseEntry::line("90", "100")
        });
        traverse.add_entry(&CourseEntry::line("180", "100"));
        traverse.recompute();
        assert!(report(&traverse).contains("not available"));
    }
}
