//! CE-XML（GeoSurvey 数据包）导出
//!
//! 数据包结构：
//! - `units`：输出距离单位、角度单位与方位角约定
//! - `jobParameters`：仅在提供空间参考 WKT 时写出
//! - `plans/plan`：录入单位、记法与宗地（`parcels/parcel`）
//! - `points`、`controlPoints`：空节点
//!
//! 数值统一保留 6 位小数；每条曲线额外写出起点、终点到圆心的两条径向线。

use crate::error::FileError;
use parcel_core::bearing::BearingFormat;
use parcel_core::course::LineCategory;
use parcel_core::math::to_degrees;
use parcel_core::parcel::{CourseRecord, DocumentType, Traverse};
use parcel_core::units::{packet_unit_label, AreaUnit};
use std::path::Path;

const PACKET_NAMESPACE: &str = "http://www.geodata.com.au/schemas/GeoSurvey/ESRI/1.0/";
const SCHEMA_VERSION: &str = "2.0";
const INDENT: &str = "  ";
const NEWLINE: &str = "\r\n";

/// 导出选项
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// 写入 `jobParameters` 的所有者名称
    pub owner: String,
    /// 输出空间参考 WKT；为空时不写 `jobParameters`
    pub spatial_reference_wkt: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            owner: "ParcelTraverse".to_string(),
            spatial_reference_wkt: None,
        }
    }
}

/// 转义 XML 文本
fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// 6 位小数
fn fixed(value: f64) -> String {
    format!("{:.6}", value)
}

/// 逐行生成带缩进的 XML
struct XmlWriter {
    output: Vec<String>,
    open: Vec<&'static str>,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            output: vec![r#"<?xml version="1.0" encoding="utf-8"?>"#.to_string()],
            open: Vec::new(),
        }
    }

    fn indent(&self) -> String {
        INDENT.repeat(self.open.len())
    }

    fn start(&mut self, name: &'static str) {
        self.output.push(format!("{}<{}>", self.indent(), name));
        self.open.push(name);
    }

    fn start_with_namespace(&mut self, prefix: &str, name: &'static str, namespace: &str) {
        self.output.push(format!(
            "{}<{}:{} xmlns:{}=\"{}\">",
            self.indent(),
            prefix,
            name,
            prefix,
            escape_xml(namespace)
        ));
        self.open.push(name);
    }

    fn end(&mut self) {
        if let Some(name) = self.open.pop() {
            self.output.push(format!("{}</{}>", self.indent(), name));
        }
    }

    fn end_with_prefix(&mut self, prefix: &str) {
        if let Some(name) = self.open.pop() {
            self.output.push(format!("{}</{}:{}>", self.indent(), prefix, name));
        }
    }

    fn element(&mut self, name: &str, value: impl std::fmt::Display) {
        let value = escape_xml(&value.to_string());
        self.output.push(format!("{}<{}>{}</{}>", self.indent(), name, value, name));
    }

    fn empty(&mut self, name: &str) {
        self.output.push(format!("{}<{} />", self.indent(), name));
    }

    fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.end();
        }
        let mut text = self.output.join(NEWLINE);
        text.push_str(NEWLINE);
        text
    }
}

/// 方位角单位：象限与度分秒记法写 DMS
fn angle_unit(format: BearingFormat) -> &'static str {
    match format {
        BearingFormat::Nswe | BearingFormat::QuadrantBearing | BearingFormat::Dms => "DMS",
        BearingFormat::Dd | BearingFormat::Unknown => "Degree",
    }
}

fn direction_format(format: BearingFormat) -> &'static str {
    if format == BearingFormat::QuadrantBearing {
        "Quadrant"
    } else {
        "North Azimuth"
    }
}

/// 待写出的一条线
struct PacketLine {
    from: u32,
    to: u32,
    bearing_deg: f64,
    distance: f64,
    category: LineCategory,
    center: Option<(f64, u32)>,
}

impl PacketLine {
    fn write(&self, writer: &mut XmlWriter, document_type: &DocumentType) {
        if self.from == 0 || self.to == 0 || self.distance == 0.0 {
            return;
        }
        writer.start("line");
        writer.element("fromPoint", self.from);
        writer.element("toPoint", self.to);
        writer.element("bearing", fixed(self.bearing_deg));
        writer.element("distance", fixed(self.distance));
        writer.element("category", self.category.name());
        writer.element("type", document_type.code);
        if let Some((radius, center)) = self.center {
            writer.element("radius", fixed(radius));
            writer.element("centerPoint", center);
        }
        writer.end();
    }
}

/// 组装线列表：非径向线按录入顺序，最后一条闭合到第一条界线的起点；随后是径向线
fn packet_lines(records: &[CourseRecord]) -> Vec<PacketLine> {
    let count = records.len();
    let mut first_boundary = None;
    let mut lines = Vec::with_capacity(count * 2);

    for (i, record) in records.iter().enumerate() {
        if first_boundary.is_none() && record.category == LineCategory::Boundary {
            first_boundary = Some(record.from_id);
        }
        if record.category == LineCategory::Radial {
            continue;
        }
        let closing = i + 1 == count && count != 1;
        let to = match first_boundary {
            Some(first) if closing => first,
            _ => record.to_id,
        };
        lines.push(PacketLine {
            from: record.from_id,
            to,
            bearing_deg: record.bearing_deg,
            distance: record.chord,
            category: record.category,
            center: record
                .center_id
                .filter(|_| record.radius != 0.0)
                .map(|center| (record.radius, center)),
        });
    }

    for record in records {
        let Some(center) = record.center_id else {
            continue;
        };
        let radials = [
            (record.from_id, record.radial_bearing1_deg),
            (record.to_id, record.radial_bearing2_deg),
        ];
        for (from, bearing) in radials {
            lines.push(PacketLine {
                from,
                to: center,
                bearing_deg: bearing.unwrap_or(0.0),
                distance: record.radius.abs(),
                category: LineCategory::Radial,
                center: None,
            });
        }
    }
    lines
}

fn write_units(writer: &mut XmlWriter, traverse: &Traverse) {
    writer.start("units");
    writer.element("distanceUnits", packet_unit_label(traverse.config().output_units_per_meter));
    writer.element("angleUnits", "Degree");
    writer.element("directionUnits", "Degree");
    writer.element("directionFormat", "north azimuth");
    writer.end();
}

fn write_job_parameters(writer: &mut XmlWriter, options: &ExportOptions) {
    let Some(wkt) = options.spatial_reference_wkt.as_deref().filter(|w| !w.is_empty()) else {
        return;
    };
    writer.start("jobParameters");
    writer.element("owner", &options.owner);
    writer.element("esriSpatialReference", wkt);
    writer.end();
}

fn write_construction_data(writer: &mut XmlWriter, traverse: &Traverse) {
    let Some(first) = traverse.courses().first() else {
        return;
    };
    let Some(start) = traverse.last().build.points.get(&first.from_id) else {
        return;
    };

    writer.start("constructionData");
    writer.start("constructionAdjustment");
    writer.start("startPoint");
    writer.element("unjoinedPointNo", first.from_id);
    writer.element("x", fixed(start.x));
    writer.element("y", fixed(start.y));
    writer.end(); // startPoint
    if traverse.closure().compass_rule_applied {
        // 罗盘法 = 0
        writer.element("type", 0);
    }
    writer.end(); // constructionAdjustment
    writer.end(); // constructionData
}

fn write_parcel(writer: &mut XmlWriter, traverse: &Traverse) {
    let info = &traverse.info;
    let document_type = &info.document_type;
    let closure = traverse.closure();

    writer.start("parcels");
    writer.start("parcel");
    writer.element("name", &info.parcel_name);

    let scale = traverse.scale();
    if scale != 1.0 {
        writer.element("scale", fixed(scale));
    }
    let mut rotation = to_degrees(-traverse.rotation());
    if rotation < 0.0 {
        rotation += 360.0;
    }
    if rotation != 0.0 {
        writer.element("rotation", fixed(rotation));
    }

    if !info.stated_area.is_empty() {
        writer.element("statedArea", &info.stated_area);
    } else if closure.area > 0.0 {
        writer.element("statedArea", format!("{:.2}", closure.area));
    }
    writer.element("joined", "false");
    writer.element("parcelNo", 1);
    writer.element("type", document_type.code);
    if closure.distance != 0.0 && closure.bearing_deg != 0.0 {
        writer.element("miscloseDistance", fixed(closure.distance));
        writer.element("miscloseBearing", fixed(closure.bearing_deg));
    }

    if let Some(attribute) = &document_type.extended_attribute {
        writer.start("extendedAttributes");
        writer.start("extendedAttribute");
        writer.element("name", &attribute.field);
        writer.element("value", &attribute.value);
        writer.element("type", "VT_BSTR");
        writer.end();
        writer.end();
    }

    write_construction_data(writer, traverse);

    writer.start("lines");
    for line in packet_lines(&traverse.course_records()) {
        line.write(writer, document_type);
    }
    writer.end(); // lines

    writer.end(); // parcel
    writer.end(); // parcels
}

fn write_plans(writer: &mut XmlWriter, traverse: &Traverse) {
    let config = traverse.config();
    let format = config.bearing_format;

    writer.start("plans");
    writer.start("plan");
    writer.element("name", &traverse.info.plan_name);
    writer.element("description", &traverse.info.document_type.name);
    writer.element("angleUnits", angle_unit(format));
    writer.element("distanceUnits", packet_unit_label(config.entry_units_per_meter));
    writer.element("directionFormat", direction_format(format));
    writer.element(
        "areaUnits",
        AreaUnit::for_factor(config.output_units_per_meter).packet_label(),
    );
    writer.element("lineParameters", "ChordBearingAndChordLengthAndRadius");
    write_parcel(writer, traverse);
    writer.end(); // plan
    writer.end(); // plans
}

/// 生成 CE-XML 文本
///
/// 使用最近一次 [`Traverse::recompute`] 的结果，调用前需先重算。
pub fn write_cexml(traverse: &Traverse, options: &ExportOptions) -> Result<String, FileError> {
    if traverse.courses().is_empty() {
        return Err(FileError::NothingToExport);
    }

    let mut writer = XmlWriter::new();
    writer.start_with_namespace("geodata", "GeoSurveyPacketData", PACKET_NAMESPACE);
    writer.element("schemaVersion", SCHEMA_VERSION);

    write_units(&mut writer, traverse);
    write_job_parameters(&mut writer, options);
    write_plans(&mut writer, traverse);
    writer.empty("points");
    writer.empty("controlPoints");

    writer.end_with_prefix("geodata");
    Ok(writer.finish())
}

/// 导出 CE-XML 到文件
pub fn save_cexml(traverse: &Traverse, options: &ExportOptions, path: &Path) -> Result<(), FileError> {
    let text = write_cexml(traverse, options)?;
    std::fs::write(path, &text)?;

    tracing::info!(
        "Exported {} courses to {} ({} bytes)",
        traverse.courses().len(),
        path.display(),
        text.len()
    );
    Ok(())
}
