//! CE-XML 导出端到端测试

use parcel_core::prelude::*;
use parcel_file::{save_cexml, write_cexml, ExportOptions, FileError, TraverseDocument};

fn curve_parcel() -> Traverse {
    let mut traverse = Traverse::new(TraverseConfig {
        bearing_format: BearingFormat::Dd,
        ..Default::default()
    });
    traverse.info.plan_name = "DP 1234".to_string();
    traverse.info.parcel_name = "Lot 7 & 8".to_string();
    traverse.set_origin(Point2::new(1000.0, 2000.0));
    traverse.set_rotation_text("10");
    traverse.add_entry(&CourseEntry::line("90", "100"));
    traverse.add_entry(&CourseEntry::curve("0", "100", "100"));
    traverse.add_entry(&CourseEntry::line("", ""));
    traverse.recompute();
    traverse
}

/// 所有 `<line>` 块的文本
fn line_blocks(xml: &str) -> Vec<String> {
    xml.split("<line>")
        .skip(1)
        .filter_map(|block| block.split("</line>").next())
        .map(|block| block.split_whitespace().collect::<Vec<_>>().join(""))
        .collect()
}

#[test]
fn test_packet_layout() {
    let traverse = curve_parcel();
    let xml = write_cexml(&traverse, &ExportOptions::default()).expect("Failed to export");

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n"));
    assert!(xml.contains(
        "<geodata:GeoSurveyPacketData xmlns:geodata=\"http://www.geodata.com.au/schemas/GeoSurvey/ESRI/1.0/\">"
    ));
    assert!(xml.contains("  <schemaVersion>2.0</schemaVersion>"));
    assert!(xml.contains("<directionFormat>north azimuth</directionFormat>"));
    assert!(xml.contains("<angleUnits>Degree</angleUnits>"));
    assert!(xml.contains("<areaUnits>Square Meter</areaUnits>"));
    assert!(xml.contains("<description>Deed</description>"));
    assert!(xml.contains("<name>Lot 7 &amp; 8</name>"));
    assert!(xml.contains("<rotation>10.000000</rotation>"));
    assert!(!xml.contains("<scale>"));
    assert!(!xml.contains("<jobParameters>"));
    assert!(xml.contains("<points />"));
    assert!(xml.contains("<controlPoints />"));
    assert!(xml.trim_end().ends_with("</geodata:GeoSurveyPacketData>"));
}

#[test]
fn test_misclose_and_start_point() {
    let traverse = curve_parcel();
    let xml = write_cexml(&traverse, &ExportOptions::default()).expect("Failed to export");

    assert!(xml.contains("<miscloseDistance>141.421356</miscloseDistance>"));
    assert!(xml.contains("<miscloseBearing>225.000000</miscloseBearing>"));
    assert!(xml.contains("<unjoinedPointNo>1</unjoinedPointNo>"));
    assert!(xml.contains("<x>1000.000000</x>"));
    assert!(xml.contains("<y>2000.000000</y>"));
    // 未平差时不写调整类型
    assert!(!xml.contains("<type>0</type>"));
}

#[test]
fn test_lines_with_radials() {
    let traverse = curve_parcel();
    let xml = write_cexml(&traverse, &ExportOptions::default()).expect("Failed to export");
    let lines = line_blocks(&xml);
    assert_eq!(lines.len(), 4);

    assert_eq!(
        lines[0],
        "<fromPoint>1</fromPoint><toPoint>2</toPoint><bearing>90.000000</bearing>\
         <distance>100.000000</distance><category>Boundary</category><type>7</type>"
    );
    // 最后一条线闭合到第一条界线的起点
    assert_eq!(
        lines[1],
        "<fromPoint>2</fromPoint><toPoint>1</toPoint><bearing>0.000000</bearing>\
         <distance>100.000000</distance><category>Boundary</category><type>7</type>\
         <radius>100.000000</radius><centerPoint>3</centerPoint>"
    );
    assert_eq!(
        lines[2],
        "<fromPoint>2</fromPoint><toPoint>3</toPoint><bearing>60.000000</bearing>\
         <distance>100.000000</distance><category>Radial</category><type>7</type>"
    );
    assert_eq!(
        lines[3],
        "<fromPoint>4</fromPoint><toPoint>3</toPoint><bearing>120.000000</bearing>\
         <distance>100.000000</distance><category>Radial</category><type>7</type>"
    );
}

#[test]
fn test_stated_area_and_job_parameters() {
    let mut traverse = curve_parcel();
    traverse.info.stated_area = "1.5 ha".to_string();
    traverse.info.document_type = DocumentType {
        name: "Survey".to_string(),
        code: 3,
        extended_attribute: Some(ExtendedAttribute {
            field: "Source".to_string(),
            value: "Field book".to_string(),
        }),
    };
    let options = ExportOptions {
        spatial_reference_wkt: Some("PROJCS[\"GDA94 / MGA zone 55\"]".to_string()),
        ..Default::default()
    };
    let xml = write_cexml(&traverse, &options).expect("Failed to export");

    assert!(xml.contains("<statedArea>1.5 ha</statedArea>"));
    assert!(xml.contains("<description>Survey</description>"));
    assert!(xml.contains("<type>3</type>"));
    assert!(xml.contains("<name>Source</name>"));
    assert!(xml.contains("<type>VT_BSTR</type>"));
    assert!(xml.contains("<owner>ParcelTraverse</owner>"));
    assert!(xml.contains("<esriSpatialReference>PROJCS[&quot;GDA94 / MGA zone 55&quot;]</esriSpatialReference>"));
}

#[test]
fn test_compass_rule_flag() {
    let mut traverse = Traverse::new(TraverseConfig {
        bearing_format: BearingFormat::Dd,
        ..Default::default()
    });
    for (bearing, distance) in [("0", "100"), ("90", "100"), ("180", "100"), ("270", "101")] {
        traverse.add_entry(&CourseEntry::line(bearing, distance));
    }
    traverse.recompute();
    let xml = write_cexml(&traverse, &ExportOptions::default()).expect("Failed to export");
    assert!(xml.contains("<type>0</type>"));
    assert!(xml.contains("<statedArea>"));
}

#[test]
fn test_feet_units() {
    let document = TraverseDocument::from_json(
        r#"{
            "config": {
                "entry_units_per_meter": "foot",
                "output_units_per_meter": "foot_us",
                "bearing_format": "QuadrantBearing"
            },
            "courses": [
                { "bearing": "45-00-00-1", "distance": "100" },
                { "bearing": "45-00-00-2", "distance": "100" }
            ]
        }"#,
    )
    .expect("Failed to parse");
    let mut traverse = document.into_traverse().expect("Failed to build");
    traverse.recompute();
    let xml = write_cexml(&traverse, &ExportOptions::default()).expect("Failed to export");

    assert!(xml.contains("<distanceUnits>foot_us</distanceUnits>"));
    assert!(xml.contains("<distanceUnits>foot</distanceUnits>"));
    assert!(xml.contains("<angleUnits>DMS</angleUnits>"));
    assert!(xml.contains("<directionFormat>Quadrant</directionFormat>"));
    assert!(xml.contains("<areaUnits>SquareUSFoot</areaUnits>"));
}

#[test]
fn test_empty_traverse_is_rejected() {
    let traverse = Traverse::default();
    let result = write_cexml(&traverse, &ExportOptions::default());
    assert!(matches!(result, Err(FileError::NothingToExport)));
}

#[test]
fn test_save_to_file() {
    let traverse = curve_parcel();
    let file_path = std::env::temp_dir().join("test_parcel_export.xml");

    save_cexml(&traverse, &ExportOptions::default(), &file_path).expect("Failed to save");
    let text = std::fs::read_to_string(&file_path).expect("Failed to read");
    assert!(text.contains("<lineParameters>ChordBearingAndChordLengthAndRadius</lineParameters>"));

    std::fs::remove_file(&file_path).ok();
}
