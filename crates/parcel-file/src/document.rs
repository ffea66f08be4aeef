//! 导线文档（.json）
//!
//! 命令行程序的输入格式，只含录入文本而不含计算结果：加载后由
//! [`TraverseDocument::into_traverse`] 重建 [`Traverse`]，重算得到坐标与闭合差。

use crate::error::FileError;
use parcel_core::config::TraverseConfig;
use parcel_core::math::Point2;
use parcel_core::parcel::{CourseEntry, ParcelInfo, Traverse};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 导线文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverseDocument {
    pub config: TraverseConfig,
    pub info: ParcelInfo,
    /// 起算点（输出坐标）
    pub origin: Point2,
    /// 比例文本，空时取 1
    pub scale: String,
    /// 旋转角文本（度，顺时针为正），空时取 0
    pub rotation: String,
    /// 强制闭合到的点编号
    pub closing_point: Option<u32>,
    pub web_mercator_scale: Option<f64>,
    /// 导出 CE-XML 时写入的空间参考 WKT
    pub spatial_reference_wkt: Option<String>,
    pub courses: Vec<CourseEntry>,
}

impl Default for TraverseDocument {
    fn default() -> Self {
        Self {
            config: TraverseConfig::default(),
            info: ParcelInfo::default(),
            origin: Point2::origin(),
            scale: String::new(),
            rotation: String::new(),
            closing_point: None,
            web_mercator_scale: None,
            spatial_reference_wkt: None,
            courses: Vec::new(),
        }
    }
}

impl TraverseDocument {
    pub fn new(config: TraverseConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// 解析 JSON 文本
    pub fn from_json(text: &str) -> Result<Self, FileError> {
        let document: Self = serde_json::from_str(text)?;
        document.check()?;
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String, FileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check(&self) -> Result<(), FileError> {
        if !(self.origin.x.is_finite() && self.origin.y.is_finite()) {
            return Err(FileError::InvalidDocument(
                "origin must be a finite coordinate".to_string(),
            ));
        }
        self.config.validate()?;
        Ok(())
    }

    /// 由文档重建导线（未重算）
    pub fn into_traverse(self) -> Result<Traverse, FileError> {
        self.check()?;

        let mut traverse = Traverse::new(self.config);
        traverse.info = self.info;
        traverse.set_origin(self.origin);
        if !self.scale.trim().is_empty() {
            traverse.set_scale_text(&self.scale);
        }
        if !self.rotation.trim().is_empty() {
            traverse.set_rotation_text(&self.rotation);
            if traverse.rotation_error() {
                return Err(FileError::InvalidDocument(format!(
                    "rotation '{}' is not a valid angle",
                    self.rotation
                )));
            }
        }
        traverse.set_closing_point(self.closing_point);
        traverse.set_web_mercator_scale(self.web_mercator_scale);
        for entry in &self.courses {
            traverse.add_entry(entry);
        }
        Ok(traverse)
    }
}

/// 从文件加载文档
pub fn load(path: &Path) -> Result<TraverseDocument, FileError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let document: TraverseDocument = serde_json::from_reader(reader)?;
    document.check()?;

    tracing::info!(
        "Loaded traverse document with {} courses from {}",
        document.courses.len(),
        path.display()
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::bearing::BearingFormat;
    use parcel_core::course::LineCategory;

    fn sample() -> TraverseDocument {
        let mut document = TraverseDocument::new(TraverseConfig {
            bearing_format: BearingFormat::Dd,
            ..Default::default()
        });
        document.info.parcel_name = "Lot 7".to_string();
        document.origin = Point2::new(1000.0, 2000.0);
        document.scale = "1.5".to_string();
        document.rotation = "10".to_string();
        document.courses = vec![
            CourseEntry::line("0", "100"),
            CourseEntry::curve("90", "50", "60"),
        ];
        document
    }

    #[test]
    fn test_load_from_file() {
        let file_path = std::env::temp_dir().join("test_traverse_document.json");
        let document = sample();

        let text = document.to_json().expect("Failed to serialize");
        std::fs::write(&file_path, text).expect("Failed to write");
        let loaded = load(&file_path).expect("Failed to load");
        assert_eq!(loaded, document);

        std::fs::remove_file(&file_path).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let result = load(Path::new("/nonexistent/traverse.json"));
        assert!(matches!(result, Err(FileError::Io(_))));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let document = TraverseDocument::from_json(
            r#"{ "config": { "entry_units_per_meter": "foot" }, "courses": [ { "bearing": "N45.1530E", "distance": "100" } ] }"#,
        )
        .expect("Failed to parse");
        assert!((document.config.entry_units_per_meter - 0.3048).abs() < 1e-12);
        assert_eq!(document.courses[0].category, LineCategory::Boundary);
        assert_eq!(document.origin, Point2::origin());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = TraverseDocument::from_json(r#"{ "courses": 5 }"#);
        assert!(matches!(result, Err(FileError::Json(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = TraverseDocument::from_json(r#"{ "config": { "output_units_per_meter": 0 } }"#);
        assert!(matches!(result, Err(FileError::Config(_))));
    }

    #[test]
    fn test_into_traverse() {
        let traverse = sample().into_traverse().expect("Failed to build");
        assert_eq!(traverse.courses().len(), 2);
        assert_eq!(traverse.scale(), 1.5);
        assert!((traverse.rotation() + 10f64.to_radians()).abs() < 1e-12);
        assert_eq!(traverse.origin(), Point2::new(1000.0, 2000.0));
        assert_eq!(traverse.info.parcel_name, "Lot 7");
    }

    #[test]
    fn test_bad_rotation_rejected() {
        let mut document = sample();
        document.config.bearing_format = BearingFormat::Dms;
        document.rotation = "abc".to_string();
        assert!(matches!(document.into_traverse(), Err(FileError::InvalidDocument(_))));
    }
}
