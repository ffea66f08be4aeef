//! 宗地导线文件处理
//!
//! 支持：
//! - `.json` 导线文档（录入文本、配置、起算点、比例与旋转）
//! - CE-XML（GeoSurvey 数据包）导出

pub mod cexml;
pub mod document;
pub mod error;

pub use cexml::{save_cexml, write_cexml, ExportOptions};
pub use document::TraverseDocument;
pub use error::FileError;
