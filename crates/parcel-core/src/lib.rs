//! 宗地导线计算引擎
//!
//! 把测量员录入的边（方位角 + 距离，或方位角 + 曲线参数）转换为闭合导线坐标、
//! 闭合差报告与可显示、可导出的曲线几何。
//!
//! # 计算流程
//!
//! 数据单向流动，每次编辑后从头重算：
//! - `units`: 带单位后缀的数值解析
//! - `bearing`: 方位角文本编解码
//! - `length` / `course`: 边长字段与单条边
//! - `curve`: 圆心、径向方位角与弧线加密
//! - `traverse`: 点链构建
//! - `closure`: 闭合差、罗盘法平差条件与面积
//!
//! # 示例
//!
//! ```rust
//! use parcel_core::prelude::*;
//!
//! let mut traverse = Traverse::new(TraverseConfig {
//!     bearing_format: BearingFormat::Dd,
//!     ..Default::default()
//! });
//! for bearing in ["0", "90", "180", "270"] {
//!     traverse.add_entry(&CourseEntry::line(bearing, "100"));
//! }
//! let result = traverse.recompute();
//! assert!(result.closure.valid);
//! assert!((result.closure.area - 10_000.0).abs() < 1e-6);
//! ```

pub mod bearing;
pub mod closure;
pub mod config;
pub mod course;
pub mod curve;
pub mod error;
pub mod length;
pub mod math;
pub mod parcel;
pub mod snap;
pub mod traverse;
pub mod units;

pub use error::{BuildError, ConfigError};

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::bearing::{BearingFormat, ParsedBearing};
    pub use crate::closure::{ClosureResult, Misclose, HIGH_RATIO, LOW_RATIO};
    pub use crate::config::TraverseConfig;
    pub use crate::course::{Course, LineCategory};
    pub use crate::curve::{CenterPoint, SweepDirection};
    pub use crate::error::{BuildError, ConfigError};
    pub use crate::length::{LengthFields, LengthSpec};
    pub use crate::math::{Point2, Vector2};
    pub use crate::parcel::{CourseEntry, CourseRecord, DocumentType, ExtendedAttribute, ParcelInfo, Recompute, Traverse};
    pub use crate::snap::{SnapAnchor, SnapCache, SnapMode, SnapSegment};
    pub use crate::traverse::{Adjustment, BuildOutput, BuildParams, ResolvedCourse};
    pub use crate::units::{AreaUnit, DistanceUnit, UnitContext};
}
