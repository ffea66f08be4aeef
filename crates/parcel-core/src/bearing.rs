//! 方位角文本编解码
//!
//! 支持四种记法：
//! - 十进制度 (DD): `123.4567`
//! - 度分秒 (DMS): `123.2722` 表示 123°27'22"
//! - 象限字母 (NSWE): `N45.1530E`
//! - 象限编号 (QuadrantBearing): `45-15-30-2`，末段为象限号 1-4
//!
//! 方位角前后的 `*` 表示切线曲线标记，不属于方位角语法。

use crate::math::wrap_degrees;
use serde::{Deserialize, Serialize};

/// 切线标记字符
pub const TANGENT_MARKER: char = '*';

/// 连字符分隔的最大数量
const MAX_DASHES: usize = 3;

/// 方位角记法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BearingFormat {
    #[default]
    Unknown,
    Nswe,
    QuadrantBearing,
    Dms,
    Dd,
}

impl BearingFormat {
    /// 是否以象限形式显示
    pub fn is_quadrant(self) -> bool {
        matches!(self, BearingFormat::Nswe | BearingFormat::QuadrantBearing)
    }

    /// 是否以度分秒解码
    pub fn is_dms(self) -> bool {
        matches!(self, BearingFormat::Nswe | BearingFormat::QuadrantBearing | BearingFormat::Dms)
    }
}

/// 方位角解析结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedBearing {
    /// 方位角（度）
    pub degrees: f64,
    /// 识别出的记法
    pub format: BearingFormat,
    /// 校验错误
    pub error: bool,
    /// 是否带切线标记
    pub tangent: bool,
}

/// 去除首或尾的标记字符（大小写不敏感），返回去除空白后的文本及是否找到标记
pub fn strip_marker(text: &str, marker: char) -> (&str, bool) {
    let trimmed = text.trim();
    let marker = marker.to_ascii_lowercase();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), _) if first.to_ascii_lowercase() == marker => {
            (&trimmed[first.len_utf8()..], true)
        }
        (Some(_), Some(last)) if last.to_ascii_lowercase() == marker => {
            (&trimmed[..trimmed.len() - last.len_utf8()], true)
        }
        _ => (trimmed, false),
    }
}

/// 解析方位角文本
///
/// 语法错误返回 0 度并置错误标志；超出范围时保留数值但置错误标志。
/// 带切线标记时不报告错误。
pub fn parse(text: &str, default_format: BearingFormat) -> ParsedBearing {
    let (body, tangent) = strip_marker(text, TANGENT_MARKER);
    let (degrees, format, error) = match parse_body(body, default_format) {
        Some(parsed) => parsed,
        None => (0.0, default_format, true),
    };
    ParsedBearing {
        degrees,
        format,
        error: error && !tangent,
        tangent,
    }
}

fn parse_body(text: &str, default_format: BearingFormat) -> Option<(f64, BearingFormat, bool)> {
    let mut trimmed = String::with_capacity(text.len());
    let mut has_ns = false;
    let mut has_ew = false;
    let mut has_num = false;
    let mut has_dec = false;
    let mut dashes = 0usize;

    for ch in text.chars().map(|c| c.to_ascii_uppercase()) {
        match ch {
            '0'..='9' => {
                if has_ew {
                    return None;
                }
                trimmed.push(ch);
                has_num = true;
            }
            '.' | '-' => {
                if !has_num || has_ew || has_dec {
                    return None;
                }
                if ch == '.' {
                    has_dec = true;
                } else {
                    if dashes >= MAX_DASHES {
                        return None;
                    }
                    dashes += 1;
                }
                trimmed.push(ch);
            }
            'N' | 'S' => {
                if has_ew || has_ns || has_num {
                    return None;
                }
                trimmed.push(ch);
                has_ns = true;
            }
            'E' | 'W' => {
                if has_ew || !has_ns {
                    return None;
                }
                trimmed.push(ch);
                has_ew = true;
            }
            ' ' => {}
            _ => return None,
        }
    }
    if has_ns && !has_ew {
        return None;
    }
    if trimmed.is_empty() {
        return None;
    }

    let mut format = default_format;
    let mut dms = default_format == BearingFormat::Dms;
    let mut quadrant = 0u8;
    let mut body = trimmed;

    if has_ns {
        let north = body.starts_with('N');
        let west = body.ends_with('W');
        quadrant = match (north, west) {
            (true, false) => 1,
            (false, false) => 2,
            (false, true) => 3,
            (true, true) => 4,
        };
        // 首个分隔符变为小数点，其余分隔符删除
        let inner = &body[1..body.len() - 1];
        let mut simplified = String::with_capacity(inner.len());
        let mut first_separator = true;
        for ch in inner.chars() {
            if ch == '.' || ch == '-' {
                if first_separator {
                    simplified.push('.');
                    first_separator = false;
                }
            } else {
                simplified.push(ch);
            }
        }
        body = simplified;
        dms = true;
        format = BearingFormat::Nswe;
    }

    if body.contains('-') {
        let parts: Vec<&str> = body.split('-').collect();
        let (last, dms_parts) = parts.split_last()?;
        quadrant = last.parse::<u8>().ok().filter(|q| (1..=4).contains(q))?;
        body = join_dash_parts(dms_parts);
        dms = true;
        format = BearingFormat::QuadrantBearing;
    }

    let (value, sexagesimal_error) = decode(&body, dms)?;

    let error = sexagesimal_error
        || if quadrant == 0 {
            !(0.0..360.0).contains(&value)
        } else {
            !(0.0..=90.0).contains(&value)
        };

    let degrees = match quadrant {
        2 => 180.0 - value,
        3 => 180.0 + value,
        4 => 360.0 - value,
        _ => value,
    };
    Some((degrees, format, error))
}

/// 将 `89-59-59` 形式合并为 `89.5959`；分、秒段补足两位
fn join_dash_parts(parts: &[&str]) -> String {
    let Some((degrees, rest)) = parts.split_first() else {
        return String::new();
    };
    let mut joined = degrees.to_string();
    if !rest.is_empty() {
        joined.push('.');
        for (i, part) in rest.iter().enumerate() {
            let digits: String = part.chars().filter(|c| *c != '.').collect();
            if i < 2 {
                joined.push_str(&format!("{:0>2}", digits));
            } else {
                joined.push_str(&digits);
            }
        }
    }
    joined
}

/// 数值解码：DD 直接解析；DMS 按 `D.MMSS[sub]` 拆分
///
/// 返回 `(度, 分或秒越界)`。分、秒不小于 60 时仍按原值累加。
fn decode(body: &str, dms: bool) -> Option<(f64, bool)> {
    let parts: Vec<&str> = body.split('.').collect();
    if parts.len() > 2 {
        return None;
    }
    let whole = parts[0].parse::<f64>().unwrap_or(0.0);
    let Some(fraction) = parts.get(1) else {
        return Some((whole, false));
    };
    if !dms {
        return Some((body.parse::<f64>().unwrap_or(whole), false));
    }
    // 分秒各两位，不足两位按右侧补零处理
    let digits = format!("{:0<4}", fraction);
    let minutes = digits[0..2].parse::<u32>().unwrap_or(0);
    let seconds = digits[2..4].parse::<u32>().unwrap_or(0);
    let sub_seconds = digits[4..].parse::<u32>().unwrap_or(0);
    let value = whole
        + f64::from(minutes) / 60.0
        + f64::from(seconds) / 3600.0
        + f64::from(sub_seconds) / 1_000_000.0;
    Some((value, minutes >= 60 || seconds >= 60))
}

/// 解析带符号的度分秒角度（用于旋转角输入）
///
/// 允许前导 `-`，允许 `10-30-15` 形式。返回 `(度, 是否错误)`，有效范围 [-180, 180)。
pub fn parse_angle_dms(text: &str) -> (f64, bool) {
    let mut trimmed = String::with_capacity(text.len());
    let mut has_num = false;
    let mut has_dec = false;
    let mut negative = false;
    let mut dashes = 0usize;

    for ch in text.chars() {
        match ch {
            '0'..='9' => {
                trimmed.push(ch);
                has_num = true;
            }
            '-' if !has_num && !has_dec => negative = true,
            '.' | '-' => {
                if !has_num || has_dec {
                    return (0.0, true);
                }
                if ch == '.' {
                    has_dec = true;
                } else {
                    if dashes >= MAX_DASHES {
                        return (0.0, true);
                    }
                    dashes += 1;
                }
                trimmed.push(ch);
            }
            ' ' => {}
            _ => return (0.0, true),
        }
    }
    if trimmed.is_empty() {
        return (0.0, true);
    }

    let body = if trimmed.contains('-') {
        let parts: Vec<&str> = trimmed.split('-').collect();
        join_dash_parts(&parts)
    } else {
        trimmed
    };
    let Some((mut value, sexagesimal_error)) = decode(&body, true) else {
        return (0.0, true);
    };
    if negative {
        value = -value;
    }
    (value, sexagesimal_error || !(-180.0..180.0).contains(&value))
}

/// 将方位角（度）格式化为指定记法
pub fn format(degrees: f64, format: BearingFormat) -> String {
    if degrees.is_nan() {
        return String::new();
    }
    if matches!(format, BearingFormat::Unknown | BearingFormat::Dd) {
        return format!("{:.4}", degrees);
    }

    let mut bearing = degrees;
    let mut quadrant = 0u8;
    if format.is_quadrant() {
        if bearing < 90.0 {
            quadrant = 1;
        } else if bearing < 180.0 {
            bearing = 180.0 - bearing;
            quadrant = 2;
        } else if bearing < 270.0 {
            bearing -= 180.0;
            quadrant = 3;
        } else if bearing < 360.0 {
            bearing = 360.0 - bearing;
            quadrant = 4;
        }
    }

    let (degree, minute, second) = split_dms(bearing, quadrant != 0);

    // 取整后度数为 0 时负号会丢失
    let deg_text = if bearing < 0.0 && degree == 0 {
        format!("-{}", degree)
    } else {
        degree.to_string()
    };

    match (format, quadrant) {
        (BearingFormat::Nswe, 1..=4) => {
            let (ns, ew) = match quadrant {
                1 => ('N', 'E'),
                2 => ('S', 'E'),
                3 => ('S', 'W'),
                _ => ('N', 'W'),
            };
            format!("{}{}.{:02}{:02}{}", ns, deg_text, minute, second, ew)
        }
        (BearingFormat::QuadrantBearing, 1..=4) => {
            format!("{}-{:02}-{:02}-{}", deg_text, minute, second, quadrant)
        }
        _ => format!("{}.{:02}{:02}", deg_text, minute, second),
    }
}

/// 拆分为整数度、分、秒，秒位四舍五入并逐级进位
///
/// 象限角进位可到 90 度；方位角满 360 度回绕到 0，负角向远离 0 的方向进位。
fn split_dms(value: f64, quadrant: bool) -> (i32, u32, u32) {
    let mut degree = value.trunc() as i32;
    let minutes_exact = ((value - f64::from(degree)) * 60.0).abs();
    let mut minute = minutes_exact.trunc() as u32;
    let seconds_exact = (minutes_exact - f64::from(minute)) * 60.0;
    let mut second = seconds_exact.trunc() as u32;

    if seconds_exact - f64::from(second) >= 0.5 {
        if second < 59 {
            second += 1;
        } else {
            second = 0;
            if minute < 59 {
                minute += 1;
            } else {
                minute = 0;
                degree = if value < 0.0 {
                    degree - 1
                } else if quadrant || degree < 359 {
                    degree + 1
                } else {
                    0
                };
            }
        }
    }
    (degree, minute, second)
}

/// 将方位角（度）折算到 [0, 360)
pub fn normalize_degrees(degrees: f64) -> f64 {
    wrap_degrees(degrees)
}
