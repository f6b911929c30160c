//! # 十六进制浮点编解码
//!
//! 持久化负载中的浮点字段以 C99 / Python `float.hex()` 形式保存，
//! 例如 `0x1.6f5c28f5c28f6p+1`，保证往返无损。
//!
//! ## 格式说明
//! ```text
//! [-]0x1.<13 位十六进制>p<±指数>     # 规格化数
//! [-]0x0.<13 位十六进制>p-1022       # 非规格化数
//! [-]0x0.0p+0                        # 零
//! inf / -inf / nan
//! ```
//! 未知分量保存为 `null`。
//!
//! ## 依赖关系
//! - 被 `models/attributes.rs`, `derive/cache.rs`, `export/orchestrator.rs` 使用

use crate::error::{CrystexError, Result};
use crate::models::Document;

use serde_json::{Number, Value};

/// 以十六进制形式持久化的浮点字段
pub const FLOAT_FIELDS: &[&str] = &[
    "elements_ratios",
    "lattice_vectors",
    "cartesian_site_positions",
];

const MANTISSA_BITS: u32 = 52;
const MANTISSA_MASK: u64 = (1 << MANTISSA_BITS) - 1;
const EXPONENT_BIAS: i32 = 1023;

/// 将 f64 格式化为十六进制字符串
pub fn float_to_hex(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value == 0.0 {
        return format!("{}0x0.0p+0", sign);
    }

    let bits = value.to_bits();
    let biased = ((bits >> MANTISSA_BITS) & 0x7ff) as i32;
    let mantissa = bits & MANTISSA_MASK;

    if biased == 0 {
        format!("{}0x0.{:013x}p-1022", sign, mantissa)
    } else {
        format!("{}0x1.{:013x}p{:+}", sign, mantissa, biased - EXPONENT_BIAS)
    }
}

/// 解析十六进制浮点字符串
pub fn hex_to_float(text: &str) -> Result<f64> {
    let malformed = || CrystexError::CodecError(format!("'{}' is not a hex-encoded float", text));

    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let body = body.to_ascii_lowercase();
    let signed = |magnitude: f64| if negative { -magnitude } else { magnitude };

    match body.as_str() {
        "inf" | "infinity" => return Ok(signed(f64::INFINITY)),
        "nan" => return Ok(f64::NAN),
        _ => {}
    }

    let body = body.strip_prefix("0x").unwrap_or(&body);
    let (digits, exponent) = match body.split_once('p') {
        Some((digits, exponent)) => (
            digits,
            exponent.parse::<i32>().map_err(|_| malformed())?,
        ),
        None => (body, 0),
    };
    let (int_digits, frac_digits) = digits.split_once('.').unwrap_or((digits, ""));
    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(malformed());
    }

    // 超过 60 位有效位的尾数直接截断，标准格式只有 53 位
    let mut mantissa: u64 = 0;
    let mut scale = exponent;
    for c in int_digits.chars() {
        let digit = c.to_digit(16).ok_or_else(malformed)?;
        if mantissa < (1 << 60) {
            mantissa = mantissa * 16 + digit as u64;
        } else {
            scale = scale.saturating_add(4);
        }
    }
    for c in frac_digits.chars() {
        let digit = c.to_digit(16).ok_or_else(malformed)?;
        if mantissa < (1 << 60) {
            mantissa = mantissa * 16 + digit as u64;
            scale = scale.saturating_sub(4);
        }
    }

    Ok(signed(scale_by_power_of_two(mantissa as f64, scale)))
}

/// 计算 value * 2^exponent，分步避免中间结果溢出
fn scale_by_power_of_two(mut value: f64, mut exponent: i32) -> f64 {
    const STEP: i32 = 1000;

    while exponent > STEP && value.is_finite() {
        value *= power_of_two(STEP);
        exponent -= STEP;
    }
    while exponent < -STEP && value != 0.0 {
        value *= power_of_two(-STEP);
        exponent += STEP;
    }

    value * power_of_two(exponent.clamp(-STEP, STEP))
}

/// 2^exponent，exponent 位于规格化范围内
fn power_of_two(exponent: i32) -> f64 {
    f64::from_bits(((exponent + EXPONENT_BIAS) as u64) << MANTISSA_BITS)
}

/// 递归编码：数值 → 十六进制字符串，其余原样保留
pub fn encode_floats(value: &Value) -> Value {
    match value {
        Value::Number(number) => match number.as_f64() {
            Some(float) => Value::String(float_to_hex(float)),
            None => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(encode_floats).collect()),
        other => other.clone(),
    }
}

/// 递归解码：十六进制字符串 → 数值，`null` 与非有限值视为未知
pub fn decode_floats(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(_) => Ok(value.clone()),
        Value::String(text) => {
            let float = hex_to_float(text)?;
            Ok(Number::from_f64(float).map_or(Value::Null, Value::Number))
        }
        Value::Array(items) => items
            .iter()
            .map(decode_floats)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Err(CrystexError::CodecError(format!(
            "expected a (nested) array of hex-encoded floats, found {}",
            other
        ))),
    }
}

/// 解码文档中的全部浮点字段
pub fn decode_float_fields(document: &mut Document) -> Result<()> {
    for field in FLOAT_FIELDS {
        if let Some(value) = document.get_mut(*field) {
            if !value.is_null() {
                *value = decode_floats(value)?;
            }
        }
    }
    Ok(())
}
