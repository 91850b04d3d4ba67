//! Adapters converting guest values into host values
//!
//! Every adapter returns a tagged [`MarshalError`] instead of touching the Lua
//! stack or raising. The registrar decides what a failure turns into.

use mlua::{Table, Value};

use crate::error::MarshalError;
use crate::surface::Color;

/// Numbers, integers and numeric strings (decimal or `0x` hex) become floats
pub fn to_number(value: &Value) -> Result<f64, MarshalError> {
    match value {
        Value::Nil => Err(MarshalError::Missing),
        Value::Integer(i) => Ok(*i as f64),
        Value::Number(n) => Ok(*n),
        Value::String(s) => parse_number(&s.to_string_lossy()).ok_or(MarshalError::TypeMismatch {
            expected: "number",
            found: "string",
        }),
        other => Err(mismatch("number", other)),
    }
}

/// Packed integer colors, or a channel table `{r, g, b, a?}` with values in [0, 1]
pub fn to_color(value: &Value) -> Result<Color, MarshalError> {
    match value {
        Value::Table(table) => channel_table(table),
        other => to_number(other).map(|n| Color::from_packed(n.max(0.0) as u32)),
    }
}

/// Strings, plus numbers and booleans rendered the way Lua's `tostring` would
pub fn to_text(value: &Value) -> Result<String, MarshalError> {
    match value {
        Value::Nil => Err(MarshalError::Missing),
        Value::String(s) => Ok(s.to_string_lossy().to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Number(n) => Ok(format_number(*n)),
        Value::Boolean(b) => Ok(b.to_string()),
        other => Err(mismatch("string", other)),
    }
}

/// Arena handles are positive integers
pub fn to_handle(value: &Value) -> Result<u32, MarshalError> {
    let n = to_number(value)?;
    if n >= 1.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
        Ok(n as u32)
    } else {
        Err(MarshalError::TypeMismatch {
            expected: "handle",
            found: "number",
        })
    }
}

/// `{vx, vy}`, `{vx = .., vy = ..}` or `{x = .., y = ..}`
pub fn to_vec2(value: &Value) -> Result<(f64, f64), MarshalError> {
    let Value::Table(table) = value else {
        return match value {
            Value::Nil => Err(MarshalError::Missing),
            other => Err(mismatch("table", other)),
        };
    };

    let first = field(table, 1, &["vx", "x"]);
    let second = field(table, 2, &["vy", "y"]);
    Ok((to_number(&first)?, to_number(&second)?))
}

fn channel_table(table: &Table) -> Result<Color, MarshalError> {
    let sequence = table.raw_len();
    let channels: Vec<Value> = if sequence > 0 {
        if !(3..=4).contains(&sequence) {
            return Err(MarshalError::ChannelCount {
                expected: "3 or 4",
                found: sequence,
            });
        }
        (1..=sequence)
            .map(|i| table.raw_get::<Value>(i).unwrap_or(Value::Nil))
            .collect()
    } else {
        ["r", "g", "b", "a"]
            .iter()
            .map(|key| table.raw_get::<Value>(*key).unwrap_or(Value::Nil))
            .collect()
    };

    let r = to_number(&channels[0])?;
    let g = to_number(&channels[1])?;
    let b = to_number(&channels[2])?;
    let a = match channels.get(3) {
        None | Some(Value::Nil) => None,
        Some(alpha) => Some(to_number(alpha)?),
    };
    Ok(Color::from_channels(r, g, b, a))
}

fn field(table: &Table, index: i64, names: &[&str]) -> Value {
    match table.raw_get::<Value>(index) {
        Ok(Value::Nil) | Err(_) => names
            .iter()
            .map(|name| table.raw_get::<Value>(*name).unwrap_or(Value::Nil))
            .find(|value| !matches!(value, Value::Nil))
            .unwrap_or(Value::Nil),
        Ok(value) => value,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let hex = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"));
    let value = match hex {
        Some(hex) => u64::from_str_radix(hex, 16).ok()? as f64,
        None => return text.parse::<f64>().ok(),
    };
    Some(if negative { -value } else { value })
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}

fn mismatch(expected: &'static str, found: &Value) -> MarshalError {
    MarshalError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}
