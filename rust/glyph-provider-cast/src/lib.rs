//! Type-coercion host modules.
//!
//! Five modules, each reading exactly slot 0 and producing a coerced value:
//! - `to_int` — byte-sequence (base-10) or uint → signed integer
//! - `to_uint` — stringified slot, trimmed, base-10 → unsigned integer
//! - `to_bool` — `"true"`/`"false"` or integer zero/nonzero → boolean
//! - `to_f32` / `to_f64` — byte-sequence or integer → float
#![warn(clippy::all)]

use std::sync::Arc;

use glyph_core::{CallError, Value};
use glyph_rt::ModuleFn;

/// Coerce slot 0 to a signed integer.
///
/// Accepts a byte-sequence parsed as base-10 or an unsigned integer widened.
pub fn to_int() -> ModuleFn {
    Arc::new(|mut frame| match frame.take(0) {
        None => Err(CallError::MissingArgument(0)),
        Some(Value::Bytes(bytes)) => {
            let text = String::from_utf8_lossy(&bytes);
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| CallError::ParseError {
                    what: "integer",
                    input: trimmed.to_string(),
                })
        }
        Some(Value::Uint(n)) => i64::try_from(n)
            .map(Value::Int)
            .map_err(|_| CallError::ParseError {
                what: "integer",
                input: n.to_string(),
            }),
        Some(other) => Err(CallError::mismatch(0, "bytes or uint", other.type_name())),
    })
}

/// Coerce slot 0 to an unsigned integer.
///
/// The slot is stringified, trimmed of surrounding whitespace, and parsed as
/// base-10; negative or malformed input fails `ParseError`.
pub fn to_uint() -> ModuleFn {
    Arc::new(|mut frame| {
        let value = frame.take(0).ok_or(CallError::MissingArgument(0))?;
        let text = stringify(&value).ok_or_else(|| {
            CallError::mismatch(0, "a stringifiable value", value.type_name())
        })?;
        let trimmed = text.trim();
        trimmed
            .parse::<u64>()
            .map(Value::Uint)
            .map_err(|_| CallError::ParseError {
                what: "unsigned integer",
                input: trimmed.to_string(),
            })
    })
}

/// Coerce slot 0 to a boolean.
///
/// A byte-sequence must spell `true` or `false` (surrounding whitespace
/// ignored); integers map zero → `false`, nonzero → `true`.
pub fn to_bool() -> ModuleFn {
    Arc::new(|mut frame| match frame.take(0) {
        None => Err(CallError::MissingArgument(0)),
        Some(Value::Bytes(bytes)) => {
            let text = String::from_utf8_lossy(&bytes);
            match text.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(CallError::InvalidBoolLiteral(other.to_string())),
            }
        }
        Some(Value::Int(n)) => Ok(Value::Bool(n != 0)),
        Some(Value::Uint(n)) => Ok(Value::Bool(n != 0)),
        Some(other) => Err(CallError::mismatch(
            0,
            "bytes, int or uint",
            other.type_name(),
        )),
    })
}

/// Coerce slot 0 to a 32-bit float.
pub fn to_f32() -> ModuleFn {
    Arc::new(|mut frame| match frame.take(0) {
        None => Err(CallError::MissingArgument(0)),
        Some(Value::Bytes(bytes)) => {
            let text = String::from_utf8_lossy(&bytes);
            let trimmed = text.trim();
            trimmed
                .parse::<f32>()
                .map(Value::F32)
                .map_err(|_| CallError::ParseError {
                    what: "float",
                    input: trimmed.to_string(),
                })
        }
        Some(Value::Int(n)) => Ok(Value::F32(n as f32)),
        Some(Value::Uint(n)) => Ok(Value::F32(n as f32)),
        Some(other) => Err(CallError::mismatch(
            0,
            "bytes, int or uint",
            other.type_name(),
        )),
    })
}

/// Coerce slot 0 to a 64-bit float.
pub fn to_f64() -> ModuleFn {
    Arc::new(|mut frame| match frame.take(0) {
        None => Err(CallError::MissingArgument(0)),
        Some(Value::Bytes(bytes)) => {
            let text = String::from_utf8_lossy(&bytes);
            let trimmed = text.trim();
            trimmed
                .parse::<f64>()
                .map(Value::F64)
                .map_err(|_| CallError::ParseError {
                    what: "float",
                    input: trimmed.to_string(),
                })
        }
        Some(Value::Int(n)) => Ok(Value::F64(n as f64)),
        Some(Value::Uint(n)) => Ok(Value::F64(n as f64)),
        Some(other) => Err(CallError::mismatch(
            0,
            "bytes, int or uint",
            other.type_name(),
        )),
    })
}

/// Textual form of the scalar variants; `None` for containers, handles and
/// engine-owned opaques.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Bytes(_)
        | Value::Uint(_)
        | Value::Int(_)
        | Value::Bool(_)
        | Value::F32(_)
        | Value::F64(_) => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::Frame;

    fn call(module: ModuleFn, arg: Value) -> Result<Value, CallError> {
        module(Frame::from(vec![arg]))
    }

    #[test]
    fn to_int_parses_bytes_and_widens_uint() {
        assert_eq!(
            call(to_int(), Value::Bytes(b"-42".to_vec())).unwrap(),
            Value::Int(-42)
        );
        assert_eq!(call(to_int(), Value::Uint(42)).unwrap(), Value::Int(42));
    }

    #[test]
    fn to_int_rejects_malformed_and_mistyped() {
        assert!(matches!(
            call(to_int(), Value::Bytes(b"4x2".to_vec())),
            Err(CallError::ParseError { .. })
        ));
        assert!(matches!(
            call(to_int(), Value::Bool(true)),
            Err(CallError::TypeMismatch { slot: 0, .. })
        ));
        assert!(matches!(
            to_int()(Frame::new()),
            Err(CallError::MissingArgument(0))
        ));
    }

    #[test]
    fn to_uint_trims_whitespace() {
        assert_eq!(
            call(to_uint(), Value::Bytes(b" 42 ".to_vec())).unwrap(),
            Value::Uint(42)
        );
        assert_eq!(call(to_uint(), Value::Int(7)).unwrap(), Value::Uint(7));
    }

    #[test]
    fn to_uint_rejects_negative() {
        assert!(matches!(
            call(to_uint(), Value::Bytes(b"-1".to_vec())),
            Err(CallError::ParseError { .. })
        ));
    }

    #[test]
    fn to_bool_literals_and_integers() {
        assert_eq!(
            call(to_bool(), Value::Bytes(b"true".to_vec())).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call(to_bool(), Value::Bytes(b" false ".to_vec())).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(call(to_bool(), Value::Uint(0)).unwrap(), Value::Bool(false));
        assert_eq!(call(to_bool(), Value::Int(-5)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn to_bool_rejects_other_strings_and_types() {
        assert!(matches!(
            call(to_bool(), Value::Bytes(b"maybe".to_vec())),
            Err(CallError::InvalidBoolLiteral(s)) if s == "maybe"
        ));
        assert!(matches!(
            call(to_bool(), Value::F64(1.0)),
            Err(CallError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn floats_parse_and_widen() {
        assert_eq!(
            call(to_f32(), Value::Bytes(b"1.5".to_vec())).unwrap(),
            Value::F32(1.5)
        );
        assert_eq!(call(to_f64(), Value::Int(-2)).unwrap(), Value::F64(-2.0));
        assert_eq!(call(to_f64(), Value::Uint(3)).unwrap(), Value::F64(3.0));
        assert!(matches!(
            call(to_f64(), Value::Bytes(b"one".to_vec())),
            Err(CallError::ParseError { .. })
        ));
        assert!(matches!(
            call(to_f32(), Value::List(vec![])),
            Err(CallError::TypeMismatch { .. })
        ));
    }
}
