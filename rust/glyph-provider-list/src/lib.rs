//! List/container host modules.
//!
//! - `list_from_frame` — folds a variable-arity call into a single list value
//! - `fetch_element` — bounds-checked list indexing
#![warn(clippy::all)]

use std::sync::Arc;

use glyph_core::{CallError, Value};
use glyph_rt::ModuleFn;

/// Collect the frame's contiguous 0-based prefix into an ordered list.
///
/// Slots 0, 1, 2, … are consumed in order until the first gap; remaining
/// sparse slots are ignored. Never fails — a frame with no slot 0 yields the
/// empty list. This is how the engine turns a variable-arity call into one
/// list argument.
pub fn list_from_frame() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut values = Vec::new();
        while let Some(value) = frame.take(values.len() as u32) {
            values.push(value);
        }
        Ok(Value::List(values))
    })
}

/// Fetch `list[index]` with an explicit bounds check.
///
/// Slot 0 is the index (uint), slot 1 the list. Any `index >= len` fails
/// `IndexOutOfRange`; the last element is a valid fetch.
pub fn fetch_element() -> ModuleFn {
    Arc::new(|mut frame| {
        let index = match frame.take(0) {
            None => return Err(CallError::MissingArgument(0)),
            Some(Value::Uint(n)) => n,
            Some(other) => return Err(CallError::mismatch(0, "uint", other.type_name())),
        };
        let mut list = match frame.take(1) {
            None => return Err(CallError::MissingArgument(1)),
            Some(Value::List(l)) => l,
            Some(other) => return Err(CallError::mismatch(1, "list", other.type_name())),
        };
        let len = list.len();
        if index >= len as u64 {
            return Err(CallError::IndexOutOfRange { index, len });
        }
        Ok(list.swap_remove(index as usize))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::Frame;

    #[test]
    fn dense_prefix_becomes_a_list() {
        let frame = Frame::from(vec![Value::Uint(1), Value::Uint(2), Value::Uint(3)]);
        let result = list_from_frame()(frame).unwrap();
        assert_eq!(
            result,
            Value::List(vec![Value::Uint(1), Value::Uint(2), Value::Uint(3)])
        );
    }

    #[test]
    fn missing_slot_zero_stops_immediately() {
        let frame: Frame = [(1, Value::Uint(2))].into_iter().collect();
        assert_eq!(list_from_frame()(frame).unwrap(), Value::List(vec![]));
    }

    #[test]
    fn gap_truncates_the_prefix() {
        let frame: Frame = [(0, Value::Uint(0)), (1, Value::Uint(1)), (3, Value::Uint(3))]
            .into_iter()
            .collect();
        assert_eq!(
            list_from_frame()(frame).unwrap(),
            Value::List(vec![Value::Uint(0), Value::Uint(1)])
        );
    }

    fn fetch(index: u64, list: Vec<Value>) -> Result<Value, CallError> {
        fetch_element()(Frame::from(vec![Value::Uint(index), Value::List(list)]))
    }

    #[test]
    fn last_index_is_fetchable() {
        let list = vec![Value::Uint(10), Value::Uint(20), Value::Uint(30)];
        assert_eq!(fetch(2, list).unwrap(), Value::Uint(30));
    }

    #[test]
    fn length_index_is_rejected() {
        let list = vec![Value::Uint(10), Value::Uint(20), Value::Uint(30)];
        assert!(matches!(
            fetch(3, list),
            Err(CallError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            fetch(0, vec![]),
            Err(CallError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn mistyped_arguments_are_reported() {
        let frame = Frame::from(vec![Value::Bool(true), Value::List(vec![])]);
        assert!(matches!(
            fetch_element()(frame),
            Err(CallError::TypeMismatch { slot: 0, .. })
        ));

        let frame = Frame::from(vec![Value::Uint(0), Value::Uint(0)]);
        assert!(matches!(
            fetch_element()(frame),
            Err(CallError::TypeMismatch { slot: 1, .. })
        ));
    }
}
