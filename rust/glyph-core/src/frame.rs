//! The sparse argument frame passed into every host module call.
//!
//! Slots are keyed by non-negative integers and need not be dense. An absent
//! slot is a normal condition — each module decides per parameter whether
//! absence is fatal or means "optional argument omitted".

use std::collections::BTreeMap;

use crate::values::Value;

/// A sparse slot → [`Value`] bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    slots: BTreeMap<u32, Value>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `slot`, replacing any previous binding.
    pub fn insert(&mut self, slot: u32, value: Value) {
        self.slots.insert(slot, value);
    }

    pub fn get(&self, slot: u32) -> Option<&Value> {
        self.slots.get(&slot)
    }

    /// Remove and return the value at `slot`, if present.
    pub fn take(&mut self, slot: u32) -> Option<Value> {
        self.slots.remove(&slot)
    }

    pub fn contains(&self, slot: u32) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Dense 0-based construction, the common case at the engine call site.
impl From<Vec<Value>> for Frame {
    fn from(values: Vec<Value>) -> Self {
        let mut frame = Frame::new();
        for (slot, value) in values.into_iter().enumerate() {
            frame.insert(slot as u32, value);
        }
        frame
    }
}

impl FromIterator<(u32, Value)> for Frame {
    fn from_iter<I: IntoIterator<Item = (u32, Value)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_slot_is_none() {
        let frame = Frame::new();
        assert!(frame.get(0).is_none());
        assert!(!frame.contains(3));
    }

    #[test]
    fn dense_from_vec() {
        let frame = Frame::from(vec![Value::Uint(1), Value::Bool(false)]);
        assert_eq!(frame.get(0), Some(&Value::Uint(1)));
        assert_eq!(frame.get(1), Some(&Value::Bool(false)));
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn take_consumes() {
        let mut frame = Frame::from(vec![Value::Uint(9)]);
        assert_eq!(frame.take(0), Some(Value::Uint(9)));
        assert_eq!(frame.take(0), None);
        assert!(frame.is_empty());
    }

    #[test]
    fn sparse_insertion() {
        let frame: Frame = [(5, Value::Uint(5))].into_iter().collect();
        assert!(!frame.contains(0));
        assert_eq!(frame.get(5), Some(&Value::Uint(5)));
    }
}
