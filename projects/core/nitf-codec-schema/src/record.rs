//! In-memory values of a decoded record.
//!
//! Every field is stored under its name. A field declared `N` loops deep holds
//! an `N`-level jagged tree of [`Slot::Repeated`] nodes with scalars at the
//! leaves, so `f.nxpts[1]` lives at `slots["nxpts"] -> Repeated[1] -> Scalar`.

use crate::expr::ExpressionError;
use crate::value::Value;
use std::collections::HashMap;

/// One node of a field's value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// A leaf. `None` is the distinct "no value" state (excluded by a condition, or blank).
    Scalar(Option<Value>),
    /// One entry per loop iteration.
    Repeated(Vec<Slot>),
}

/// Field values of one record instance, addressed by `(name, indices)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRecord {
    slots: HashMap<String, Slot>,
}

impl DecodedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value at `indices`, or `None` if the position is absent or holds no value.
    pub fn get(&self, name: &str, indices: &[usize]) -> Option<&Value> {
        match self.slot(name, indices)? {
            Slot::Scalar(value) => value.as_ref(),
            Slot::Repeated(_) => None,
        }
    }

    /// Returns the raw slot at `indices` (which may be a partial index path).
    pub fn slot(&self, name: &str, indices: &[usize]) -> Option<&Slot> {
        let mut slot = self.slots.get(name)?;
        for &index in indices {
            match slot {
                Slot::Repeated(items) => slot = items.get(index)?,
                Slot::Scalar(_) => return None,
            }
        }
        Some(slot)
    }

    /// Whether the field has been stored at all.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Stores a value, growing intermediate iteration lists as needed.
    ///
    /// Positions created by growth hold no value.
    pub fn set(&mut self, name: &str, indices: &[usize], value: Option<Value>) {
        let mut slot = self
            .slots
            .entry(name.to_string())
            .or_insert_with(|| Slot::Scalar(None));
        for (level, &index) in indices.iter().enumerate() {
            let leaf_next = level + 1 == indices.len();
            let items = as_repeated(slot);
            while items.len() <= index {
                items.push(if leaf_next {
                    Slot::Scalar(None)
                } else {
                    Slot::Repeated(Vec::new())
                });
            }
            slot = &mut items[index];
        }
        *slot = Slot::Scalar(value);
    }

    /// Makes sure the field has an (initially empty) iteration list at `prefix`,
    /// so that a loop with zero iterations is still distinguishable from an
    /// undecoded one.
    pub(crate) fn ensure_repeated(&mut self, name: &str, prefix: &[usize]) {
        let mut slot = self
            .slots
            .entry(name.to_string())
            .or_insert_with(|| Slot::Repeated(Vec::new()));
        for &index in prefix {
            let items = as_repeated(slot);
            while items.len() <= index {
                items.push(Slot::Repeated(Vec::new()));
            }
            slot = &mut items[index];
        }
        as_repeated(slot);
    }

    /// Number of stored iterations of the loop level directly below `prefix`.
    pub fn iteration_count(&self, name: &str, prefix: &[usize]) -> usize {
        match self.slot(name, prefix) {
            Some(Slot::Repeated(items)) => items.len(),
            _ => 0,
        }
    }

    /// Drops stored iterations beyond `len` at `prefix`.
    pub fn truncate(&mut self, name: &str, prefix: &[usize], len: usize) {
        let mut slot = match self.slots.get_mut(name) {
            Some(slot) => slot,
            None => return,
        };
        for &index in prefix {
            match slot {
                Slot::Repeated(items) => match items.get_mut(index) {
                    Some(next) => slot = next,
                    None => return,
                },
                Slot::Scalar(_) => return,
            }
        }
        if let Slot::Repeated(items) = slot {
            items.truncate(len);
        }
    }

    /// Names of all stored fields, in no particular order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Lookup used by expressions, distinguishing an undecoded field from a
    /// position past the stored iterations.
    pub(crate) fn lookup(
        &self,
        name: &str,
        indices: &[usize],
    ) -> Result<Option<&Value>, ExpressionError> {
        if !self.contains(name) {
            return Err(ExpressionError::UndefinedField(name.into()));
        }
        match self.slot(name, indices) {
            Some(Slot::Scalar(value)) => Ok(value.as_ref()),
            Some(Slot::Repeated(_)) => Err(ExpressionError::WrongKind {
                expected: "scalar",
                found: "sequence",
            }),
            None => Err(ExpressionError::IndexOutOfRange {
                field: name.into(),
                indices: indices.to_vec(),
            }),
        }
    }
}

/// Turns a scalar slot into an empty iteration list, then returns the list.
fn as_repeated(slot: &mut Slot) -> &mut Vec<Slot> {
    match slot {
        Slot::Repeated(items) => items,
        Slot::Scalar(_) => {
            *slot = Slot::Repeated(Vec::new());
            as_repeated(slot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_grows_jagged_levels() {
        let mut record = DecodedRecord::new();
        record.set("pts", &[0, 2], Some(Value::Int(7)));
        record.set("pts", &[1, 0], Some(Value::Int(8)));

        assert_eq!(record.iteration_count("pts", &[]), 2);
        assert_eq!(record.iteration_count("pts", &[0]), 3);
        assert_eq!(record.iteration_count("pts", &[1]), 1);
        assert_eq!(record.get("pts", &[0, 2]), Some(&Value::Int(7)));
        assert_eq!(record.get("pts", &[0, 1]), None);
        assert_eq!(record.slot("pts", &[0, 1]), Some(&Slot::Scalar(None)));
    }

    #[test]
    fn lookup_distinguishes_undefined_and_out_of_range() {
        let mut record = DecodedRecord::new();
        record.ensure_repeated("nxpts", &[]);

        assert_eq!(
            record.lookup("other", &[]),
            Err(ExpressionError::UndefinedField("other".into()))
        );
        assert_eq!(
            record.lookup("nxpts", &[0]),
            Err(ExpressionError::IndexOutOfRange {
                field: "nxpts".into(),
                indices: vec![0]
            })
        );
        assert_eq!(record.iteration_count("nxpts", &[]), 0);
    }

    #[test]
    fn truncate_drops_trailing_iterations() {
        let mut record = DecodedRecord::new();
        for i in 0..4 {
            record.set("x", &[i], Some(Value::Int(i as i64)));
        }
        record.truncate("x", &[], 2);
        assert_eq!(record.iteration_count("x", &[]), 2);
        assert_eq!(record.get("x", &[1]), Some(&Value::Int(1)));
    }
}
