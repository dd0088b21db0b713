use anyhow::{anyhow, Result};
use std::sync::Arc;

/// One joined round of input values, addressable by input name.
///
/// Built by a node for every tuple produced by its zip-join and handed to the
/// transformation by value.
#[derive(Debug, Clone)]
pub struct Args<T> {
    names: Arc<[String]>,
    values: Vec<T>,
}

impl<T> Args<T> {
    pub fn new(names: Arc<[String]>, values: Vec<T>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i))
    }

    /// Like [`Args::get`] but fails with a descriptive error.
    pub fn require(&self, name: &str) -> Result<&T> {
        self.get(name)
            .ok_or_else(|| anyhow!("argument `{}` is not bound", name))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Values in declared input order.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

/// Result of one transformation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emit<T> {
    /// A single value, for nodes with one output
    One(T),
    /// An ordered tuple, one value per declared output
    Many(Vec<T>),
}

impl<T> Emit<T> {
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> From<Vec<T>> for Emit<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Args<i32> {
        let names: Arc<[String]> = vec!["a".to_string(), "b".to_string()].into();
        Args::new(names, vec![1, 10])
    }

    #[test]
    fn test_lookup_by_name() {
        let args = frame();
        assert_eq!(args.get("b"), Some(&10));
        assert_eq!(args.get("c"), None);
        assert!(args.require("c").is_err());
    }

    #[test]
    fn test_iter_keeps_declared_order() {
        let args = frame();
        let pairs: Vec<(&str, i32)> = args.iter().map(|(n, v)| (n, *v)).collect();
        assert_eq!(pairs, vec![("a", 1), ("b", 10)]);
    }

    #[test]
    fn test_emit_len() {
        assert_eq!(Emit::One(3).len(), 1);
        assert_eq!(Emit::from(vec![1, 2, 3]).len(), 3);
    }
}
