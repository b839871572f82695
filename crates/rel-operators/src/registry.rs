//! Operator registry for exec/CLI wiring.
//!
//! Maps command names to boxed operator instances.

use std::collections::BTreeMap;

use crate::join::{Compose, Image, Join, Match, Miss};
use crate::setops::{SetOp, Sum};
use crate::traits::Operator;

pub struct Registry {
    makers: BTreeMap<&'static str, fn() -> Box<dyn Operator>>,
}

impl Registry {
    pub fn new() -> Self {
        let mut r = Self {
            makers: BTreeMap::new(),
        };
        r.register("join", || Box::new(Join));
        r.register("compose", || Box::new(Compose));
        r.register("image", || Box::new(Image));
        r.register("match", || Box::new(Match));
        r.register("miss", || Box::new(Miss));
        r.register("union", || Box::new(SetOp::Union));
        r.register("meet", || Box::new(SetOp::Meet));
        r.register("sans", || Box::new(SetOp::Sans));
        r.register("symm", || Box::new(SetOp::Symm));
        r.register("sum", || Box::new(Sum));
        r
    }

    pub fn register(&mut self, key: &'static str, f: fn() -> Box<dyn Operator>) {
        self.makers.insert(key, f);
    }

    pub fn make(&self, key: &str) -> Option<Box<dyn Operator>> {
        self.makers.get(key).map(|f| f())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.makers.keys().copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        let r = Registry::new();
        assert_eq!(r.names().count(), 10);
        for name in r.names() {
            assert_eq!(r.make(name).unwrap().name(), name);
        }
        assert!(r.make("divide").is_none());
    }
}
