//! Grouping of a key-sorted record sequence.
//!
//! `Groups` is a cursor: `next_key` moves to the next run of records sharing
//! a key and returns that key; `group` reads the records of the current run.
//! A `Group` borrows the cursor mutably, so it cannot outlive the next call
//! to `next_key`, which skips whatever the group did not read.

use rel_core::prelude::{Key, KeySpec, Record, Result};

pub struct Groups<I>
where
    I: Iterator<Item = Result<Record>>,
{
    records: I,
    key: KeySpec,
    /// One record (or the error that stopped the input) read ahead.
    lookahead: Option<Result<Record>>,
    current: Option<Key>,
    started: bool,
}

impl<I> Groups<I>
where
    I: Iterator<Item = Result<Record>>,
{
    /// `records` must already be ordered on `key`.
    pub fn new(records: I, key: KeySpec) -> Self {
        Self {
            records,
            key,
            lookahead: None,
            current: None,
            started: false,
        }
    }

    /// Key of the current group, if there is one.
    pub fn current(&self) -> Option<&Key> {
        self.current.as_ref()
    }

    /// Advance to the next group and return its key, or `None` at the end.
    pub fn next_key(&mut self) -> Result<Option<Key>> {
        if !self.started {
            self.started = true;
            self.pull();
        } else {
            while self.in_current_group() {
                self.pull();
            }
        }
        match self.lookahead.take() {
            None => {
                self.current = None;
                Ok(None)
            }
            Some(Err(e)) => {
                self.current = None;
                Err(e)
            }
            Some(Ok(record)) => {
                let key = self.key.extract(&record);
                self.lookahead = Some(Ok(record));
                self.current = Some(key.clone());
                Ok(Some(key))
            }
        }
    }

    /// The records of the current group that have not been read yet.
    pub fn group(&mut self) -> Group<'_, I> {
        Group { groups: self }
    }

    fn pull(&mut self) {
        self.lookahead = self.records.next();
    }

    fn in_current_group(&self) -> bool {
        match &self.lookahead {
            Some(Ok(record)) => self.in_current_group_record(record),
            _ => false,
        }
    }

    fn in_current_group_record(&self, record: &Record) -> bool {
        self.current
            .as_ref()
            .map_or(false, |key| self.key.matches(record, key))
    }
}

/// Single-pass view of the current group.
pub struct Group<'a, I>
where
    I: Iterator<Item = Result<Record>>,
{
    groups: &'a mut Groups<I>,
}

impl<'a, I> Iterator for Group<'a, I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let g = &mut *self.groups;
        if g.current.is_none() {
            return None;
        }
        match g.lookahead.take() {
            Some(Ok(record)) if g.in_current_group_record(&record) => {
                g.pull();
                Some(Ok(record))
            }
            Some(Err(e)) => {
                g.current = None;
                Some(Err(e))
            }
            other => {
                g.lookahead = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rel_core::Error;

    fn recs(rows: &[(&str, &str)]) -> Vec<Result<Record>> {
        rows.iter()
            .map(|(k, v)| Ok(vec![k.as_bytes().to_vec(), v.as_bytes().to_vec()]))
            .collect()
    }

    fn k(s: &str) -> Key {
        vec![s.as_bytes().to_vec()]
    }

    #[test]
    fn walks_groups_in_order() {
        let data = recs(&[("a", "1"), ("a", "2"), ("b", "3"), ("c", "4"), ("c", "5")]);
        let mut g = Groups::new(data.into_iter(), KeySpec::new(vec![0]));

        assert_eq!(g.next_key().unwrap(), Some(k("a")));
        let a: Vec<Record> = g.group().collect::<Result<_>>().unwrap();
        assert_eq!(a.len(), 2);

        assert_eq!(g.next_key().unwrap(), Some(k("b")));
        assert_eq!(g.group().count(), 1);

        assert_eq!(g.next_key().unwrap(), Some(k("c")));
        assert_eq!(g.current(), Some(&k("c")));
        assert_eq!(g.group().count(), 2);
        assert_eq!(g.group().count(), 0);

        assert_eq!(g.next_key().unwrap(), None);
        assert_eq!(g.next_key().unwrap(), None);
    }

    #[test]
    fn next_key_skips_unread_rest() {
        let data = recs(&[("a", "1"), ("a", "2"), ("a", "3"), ("b", "4")]);
        let mut g = Groups::new(data.into_iter(), KeySpec::new(vec![0]));
        g.next_key().unwrap();
        assert!(g.group().next().is_some());
        assert_eq!(g.next_key().unwrap(), Some(k("b")));
        let b: Vec<Record> = g.group().collect::<Result<_>>().unwrap();
        assert_eq!(b[0][1], b"4");
    }

    #[test]
    fn empty_key_is_one_group() {
        let data = recs(&[("a", "1"), ("b", "2")]);
        let mut g = Groups::new(data.into_iter(), KeySpec::default());
        assert_eq!(g.next_key().unwrap(), Some(Vec::new()));
        assert_eq!(g.group().count(), 2);
        assert_eq!(g.next_key().unwrap(), None);
    }

    #[test]
    fn empty_input_has_no_groups() {
        let mut g = Groups::new(Vec::<Result<Record>>::new().into_iter(), KeySpec::default());
        assert_eq!(g.next_key().unwrap(), None);
        assert_eq!(g.group().count(), 0);
    }

    #[test]
    fn errors_surface_where_they_occur() {
        let mut data = recs(&[("a", "1")]);
        data.push(Err(Error::data("bad line")));
        let mut g = Groups::new(data.into_iter(), KeySpec::new(vec![0]));
        g.next_key().unwrap();
        let mut group = g.group();
        assert!(group.next().unwrap().is_ok());
        assert!(group.next().unwrap().is_err());
        assert!(group.next().is_none());

        let mut data = recs(&[("a", "1")]);
        data.push(Err(Error::data("bad line")));
        let mut g = Groups::new(data.into_iter(), KeySpec::new(vec![0]));
        g.next_key().unwrap();
        assert!(g.next_key().is_err());
    }
}
