// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::ops::{AddAssign, Deref};

use itertools::Itertools;

#[derive(CopyGetters, Debug)]
pub struct SimpleCounter<T>
where
    T: Eq + Hash,
{
    inner: HashMap<T, usize>,
    #[getset(get_copy = "pub")]
    total_count: usize,
}

impl<T> SimpleCounter<T>
where
    T: Eq + Hash,
{
    pub fn incr(&mut self, event: T) {
        self.total_count += 1;
        *self.inner.entry(event).or_insert(0) += 1;
    }
}

impl<T> SimpleCounter<T>
where
    T: Eq + Hash + Display,
{
    /// Log each non-zero count, ordered by descending count.
    pub fn log_summary(&self, context: &str) {
        for (event, count) in self
            .inner
            .iter()
            .filter(|&(_, &count)| count > 0)
            .sorted_by_key(|&(_, &count)| std::cmp::Reverse(count))
        {
            info!("{}: skipped {} {}.", context, count, event);
        }
    }
}

impl<T> AddAssign for SimpleCounter<T>
where
    T: Eq + Hash,
{
    fn add_assign(&mut self, other: Self) {
        self.total_count += other.total_count;
        for (event, count) in other.inner {
            *self.inner.entry(event).or_insert(0) += count;
        }
    }
}

impl<T> Default for SimpleCounter<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        SimpleCounter {
            inner: HashMap::new(),
            total_count: 0,
        }
    }
}

impl<T> Deref for SimpleCounter<T>
where
    T: Eq + Hash,
{
    type Target = HashMap<T, usize>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_counter() {
        let mut counter = SimpleCounter::default();
        counter.incr("a");
        counter.incr("a");
        counter.incr("b");
        assert_eq!(counter.total_count(), 3);
        assert_eq!(counter.get("a"), Some(&2));

        let mut other = SimpleCounter::default();
        other.incr("b");
        counter += other;
        assert_eq!(counter.total_count(), 4);
        assert_eq!(counter.get("b"), Some(&2));
    }
}
