//! Splitting pages into bulk-sized batches

use crate::models::IndexableRecord;

/// Ordered, non-empty group of records written by one bulk call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    records: Vec<IndexableRecord>,
}

impl Batch {
    pub fn records(&self) -> &[IndexableRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id of the first record, 0 for an empty batch
    pub fn first_id(&self) -> i64 {
        self.records.first().map(|r| r.id).unwrap_or_default()
    }

    /// Id of the last record, 0 for an empty batch
    pub fn last_id(&self) -> i64 {
        self.records.last().map(|r| r.id).unwrap_or_default()
    }
}

/// Splits a page into batches of at most `max_size` records
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    max_size: usize,
}

impl Batcher {
    /// Create a batcher; a `max_size` of 0 is treated as 1
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Split `records` in order. Never yields an empty batch.
    pub fn split(&self, records: Vec<IndexableRecord>) -> Vec<Batch> {
        let mut batches = Vec::with_capacity(records.len().div_ceil(self.max_size));
        let mut records = records.into_iter().peekable();

        while records.peek().is_some() {
            let chunk: Vec<IndexableRecord> = records.by_ref().take(self.max_size).collect();
            batches.push(Batch { records: chunk });
        }

        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn records(n: usize) -> Vec<IndexableRecord> {
        (0..n)
            .map(|i| IndexableRecord::new(i as i64, format!("user {}", i), format!("u{}@example.com", i)))
            .collect()
    }

    #[test]
    fn test_split_with_partial_tail() {
        let batches = Batcher::new(100).split(records(250));

        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(batches[2].first_id(), 200);
        assert_eq!(batches[2].last_id(), 249);
    }

    #[test]
    fn test_split_empty_page() {
        assert!(Batcher::new(100).split(Vec::new()).is_empty());
    }

    #[test]
    fn test_zero_max_size_is_clamped() {
        let batches = Batcher::new(0).split(records(3));
        assert_eq!(batches.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_batches_are_bounded_and_order_preserving(n in 0usize..600, max in 1usize..150) {
            let input = records(n);
            let batches = Batcher::new(max).split(input.clone());

            prop_assert_eq!(batches.len(), n.div_ceil(max));
            prop_assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= max));

            let rejoined: Vec<IndexableRecord> = batches
                .into_iter()
                .flat_map(|b| b.records)
                .collect();
            prop_assert_eq!(rejoined, input);
        }
    }
}
