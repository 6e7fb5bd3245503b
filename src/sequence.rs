use thiserror::Error;

/// Identifier of a loaded item. Items are numbered from 1.
pub type ItemId = u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("item {got} does not follow item {last} (expected {expected})")]
    NotContiguous {
        last: ItemId,
        expected: ItemId,
        got: ItemId,
    },
}

/// Ordered, contiguous list of loaded item ids, starting at `[1]`.
///
/// The only mutation is [`Sequence::append`], which accepts exactly
/// `len + 1`. There is no removal, so `last()` is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    items: Vec<ItemId>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequence {
    pub fn new() -> Self {
        Self { items: vec![1] }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Never true; a sequence always holds its first item.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Newest item id.
    pub fn last(&self) -> ItemId {
        self.items.last().copied().unwrap_or(1)
    }

    /// The id the next successful load would append.
    pub fn next_id(&self) -> ItemId {
        self.items.len() as ItemId + 1
    }

    pub fn append(&mut self, next: ItemId) -> Result<(), SequenceError> {
        let expected = self.next_id();
        if next != expected {
            return Err(SequenceError::NotContiguous {
                last: self.last(),
                expected,
                got: next,
            });
        }
        self.items.push(next);
        Ok(())
    }

    pub fn as_slice(&self) -> &[ItemId] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_first_item() {
        let seq = Sequence::new();
        assert_eq!(seq.as_slice(), &[1]);
        assert_eq!(seq.last(), 1);
        assert_eq!(seq.next_id(), 2);
        assert!(!seq.is_empty());
    }

    #[test]
    fn test_append_contiguous() {
        let mut seq = Sequence::new();
        for next in 2..=10 {
            seq.append(next).unwrap();
        }
        assert_eq!(seq.as_slice(), (1..=10).collect::<Vec<_>>().as_slice());
        assert_eq!(seq.last(), 10);
    }

    #[test]
    fn test_append_rejects_gap_and_duplicate() {
        let mut seq = Sequence::new();
        assert_eq!(
            seq.append(3),
            Err(SequenceError::NotContiguous {
                last: 1,
                expected: 2,
                got: 3
            })
        );
        assert!(seq.append(1).is_err());
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_rejected_append_keeps_sequence_non_empty() {
        let mut seq = Sequence::new();
        assert!(seq.append(5).is_err());
        assert!(!seq.is_empty());
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.last(), 1);
    }
}
