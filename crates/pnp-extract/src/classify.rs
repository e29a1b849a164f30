use lopdf::ObjectId;
use std::collections::{BTreeSet, HashMap};

/// Tracks which back images are shared by many cards.
///
/// Occurrences are counted over every back page before any back is written;
/// an image seen at least `threshold` times is common and written once.
#[derive(Debug, Default)]
pub struct CommonBackIndex {
    occurrences: HashMap<ObjectId, usize>,
    common: BTreeSet<ObjectId>,
    saved: HashMap<ObjectId, String>,
}

impl CommonBackIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, image: ObjectId) {
        *self.occurrences.entry(image).or_default() += 1;
    }

    /// Freeze the common set. Returns how many common images were found.
    pub fn finalize(&mut self, threshold: usize) -> usize {
        self.common = self
            .occurrences
            .iter()
            .filter(|&(_, &count)| count >= threshold)
            .map(|(&id, _)| id)
            .collect();
        self.common.len()
    }

    pub fn is_common(&self, image: ObjectId) -> bool {
        self.common.contains(&image)
    }

    pub fn occurrences(&self, image: ObjectId) -> usize {
        self.occurrences.get(&image).copied().unwrap_or(0)
    }

    /// Name under which a common image was already written
    pub fn saved_name(&self, image: ObjectId) -> Option<&str> {
        self.saved.get(&image).map(String::as_str)
    }

    /// Name for the next common back to be written: `back_<n>`, or
    /// `<prefix>_back_<n>` with a prefix
    pub fn next_name(&self, prefix: Option<&str>) -> String {
        let n = self.saved.len() + 1;
        match prefix {
            Some(prefix) => format!("{}_back_{}", prefix, n),
            None => format!("back_{}", n),
        }
    }

    pub fn mark_saved(&mut self, image: ObjectId, name: String) {
        self.saved.insert(image, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let mut index = CommonBackIndex::new();
        for _ in 0..10 {
            index.record((1, 0));
        }
        for _ in 0..9 {
            index.record((2, 0));
        }

        assert_eq!(index.finalize(10), 1);
        assert!(index.is_common((1, 0)));
        assert!(!index.is_common((2, 0)));
        assert_eq!(index.occurrences((2, 0)), 9);
    }

    #[test]
    fn test_names_count_up() {
        let mut index = CommonBackIndex::new();
        assert_eq!(index.next_name(None), "back_1");
        index.mark_saved((1, 0), "back_1".to_string());
        assert_eq!(index.next_name(Some("deck")), "deck_back_2");
        assert_eq!(index.saved_name((1, 0)), Some("back_1"));
        assert_eq!(index.saved_name((3, 0)), None);
    }
}
