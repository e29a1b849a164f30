use std::collections::{BTreeSet, HashMap};

/// Fronts awaiting their backs, keyed by `(front page, position)`
#[derive(Debug, Default)]
pub struct PairingTable {
    fronts: HashMap<(u32, usize), String>,
    mismatched: BTreeSet<u32>,
}

impl PairingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a front page from pairing because its back page disagrees
    /// on the number of cards
    pub fn mark_mismatched(&mut self, front_page: u32) {
        self.mismatched.insert(front_page);
    }

    pub fn is_mismatched(&self, front_page: u32) -> bool {
        self.mismatched.contains(&front_page)
    }

    pub fn mismatched_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.mismatched.iter().copied()
    }

    pub fn record_front(&mut self, page: u32, position: usize, name: String) {
        self.fronts.insert((page, position), name);
    }

    /// Front name for the back at `position` on `back_page`, looked up on the
    /// page before it
    pub fn front_for_back(&self, back_page: u32, position: usize) -> Option<&str> {
        let front_page = back_page.checked_sub(1)?;
        self.fronts
            .get(&(front_page, position))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_pairs_with_previous_page() {
        let mut table = PairingTable::new();
        table.record_front(1, 2, "1_2".to_string());

        assert_eq!(table.front_for_back(2, 2), Some("1_2"));
        assert_eq!(table.front_for_back(2, 3), None);
        assert_eq!(table.front_for_back(4, 2), None);
        assert_eq!(table.front_for_back(0, 2), None);
    }

    #[test]
    fn test_mismatch_tracking() {
        let mut table = PairingTable::new();
        table.mark_mismatched(3);
        assert!(table.is_mismatched(3));
        assert!(!table.is_mismatched(1));
        assert_eq!(table.mismatched_pages().collect::<Vec<_>>(), vec![3]);
    }
}
