use log::debug;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An advance organizer type together with the function it serves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerPair {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntry {
    pub id: String,
    pub kind: String,
    pub description: String,
    pub matched: bool,
}

impl From<&OrganizerPair> for MatchEntry {
    fn from(pair: &OrganizerPair) -> Self {
        Self {
            id: pair.id.clone(),
            kind: pair.kind.clone(),
            description: pair.description.clone(),
            matched: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    NoSelection,
    Matched,
    Mismatch,
}

/// One matching session: every type has to be linked to its description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matching {
    pub entries: Vec<MatchEntry>,
    pub selected: Option<String>,
    /// Descriptions are listed in a different order than the types,
    /// otherwise the exercise answers itself.
    pub description_order: Vec<usize>,
}

impl Matching {
    pub fn new(pairs: &[OrganizerPair]) -> Self {
        let mut matching = Self::default();
        matching.reset(pairs);
        matching
    }

    pub fn reset(&mut self, pairs: &[OrganizerPair]) {
        self.entries = pairs.iter().map(MatchEntry::from).collect();
        self.selected = None;
        self.description_order = (0..self.entries.len()).collect();
        self.description_order.shuffle(&mut rand::thread_rng());
    }

    pub fn select_type(&mut self, kind: &str) -> Result<(), ValidationError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.kind == kind)
            .ok_or_else(|| ValidationError::UnknownType(kind.to_string()))?;
        if entry.matched {
            return Err(ValidationError::AlreadyMatched(kind.to_string()));
        }
        debug!("Selected organizer type {}", kind);
        self.selected = Some(kind.to_string());
        Ok(())
    }

    /// Tries to link `kind` to `description`.
    ///
    /// Whatever the outcome, the selection is cleared afterwards so the next
    /// attempt starts from a fresh pick.
    pub fn attempt_match(
        &mut self,
        pairs: &[OrganizerPair],
        kind: &str,
        description: &str,
    ) -> MatchOutcome {
        if self.selected.take().is_none() {
            return MatchOutcome::NoSelection;
        }

        let pair = pairs
            .iter()
            .find(|p| p.kind == kind && p.description == description);
        let entry = pair.and_then(|p| self.entries.iter_mut().find(|e| e.id == p.id));
        match entry {
            Some(entry) if !entry.matched => {
                entry.matched = true;
                debug!("Matched {} with its description", kind);
                MatchOutcome::Matched
            }
            _ => {
                debug!("No match for {}", kind);
                MatchOutcome::Mismatch
            }
        }
    }

    /// Matches the currently selected type against `description`.
    pub fn match_selected(&mut self, pairs: &[OrganizerPair], description: &str) -> MatchOutcome {
        match self.selected.clone() {
            Some(kind) => self.attempt_match(pairs, &kind, description),
            None => MatchOutcome::NoSelection,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.matched)
    }

    pub fn matched_count(&self) -> usize {
        self.entries.iter().filter(|e| e.matched).count()
    }

    /// Entries in the order their descriptions are shown.
    pub fn descriptions(&self) -> impl Iterator<Item = &MatchEntry> {
        self.description_order
            .iter()
            .filter_map(move |&i| self.entries.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> Vec<OrganizerPair> {
        vec![
            OrganizerPair {
                id: "1".into(),
                kind: "Grafisch".into(),
                description: "X".into(),
            },
            OrganizerPair {
                id: "2".into(),
                kind: "Expository".into(),
                description: "Y".into(),
            },
        ]
    }

    #[test]
    fn new_board_is_unmatched() {
        let board = Matching::new(&pairs());
        assert_eq!(board.entries.len(), 2);
        assert!(board.entries.iter().all(|e| !e.matched));
        assert_eq!(board.selected, None);
        assert!(!board.is_complete());

        let mut order = board.description_order.clone();
        order.sort();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn wrong_pair_marks_nothing_and_clears_selection() {
        let pairs = pairs();
        let mut board = Matching::new(&pairs);
        board.select_type("Grafisch").unwrap();

        assert_eq!(
            board.attempt_match(&pairs, "Grafisch", "Y"),
            MatchOutcome::Mismatch
        );
        assert!(board.entries.iter().all(|e| !e.matched));
        assert_eq!(board.selected, None);
    }

    #[test]
    fn match_without_selection_does_nothing() {
        let pairs = pairs();
        let mut board = Matching::new(&pairs);
        assert_eq!(
            board.attempt_match(&pairs, "Grafisch", "X"),
            MatchOutcome::NoSelection
        );
        assert_eq!(board.matched_count(), 0);
    }

    #[test]
    fn correct_pairs_complete_the_board() {
        let pairs = pairs();
        let mut board = Matching::new(&pairs);

        board.select_type("Grafisch").unwrap();
        assert_eq!(board.match_selected(&pairs, "X"), MatchOutcome::Matched);
        assert_eq!(board.selected, None);
        assert!(!board.is_complete());

        board.select_type("Expository").unwrap();
        assert_eq!(board.match_selected(&pairs, "Y"), MatchOutcome::Matched);
        assert!(board.is_complete());
    }

    #[test]
    fn matched_type_cannot_be_selected_again() {
        let pairs = pairs();
        let mut board = Matching::new(&pairs);
        board.select_type("Grafisch").unwrap();
        board.match_selected(&pairs, "X");

        assert_eq!(
            board.select_type("Grafisch"),
            Err(ValidationError::AlreadyMatched("Grafisch".into()))
        );
        assert_eq!(board.selected, None);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut board = Matching::new(&pairs());
        assert_eq!(
            board.select_type("Narratief"),
            Err(ValidationError::UnknownType("Narratief".into()))
        );
    }

    #[test]
    fn selecting_again_replaces_the_selection() {
        let mut board = Matching::new(&pairs());
        board.select_type("Grafisch").unwrap();
        board.select_type("Expository").unwrap();
        assert_eq!(board.selected.as_deref(), Some("Expository"));
    }

    #[test]
    fn already_matched_pair_is_a_mismatch() {
        let pairs = pairs();
        let mut board = Matching::new(&pairs);
        board.select_type("Grafisch").unwrap();
        board.match_selected(&pairs, "X");

        board.select_type("Expository").unwrap();
        assert_eq!(
            board.attempt_match(&pairs, "Grafisch", "X"),
            MatchOutcome::Mismatch
        );
        assert_eq!(board.matched_count(), 1);
    }

    #[test]
    fn reset_unmatches_everything() {
        let pairs = pairs();
        let mut board = Matching::new(&pairs);
        board.select_type("Grafisch").unwrap();
        board.match_selected(&pairs, "X");
        board.select_type("Expository").unwrap();

        board.reset(&pairs);
        assert_eq!(board.matched_count(), 0);
        assert_eq!(board.selected, None);
        assert_eq!(board.descriptions().count(), 2);
    }
}
