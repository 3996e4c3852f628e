use crate::shared::known_face::KnownFaceEntry;

pub const EMPTY_LIST_MESSAGE: &str = "No known faces yet. Add some faces to get started!";

/// Action a row can trigger. Carries the row's own name so the handler
/// never has to look it up by position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KnownFaceAction {
    DeleteFace(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnownFaceRow {
    pub name: String,
    pub delete: KnownFaceAction,
}

/// View model for the "manage known faces" screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownFacesList {
    rows: Vec<KnownFaceRow>,
}

impl KnownFacesList {
    pub fn from_entries(entries: &[KnownFaceEntry]) -> Self {
        let rows = entries
            .iter()
            .map(|entry| KnownFaceRow {
                name: entry.name.clone(),
                delete: KnownFaceAction::DeleteFace(entry.name.clone()),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[KnownFaceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Placeholder text to show instead of rows, if any.
    pub fn empty_message(&self) -> Option<&'static str> {
        self.rows.is_empty().then_some(EMPTY_LIST_MESSAGE)
    }

    pub fn loaded_message(&self) -> String {
        format!("{} known face(s) loaded", self.rows.len())
    }

    /// Removes a row after its deletion succeeded. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.name != name);
        self.rows.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(names: &[&str]) -> Vec<KnownFaceEntry> {
        names.iter().map(|n| KnownFaceEntry::new(*n)).collect()
    }

    #[test]
    fn test_each_entry_gets_delete_bound_to_its_name() {
        let list = KnownFacesList::from_entries(&entries(&["Bob", "Carol"]));

        assert_eq!(list.len(), 2);
        assert_eq!(list.rows()[0].name, "Bob");
        assert_eq!(
            list.rows()[0].delete,
            KnownFaceAction::DeleteFace("Bob".into())
        );
        assert_eq!(list.rows()[1].name, "Carol");
        assert_eq!(
            list.rows()[1].delete,
            KnownFaceAction::DeleteFace("Carol".into())
        );
        assert!(list.empty_message().is_none());
    }

    #[test]
    fn test_empty_list_shows_placeholder() {
        let list = KnownFacesList::from_entries(&[]);
        assert!(list.is_empty());
        assert_eq!(list.empty_message(), Some(EMPTY_LIST_MESSAGE));
    }

    #[test]
    fn test_loaded_message_counts_rows() {
        let list = KnownFacesList::from_entries(&entries(&["Bob", "Carol"]));
        assert_eq!(list.loaded_message(), "2 known face(s) loaded");
    }

    #[test]
    fn test_remove_drops_only_named_row() {
        let mut list = KnownFacesList::from_entries(&entries(&["Bob", "Carol"]));
        assert!(list.remove("Bob"));
        assert!(!list.remove("Bob"));
        assert_eq!(list.len(), 1);
        assert_eq!(list.rows()[0].name, "Carol");
    }
}
