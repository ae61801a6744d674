//! In-memory list items (tasks).
//!
//! New items get ids from a monotonic counter that starts past the largest
//! numeric id already present, so deleting an item and adding another never
//! reuses an id still held by a surviving item.

use std::collections::HashSet;

use devsync_shared::{ItemComment, ListItem, ListItemPatch, NewListItem};
use tracing::debug;

use crate::seed;

#[derive(Debug, Clone)]
pub struct ListsStore {
    items: Vec<ListItem>,
    next_id: u64,
}

impl ListsStore {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<ListItem>) -> Self {
        let mut store = Self { items, next_id: 1 };
        store.bump_counter();
        store
    }

    /// A store holding the three sample tasks.
    pub fn seeded() -> Self {
        Self::with_items(seed::list_items())
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    /// Replace the whole collection. The id counter never moves backwards.
    pub fn set_items(&mut self, items: Vec<ListItem>) {
        self.items = items;
        self.bump_counter();
    }

    pub fn get_item(&self, id: &str) -> Option<&ListItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Merge `patch` into the item with `id`. Returns `false` if no item matched.
    pub fn update_item(&mut self, id: &str, patch: ListItemPatch) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.apply(patch);
                debug!(id, "list item updated");
                true
            }
            None => false,
        }
    }

    /// Append a new item and return its id.
    pub fn add_item(&mut self, new: NewListItem) -> String {
        let id = self.allocate_id();
        debug!(id = %id, title = %new.title, "list item added");
        self.items.push(ListItem::from_new(id.clone(), new));
        id
    }

    /// Remove the item with `id`. Returns `false` if no item matched.
    pub fn delete_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Items in the given board column, in insertion order.
    pub fn items_by_status<'a>(&'a self, status: &'a str) -> impl Iterator<Item = &'a ListItem> {
        self.items.iter().filter(move |item| item.status == status)
    }

    /// Flip a subtask's completion. Returns the new value, or `None` if either
    /// id is unknown.
    pub fn toggle_subtask(&mut self, item_id: &str, subtask_id: &str) -> Option<bool> {
        let item = self.items.iter_mut().find(|item| item.id == item_id)?;
        let subtask = item.subtasks.iter_mut().find(|s| s.id == subtask_id)?;
        subtask.completed = !subtask.completed;
        Some(subtask.completed)
    }

    pub fn add_comment(&mut self, item_id: &str, comment: ItemComment) -> bool {
        match self.items.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                item.comments.push(comment);
                true
            }
            None => false,
        }
    }

    fn bump_counter(&mut self) {
        let max = self
            .items
            .iter()
            .filter_map(|item| item.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(max.saturating_add(1));
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id;
        if id < u64::MAX {
            self.next_id = id + 1;
            return id.to_string();
        }

        // Counter exhausted: lowest numeric id no surviving item holds.
        let taken: HashSet<&str> = self.items.iter().map(|item| item.id.as_str()).collect();
        (1..u64::MAX)
            .map(|n| n.to_string())
            .find(|candidate| !taken.contains(candidate.as_str()))
            .unwrap_or_else(|| u64::MAX.to_string())
    }
}

impl Default for ListsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use devsync_shared::Priority;

    use super::*;

    fn new_item(title: &str) -> NewListItem {
        NewListItem {
            title: title.into(),
            assignee: "Caleb Adams".into(),
            due_date: "2025-03-01".into(),
            priority: Priority::Low,
            status: "To Do".into(),
            ..NewListItem::default()
        }
    }

    #[test]
    fn update_touches_only_the_target() {
        let mut store = ListsStore::seeded();
        let before = store.items().to_vec();

        assert!(store.update_item("2", ListItemPatch::status("In Progress")));

        let updated: Vec<_> = store.items().iter().filter(|i| i.id == "2").collect();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].status, "In Progress");
        assert_eq!(updated[0].title, before[1].title);

        for (old, new) in before.iter().zip(store.items()) {
            if old.id != "2" {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn update_unknown_id_is_a_no_op() {
        let mut store = ListsStore::seeded();
        let before = store.items().to_vec();
        assert!(!store.update_item("99", ListItemPatch::status("Done")));
        assert_eq!(store.items(), before.as_slice());
    }

    #[test]
    fn delete_then_add_never_duplicates_ids() {
        let mut store = ListsStore::seeded();
        assert!(store.delete_item("1"));
        let id = store.add_item(new_item("Write release notes"));

        assert_eq!(id, "4");
        let ids: HashSet<_> = store.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), store.items().len());
    }

    #[test]
    fn ids_keep_growing_after_deleting_the_newest() {
        let mut store = ListsStore::seeded();
        let a = store.add_item(new_item("a"));
        assert!(store.delete_item(&a));
        let b = store.add_item(new_item("b"));
        assert_ne!(a, b);
    }

    #[test]
    fn set_items_does_not_rewind_counter() {
        let mut store = ListsStore::seeded();
        store.add_item(new_item("four"));
        store.set_items(Vec::new());
        assert_eq!(store.add_item(new_item("five")), "5");
    }

    #[test]
    fn huge_ids_do_not_overflow_the_counter() {
        let mut store = ListsStore::new();
        let huge = ListItem::from_new(u64::MAX.to_string(), new_item("imported"));
        store.set_items(vec![huge]);

        let a = store.add_item(new_item("a"));
        let b = store.add_item(new_item("b"));

        assert_ne!(a, b);
        let ids: HashSet<_> = store.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn get_item_and_status_filter() {
        let store = ListsStore::seeded();
        assert_eq!(store.get_item("3").unwrap().status, "Done");
        assert!(store.get_item("nope").is_none());
        assert_eq!(store.items_by_status("To Do").count(), 1);
    }

    #[test]
    fn toggle_subtask() {
        let mut store = ListsStore::seeded();
        assert_eq!(store.toggle_subtask("1", "1-2"), Some(true));
        assert_eq!(store.toggle_subtask("1", "1-2"), Some(false));
        assert_eq!(store.toggle_subtask("1", "9-9"), None);
    }

    #[test]
    fn delete_unknown_returns_false() {
        let mut store = ListsStore::new();
        assert!(!store.delete_item("1"));
    }
}
