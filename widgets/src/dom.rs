use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SharedElement = Arc<Mutex<Element>>;

/// A widget's hosting element: its data attributes plus the text and table slots a
/// renderer is allowed to touch.
///
/// Writes to a slot the element was not built with are dropped, the same way a missing
/// child node is skipped on a real page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    id: String,
    data: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    text: BTreeMap<String, String>,
    tables: BTreeMap<String, Vec<Vec<String>>>,
}

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_slot(mut self, selector: impl Into<String>) -> Self {
        self.text.insert(selector.into(), String::new());
        self
    }

    pub fn with_table(mut self, selector: impl Into<String>) -> Self {
        self.tables.insert(selector.into(), Vec::new());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn text(&self, selector: &str) -> Option<&str> {
        self.text.get(selector).map(String::as_str)
    }

    pub fn set_text(&mut self, selector: &str, value: impl Into<String>) -> bool {
        match self.text.get_mut(selector) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn rows(&self, selector: &str) -> Option<&[Vec<String>]> {
        self.tables.get(selector).map(Vec::as_slice)
    }

    pub fn set_rows(&mut self, selector: &str, rows: Vec<Vec<String>>) -> bool {
        match self.tables.get_mut(selector) {
            Some(table) => {
                *table = rows;
                true
            }
            None => false,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn set_class(&mut self, class: &str, enabled: bool) {
        if enabled {
            self.classes.insert(class.to_string());
        } else {
            self.classes.remove(class);
        }
    }

    /// All slot text in selector order, one line per slot and per table row.
    pub fn text_content(&self) -> String {
        let mut lines: Vec<String> = self
            .text
            .values()
            .filter(|value| !value.is_empty())
            .cloned()
            .collect();
        for rows in self.tables.values() {
            lines.extend(rows.iter().map(|row| row.join(" ")));
        }
        lines.join("\n")
    }
}

/// The elements present on one page, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Arc<Mutex<BTreeMap<String, SharedElement>>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, element: Element) -> SharedElement {
        let id = element.id().to_string();
        let shared = Arc::new(Mutex::new(element));
        lock(&self.elements).insert(id, Arc::clone(&shared));
        shared
    }

    pub fn get(&self, id: &str) -> Option<SharedElement> {
        lock(&self.elements).get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<SharedElement> {
        lock(&self.elements).remove(id)
    }

    /// Copy of an element's current state.
    pub fn snapshot(&self, id: &str) -> Option<Element> {
        let element = self.get(id)?;
        let snapshot = lock(&element).clone();
        Some(snapshot)
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
