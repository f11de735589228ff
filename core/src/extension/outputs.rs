//! Typed side tables produced by extension parsers.

use std::any::Any;
use std::collections::HashMap;

/// Extension results keyed by extension name.
///
/// Each parser owns the type stored under its own name; readers downcast
/// with [`get`](Self::get).
#[derive(Default)]
pub struct ExtensionOutputs {
    entries: HashMap<String, Box<dyn Any>>,
}

impl ExtensionOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing whatever was under `name`.
    pub fn insert<T: Any>(&mut self, name: impl Into<String>, value: T) {
        self.entries.insert(name.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.entries.get(name)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name)?.downcast_mut()
    }

    /// Remove and return a value if it has type `T`.
    pub fn take<T: Any>(&mut self, name: &str) -> Option<T> {
        if !self.entries.get(name)?.is::<T>() {
            return None;
        }
        self.entries
            .remove(name)?
            .downcast::<T>()
            .ok()
            .map(|boxed| *boxed)
    }

    /// Append to a `Vec<T>` stored under `name`, creating it if needed.
    pub fn push<T: Any>(&mut self, name: &str, item: T) {
        match self.get_mut::<Vec<T>>(name) {
            Some(items) => items.push(item),
            None => self.insert(name, vec![item]),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ExtensionOutputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("ExtensionOutputs")
            .field("entries", &names)
            .finish()
    }
}
