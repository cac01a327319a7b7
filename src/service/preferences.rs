use tracing::debug;

use super::storage::LocalStore;
use crate::errors::{ChronosError, Result};

pub const PREFERENCES_KEY: &str = "preferences";

/// Ordered scheduling preferences, written back to the store on every change.
#[derive(Debug, Clone)]
pub struct Preferences {
    store: LocalStore,
    items: Vec<String>,
}

impl Preferences {
    pub fn load(store: LocalStore) -> Result<Self> {
        let items: Vec<String> = store.get(PREFERENCES_KEY)?.unwrap_or_default();
        Ok(Self { store, items })
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.items.clone()
    }

    /// Blank input is ignored and reported as `false`.
    pub fn add(&mut self, preference: &str) -> Result<bool> {
        let preference = preference.trim();
        if preference.is_empty() {
            return Ok(false);
        }
        let mut next = self.items.clone();
        next.push(preference.to_string());
        self.commit(next)?;
        debug!(count = self.items.len(), "preference added");
        Ok(true)
    }

    pub fn remove(&mut self, index: usize) -> Result<String> {
        if index >= self.items.len() {
            return Err(ChronosError::InvalidInput(format!(
                "no preference at position {}",
                index + 1
            )));
        }
        let mut next = self.items.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        Ok(removed)
    }

    /// Memory only changes once the store write went through.
    fn commit(&mut self, next: Vec<String>) -> Result<()> {
        self.store.set(PREFERENCES_KEY, &next)?;
        self.items = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = Preferences::load(LocalStore::new(dir.path())).unwrap();
        assert!(prefs.items().is_empty());

        assert!(prefs.add("I only take work calls between 6am - 4pm").unwrap());
        assert!(!prefs.add("   ").unwrap());
        assert!(prefs.add("Wednesdays are blocked").unwrap());

        let reloaded = Preferences::load(LocalStore::new(dir.path())).unwrap();
        assert_eq!(reloaded.items(), prefs.items());

        assert_eq!(prefs.remove(0).unwrap(), "I only take work calls between 6am - 4pm");
        assert!(matches!(prefs.remove(5), Err(ChronosError::InvalidInput(_))));
        let reloaded = Preferences::load(LocalStore::new(dir.path())).unwrap();
        assert_eq!(reloaded.items(), &["Wednesdays are blocked".to_string()]);
    }

    #[test]
    fn failed_write_leaves_items_untouched() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        // The store directory is a regular file, so every write fails.
        let store = LocalStore::new(blocker.path());

        let mut prefs = Preferences::load(store.clone()).unwrap();
        assert!(prefs.add("No meetings on Fridays").is_err());
        assert!(prefs.items().is_empty());

        let mut prefs = Preferences {
            store,
            items: vec!["Lunch at noon".to_string()],
        };
        assert!(matches!(prefs.remove(0), Err(ChronosError::Storage(_))));
        assert_eq!(prefs.items(), &["Lunch at noon".to_string()]);
    }
}
