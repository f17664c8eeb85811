use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("table `{0}` is already being edited")]
    TableBusy(String),
    #[error("grid surface `{0}` already hosts an edit session")]
    SurfaceBusy(String),
}

struct Entry<S> {
    table: String,
    surface: String,
    session: S,
}

/// Open edit sessions, reachable by table name and by grid surface identity.
///
/// At most one session exists per table and per surface.
pub struct SessionRegistry<S> {
    next_id: u64,
    sessions: HashMap<u64, Entry<S>>,
    by_table: HashMap<String, u64>,
    by_surface: HashMap<String, u64>,
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        SessionRegistry {
            next_id: 0,
            sessions: HashMap::new(),
            by_table: HashMap::new(),
            by_surface: HashMap::new(),
        }
    }
}

impl<S> SessionRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, table: &str, surface: &str, session: S) -> Result<(), RegistryError> {
        if self.by_table.contains_key(table) {
            return Err(RegistryError::TableBusy(table.to_string()));
        }
        if self.by_surface.contains_key(surface) {
            return Err(RegistryError::SurfaceBusy(surface.to_string()));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.by_table.insert(table.to_string(), id);
        self.by_surface.insert(surface.to_string(), id);
        self.sessions.insert(
            id,
            Entry {
                table: table.to_string(),
                surface: surface.to_string(),
                session,
            },
        );
        Ok(())
    }

    pub fn by_table(&self, table: &str) -> Option<&S> {
        let id = self.by_table.get(table)?;
        self.sessions.get(id).map(|entry| &entry.session)
    }

    pub fn by_surface_mut(&mut self, surface: &str) -> Option<&mut S> {
        let id = self.by_surface.get(surface)?;
        self.sessions.get_mut(id).map(|entry| &mut entry.session)
    }

    /// Remove the session editing `table`, dropping both of its keys.
    pub fn close_table(&mut self, table: &str) -> Option<S> {
        let id = self.by_table.remove(table)?;
        let entry = self.sessions.remove(&id)?;
        self.by_surface.remove(&entry.surface);
        Some(entry.session)
    }

    /// Remove the session hosted on `surface`, dropping both of its keys.
    pub fn close_surface(&mut self, surface: &str) -> Option<S> {
        let id = self.by_surface.remove(surface)?;
        let entry = self.sessions.remove(&id)?;
        self.by_table.remove(&entry.table);
        Some(entry.session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_second_session_for_table_or_surface() {
        let mut registry = SessionRegistry::new();
        registry.open("people", "Sheet1", 1).expect("first session should open");

        assert_eq!(
            registry.open("people", "Sheet2", 2),
            Err(RegistryError::TableBusy("people".to_string()))
        );
        assert_eq!(
            registry.open("orders", "Sheet1", 3),
            Err(RegistryError::SurfaceBusy("Sheet1".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn closing_removes_both_keys() {
        let mut registry = SessionRegistry::new();
        registry.open("people", "Sheet1", "a").expect("should open");
        registry.open("orders", "Sheet2", "b").expect("should open");

        assert_eq!(registry.close_table("people"), Some("a"));
        assert!(registry.by_surface_mut("Sheet1").is_none());
        assert_eq!(registry.close_surface("Sheet2"), Some("b"));
        assert!(registry.by_table("orders").is_none());
        assert!(registry.is_empty());

        registry.open("people", "Sheet1", "c").expect("keys should be free again");
    }
}
