//! Symbol table for cross-file call resolution

use dashmap::DashMap;

/// Maps a short call key (`name/arity`) to every function id carrying it.
/// Thread-safe for concurrent access.
pub struct SymbolTable {
    symbols: DashMap<String, Vec<String>>,
    /// For fast file lookup: file id -> function ids defined in that file
    file_symbols: DashMap<String, Vec<String>>,
}

/// Key used to match an unqualified call site against definitions.
pub fn call_key(name: &str, arity: usize) -> String {
    format!("{}/{}", name, arity)
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: DashMap::new(),
            file_symbols: DashMap::new(),
        }
    }

    /// Register a function definition.
    pub fn insert(&self, key: String, function_id: String, file_id: String) {
        {
            let mut ids = self.symbols.entry(key).or_default();
            if !ids.contains(&function_id) {
                ids.push(function_id.clone());
            }
        }
        let mut defined = self.file_symbols.entry(file_id).or_default();
        if !defined.contains(&function_id) {
            defined.push(function_id);
        }
    }

    /// All function ids registered under a call key, sorted.
    pub fn lookup(&self, key: &str) -> Vec<String> {
        let mut ids = self
            .symbols
            .get(key)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// The single function registered under a key, if exactly one exists.
    pub fn lookup_unique(&self, key: &str) -> Option<String> {
        let ids = self.symbols.get(key)?;
        match ids.value().as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        }
    }

    /// Get all function ids defined in a file.
    pub fn symbols_in_file(&self, file_id: &str) -> Vec<String> {
        self.file_symbols
            .get(file_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.symbols.iter().map(|r| r.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
