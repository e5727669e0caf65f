// src/core/symbols.rs

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// A table of named string values used by the template engine.
///
/// Besides plain storage the table answers a small set of computed virtual
/// keys (`currentMilliseconds`, `currentSeconds`, `epocTime`, `symbolDump`)
/// when the key is not present. All access is serialized through a single
/// coarse lock, so the table can be shared freely.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Mutex<HashMap<String, String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under the given key, replacing any prior value.
    /// An empty key is ignored silently.
    pub fn put(&self, key: &str, value: &str) {
        if key.is_empty() {
            return;
        }
        let mut entries = self.entries.lock().expect("symbol table lock poisoned");
        entries.insert(key.to_string(), value.to_string());
    }

    /// Return the string value of the named symbol.
    ///
    /// Unknown keys that match one of the virtual keys produce a computed
    /// value; anything else yields the literal string `"null"`, which is the
    /// contract the template engine relies on.
    pub fn get(&self, key: &str) -> String {
        {
            let entries = self.entries.lock().expect("symbol table lock poisoned");
            if let Some(value) = entries.get(key) {
                return value.clone();
            }
        }

        match key {
            "currentMilliseconds" => millis_since_epoch().to_string(),
            "currentSeconds" | "epocTime" => (millis_since_epoch() / 1000).to_string(),
            "symbolDump" => self.dump(),
            _ => "null".to_string(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock().expect("symbol table lock poisoned");
        entries.contains_key(key)
    }

    /// Copy every entry from the other table into this one, overwriting on
    /// conflict.
    pub fn merge(&self, other: &Self) {
        let source = other.entries.lock().expect("symbol table lock poisoned");
        let mut entries = self.entries.lock().expect("symbol table lock poisoned");
        for (key, value) in source.iter() {
            entries.insert(key.clone(), value.clone());
        }
    }

    /// Import every process environment variable into the table.
    pub fn load_process_properties(&self) {
        let mut entries = self.entries.lock().expect("symbol table lock poisoned");
        for (key, value) in std::env::vars() {
            entries.insert(key, value);
        }
    }

    /// Remove every key currently present as a process environment variable.
    pub fn remove_process_properties(&self) {
        let mut entries = self.entries.lock().expect("symbol table lock poisoned");
        for (key, _) in std::env::vars() {
            entries.remove(&key);
        }
    }

    /// A human-readable listing of the table, one `'key' = 'value'` per line.
    /// Keys are sorted so the output is deterministic.
    pub fn dump(&self) -> String {
        let entries = self.entries.lock().expect("symbol table lock poisoned");
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();

        let mut retval = String::new();
        for key in keys {
            retval.push_str(&format!("'{}' = '{}'\r\n", key, entries[key]));
        }
        retval
    }
}

fn millis_since_epoch() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
