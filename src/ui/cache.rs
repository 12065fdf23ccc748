use std::collections::HashMap;

/// Rendered view data keyed by view path plus its parameters.
///
/// Invalidating a path drops every entry rendered for it, whatever the
/// parameters were.
#[derive(Debug)]
pub struct ViewCache<T> {
    entries: HashMap<String, T>,
}

impl<T> Default for ViewCache<T> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

fn key(path: &str, params: &str) -> String {
    format!("{path}?{params}")
}

impl<T> ViewCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str, params: &str) -> Option<&T> {
        self.entries.get(&key(path, params))
    }

    pub fn insert(&mut self, path: &str, params: &str, value: T) {
        self.entries.insert(key(path, params), value);
    }

    /// Drop every entry under `path`. Returns how many were dropped.
    pub fn invalidate(&mut self, path: &str) -> usize {
        let prefix = format!("{path}?");
        let before = self.entries.len();
        self.entries.retain(|k, _| !k.starts_with(&prefix));
        before - self.entries.len()
    }

    /// Keep only the entries under `path` whose params satisfy `keep`.
    /// Entries under other paths are untouched.
    pub fn retain_params(&mut self, path: &str, keep: impl Fn(&str) -> bool) {
        let prefix = format!("{path}?");
        self.entries.retain(|k, _| match k.strip_prefix(&prefix) {
            Some(params) => keep(params),
            None => true,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
