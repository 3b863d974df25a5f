//! Entity cache injected into the [`Engine`](crate::Engine).
//!
//! Entries are keyed by the entity's public identifier (the budget/project
//! token or the code token). The engine fills the cache on lookups by token
//! and **invalidates** the entry on every write it performs; it never writes
//! updated values through, so a reader either sees a fresh row from the
//! database or an entry that was current when it was cached.

use std::{
    collections::HashMap,
    fmt,
    sync::{PoisonError, RwLock},
};

use crate::{Budget, Code, Project};

/// Identifies one cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Budget(String),
    Project(String),
    Code(String),
}

pub trait EntityCache: Send + Sync + fmt::Debug {
    fn budget(&self, token: &str) -> Option<Budget>;
    fn put_budget(&self, budget: &Budget);
    fn project(&self, token: &str) -> Option<Project>;
    fn put_project(&self, project: &Project);
    fn code(&self, token: &str) -> Option<Code>;
    fn put_code(&self, code: &Code);
    fn invalidate(&self, key: &CacheKey);
}

/// Cache that never holds anything.
#[derive(Debug, Default)]
pub struct NoCache;

impl EntityCache for NoCache {
    fn budget(&self, _token: &str) -> Option<Budget> {
        None
    }

    fn put_budget(&self, _budget: &Budget) {}

    fn project(&self, _token: &str) -> Option<Project> {
        None
    }

    fn put_project(&self, _project: &Project) {}

    fn code(&self, _token: &str) -> Option<Code> {
        None
    }

    fn put_code(&self, _code: &Code) {}

    fn invalidate(&self, _key: &CacheKey) {}
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    budgets: RwLock<HashMap<String, Budget>>,
    projects: RwLock<HashMap<String, Project>>,
    codes: RwLock<HashMap<String, Code>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T: Clone>(map: &RwLock<HashMap<String, T>>, key: &str) -> Option<T> {
    map.read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
}

fn write<T>(map: &RwLock<HashMap<String, T>>, key: String, value: T) {
    map.write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, value);
}

fn remove<T>(map: &RwLock<HashMap<String, T>>, key: &str) {
    map.write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(key);
}

impl EntityCache for MemoryCache {
    fn budget(&self, token: &str) -> Option<Budget> {
        read(&self.budgets, token)
    }

    fn put_budget(&self, budget: &Budget) {
        write(&self.budgets, budget.token.clone(), budget.clone());
    }

    fn project(&self, token: &str) -> Option<Project> {
        read(&self.projects, token)
    }

    fn put_project(&self, project: &Project) {
        write(&self.projects, project.token.clone(), project.clone());
    }

    fn code(&self, token: &str) -> Option<Code> {
        read(&self.codes, token)
    }

    fn put_code(&self, code: &Code) {
        write(&self.codes, code.token.clone(), code.clone());
    }

    fn invalidate(&self, key: &CacheKey) {
        match key {
            CacheKey::Budget(token) => remove(&self.budgets, token),
            CacheKey::Project(token) => remove(&self.projects, token),
            CacheKey::Code(token) => remove(&self.codes, token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(token: &str) -> Budget {
        Budget {
            id: 1,
            token: token.to_string(),
            project_id: None,
            user_id: None,
            parent_id: None,
            name: "General".to_string(),
            description: None,
            private: false,
            private_balance: true,
        }
    }

    #[test]
    fn invalidate_drops_entry() {
        let cache = MemoryCache::new();
        cache.put_budget(&budget("abc"));
        assert!(cache.budget("abc").is_some());

        cache.invalidate(&CacheKey::Budget("abc".to_string()));
        assert!(cache.budget("abc").is_none());
    }

    #[test]
    fn keys_are_scoped_per_kind() {
        let cache = MemoryCache::new();
        cache.put_budget(&budget("abc"));
        cache.invalidate(&CacheKey::Project("abc".to_string()));
        assert!(cache.budget("abc").is_some());
    }

    #[test]
    fn no_cache_stays_empty() {
        let cache = NoCache;
        cache.put_budget(&budget("abc"));
        assert!(cache.budget("abc").is_none());
    }
}
