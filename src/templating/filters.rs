//! Configured template filters.
//!
//! A filter is a transform function registered once on the service builder.
//! Every compiled view receives all configured filters twice:
//!
//! - as a Tera filter: `<%= title | shout %>`
//! - as a Tera function taking the input as `value`: `<%= shout(value=title) %>`
//!
//! Filter names are reserved in the locals namespace. A caller option that
//! shares a filter's name is dropped when locals are assembled, so the filter
//! always wins.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tera::{Tera, Value};

/// Shared transform function backing a configured filter.
pub type FilterFn = Arc<dyn Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync>;

/// Named filters registered into every compiled template.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: BTreeMap<String, FilterFn>,
}

impl FilterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a filter
    pub fn insert(&mut self, name: impl Into<String>, filter: FilterFn) {
        self.filters.insert(name.into(), filter);
    }

    /// Whether a filter with this name is configured
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Names of all configured filters, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Register every filter on a Tera instance, as both filter and function.
    pub fn register(&self, tera: &mut Tera) {
        for (name, filter) in &self.filters {
            let as_filter = Arc::clone(filter);
            tera.register_filter(
                name,
                move |value: &Value, args: &HashMap<String, Value>| as_filter(value, args),
            );

            let as_function = Arc::clone(filter);
            tera.register_function(name, move |args: &HashMap<String, Value>| {
                let value = args.get("value").cloned().unwrap_or(Value::Null);
                as_function(&value, args)
            });
        }
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.filters.keys()).finish()
    }
}
