//! Per-collection cache of lazily loaded fields

use crate::types::ItemReference;
use std::collections::HashMap;

/// Fields (and the raw pages they are read from) a collection loads on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CacheKey {
    MainPage,
    ProfilePage,
    Name,
    Description,
    CollectionType,
    Parent,
    Intro,
    Rules,
    Maintainers,
    Subcollections,
    WorkCount,
    BookmarkCount,
    WorkList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CachedValue {
    Markup(String),
    Text(String),
    OptionalText(Option<String>),
    Count(usize),
    Names(Vec<String>),
    Items(Vec<ItemReference>),
}

impl CachedValue {
    pub(crate) fn as_markup(&self) -> Option<&str> {
        match self {
            CachedValue::Markup(markup) => Some(markup),
            _ => None,
        }
    }

    pub(crate) fn as_text(&self) -> Option<&str> {
        match self {
            CachedValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn as_optional_text(&self) -> Option<Option<&str>> {
        match self {
            CachedValue::OptionalText(text) => Some(text.as_deref()),
            _ => None,
        }
    }

    pub(crate) fn as_count(&self) -> Option<usize> {
        match self {
            CachedValue::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub(crate) fn as_names(&self) -> Option<&[String]> {
        match self {
            CachedValue::Names(names) => Some(names),
            _ => None,
        }
    }

    pub(crate) fn as_items(&self) -> Option<&[ItemReference]> {
        match self {
            CachedValue::Items(items) => Some(items),
            _ => None,
        }
    }
}

/// Compute-once field storage; `clear` is the only way a value changes
#[derive(Debug, Default)]
pub(crate) struct FieldCache {
    values: HashMap<CacheKey, CachedValue>,
}

impl FieldCache {
    pub(crate) fn get(&self, key: CacheKey) -> Option<&CachedValue> {
        self.values.get(&key)
    }

    pub(crate) fn contains(&self, key: CacheKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Stores `value` unless the field is already cached
    pub(crate) fn insert(&mut self, key: CacheKey, value: CachedValue) -> &CachedValue {
        self.values.entry(key).or_insert(value)
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}
