//! Bidirectional mapping between resource type strings and model paths.
//!
//! A type string is the dash-joined, snake-cased tail of a model path below
//! the configured model root: `app::models::nested::NestedModel` maps to
//! `nested-nested_model`. The mapping is deterministic and reversible for
//! every registered model; unknown type strings are rejected.

use crate::errors::ResourceError;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

pub struct TypeRegistry {
    model_root: String,
    /// Registered model paths; membership stands in for "the class exists".
    catalog: RwLock<HashSet<String>>,
    /// Memoized path -> type string mappings. Insert-only.
    types: RwLock<HashMap<String, String>>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new(model_root: impl Into<String>) -> Self {
        Self {
            model_root: model_root.into(),
            catalog: RwLock::new(HashSet::new()),
            types: RwLock::new(HashMap::new()),
        }
    }

    /// Register a model path so `path_from_type` can resolve it.
    /// Registration is idempotent.
    pub fn register(&self, path: impl Into<String>) {
        self.catalog.write().unwrap().insert(path.into());
    }

    #[must_use]
    pub fn is_registered(&self, path: &str) -> bool {
        self.catalog.read().unwrap().contains(path)
    }

    /// Derive the resource type string for a model path. Memoized by path.
    #[must_use]
    pub fn type_from_path(&self, path: &str) -> String {
        if let Some(cached) = self.types.read().unwrap().get(path) {
            return cached.clone();
        }

        let tail = path
            .strip_prefix(&format!("{}::", self.model_root))
            .unwrap_or(path);

        let type_string = tail
            .split("::")
            .map(snake_case)
            .collect::<Vec<_>>()
            .join("-");

        self.types
            .write()
            .unwrap()
            .entry(path.to_string())
            .or_insert_with(|| type_string.clone());

        type_string
    }

    /// Reverse of `type_from_path`. Checks the memo first, then recomputes
    /// the candidate path and verifies it against the catalog.
    ///
    /// # Errors
    ///
    /// `InvalidResourceType` when the type string maps to no registered model.
    pub fn path_from_type(&self, type_string: &str) -> Result<String, ResourceError> {
        // Reverse lookup over the memo. The match is on presence, not on the
        // value itself: an empty-but-cached type string still counts as found.
        {
            let types = self.types.read().unwrap();
            let found = types
                .iter()
                .find_map(|(path, cached)| (cached == type_string).then(|| path.clone()));
            if let Some(path) = found {
                return Ok(path);
            }
        }

        // Last segment is a type name, the rest are module segments.
        let segments: Vec<&str> = type_string.split('-').collect();
        let mut path = self.model_root.clone();
        for (i, segment) in segments.iter().enumerate() {
            path.push_str("::");
            if i == segments.len() - 1 {
                path.push_str(&upper_camel(segment));
            } else {
                path.push_str(segment);
            }
        }

        if !self.is_registered(&path) {
            return Err(ResourceError::invalid_resource_type(type_string));
        }

        self.types
            .write()
            .unwrap()
            .entry(path.clone())
            .or_insert_with(|| type_string.to_string());

        Ok(path)
    }
}

/// `NestedModel` -> `nested_model`. Already-snake input passes through.
fn snake_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    for (i, ch) in segment.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `nested_model` -> `NestedModel`.
fn upper_camel(segment: &str) -> String {
    segment
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
