//! Parsing of the client include parameter.
//!
//! Raw syntax: comma-separated dotted relation paths, each optionally
//! followed by `:`-delimited parameter segments of the form
//! `name(value|value2)`, e.g. `comments.author:sort(created|desc):limit(5)`.
//! Paths deeper than the configured maximum are truncated, and intermediate
//! ancestors are filled in so `a.b` always implies `a`.

use std::collections::HashMap;

/// Parameters attached to one include, keyed by parameter name. Values are
/// split on `|`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamBag {
    params: HashMap<String, Vec<String>>,
}

impl ParamBag {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.params.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.params.insert(name.into(), values);
    }
}

/// The parsed set of requested includes, in request order.
#[derive(Debug, Clone, Default)]
pub struct IncludeSet {
    names: Vec<String>,
    params: HashMap<String, ParamBag>,
}

impl IncludeSet {
    /// Parse a raw include string, bounding nesting at `max_depth` segments.
    #[must_use]
    pub fn parse(raw: &str, max_depth: usize) -> Self {
        let mut set = Self::default();

        for spec in raw.split(',') {
            let spec = spec.trim();
            if spec.is_empty() {
                continue;
            }

            let mut segments = spec.split(':');
            let path = segments.next().unwrap_or_default();

            let trimmed: Vec<&str> = path
                .split('.')
                .filter(|s| !s.is_empty())
                .take(max_depth)
                .collect();
            if trimmed.is_empty() {
                continue;
            }

            // Fill in ancestors so nested loads always have their parent.
            for depth in 1..trimmed.len() {
                set.push(trimmed[..depth].join("."));
            }

            let full = trimmed.join(".");
            set.push(full.clone());

            let mut bag = ParamBag::default();
            for param in segments {
                if let Some((name, values)) = parse_param(param) {
                    bag.insert(name, values);
                }
            }
            if !bag.is_empty() {
                set.params.insert(full, bag);
            }
        }

        set
    }

    fn push(&mut self, name: String) {
        if !self.names.iter().any(|n| *n == name) {
            self.names.push(name);
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    #[must_use]
    pub fn params(&self, name: &str) -> Option<&ParamBag> {
        self.params.get(name)
    }

    /// Includes whose first path segment is not listed in `except`. Used to
    /// keep lazy includes away from the eager-load set.
    #[must_use]
    pub fn except(&self, except: &[&str]) -> Vec<&str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|name| {
                let head = name.split('.').next().unwrap_or(name);
                !except.contains(&head)
            })
            .collect()
    }

    /// First segments of all requested paths, deduplicated in order.
    #[must_use]
    pub fn top_level(&self) -> Vec<&str> {
        let mut heads: Vec<&str> = Vec::new();
        for name in &self.names {
            let head = name.split('.').next().unwrap_or(name);
            if !heads.contains(&head) {
                heads.push(head);
            }
        }
        heads
    }

    /// Re-scope the set one level below `name`, so the includes requested for
    /// a relation's own transformer keep their params.
    #[must_use]
    pub fn children_of(&self, name: &str) -> Self {
        let prefix = format!("{name}.");
        let mut child = Self::default();

        for full in &self.names {
            if let Some(rest) = full.strip_prefix(&prefix) {
                child.push(rest.to_string());
                if let Some(bag) = self.params.get(full) {
                    child.params.insert(rest.to_string(), bag.clone());
                }
            }
        }

        child
    }
}

fn parse_param(segment: &str) -> Option<(String, Vec<String>)> {
    let open = segment.find('(')?;
    let close = segment.rfind(')')?;
    if close <= open {
        return None;
    }

    let name = segment[..open].trim();
    if name.is_empty() {
        return None;
    }

    let values = segment[open + 1..close]
        .split('|')
        .map(str::to_string)
        .collect();

    Some((name.to_string(), values))
}
