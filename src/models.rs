use serde::Deserialize;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

/// Query parameters understood by the resource manager.
///
/// # Includes
/// The `with` parameter is a comma-separated list of dot-nested relation
/// names, each optionally parameterized: `comments.author:sort(created|desc):limit(5)`.
///
/// # Sorting
/// The `sort` parameter is `column|direction`, e.g. `created|desc`. Only the
/// exact directions `asc` and `desc` are accepted.
///
/// # Pagination
/// `limit` is the page size (non-positive or non-numeric values fall back to
/// the configured default), `page` the 1-based page number.
#[derive(Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct ResourceParams {
    /// Comma-separated relation includes with optional `:name(value)` params.
    #[param(example = "comments.author:sort(created|desc)")]
    pub with: Option<String>,
    /// Sort specifier in the form `column|direction`.
    #[param(example = "created|desc")]
    pub sort: Option<String>,
    /// Items per page; invalid values fall back to the configured default.
    #[param(example = "25")]
    pub limit: Option<String>,
    /// 1-based page number.
    #[param(example = "1")]
    pub page: Option<String>,
}

impl ResourceParams {
    /// Lower into the untyped request view the manager consumes.
    #[must_use]
    pub fn into_request(self, path: impl Into<String>) -> ResourceRequest {
        let mut request = ResourceRequest::new(path);
        if let Some(with) = self.with {
            request.set("with", with);
        }
        if let Some(sort) = self.sort {
            request.set("sort", sort);
        }
        if let Some(limit) = self.limit {
            request.set("limit", limit);
        }
        if let Some(page) = self.page {
            request.set("page", page);
        }
        request
    }
}

/// Read-only view of the inbound request: its path and query parameters.
///
/// Parameter names are free-form so hosts can rename them through
/// [`ResourceConfig`](crate::config::ResourceConfig). Ordered map so
/// generated pagination links are stable.
#[derive(Debug, Clone, Default)]
pub struct ResourceRequest {
    path: String,
    params: BTreeMap<String, String>,
}

impl ResourceRequest {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All parameters except the named ones, for rebuilding query strings.
    #[must_use]
    pub fn except(&self, names: &[&str]) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .filter(|(name, _)| !names.contains(&name.as_str()))
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect()
    }
}
