use serde::Deserialize;

/// Resolved configuration for a [`ResourceManager`](crate::manager::ResourceManager).
///
/// Hosts deserialize this from their own configuration source and pass it in
/// at construction time; nothing in this crate reads ambient configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Path prefix stripped from model paths when deriving resource type
    /// strings, e.g. `app::models`.
    pub model_root: String,
    /// Query/include parameter carrying the sort clause.
    pub sort_param: String,
    /// Query/include parameter carrying the per-page or per-include count.
    pub count_param: String,
    /// Page size used when the request does not provide one.
    pub count_default: u64,
    /// Upper bound applied to any client-provided count.
    pub count_max: u64,
    /// Query parameter carrying the include list.
    pub includes_param: String,
    /// Maximum depth of nested includes; deeper paths are truncated.
    pub includes_max_depth: usize,
    /// strftime-style format used when presenting date fields.
    pub date_format: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            model_root: "app::models".to_string(),
            sort_param: "sort".to_string(),
            count_param: "limit".to_string(),
            count_default: 25,
            count_max: 1000,
            includes_param: "with".to_string(),
            includes_max_depth: 10,
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}
