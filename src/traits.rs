use crate::errors::ResourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier value carried by a model. Byte ids are hex-encoded for display
/// by the presenter; the other variants render directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelId {
    Uuid(Uuid),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

/// A loaded relation: either a single related model or a homogeneous
/// collection of them.
#[derive(Clone)]
pub enum RelationValue {
    One(Arc<dyn Transformable>),
    Many(Vec<Arc<dyn Transformable>>),
}

/// Sort direction. Parsing is strict: only the exact strings `asc` and
/// `desc` are accepted, and callers discard the whole sort clause on any
/// other value rather than defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One entry of the eager-load set handed to the data layer. An include with
/// a valid sort parameter carries the ordering constraint as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EagerLoad {
    Bare(String),
    Ordered {
        include: String,
        column: String,
        direction: SortDirection,
    },
}

impl EagerLoad {
    #[must_use]
    pub fn include(&self) -> &str {
        match self {
            Self::Bare(name) | Self::Ordered { include: name, .. } => name,
        }
    }
}

/// The model contract consumed by the transformation core.
///
/// A model exposes a stable identifier, raw attribute access, typed date
/// fields, and named relations. Relation values are whatever the host's data
/// layer has loaded; this crate never triggers a fetch through them.
pub trait Transformable: Send + Sync {
    /// Module-path-like identifier for the model type, e.g.
    /// `app::models::nested::NestedModel`. Must be stable for the life of the
    /// process; the type registry derives resource type strings from it.
    fn model_path(&self) -> &'static str;

    /// The model's identifier.
    fn model_id(&self) -> ModelId;

    /// Raw attribute access by name.
    fn field(&self, name: &str) -> Option<Value>;

    /// Names of attributes holding date values.
    fn date_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Typed access to a date attribute.
    fn date_value(&self, name: &str) -> Option<DateTime<Utc>> {
        let _ = name;
        None
    }

    /// Whether the model exposes a relation accessor with this name. Used to
    /// validate requested includes before they reach the data layer.
    fn has_relation(&self, name: &str) -> bool {
        let _ = name;
        false
    }

    /// The loaded value of a named relation, if any.
    fn relation(&self, name: &str) -> Option<RelationValue> {
        let _ = name;
        None
    }

    /// An unsaved instance of the related model type, used to walk nested
    /// includes and resolve related transformers without loading data.
    fn related_prototype(&self, name: &str) -> Option<Arc<dyn Transformable>> {
        let _ = name;
        None
    }

    /// For inputs that bypass the model abstraction entirely: the row as a
    /// plain mapping, round-tripped by the fallback transformer.
    fn raw_fields(&self) -> Option<serde_json::Map<String, Value>> {
        None
    }
}

/// One page of materialized results.
pub struct Page {
    pub items: Vec<Arc<dyn Transformable>>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
}

impl Page {
    /// Number of pages needed for `total` at this page size.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}

/// The unexecuted-query seam.
///
/// Implemented by the host's data layer over whatever query builder it uses.
/// The manager applies ordering and the eager-load set, then asks for rows;
/// query construction and execution stay outside this crate.
#[async_trait]
pub trait QuerySource: Send {
    /// Prototype of the model the query yields, for transformer resolution
    /// and relation validation.
    fn prototype(&self) -> Arc<dyn Transformable>;

    /// Apply a top-level ordering constraint. `column` is a storage column
    /// name already resolved through the transformer's order-column table.
    fn order_by(&mut self, column: &str, direction: SortDirection);

    /// Register relations to load alongside the primary rows.
    fn eager_load(&mut self, loads: &[EagerLoad]);

    /// Execute without pagination.
    async fn fetch_all(&mut self) -> Result<Vec<Arc<dyn Transformable>>, ResourceError>;

    /// Execute one page.
    async fn paginate(&mut self, per_page: u64, page: u64) -> Result<Page, ResourceError>;

    /// Execute and return the first row, if any.
    async fn first(&mut self) -> Result<Option<Arc<dyn Transformable>>, ResourceError>;
}
