//! The transformer contract: per-model-type conversion into an output map.

use crate::config::ResourceConfig;
use crate::errors::ResourceError;
use crate::includes::ParamBag;
use crate::presenter::Presenter;
use crate::registry::TypeRegistry;
use crate::traits::{RelationValue, SortDirection, Transformable};
use serde_json::{Map, Value};

/// Output mapping for a single transformed model. Insertion order is the
/// serialization order.
pub type JsonMap = Map<String, Value>;

/// Sort columns available on every transformer, merged under any the
/// transformer declares itself.
pub const DEFAULT_ORDER_COLUMNS: &[(&str, &str)] = &[
    ("created", "created_at"),
    ("updated", "updated_at"),
    ("id", "id"),
];

/// Shared state handed to every transform call.
pub struct TransformContext<'a> {
    pub registry: &'a TypeRegistry,
    pub presenter: &'a Presenter,
    pub config: &'a ResourceConfig,
}

impl TransformContext<'_> {
    /// Resource type string for the model.
    #[must_use]
    pub fn resource_type(&self, model: &dyn Transformable) -> String {
        self.registry.type_from_path(model.model_path())
    }

    /// Merge the common wire fields around the caller-supplied ones: `id`
    /// first, then `fields`, then `created`/`updated` epoch timestamps and
    /// `resource_type`. Consumers rely on this ordering. A caller-supplied
    /// value under one of the trailing keys wins over the derived one.
    #[must_use]
    pub fn prep_model(&self, model: &dyn Transformable, fields: JsonMap) -> JsonMap {
        let mut out = JsonMap::new();
        out.insert("id".to_string(), self.presenter.present_id(model));

        for (key, value) in fields {
            // The id slot is already taken.
            if key != "id" {
                out.insert(key, value);
            }
        }

        if !out.contains_key("created") {
            out.insert(
                "created".to_string(),
                self.presenter
                    .date_timestamp(model, "created_at")
                    .map_or(Value::Null, Value::from),
            );
        }
        if !out.contains_key("updated") {
            out.insert(
                "updated".to_string(),
                self.presenter
                    .date_timestamp(model, "updated_at")
                    .map_or(Value::Null, Value::from),
            );
        }
        if !out.contains_key("resource_type") {
            out.insert(
                "resource_type".to_string(),
                Value::String(self.resource_type(model)),
            );
        }

        out
    }
}

/// Converts one model into an output mapping, optionally exposing relations
/// as includes. Implementations are stateless per model type; instances are
/// cached by the manager for its lifetime, so per-request state never lives
/// on a transformer.
pub trait Transformer: Send + Sync {
    /// Convert the model into its output mapping.
    ///
    /// # Errors
    ///
    /// Implementations may fail with any [`ResourceError`]; the default
    /// machinery itself raises none here.
    fn transform(
        &self,
        model: &dyn Transformable,
        ctx: &TransformContext<'_>,
    ) -> Result<JsonMap, ResourceError>;

    /// Sortable column aliases: API name -> storage column.
    fn order_columns(&self) -> &[(&'static str, &'static str)] {
        &[]
    }

    /// Includes this transformer can produce, declared statically.
    fn available_includes(&self) -> &[&'static str] {
        &[]
    }

    /// Declared includes that must not reach the data layer's eager-load set.
    fn lazy_includes(&self) -> &[&'static str] {
        &[]
    }

    /// Fetch the relation value backing an include.
    ///
    /// # Errors
    ///
    /// `BadInclude` for a name outside [`Transformer::available_includes`],
    /// `InvalidRelation` when the model has no such relation accessor.
    fn resolve_include(
        &self,
        model: &dyn Transformable,
        name: &str,
    ) -> Result<Option<RelationValue>, ResourceError> {
        if !self.available_includes().contains(&name) {
            return Err(ResourceError::bad_include(name));
        }

        if !model.has_relation(name) {
            return Err(ResourceError::invalid_relation(name, model.model_path()));
        }

        Ok(model.relation(name))
    }
}

/// Sort and limit parameters parsed from one include's param bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedParams {
    pub limit: Option<u64>,
    /// Storage column and direction, already validated.
    pub order: Option<(String, SortDirection)>,
}

/// The merged order-column table for a transformer: built-in defaults with
/// declared columns layered on top.
#[must_use]
pub fn resolved_order_columns(transformer: &dyn Transformer) -> Vec<(&'static str, &'static str)> {
    let mut columns = DEFAULT_ORDER_COLUMNS.to_vec();
    for &(name, column) in transformer.order_columns() {
        if let Some(entry) = columns.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = column;
        } else {
            columns.push((name, column));
        }
    }
    columns
}

/// Parse the limit and order parameters out of a param bag.
///
/// The limit is accepted only if numeric and positive, clamped to the
/// configured maximum. The order is accepted only as a two-element
/// `column|direction` pair whose column is in the merged order table and
/// whose direction is exactly `asc` or `desc`; anything else discards the
/// whole order clause.
#[must_use]
pub fn parse_params(
    transformer: &dyn Transformer,
    bag: Option<&ParamBag>,
    config: &ResourceConfig,
) -> ParsedParams {
    let mut result = ParsedParams::default();

    let Some(bag) = bag else {
        return result;
    };

    if let Some(values) = bag.get(&config.count_param) {
        if let Some(limit) = values.first().and_then(|v| v.parse::<u64>().ok()) {
            if limit > 0 {
                result.limit = Some(limit.min(config.count_max));
            }
        }
    }

    if let Some(values) = bag.get(&config.sort_param) {
        if let [column, direction] = values {
            let columns = resolved_order_columns(transformer);
            let storage = columns
                .iter()
                .find_map(|(name, col)| (name == column).then_some(*col));
            if let (Some(storage), Some(direction)) = (storage, SortDirection::parse(direction)) {
                result.order = Some((storage.to_string(), direction));
            }
        }
    }

    result
}

/// The fallback transformer synthesized when no concrete one is registered
/// for a model type. Emits the minimal `{id, type}` mapping.
pub struct DefaultTransformer {
    type_string: String,
}

impl DefaultTransformer {
    #[must_use]
    pub fn new(type_string: impl Into<String>) -> Self {
        Self {
            type_string: type_string.into(),
        }
    }
}

impl Transformer for DefaultTransformer {
    fn transform(
        &self,
        model: &dyn Transformable,
        ctx: &TransformContext<'_>,
    ) -> Result<JsonMap, ResourceError> {
        // Raw rows round-trip unchanged.
        if let Some(raw) = model.raw_fields() {
            return Ok(raw);
        }

        let mut out = JsonMap::new();
        out.insert("id".to_string(), ctx.presenter.present_id(model));
        out.insert(
            "type".to_string(),
            Value::String(self.type_string.clone()),
        );
        Ok(out)
    }
}

/// Wrap a plain closure as a [`Transformer`], for one-off callbacks.
pub fn from_fn<F>(f: F) -> FnTransformer<F>
where
    F: Fn(&dyn Transformable) -> JsonMap + Send + Sync,
{
    FnTransformer { f }
}

pub struct FnTransformer<F> {
    f: F,
}

impl<F> Transformer for FnTransformer<F>
where
    F: Fn(&dyn Transformable) -> JsonMap + Send + Sync,
{
    fn transform(
        &self,
        model: &dyn Transformable,
        _ctx: &TransformContext<'_>,
    ) -> Result<JsonMap, ResourceError> {
        Ok((self.f)(model))
    }
}
