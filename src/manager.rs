//! Orchestration: include parsing, eager-load construction, sort and
//! pagination parameter extraction, and envelope assembly.

use crate::config::ResourceConfig;
use crate::envelope::{Pagination, ResourceEnvelope};
use crate::errors::ResourceError;
use crate::includes::{IncludeSet, ParamBag};
use crate::models::ResourceRequest;
use crate::presenter::Presenter;
use crate::registry::TypeRegistry;
use crate::traits::{EagerLoad, QuerySource, RelationValue, Transformable};
use crate::transformer::{
    DefaultTransformer, JsonMap, TransformContext, Transformer, parse_params,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Input to a collection resolve: an unexecuted query, already-materialized
/// models, or raw pre-serialized rows.
pub enum CollectionInput {
    Query(Box<dyn QuerySource>),
    Models(Vec<Arc<dyn Transformable>>),
    /// Rows that bypass the model abstraction. These require an explicit
    /// transformer; there is no model to resolve one from.
    Raw(Vec<JsonMap>),
}

impl From<Vec<Arc<dyn Transformable>>> for CollectionInput {
    fn from(models: Vec<Arc<dyn Transformable>>) -> Self {
        Self::Models(models)
    }
}

/// Input to an item resolve.
pub enum ItemInput {
    Query(Box<dyn QuerySource>),
    Model(Arc<dyn Transformable>),
}

/// Maps models to resource representations.
///
/// Construct one per application and pass it by reference to whatever needs
/// it. The two internal caches are insert-only and grow for the lifetime of
/// the manager; per-request state lives on the stack of each resolve call, so
/// a shared manager is safe across concurrent requests.
pub struct ResourceManager {
    config: ResourceConfig,
    registry: TypeRegistry,
    presenter: Presenter,
    /// Explicitly registered transformers, keyed by model path.
    registered: RwLock<HashMap<String, Arc<dyn Transformer>>>,
    /// Resolved transformers, keyed by resource type string. Insert-only;
    /// racing resolutions of the same key are idempotent.
    transformers: RwLock<HashMap<String, Arc<dyn Transformer>>>,
}

impl ResourceManager {
    #[must_use]
    pub fn new(config: ResourceConfig) -> Self {
        let registry = TypeRegistry::new(config.model_root.clone());
        let presenter = Presenter::new(config.date_format.clone());
        Self {
            config,
            registry,
            presenter,
            registered: RwLock::new(HashMap::new()),
            transformers: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    #[must_use]
    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Register a model path with the type registry.
    pub fn register_model(&self, path: impl Into<String>) {
        self.registry.register(path);
    }

    /// Register a transformer for a model path. Also registers the model.
    pub fn register_transformer(
        &self,
        path: impl Into<String>,
        transformer: Arc<dyn Transformer>,
    ) {
        let path = path.into();
        self.registry.register(path.clone());
        self.registered.write().unwrap().insert(path, transformer);
    }

    /// Resource type string for a model path.
    #[must_use]
    pub fn resource_type(&self, path: &str) -> String {
        self.registry.type_from_path(path)
    }

    /// Model path for a resource type string.
    ///
    /// # Errors
    ///
    /// `InvalidResourceType` for unregistered type strings.
    pub fn model_path(&self, type_string: &str) -> Result<String, ResourceError> {
        self.registry.path_from_type(type_string)
    }

    /// Resolve the transformer for a model path: resolution cache first, then
    /// the registration table, then a synthesized fallback emitting
    /// `{id, type}`. Absence of a concrete transformer is not an error.
    #[must_use]
    pub fn transformer_for(&self, path: &str) -> Arc<dyn Transformer> {
        let type_string = self.registry.type_from_path(path);

        if let Some(cached) = self.transformers.read().unwrap().get(&type_string) {
            return Arc::clone(cached);
        }

        let resolved: Arc<dyn Transformer> =
            match self.registered.read().unwrap().get(path) {
                Some(registered) => Arc::clone(registered),
                None => Arc::new(DefaultTransformer::new(type_string.clone())),
            };

        // A concurrent resolve may have won the race; keep whichever landed.
        Arc::clone(
            self.transformers
                .write()
                .unwrap()
                .entry(type_string)
                .or_insert(resolved),
        )
    }

    /// Parse the requested includes out of the request.
    #[must_use]
    pub fn requested_includes(&self, request: &ResourceRequest) -> IncludeSet {
        match request.get(&self.config.includes_param) {
            Some(raw) => IncludeSet::parse(raw, self.config.includes_max_depth),
            None => IncludeSet::default(),
        }
    }

    /// Build the eager-load set for the requested includes, skipping the
    /// transformer's lazy includes. An include whose parameters carry a valid
    /// sort order is emitted with the ordering constraint attached.
    ///
    /// # Errors
    ///
    /// `InvalidRelation` when an include's first segment is not a relation
    /// accessor on the model.
    pub fn eager_loads(
        &self,
        transformer: &dyn Transformer,
        model: &dyn Transformable,
        includes: &IncludeSet,
    ) -> Result<Vec<EagerLoad>, ResourceError> {
        let mut eager = Vec::new();

        for include in includes.except(transformer.lazy_includes()) {
            let mut segments = include.split('.');
            let head = segments.next().unwrap_or(include);

            if !model.has_relation(head) {
                return Err(ResourceError::invalid_relation(include, model.model_path()));
            }

            // Only a requested sort justifies walking to the related
            // transformer; param bags without one load bare.
            let bag = includes
                .params(include)
                .filter(|bag| bag.get(&self.config.sort_param).is_some());
            let Some(bag) = bag else {
                eager.push(EagerLoad::Bare(include.to_string()));
                continue;
            };

            // Sort params are validated against the transformer of the
            // model the include finally lands on.
            let related = self.walk_relation(model, head, segments)?;
            let related_transformer = self.transformer_for(related.model_path());
            let params = parse_params(related_transformer.as_ref(), Some(bag), &self.config);

            match params.order {
                Some((column, direction)) => eager.push(EagerLoad::Ordered {
                    include: include.to_string(),
                    column,
                    direction,
                }),
                None => eager.push(EagerLoad::Bare(include.to_string())),
            }
        }

        Ok(eager)
    }

    fn walk_relation<'a>(
        &self,
        model: &dyn Transformable,
        head: &str,
        rest: impl Iterator<Item = &'a str>,
    ) -> Result<Arc<dyn Transformable>, ResourceError> {
        let mut current = model
            .related_prototype(head)
            .ok_or_else(|| ResourceError::invalid_relation(head, model.model_path()))?;

        for segment in rest {
            let next = current
                .related_prototype(segment)
                .ok_or_else(|| ResourceError::invalid_relation(segment, current.model_path()))?;
            current = next;
        }

        Ok(current)
    }

    /// Per-page count: the request value when positive-numeric (clamped to
    /// the configured maximum), otherwise the default. Clients cannot disable
    /// pagination; a resolved count of zero (a zero configured default) does.
    #[must_use]
    pub fn resource_count(&self, request: &ResourceRequest) -> u64 {
        request
            .get(&self.config.count_param)
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|count| *count > 0)
            .map_or(self.config.count_default, |count| {
                count.min(self.config.count_max)
            })
    }

    fn current_page(request: &ResourceRequest) -> u64 {
        request
            .get("page")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1)
    }

    /// Apply the request's top-level sort clause to the query. Column aliases
    /// resolve through the transformer's order-column table; a direction
    /// other than exactly `asc`/`desc`, or an unknown column, discards the
    /// whole clause and leaves the data source's natural order.
    fn apply_sort(
        &self,
        query: &mut Box<dyn QuerySource>,
        transformer: &dyn Transformer,
        request: &ResourceRequest,
    ) {
        let Some(raw) = request.get(&self.config.sort_param) else {
            return;
        };

        let mut bag = ParamBag::default();
        bag.insert(
            self.config.sort_param.clone(),
            raw.split('|').map(str::to_string).collect(),
        );

        if let Some((column, direction)) =
            parse_params(transformer, Some(&bag), &self.config).order
        {
            query.order_by(&column, direction);
        }
    }

    /// Resolve a collection input into a `{data, meta?, pagination?}`
    /// envelope.
    ///
    /// # Errors
    ///
    /// `MissingTransformer` for raw rows without an explicit transformer,
    /// `InvalidResource` when a mixed-type model list needs a transformer
    /// resolved for it, `InvalidRelation` from eager-load validation, and
    /// anything the query source raises while materializing.
    pub async fn collection(
        &self,
        input: CollectionInput,
        request: &ResourceRequest,
        meta: Map<String, Value>,
        transformer: Option<Arc<dyn Transformer>>,
    ) -> Result<ResourceEnvelope, ResourceError> {
        let includes = self.requested_includes(request);

        match input {
            CollectionInput::Raw(rows) => {
                let Some(transformer) = transformer else {
                    return Err(ResourceError::MissingTransformer);
                };
                let ctx = self.context();
                let mut data = Vec::with_capacity(rows.len());
                for row in rows {
                    data.push(Value::Object(transformer.transform(&RawRow(row), &ctx)?));
                }
                Ok(ResourceEnvelope::collection(data).with_meta(meta))
            }

            CollectionInput::Models(models) => {
                if models.is_empty() {
                    return Ok(ResourceEnvelope::empty_collection());
                }

                let transformer = match transformer {
                    Some(transformer) => transformer,
                    None => {
                        // The first model picks the transformer for all of
                        // them, so the collection must be homogeneous.
                        let path = models[0].model_path();
                        if models.iter().any(|model| model.model_path() != path) {
                            return Err(ResourceError::invalid_resource(
                                "Resources must be a homogeneous collection",
                            ));
                        }
                        self.transformer_for(path)
                    }
                };

                // Validates the requested includes even though materialized
                // models carry their relations pre-loaded.
                self.eager_loads(transformer.as_ref(), models[0].as_ref(), &includes)?;

                let data = self.transform_all(&models, transformer.as_ref(), &includes)?;
                Ok(ResourceEnvelope::collection(data).with_meta(meta))
            }

            CollectionInput::Query(mut query) => {
                let prototype = query.prototype();
                let transformer = transformer
                    .unwrap_or_else(|| self.transformer_for(prototype.model_path()));

                let eager =
                    self.eager_loads(transformer.as_ref(), prototype.as_ref(), &includes)?;
                if !eager.is_empty() {
                    query.eager_load(&eager);
                }

                self.apply_sort(&mut query, transformer.as_ref(), request);

                let count = self.resource_count(request);
                if count == 0 {
                    let models = query.fetch_all().await?;
                    let data = self.transform_all(&models, transformer.as_ref(), &includes)?;
                    return Ok(ResourceEnvelope::collection(data).with_meta(meta));
                }

                let page = query.paginate(count, Self::current_page(request)).await?;
                let pagination = Pagination::from_page(&page, request);
                let data = self.transform_all(&page.items, transformer.as_ref(), &includes)?;

                let mut envelope = ResourceEnvelope::collection(data).with_meta(meta);
                envelope.pagination = Some(pagination);
                Ok(envelope)
            }
        }
    }

    /// Resolve an item input into a `{data, meta?}` envelope.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` when a query input yields no row; a materialized
    /// model never fails that way.
    pub async fn item(
        &self,
        input: ItemInput,
        request: &ResourceRequest,
        meta: Map<String, Value>,
        transformer: Option<Arc<dyn Transformer>>,
    ) -> Result<ResourceEnvelope, ResourceError> {
        let includes = self.requested_includes(request);

        let (model, transformer) = match input {
            ItemInput::Model(model) => {
                let transformer =
                    transformer.unwrap_or_else(|| self.transformer_for(model.model_path()));
                self.eager_loads(transformer.as_ref(), model.as_ref(), &includes)?;
                (model, transformer)
            }
            ItemInput::Query(mut query) => {
                let prototype = query.prototype();
                let transformer = transformer
                    .unwrap_or_else(|| self.transformer_for(prototype.model_path()));

                let eager =
                    self.eager_loads(transformer.as_ref(), prototype.as_ref(), &includes)?;
                if !eager.is_empty() {
                    query.eager_load(&eager);
                }

                let model = query.first().await?.ok_or_else(|| {
                    ResourceError::entity_not_found(
                        self.registry.type_from_path(prototype.model_path()),
                    )
                })?;
                (model, transformer)
            }
        };

        let data = self.transform_model(model.as_ref(), transformer.as_ref(), &includes)?;
        Ok(ResourceEnvelope::item(data).with_meta(meta))
    }

    fn transform_all(
        &self,
        models: &[Arc<dyn Transformable>],
        transformer: &dyn Transformer,
        includes: &IncludeSet,
    ) -> Result<Vec<Value>, ResourceError> {
        models
            .iter()
            .map(|model| {
                self.transform_model(model.as_ref(), transformer, includes)
                    .map(Value::Object)
            })
            .collect()
    }

    /// Transform one model and embed its requested includes. Nested include
    /// scopes recurse through the related models' own transformers; recursion
    /// is bounded by the include parser's depth limit.
    fn transform_model(
        &self,
        model: &dyn Transformable,
        transformer: &dyn Transformer,
        scope: &IncludeSet,
    ) -> Result<JsonMap, ResourceError> {
        let ctx = self.context();
        let mut out = transformer.transform(model, &ctx)?;

        for name in scope.top_level() {
            if !transformer.available_includes().contains(&name) {
                continue;
            }

            let value = transformer.resolve_include(model, name)?;
            let Some(value) = value else {
                out.insert(name.to_string(), Value::Null);
                continue;
            };

            let params = parse_params(
                transformer,
                scope.params(name),
                &self.config,
            );
            let children = scope.children_of(name);

            let embedded = match value {
                RelationValue::One(related) => {
                    let related_transformer = self.transformer_for(related.model_path());
                    Value::Object(self.transform_model(
                        related.as_ref(),
                        related_transformer.as_ref(),
                        &children,
                    )?)
                }
                RelationValue::Many(related) => {
                    let limited = match params.limit {
                        Some(limit) => &related[..related.len().min(limit as usize)],
                        None => &related[..],
                    };
                    let mut items = Vec::with_capacity(limited.len());
                    for item in limited {
                        let related_transformer = self.transformer_for(item.model_path());
                        items.push(Value::Object(self.transform_model(
                            item.as_ref(),
                            related_transformer.as_ref(),
                            &children,
                        )?));
                    }
                    Value::Array(items)
                }
            };

            out.insert(name.to_string(), embedded);
        }

        Ok(out)
    }

    fn context(&self) -> TransformContext<'_> {
        TransformContext {
            registry: &self.registry,
            presenter: &self.presenter,
            config: &self.config,
        }
    }
}

/// Adapter letting raw rows flow through the `Transformer` interface.
struct RawRow(JsonMap);

impl Transformable for RawRow {
    fn model_path(&self) -> &'static str {
        "raw"
    }

    fn model_id(&self) -> crate::traits::ModelId {
        crate::traits::ModelId::Int(0)
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.0.get(name).cloned()
    }

    fn raw_fields(&self) -> Option<JsonMap> {
        Some(self.0.clone())
    }
}
