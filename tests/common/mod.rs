//! Shared fixtures: a small model graph and a scripted query source.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use resourceful::errors::ResourceError;
use resourceful::traits::{EagerLoad, Page};
use resourceful::transformer::JsonMap;
use resourceful::{
    ModelId, QuerySource, RelationValue, ResourceConfig, ResourceManager, SortDirection,
    TransformContext, Transformable, Transformer,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub struct TestModel {
    pub id: i64,
    pub name: String,
    pub created: Option<DateTime<Utc>>,
    pub nested: Option<Arc<NestedModel>>,
    pub nesteds: Vec<Arc<NestedModel>>,
}

impl TestModel {
    pub fn prototype() -> Arc<Self> {
        Arc::new(Self {
            id: 0,
            name: String::new(),
            created: None,
            nested: None,
            nesteds: Vec::new(),
        })
    }
}

impl Transformable for TestModel {
    fn model_path(&self) -> &'static str {
        "app::models::TestModel"
    }

    fn model_id(&self) -> ModelId {
        ModelId::Int(self.id)
    }

    fn field(&self, name: &str) -> Option<Value> {
        (name == "name").then(|| Value::String(self.name.clone()))
    }

    fn date_fields(&self) -> &[&'static str] {
        &["created_at"]
    }

    fn date_value(&self, name: &str) -> Option<DateTime<Utc>> {
        (name == "created_at").then_some(self.created).flatten()
    }

    fn has_relation(&self, name: &str) -> bool {
        matches!(name, "nestedModel" | "nestedModels")
    }

    fn relation(&self, name: &str) -> Option<RelationValue> {
        match name {
            "nestedModel" => self
                .nested
                .as_ref()
                .map(|n| RelationValue::One(n.clone() as Arc<dyn Transformable>)),
            "nestedModels" => {
                if self.nesteds.is_empty() {
                    None
                } else {
                    Some(RelationValue::Many(
                        self.nesteds
                            .iter()
                            .map(|n| n.clone() as Arc<dyn Transformable>)
                            .collect(),
                    ))
                }
            }
            _ => None,
        }
    }

    fn related_prototype(&self, name: &str) -> Option<Arc<dyn Transformable>> {
        matches!(name, "nestedModel" | "nestedModels")
            .then(|| NestedModel::prototype() as Arc<dyn Transformable>)
    }
}

pub struct NestedModel {
    pub id: i64,
    pub leaf: Option<Arc<LeafModel>>,
}

impl NestedModel {
    pub fn prototype() -> Arc<Self> {
        Arc::new(Self { id: 0, leaf: None })
    }
}

impl Transformable for NestedModel {
    fn model_path(&self) -> &'static str {
        "app::models::nested::NestedModel"
    }

    fn model_id(&self) -> ModelId {
        ModelId::Int(self.id)
    }

    fn field(&self, _: &str) -> Option<Value> {
        None
    }

    fn has_relation(&self, name: &str) -> bool {
        name == "leaf"
    }

    fn relation(&self, name: &str) -> Option<RelationValue> {
        (name == "leaf")
            .then(|| {
                self.leaf
                    .as_ref()
                    .map(|l| RelationValue::One(l.clone() as Arc<dyn Transformable>))
            })
            .flatten()
    }

    fn related_prototype(&self, name: &str) -> Option<Arc<dyn Transformable>> {
        (name == "leaf").then(|| Arc::new(LeafModel { id: 0 }) as Arc<dyn Transformable>)
    }
}

/// Has no registered transformer; exercises the fallback.
pub struct LeafModel {
    pub id: i64,
}

impl Transformable for LeafModel {
    fn model_path(&self) -> &'static str {
        "app::models::Leaf"
    }

    fn model_id(&self) -> ModelId {
        ModelId::Int(self.id)
    }

    fn field(&self, _: &str) -> Option<Value> {
        None
    }
}

pub struct TestModelTransformer;

impl Transformer for TestModelTransformer {
    fn transform(
        &self,
        _model: &dyn Transformable,
        _ctx: &TransformContext<'_>,
    ) -> Result<JsonMap, ResourceError> {
        let mut out = JsonMap::new();
        out.insert(
            "test".to_string(),
            Value::String("transformed".to_string()),
        );
        Ok(out)
    }

    fn order_columns(&self) -> &[(&'static str, &'static str)] {
        &[("name", "name")]
    }

    fn available_includes(&self) -> &[&'static str] {
        &["nestedModel", "nestedModels", "stats"]
    }

    fn lazy_includes(&self) -> &[&'static str] {
        &["stats"]
    }
}

pub struct NestedModelTransformer;

impl Transformer for NestedModelTransformer {
    fn transform(
        &self,
        _model: &dyn Transformable,
        _ctx: &TransformContext<'_>,
    ) -> Result<JsonMap, ResourceError> {
        let mut out = JsonMap::new();
        out.insert("label".to_string(), Value::String("nested".to_string()));
        Ok(out)
    }

    fn available_includes(&self) -> &[&'static str] {
        &["leaf"]
    }
}

pub fn manager() -> ResourceManager {
    manager_with(ResourceConfig::default())
}

pub fn manager_with(config: ResourceConfig) -> ResourceManager {
    let manager = ResourceManager::new(config);
    manager.register_transformer("app::models::TestModel", Arc::new(TestModelTransformer));
    manager.register_transformer(
        "app::models::nested::NestedModel",
        Arc::new(NestedModelTransformer),
    );
    manager.register_model("app::models::Leaf");
    manager
}

pub fn test_model() -> Arc<TestModel> {
    Arc::new(TestModel {
        id: 1,
        name: "first".to_string(),
        created: Some(Utc.with_ymd_and_hms(2017, 3, 14, 9, 26, 53).unwrap()),
        nested: Some(Arc::new(NestedModel {
            id: 2,
            leaf: Some(Arc::new(LeafModel { id: 5 })),
        })),
        nesteds: vec![
            Arc::new(NestedModel { id: 3, leaf: None }),
            Arc::new(NestedModel { id: 4, leaf: None }),
        ],
    })
}

/// What the manager asked of the query source, observable after the query
/// has been consumed.
#[derive(Default, Clone)]
pub struct QueryLog {
    inner: Arc<Mutex<QueryLogInner>>,
}

#[derive(Default)]
struct QueryLogInner {
    orders: Vec<(String, SortDirection)>,
    eager: Vec<EagerLoad>,
}

impl QueryLog {
    pub fn orders(&self) -> Vec<(String, SortDirection)> {
        self.inner.lock().unwrap().orders.clone()
    }

    pub fn eager(&self) -> Vec<EagerLoad> {
        self.inner.lock().unwrap().eager.clone()
    }
}

/// Scripted query source over pre-built rows.
pub struct StubQuery {
    rows: Vec<Arc<dyn Transformable>>,
    prototype: Arc<dyn Transformable>,
    log: QueryLog,
}

impl StubQuery {
    pub fn new(rows: Vec<Arc<dyn Transformable>>, prototype: Arc<dyn Transformable>) -> Self {
        Self {
            rows,
            prototype,
            log: QueryLog::default(),
        }
    }

    pub fn of_test_models(rows: Vec<Arc<TestModel>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|m| m as Arc<dyn Transformable>)
                .collect(),
            TestModel::prototype(),
        )
    }

    pub fn log(&self) -> QueryLog {
        self.log.clone()
    }
}

#[async_trait]
impl QuerySource for StubQuery {
    fn prototype(&self) -> Arc<dyn Transformable> {
        self.prototype.clone()
    }

    fn order_by(&mut self, column: &str, direction: SortDirection) {
        self.log
            .inner
            .lock()
            .unwrap()
            .orders
            .push((column.to_string(), direction));
    }

    fn eager_load(&mut self, loads: &[EagerLoad]) {
        self.log.inner.lock().unwrap().eager.extend_from_slice(loads);
    }

    async fn fetch_all(&mut self) -> Result<Vec<Arc<dyn Transformable>>, ResourceError> {
        Ok(self.rows.clone())
    }

    async fn paginate(&mut self, per_page: u64, page: u64) -> Result<Page, ResourceError> {
        let start = ((page - 1) * per_page) as usize;
        let end = (start + per_page as usize).min(self.rows.len());
        let items = if start < self.rows.len() {
            self.rows[start..end].to_vec()
        } else {
            Vec::new()
        };

        Ok(Page {
            items,
            total: self.rows.len() as u64,
            per_page,
            current_page: page,
        })
    }

    async fn first(&mut self) -> Result<Option<Arc<dyn Transformable>>, ResourceError> {
        Ok(self.rows.first().cloned())
    }
}
