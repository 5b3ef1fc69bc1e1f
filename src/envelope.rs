//! The `{data, meta?, pagination?}` wire structure returned to the boundary.

use crate::models::ResourceRequest;
use crate::traits::Page;
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use url::form_urlencoded;
use utoipa::ToSchema;

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct ResourceEnvelope {
    /// A single mapping or a homogeneous sequence of mappings.
    #[schema(value_type = Object)]
    pub data: Value,
    #[schema(value_type = Option<Object>)]
    pub meta: Option<Map<String, Value>>,
    pub pagination: Option<Pagination>,
}

impl ResourceEnvelope {
    #[must_use]
    pub fn item(data: Map<String, Value>) -> Self {
        Self {
            data: Value::Object(data),
            meta: None,
            pagination: None,
        }
    }

    #[must_use]
    pub fn collection(data: Vec<Value>) -> Self {
        Self {
            data: Value::Array(data),
            meta: None,
            pagination: None,
        }
    }

    #[must_use]
    pub fn empty_collection() -> Self {
        Self::collection(Vec::new())
    }

    /// Attach caller-supplied meta key/value pairs. Empty meta is omitted
    /// from the wire entirely.
    #[must_use]
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        if !meta.is_empty() {
            self.meta = Some(meta);
        }
        self
    }
}

impl IntoResponse for ResourceEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub total: u64,
    /// Items on this page.
    pub count: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub links: PaginationLinks,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationLinks {
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl Pagination {
    /// Build pagination detail from a materialized page, deriving prev/next
    /// links that keep every current query parameter except the page cursor.
    #[must_use]
    pub fn from_page(page: &Page, request: &ResourceRequest) -> Self {
        let total_pages = page.total_pages();
        let current = page.current_page;

        let previous = (current > 1).then(|| page_url(request, current - 1));
        let next = (current < total_pages).then(|| page_url(request, current + 1));

        Self {
            total: page.total,
            count: page.items.len() as u64,
            per_page: page.per_page,
            current_page: current,
            total_pages,
            links: PaginationLinks { previous, next },
        }
    }
}

fn page_url(request: &ResourceRequest, page: u64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (name, value) in request.except(&["page"]) {
        query.append_pair(name, value);
    }
    query.append_pair("page", &page.to_string());

    format!("{}?{}", request.path(), query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn page(total: u64, per_page: u64, current: u64, count: usize) -> Page {
        struct Stub;
        impl crate::traits::Transformable for Stub {
            fn model_path(&self) -> &'static str {
                "app::models::Stub"
            }
            fn model_id(&self) -> crate::traits::ModelId {
                crate::traits::ModelId::Int(0)
            }
            fn field(&self, _: &str) -> Option<Value> {
                None
            }
        }

        Page {
            items: (0..count)
                .map(|_| Arc::new(Stub) as Arc<dyn crate::traits::Transformable>)
                .collect(),
            total,
            per_page,
            current_page: current,
        }
    }

    #[test]
    fn empty_collection_serializes_to_bare_data() {
        let json = serde_json::to_string(&ResourceEnvelope::empty_collection()).unwrap();
        assert_eq!(json, r#"{"data":[]}"#);
    }

    #[test]
    fn meta_is_omitted_when_empty() {
        let envelope = ResourceEnvelope::empty_collection().with_meta(Map::new());
        assert_eq!(serde_json::to_string(&envelope).unwrap(), r#"{"data":[]}"#);
    }

    #[test]
    fn meta_serializes_after_data() {
        let mut meta = Map::new();
        meta.insert("key".to_string(), Value::String("value".to_string()));
        let envelope = ResourceEnvelope::empty_collection().with_meta(meta);
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"data":[],"meta":{"key":"value"}}"#
        );
    }

    #[test]
    fn links_preserve_query_params_except_page() {
        let request = ResourceRequest::new("/posts")
            .with("page", "2")
            .with("limit", "10")
            .with("with", "comments");
        let pagination = Pagination::from_page(&page(50, 10, 2, 10), &request);

        assert_eq!(
            pagination.links.previous.as_deref(),
            Some("/posts?limit=10&with=comments&page=1")
        );
        assert_eq!(
            pagination.links.next.as_deref(),
            Some("/posts?limit=10&with=comments&page=3")
        );
    }

    #[test]
    fn boundary_pages_drop_dangling_links() {
        let request = ResourceRequest::new("/posts");
        let first = Pagination::from_page(&page(30, 10, 1, 10), &request);
        assert!(first.links.previous.is_none());
        assert!(first.links.next.is_some());

        let last = Pagination::from_page(&page(30, 10, 3, 10), &request);
        assert!(last.links.previous.is_some());
        assert!(last.links.next.is_none());
    }

    #[test]
    fn pagination_reports_counts() {
        let request = ResourceRequest::new("/posts");
        let pagination = Pagination::from_page(&page(101, 25, 1, 25), &request);
        assert_eq!(pagination.total, 101);
        assert_eq!(pagination.count, 25);
        assert_eq!(pagination.total_pages, 5);
    }
}
