pub mod config;
pub mod envelope;
pub mod errors;
pub mod includes;
pub mod manager;
pub mod models;
pub mod presenter;
pub mod registry;
pub mod traits;
pub mod transformer;

pub use config::ResourceConfig;
pub use envelope::{Pagination, ResourceEnvelope};
pub use errors::ResourceError;
pub use manager::{CollectionInput, ItemInput, ResourceManager};
pub use models::{ResourceParams, ResourceRequest};
pub use traits::{ModelId, QuerySource, RelationValue, SortDirection, Transformable};
pub use transformer::{DefaultTransformer, TransformContext, Transformer};
