//! Error taxonomy for resource resolution.
//!
//! Every failure here is scoped to the resolve call that raised it and maps
//! to a stable application error code plus an HTTP status. Internal detail is
//! logged with `tracing` and never sent to clients; responses carry only the
//! error code and a user-safe message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Errors raised while resolving a model into a resource representation.
#[derive(Debug)]
pub enum ResourceError {
    /// A resource type string does not map to any registered model.
    InvalidResourceType {
        /// The offending type string.
        type_string: String,
    },

    /// A requested include is not a real relation on the model, or the
    /// related value cannot be transformed.
    InvalidRelation {
        /// The relation/include name as requested.
        relation: String,
        /// Model path the relation was requested on.
        model: String,
    },

    /// No transformer could be resolved and none was supplied.
    MissingTransformer,

    /// A single-item fetch against an unexecuted query yielded no row.
    EntityNotFound {
        /// Resource type string of the missing entity.
        resource: String,
    },

    /// An include accessor was invoked for a name the transformer does not
    /// declare.
    BadInclude {
        /// The undeclared include name.
        include: String,
    },

    /// The input to a resolve call was not a recognizable resource.
    InvalidResource {
        /// User-facing description of what was rejected.
        message: String,
    },
}

impl ResourceError {
    pub fn invalid_resource_type(type_string: impl Into<String>) -> Self {
        Self::InvalidResourceType {
            type_string: type_string.into(),
        }
    }

    pub fn invalid_relation(relation: impl Into<String>, model: impl Into<String>) -> Self {
        Self::InvalidRelation {
            relation: relation.into(),
            model: model.into(),
        }
    }

    pub fn entity_not_found(resource: impl Into<String>) -> Self {
        Self::EntityNotFound {
            resource: resource.into(),
        }
    }

    pub fn bad_include(include: impl Into<String>) -> Self {
        Self::BadInclude {
            include: include.into(),
        }
    }

    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    /// Stable application error code, independent of HTTP status. Codes
    /// 201-205 are reserved for entity errors; 203 (duplicate entity) has no
    /// counterpart here and stays unassigned.
    #[must_use]
    pub fn error_code(&self) -> u16 {
        match self {
            Self::InvalidResource { .. } => 201,
            Self::EntityNotFound { .. } => 202,
            Self::InvalidRelation { .. } | Self::BadInclude { .. } => 204,
            Self::InvalidResourceType { .. } => 205,
            Self::MissingTransformer => 206,
        }
    }

    /// HTTP status this error maps to at the boundary.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EntityNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidResourceType { .. }
            | Self::InvalidRelation { .. }
            | Self::BadInclude { .. } => StatusCode::BAD_REQUEST,
            Self::MissingTransformer | Self::InvalidResource { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing message, safe to return to clients.
    fn user_message(&self) -> String {
        match self {
            Self::InvalidResourceType { type_string } => {
                format!("Invalid model type: {type_string}")
            }
            Self::InvalidRelation { relation, .. } => {
                format!("'{relation}' is not a valid relation")
            }
            Self::MissingTransformer => "Resource callback not provided".to_string(),
            Self::EntityNotFound { resource } => format!("No {resource} found"),
            Self::BadInclude { include } => {
                format!("Invalid include '{include}' requested on transformer")
            }
            Self::InvalidResource { message } => message.clone(),
        }
    }

    /// Log internal detail. Only the sanitized message leaves the process.
    fn log_internal(&self) {
        match self {
            Self::InvalidRelation { relation, model } => {
                tracing::error!(
                    relation = %relation,
                    model = %model,
                    "invalid relation requested"
                );
            }
            Self::MissingTransformer | Self::InvalidResource { .. } => {
                tracing::error!(error = %self.user_message(), "resource resolution failed");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    code = self.error_code(),
                    "resource error"
                );
            }
        }
    }
}

/// Error body sent to clients.
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ResourceError {}
