//! Actor identity middleware
//!
//! Authentication is owned by the platform gateway; by the time a request
//! reaches this subsystem the gateway has already verified the caller and
//! stamped an opaque actor id into the `x-actor-id` header. This middleware
//! extracts that id so ledger entries, receipts and alert resolutions can
//! record who acted. It does not authenticate anything itself.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorResponse;

/// Header carrying the gateway-verified actor id
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Opaque identity of the caller, as supplied by the gateway
#[derive(Clone, Debug)]
pub struct Actor {
    pub id: String,
}

/// Middleware that requires an actor id on every stock/alert route
pub async fn actor_middleware(mut request: Request, next: Next) -> Response {
    let actor_id = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let actor_id = match actor_id {
        Some(id) => id.to_string(),
        None => {
            return unauthorized_response("Missing x-actor-id header");
        }
    };

    request.extensions_mut().insert(Actor { id: actor_id });

    next.run(request).await
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: crate::error::ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for the current actor
/// Use this in handlers to get the acting identity
#[derive(Clone, Debug)]
pub struct CurrentActor(pub Actor);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(CurrentActor)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: crate::error::ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Actor identity required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
