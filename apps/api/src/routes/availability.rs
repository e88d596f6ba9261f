use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::state::AppState;

/// Operator kill switch (`DISABLE_API=true`): every route answers 503.
pub async fn reject_when_disabled(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if state.api_disabled {
        return AppError::Unavailable.into_response();
    }
    next.run(req).await
}
