use std::sync::Arc;

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::{bearer_token, TokenVerifier};
use crate::error::ApiError;

/// Verify the bearer token and make its claims available to handlers.
pub async fn require_auth(
    Extension(verifier): Extension<Arc<TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?.to_owned();
    let claims = verifier.verify(&token).await?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
