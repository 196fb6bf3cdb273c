use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

/// Middleware for caller identity. Token verification happens at the API
/// gateway, which forwards the authenticated identity in `x-user-id` /
/// `x-user-role` headers; this middleware only materializes it for handlers.
pub async fn identity_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = request
        .headers()
        .get("x-user-id")
        .ok_or_else(|| AppError::Auth("Missing x-user-id header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid x-user-id header".to_string()))?;

    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| AppError::Auth("x-user-id is not a valid UUID".to_string()))?;

    let role = request
        .headers()
        .get("x-user-role")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let email = request
        .headers()
        .get("x-user-email")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let user = User {
        id: user_id,
        email,
        role,
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
