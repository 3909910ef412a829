/// JWT authentication layer
///
/// Validates the bearer token and inserts an [`AuthContext`] into request
/// extensions for handlers to extract with `Extension<AuthContext>`.
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use contacthub_api::{app::AppState, middleware::auth::jwt_auth_layer};
///
/// # fn example(state: AppState) {
/// let protected: Router<AppState> = Router::new()
///     .route("/me", get(|| async { "ok" }))
///     .layer(axum::middleware::from_fn_with_state(state, jwt_auth_layer));
/// # }
/// ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use contacthub_shared::auth::middleware::{authenticate, AuthContext};

use crate::{app::AppState, error::ApiError};

/// Rejects requests without a valid access token
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context: AuthContext = authenticate(req.headers(), state.jwt_secret())?;

    tracing::debug!(user_id = %auth_context.user_id, "Authenticated request");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
