use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, patch, post, put},
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin};
use crate::state::AppState;

/// Full application router over the given state.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security.cors_origins);

    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors);

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/login", post(public::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{officials, pages, reports, session, tasks, todos};

    Router::new()
        .route("/me", get(session::me))
        .route("/logout", post(session::logout))
        // Pages
        .route("/page", get(pages::list))
        .route("/page/my/assigned", get(pages::my_assigned))
        .route("/page/:id", get(pages::get))
        // Tasks
        .route("/task", get(tasks::list))
        .route("/task/my/assigned", get(tasks::my_assigned))
        .route("/task/:id", get(tasks::get))
        // Official documents
        .route("/officials", get(officials::list))
        .route("/officials/my/assigned", get(officials::my_assigned))
        .route("/officials/:id", get(officials::get))
        // Reports
        .route("/report", post(reports::create))
        .route("/report/rapport", get(reports::list))
        .route(
            "/report/:id",
            get(reports::get).put(reports::update).delete(reports::delete),
        )
        // To-dos
        .route("/ToDo/my-toDo", get(todos::mine))
        .route("/ToDo/:id/validate", patch(todos::validate))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use elevated::{accounts, officials, pages, reports, tasks, todos};

    Router::new()
        // Accounts
        .route("/admin/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/admin/accounts/:id",
            get(accounts::get).put(accounts::update).delete(accounts::delete),
        )
        .route("/admin/accounts/:id/reset-password", post(accounts::reset_password))
        // Pages
        .route("/admin/page", post(pages::create))
        .route("/admin/page/:id", put(pages::update).delete(pages::delete))
        // Tasks
        .route("/admin/task", post(tasks::create))
        .route("/admin/task/:id", put(tasks::update).delete(tasks::delete))
        .route("/admin/task/:id/progression", put(tasks::progression))
        // Official documents
        .route("/admin/officials", get(officials::list).post(officials::create))
        .route(
            "/admin/officials/:id",
            put(officials::update).delete(officials::delete),
        )
        // Reports
        .route("/admin/rapport", get(reports::list))
        // To-dos
        .route("/admin/ToDo", get(todos::list).post(todos::create))
        .route("/admin/ToDo/:id", put(todos::update).delete(todos::delete))
        // Layers run bottom-up: the token is checked before the role
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    base.allow_origin(allowed)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Page not found" })))
}
