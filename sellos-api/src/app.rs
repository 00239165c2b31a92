/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use sellos_api::{app::{build_router, AppState}, config::Config};
/// use sellos_shared::{db::pg_store::PgStore, mail::LogMailer};
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), Arc::new(LogMailer), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sellos_shared::{
    auth::{
        authorization::Guard,
        middleware::{authenticate, AuthContext},
    },
    mail::Mailer,
    store::Store,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is an `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Persistence (Postgres in production, in-memory in tests)
    pub store: Arc<dyn Store>,

    /// Outbound mail
    pub mailer: Arc<dyn Mailer>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            store,
            mailer,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Storefront base URL for email links
    pub fn frontend_url(&self) -> &str {
        &self.config.mail.frontend_url
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /api
/// ├── GET    /health
/// ├── /auth
/// │   ├── POST  /login
/// │   ├── POST  /verify-email
/// │   ├── POST  /request-reset
/// │   ├── POST  /reset/:token
/// │   └── PATCH /password                  (authenticated)
/// ├── /customers
/// │   ├── POST   /register
/// │   └── GET / PUT /:id / DELETE /:id     (admin)
/// ├── /employees                            (admin)
/// ├── /products
/// │   ├── GET /, /:id, /search/:term
/// │   └── POST / PUT /:id / DELETE /:id    (staff)
/// ├── /orders
/// │   ├── POST / GET / PUT /:id / DELETE /:id (admin)
/// │   ├── GET /assigned, PATCH /:id/status (staff)
/// │   ├── GET /mine                         (customer)
/// │   └── GET /:id                          (authenticated, ownership checked)
/// └── /notifications                        (admin)
/// ```
///
/// # Middleware Stack
///
/// Per route group, the session gate runs first and resolves the bearer
/// token into an [`AuthContext`]; the role guard runs next. Globally:
/// body size limit, tracing, CORS and security headers.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/verify-email", post(routes::auth::verify_email))
        .route("/request-reset", post(routes::auth::request_reset))
        .route("/reset/:token", post(routes::auth::reset_password))
        .merge(protect(
            Router::new().route("/password", patch(routes::auth::change_password)),
            &state,
            None,
        ));

    let customer_routes = Router::new()
        .route("/register", post(routes::customers::register))
        .merge(protect(
            Router::new()
                .route("/", get(routes::customers::list_customers))
                .route(
                    "/:id",
                    put(routes::customers::update_customer).delete(routes::customers::delete_customer),
                ),
            &state,
            Some(Guard::Admin),
        ));

    let employee_routes = protect(
        Router::new()
            .route(
                "/",
                post(routes::employees::create_employee).get(routes::employees::list_employees),
            )
            .route(
                "/:id",
                put(routes::employees::update_employee).delete(routes::employees::delete_employee),
            ),
        &state,
        Some(Guard::Admin),
    );

    let product_routes = Router::new()
        .route("/", get(routes::products::list_products))
        .route("/:id", get(routes::products::get_product))
        .route("/search/:term", get(routes::products::search_products))
        .merge(protect(
            Router::new()
                .route("/", post(routes::products::create_product))
                .route(
                    "/:id",
                    put(routes::products::update_product).delete(routes::products::delete_product),
                ),
            &state,
            Some(Guard::Staff),
        ));

    let order_routes = Router::new()
        .merge(protect(
            Router::new()
                .route(
                    "/",
                    post(routes::orders::create_order).get(routes::orders::list_orders),
                )
                .route(
                    "/:id",
                    put(routes::orders::update_order).delete(routes::orders::delete_order),
                ),
            &state,
            Some(Guard::Admin),
        ))
        .merge(protect(
            Router::new()
                .route("/assigned", get(routes::orders::list_assigned_orders))
                .route("/:id/status", patch(routes::orders::update_order_status)),
            &state,
            Some(Guard::Staff),
        ))
        .merge(protect(
            Router::new().route("/mine", get(routes::orders::list_my_orders)),
            &state,
            Some(Guard::Customer),
        ))
        .merge(protect(
            Router::new().route("/:id", get(routes::orders::get_order)),
            &state,
            None,
        ));

    let notification_routes = protect(
        Router::new()
            .route("/", get(routes::notifications::list_notifications))
            .route("/unread", get(routes::notifications::list_unread_notifications))
            .route("/read-all", patch(routes::notifications::mark_all_read))
            .route("/:id/read", patch(routes::notifications::mark_read))
            .route("/:id", delete(routes::notifications::delete_notification)),
        &state,
        Some(Guard::Admin),
    );

    let api_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/customers", customer_routes)
        .nest("/employees", employee_routes)
        .nest("/products", product_routes)
        .nest("/orders", order_routes)
        .nest("/notifications", notification_routes);

    let cors = cors_layer(&state.config);
    let production = state.config.api.production;

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Wraps a route group with the session gate and, optionally, a role guard
///
/// `route_layer` keeps unmatched paths as 404 instead of 401.
fn protect(router: Router<AppState>, state: &AppState, guard: Option<Guard>) -> Router<AppState> {
    let router = match guard {
        Some(guard) => router.route_layer(from_fn_with_state(guard, role_guard_layer)),
        None => router,
    };

    router.route_layer(from_fn_with_state(state.clone(), session_auth_layer))
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Session authentication middleware layer
///
/// Resolves the bearer token to a stored identity, then injects
/// [`AuthContext`] into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(&*state.store, state.jwt_secret(), req.headers()).await?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Role guard layer, evaluated after [`session_auth_layer`]
async fn role_guard_layer(
    State(guard): State<Guard>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::unauthorized("No token provided"))?;

    guard.check(auth)?;

    Ok(next.run(req).await)
}
