//! HTTP server for the ordering backend.
//!
//! Exposes the checkout, order-tracking, review, combo-deal, admin, and
//! payment-webhook endpoints over axum, with request metrics and graceful
//! shutdown. Authentication itself is an upstream concern: the handlers
//! trust the `x-user-id`/`x-user-role` headers established by the auth
//! proxy in front of this service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Bytes,
    extract::{Path as AxumPath, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use model::DateRange;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use serde::Deserialize;
use serde_json::json;
use service::{ComboService, OrderService, ReviewService, ServiceError};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// Server represents the HTTP boundary of the ordering core.
pub struct Server {
    service: Arc<dyn OrderService>,
    reviews: Arc<dyn ReviewService>,
    combos: Arc<dyn ComboService>,
    port: String,
    metrics: Arc<Metrics>,
    webhook: Arc<WebhookVerifier>,
    debug_errors: bool,
}

/// Metrics collects and exposes HTTP server metrics.
struct Metrics {
    registry: Registry,
    http_requests_total: CounterVec,
    http_request_duration_seconds: HistogramVec,
    errors_total: CounterVec,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "endpoint", "status"],
        )
        .expect("Failed to create http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "endpoint"],
        )
        .expect("Failed to create http_request_duration_seconds metric");

        let errors_total = CounterVec::new(
            Opts::new("errors_total", "Total number of errors"),
            &["source", "endpoint"],
        )
        .expect("Failed to create errors_total metric");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("Failed to register http_requests_total metric");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("Failed to register http_request_duration_seconds metric");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("Failed to register errors_total metric");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            errors_total,
        }
    }

    fn record_request(&self, method: &str, endpoint: &str, status: u16, duration: Duration) {
        self.http_requests_total
            .with_label_values(&[method, endpoint, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration.as_secs_f64());
    }

    fn record_error(&self, source: &str, endpoint: &str) {
        self.errors_total
            .with_label_values(&[source, endpoint])
            .inc();
    }
}

/// Checks the `x-payment-signature` header against the shared secret the
/// payment provider was configured with. The header carries the secret as a
/// bearer token; it does not sign the request body. A callback that fails
/// the check is untrusted and must not mutate anything.
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn verify(&self, signature: &str) -> bool {
        let a = signature.as_bytes();
        let b = self.secret.as_bytes();
        if a.len() != b.len() {
            return false;
        }
        // Compare every byte so the comparison time does not leak a prefix.
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

/// The caller identity established by the upstream auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Caller {
    user_id: i64,
    admin: bool,
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, Response> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok());
    match user_id {
        Some(user_id) => {
            let admin = headers
                .get("x-user-role")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|role| role == "admin");
            Ok(Caller { user_id, admin })
        }
        None => Err((
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({ "success": false, "error": "authentication required" })),
        )
            .into_response()),
    }
}

fn require_admin(caller: Caller) -> Result<Caller, Response> {
    if caller.admin {
        Ok(caller)
    } else {
        Err((
            StatusCode::FORBIDDEN,
            axum::Json(json!({ "success": false, "error": "admin access required" })),
        )
            .into_response())
    }
}

/// Maps a [`ServiceError`] to the structured JSON error body. Internal fault
/// detail is exposed only when `debug_errors` is set.
fn error_response(err: ServiceError, debug_errors: bool) -> Response {
    let (status, body) = match &err {
        ServiceError::Validation { fields } => (
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "error": "validation failed", "fields": fields }),
        ),
        ServiceError::UnknownStatus(value) => (
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "error": format!("unknown order status: {value}") }),
        ),
        ServiceError::NotFound => (
            StatusCode::NOT_FOUND,
            json!({ "success": false, "error": "not found" }),
        ),
        ServiceError::InvalidTransition { from, requested } => (
            StatusCode::CONFLICT,
            json!({
                "success": false,
                "error": format!("cannot move order from {from} to {requested}"),
                "from": from.as_str(),
                "requested": requested.as_str(),
            }),
        ),
        ServiceError::DuplicateReview => (
            StatusCode::CONFLICT,
            json!({ "success": false, "error": "order already reviewed" }),
        ),
        ServiceError::ReviewEditExpired => (
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "error": err.to_string() }),
        ),
        ServiceError::Storage(inner) => {
            error!(error = %inner, "storage fault");
            let message = if debug_errors {
                format!("storage error: {inner}")
            } else {
                "internal server error".to_string()
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "error": message }),
            )
        }
    };
    (status, axum::Json(body)).into_response()
}

/// Body of the admin status-update request.
#[derive(Debug, Deserialize)]
struct StatusUpdateRequest {
    status: String,
    #[serde(default)]
    payment_completed: bool,
}

/// Payment-provider callback payload.
#[derive(Debug, Deserialize)]
struct PaymentWebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    order_id: i64,
}

/// Body of the admin review-response request.
#[derive(Debug, Deserialize)]
struct ReviewResponseRequest {
    text: String,
}

/// Query string of the review moderation listing.
#[derive(Debug, Deserialize)]
struct ModerationQuery {
    rating: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// Query string of the admin dashboard.
#[derive(Debug, Deserialize)]
struct DashboardQuery {
    #[serde(rename = "dateRange")]
    date_range: Option<String>,
}

/// Application state shared between request handlers.
#[derive(Clone)]
struct AppState {
    service: Arc<dyn OrderService>,
    reviews: Arc<dyn ReviewService>,
    combos: Arc<dyn ComboService>,
    metrics: Arc<Metrics>,
    webhook: Arc<WebhookVerifier>,
    debug_errors: bool,
}

impl Server {
    /// Creates a new Server instance.
    ///
    /// # Arguments
    ///
    /// * `port` - The port on which the server will listen
    /// * `service` - The order service handling checkout and the lifecycle
    /// * `reviews` - The customer-review service
    /// * `combos` - The combo-deal service
    /// * `webhook_secret` - Shared secret for payment callback verification
    /// * `debug_errors` - Whether error bodies include internal detail
    pub fn new(
        port: String,
        service: Arc<dyn OrderService>,
        reviews: Arc<dyn ReviewService>,
        combos: Arc<dyn ComboService>,
        webhook_secret: String,
        debug_errors: bool,
    ) -> Self {
        info!("Initializing HTTP server on port {}", port);

        Self {
            service,
            reviews,
            combos,
            port,
            metrics: Arc::new(Metrics::new()),
            webhook: Arc::new(WebhookVerifier::new(webhook_secret)),
            debug_errors,
        }
    }

    /// Starts the server and blocks until it's shut down.
    pub async fn start(&self) -> Result<()> {
        let app = self.create_router();

        let listener = TcpListener::bind(format!("0.0.0.0:{}", self.port))
            .await
            .context("Failed to bind to port")?;

        info!("HTTP server listening on port {}", self.port);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("HTTP server shut down gracefully");
        Ok(())
    }

    fn create_router(&self) -> Router {
        let metrics = self.metrics.clone();

        Router::new()
            .route("/api/orders", post(Self::handle_create_order))
            .route("/api/orders/my", get(Self::handle_my_orders))
            .route("/api/orders/{id}", get(Self::handle_get_order))
            .route("/api/orders/{id}/status", put(Self::handle_update_status))
            .route(
                "/api/orders/{id}/reviews",
                get(Self::handle_order_reviews).post(Self::handle_submit_review),
            )
            .route("/api/orders/webhook", post(Self::handle_payment_webhook))
            .route("/api/reviews/{id}", patch(Self::handle_edit_review))
            .route("/api/admin/orders", get(Self::handle_all_orders))
            .route("/api/admin/dashboard", get(Self::handle_dashboard))
            .route("/api/admin/reviews", get(Self::handle_moderation_page))
            .route(
                "/api/admin/reviews/{id}",
                delete(Self::handle_delete_review),
            )
            .route(
                "/api/admin/reviews/{id}/respond",
                post(Self::handle_review_response),
            )
            .route(
                "/api/admin/combos",
                get(Self::handle_list_combos).post(Self::handle_create_combo),
            )
            .route(
                "/api/admin/combos/{id}",
                patch(Self::handle_update_combo).delete(Self::handle_delete_combo),
            )
            .route("/api/menu", get(Self::handle_menu))
            .route("/health", get(Self::handle_health))
            .route("/metrics", get(Self::handle_metrics))
            .layer(axum::middleware::from_fn_with_state(
                metrics.clone(),
                Self::metrics_middleware,
            ))
            .with_state(AppState {
                service: self.service.clone(),
                reviews: self.reviews.clone(),
                combos: self.combos.clone(),
                metrics,
                webhook: self.webhook.clone(),
                debug_errors: self.debug_errors,
            })
    }

    /// Middleware for collecting metrics on HTTP requests.
    async fn metrics_middleware(
        State(metrics): State<Arc<Metrics>>,
        req: axum::extract::Request,
        next: axum::middleware::Next,
    ) -> Response {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let start = std::time::Instant::now();

        let response = next.run(req).await;

        let status = response.status().as_u16();
        metrics.record_request(&method, &path, status, start.elapsed());
        if status >= 400 {
            metrics.record_error("http", &path);
        }

        response
    }

    async fn handle_create_order(
        State(state): State<AppState>,
        headers: HeaderMap,
        axum::Json(req): axum::Json<model::NewOrderRequest>,
    ) -> Response {
        let caller = match caller_from_headers(&headers) {
            Ok(caller) => caller,
            Err(resp) => return resp,
        };

        match state.service.place_order(caller.user_id, req).await {
            Ok(order) => (
                StatusCode::CREATED,
                axum::Json(json!({ "success": true, "order": order })),
            )
                .into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_my_orders(State(state): State<AppState>, headers: HeaderMap) -> Response {
        let caller = match caller_from_headers(&headers) {
            Ok(caller) => caller,
            Err(resp) => return resp,
        };

        match state.service.my_orders(caller.user_id).await {
            Ok(orders) => axum::Json(orders).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_get_order(
        State(state): State<AppState>,
        headers: HeaderMap,
        AxumPath(order_id): AxumPath<i64>,
    ) -> Response {
        let caller = match caller_from_headers(&headers) {
            Ok(caller) => caller,
            Err(resp) => return resp,
        };

        // Admins see any order; customers only their own.
        let owner = if caller.admin { None } else { Some(caller.user_id) };
        match state.service.get_order(order_id, owner).await {
            Ok(order) => axum::Json(order).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_update_status(
        State(state): State<AppState>,
        headers: HeaderMap,
        AxumPath(order_id): AxumPath<i64>,
        axum::Json(req): axum::Json<StatusUpdateRequest>,
    ) -> Response {
        let caller = match caller_from_headers(&headers).and_then(require_admin) {
            Ok(caller) => caller,
            Err(resp) => return resp,
        };

        match state
            .service
            .change_status(order_id, &req.status, req.payment_completed, Some(caller.user_id))
            .await
        {
            Ok(order) => axum::Json(json!({ "success": true, "order": order })).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_all_orders(State(state): State<AppState>, headers: HeaderMap) -> Response {
        if let Err(resp) = caller_from_headers(&headers).and_then(require_admin) {
            return resp;
        }

        match state.service.all_orders().await {
            Ok(orders) => axum::Json(orders).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    /// Payment-provider callback. The body is taken raw so the shared-secret
    /// check runs before any payload parsing.
    async fn handle_payment_webhook(
        State(state): State<AppState>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let signature = headers
            .get("x-payment-signature")
            .and_then(|v| v.to_str().ok());
        let verified = signature.is_some_and(|sig| state.webhook.verify(sig));
        if !verified {
            warn!("rejected payment webhook with missing or invalid signature");
            return (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({ "success": false, "error": "invalid webhook signature" })),
            )
                .into_response();
        }

        let event: PaymentWebhookEvent = match serde_json::from_slice(&body) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "malformed payment webhook payload");
                return (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({ "success": false, "error": "malformed webhook payload" })),
                )
                    .into_response();
            }
        };

        if event.event_type != "payment.succeeded" {
            // Acknowledge unhandled event types without acting on them.
            return axum::Json(json!({ "received": true })).into_response();
        }

        match state.service.complete_payment(event.order_id).await {
            Ok(_) => axum::Json(json!({ "received": true })).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_submit_review(
        State(state): State<AppState>,
        headers: HeaderMap,
        AxumPath(order_id): AxumPath<i64>,
        axum::Json(req): axum::Json<model::NewReviewRequest>,
    ) -> Response {
        let caller = match caller_from_headers(&headers) {
            Ok(caller) => caller,
            Err(resp) => return resp,
        };

        match state.reviews.submit_review(caller.user_id, order_id, req).await {
            Ok(review) => (StatusCode::CREATED, axum::Json(review)).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_order_reviews(
        State(state): State<AppState>,
        headers: HeaderMap,
        AxumPath(order_id): AxumPath<i64>,
    ) -> Response {
        if let Err(resp) = caller_from_headers(&headers) {
            return resp;
        }

        match state.reviews.order_reviews(order_id).await {
            Ok(reviews) => axum::Json(reviews).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_edit_review(
        State(state): State<AppState>,
        headers: HeaderMap,
        AxumPath(review_id): AxumPath<i64>,
        axum::Json(req): axum::Json<model::ReviewUpdateRequest>,
    ) -> Response {
        let caller = match caller_from_headers(&headers) {
            Ok(caller) => caller,
            Err(resp) => return resp,
        };

        match state.reviews.edit_review(caller.user_id, review_id, req).await {
            Ok(review) => axum::Json(review).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_moderation_page(
        State(state): State<AppState>,
        headers: HeaderMap,
        Query(query): Query<ModerationQuery>,
    ) -> Response {
        if let Err(resp) = caller_from_headers(&headers).and_then(require_admin) {
            return resp;
        }

        // "all" matches every star value, like leaving the filter out.
        let rating = match query.rating.as_deref() {
            None | Some("all") => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(rating) => Some(rating),
                Err(_) => {
                    return error_response(
                        ServiceError::Validation {
                            fields: vec!["rating".to_string()],
                        },
                        state.debug_errors,
                    );
                }
            },
        };

        match state
            .reviews
            .moderation_page(rating, query.page.unwrap_or(1), query.limit.unwrap_or(10))
            .await
        {
            Ok(page) => axum::Json(page).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_review_response(
        State(state): State<AppState>,
        headers: HeaderMap,
        AxumPath(review_id): AxumPath<i64>,
        axum::Json(req): axum::Json<ReviewResponseRequest>,
    ) -> Response {
        let caller = match caller_from_headers(&headers).and_then(require_admin) {
            Ok(caller) => caller,
            Err(resp) => return resp,
        };

        match state.reviews.respond(review_id, caller.user_id, &req.text).await {
            Ok(review) => axum::Json(review).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_delete_review(
        State(state): State<AppState>,
        headers: HeaderMap,
        AxumPath(review_id): AxumPath<i64>,
    ) -> Response {
        if let Err(resp) = caller_from_headers(&headers).and_then(require_admin) {
            return resp;
        }

        match state.reviews.delete_review(review_id).await {
            Ok(()) => axum::Json(json!({ "success": true })).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_list_combos(State(state): State<AppState>, headers: HeaderMap) -> Response {
        if let Err(resp) = caller_from_headers(&headers).and_then(require_admin) {
            return resp;
        }

        match state.combos.list_combos().await {
            Ok(combos) => axum::Json(json!({ "combos": combos })).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_create_combo(
        State(state): State<AppState>,
        headers: HeaderMap,
        axum::Json(req): axum::Json<model::NewComboDealRequest>,
    ) -> Response {
        if let Err(resp) = caller_from_headers(&headers).and_then(require_admin) {
            return resp;
        }

        match state.combos.create_combo(req).await {
            Ok(combo) => (StatusCode::CREATED, axum::Json(combo)).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_update_combo(
        State(state): State<AppState>,
        headers: HeaderMap,
        AxumPath(deal_id): AxumPath<i64>,
        axum::Json(req): axum::Json<model::ComboDealUpdateRequest>,
    ) -> Response {
        if let Err(resp) = caller_from_headers(&headers).and_then(require_admin) {
            return resp;
        }

        match state.combos.update_combo(deal_id, req).await {
            Ok(combo) => axum::Json(combo).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_delete_combo(
        State(state): State<AppState>,
        headers: HeaderMap,
        AxumPath(deal_id): AxumPath<i64>,
    ) -> Response {
        if let Err(resp) = caller_from_headers(&headers).and_then(require_admin) {
            return resp;
        }

        match state.combos.delete_combo(deal_id).await {
            Ok(()) => axum::Json(json!({ "success": true })).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    /// Unknown range values fall back to today's figures.
    async fn handle_dashboard(
        State(state): State<AppState>,
        headers: HeaderMap,
        Query(query): Query<DashboardQuery>,
    ) -> Response {
        if let Err(resp) = caller_from_headers(&headers).and_then(require_admin) {
            return resp;
        }

        let range = query
            .date_range
            .as_deref()
            .and_then(|raw| raw.parse::<DateRange>().ok())
            .unwrap_or(DateRange::Today);

        match state.service.dashboard(range).await {
            Ok(stats) => axum::Json(stats).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_menu(State(state): State<AppState>) -> Response {
        match state.service.menu().await {
            Ok(menu) => axum::Json(menu).into_response(),
            Err(err) => error_response(err, state.debug_errors),
        }
    }

    async fn handle_health() -> &'static str {
        "OK"
    }

    async fn handle_metrics(State(state): State<AppState>) -> Response {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();

        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&state.metrics.registry.gather(), &mut buffer) {
            error!("Failed to encode metrics: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
        }

        match String::from_utf8(buffer) {
            Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
            Err(e) => {
                error!("Failed to convert metrics to UTF-8: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Invalid metrics data").into_response()
            }
        }
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
