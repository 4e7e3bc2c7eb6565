//! Restaurant Ordering Backend
//!
//! Entry point for the ordering service. Wires together the configuration,
//! the Postgres pool (with startup migrations), the repositories, the order
//! service, the Kafka order-event publisher, and the HTTP server.
//!
//! # Architecture
//!
//! - Repository layer for transactional data access
//! - Service layer for validation and the status-transition policy
//! - HTTP layer for the storefront, admin, and payment-webhook endpoints
//! - Outbound order events for connected dashboards
//! - Metrics for monitoring

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use app_config::AppConfig;
use notifier::KafkaOrderNotifier;
use repository::{PgCombosRepository, PgMenuRepository, PgOrdersRepository, PgReviewsRepository};
use server::Server;
use service::{
    ComboService, ComboServiceImpl, OrderEventSink, OrderService, OrderServiceImpl, ReviewService,
    ReviewServiceImpl,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Restaurant ordering backend starting...");

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db_pool = match db::init_db_pool(&config).await {
        Ok(pool) => {
            info!("Database initialized successfully");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.context("Database connection is required"));
        }
    };

    let orders_repo = PgOrdersRepository::new(db_pool.clone());
    let menu_repo = PgMenuRepository::new(db_pool.clone());
    let reviews_repo = PgReviewsRepository::new(db_pool.clone());
    let combos_repo = PgCombosRepository::new(db_pool.clone());

    // Order events are best-effort; the shop keeps taking orders when the
    // broker is down.
    let events: Option<Arc<dyn OrderEventSink>> = match KafkaOrderNotifier::new(&config) {
        Ok(producer) => Some(Arc::new(producer)),
        Err(e) => {
            error!("Failed to initialize order event producer: {}", e);
            None
        }
    };

    let order_service: Arc<dyn OrderService> =
        Arc::new(OrderServiceImpl::new(orders_repo, menu_repo, events));
    let review_service: Arc<dyn ReviewService> = Arc::new(ReviewServiceImpl::new(reviews_repo));
    let combo_service: Arc<dyn ComboService> = Arc::new(ComboServiceImpl::new(combos_repo));

    let http_server = Server::new(
        config.http_port.to_string(),
        order_service,
        review_service,
        combo_service,
        config.payment_webhook_secret.clone(),
        config.debug_errors,
    );

    http_server.start().await?;

    info!("Application stopped");
    Ok(())
}
