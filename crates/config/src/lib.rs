use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// `AppConfig` holds all configuration parameters required by the backend.
///
/// The configuration is loaded from environment variables (optionally via a
/// `.env` file) with sensible defaults for local development. Fields cover
/// the database, the order-events Kafka topic, the HTTP server, and the
/// payment webhook. This struct is deserializable via Serde.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    // --- Database settings ---
    /// Database hostname or service name (e.g. "postgres" in Docker Compose,
    /// "localhost" for local runs).
    pub db_host: String,
    /// Database port (default: 5432).
    pub db_port: u16,
    /// Database user.
    pub db_user: String,
    /// Database password.
    pub db_password: String,
    /// Database name.
    pub db_name: String,
    /// Maximum number of pooled connections.
    pub db_pool_size: usize,
    /// Directory with the SQL migrations applied at startup.
    pub migrations_dir: String,

    // --- Order events (Kafka) ---
    /// List of Kafka brokers (comma-separated string in env, parsed to Vec<String>).
    pub kafka_brokers: Vec<String>,
    /// Kafka topic that receives order created/status-changed events.
    pub kafka_topic: String,

    // --- HTTP server ---
    /// The port on which the HTTP server will listen.
    pub http_port: u16,

    // --- Shutdown timeout ---
    /// Graceful shutdown timeout (human-friendly format, e.g. "5s", "1m").
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub shutdown_timeout: Duration,

    // --- Payment provider callback ---
    /// Shared secret the payment provider signs webhook payloads with.
    pub payment_webhook_secret: String,

    // --- Diagnostics ---
    /// When true, error responses include the underlying fault detail.
    /// Must stay false in production.
    pub debug_errors: bool,
}

/// Custom deserializer for graceful shutdown timeout.
/// Accepts human-readable formats like "5s", "1m", etc.
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let val = String::deserialize(deserializer)?;
    humantime::parse_duration(&val)
        .map_err(|e| D::Error::custom(format!("Invalid duration '{val}': {e}")))
}

impl AppConfig {
    /// Loads configuration from environment variables (and optionally from `.env` file).
    ///
    /// Fields not set via env will be filled with default values.
    ///
    /// # Errors
    /// Returns an error if environment variables are invalid or missing required values.
    pub fn load() -> Result<Self> {
        // Load from .env file (for Docker environment)
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            // Database
            .set_default("db_host", "localhost")?
            .set_default("db_port", 5432)?
            .set_default("db_user", "orders_user")?
            .set_default("db_password", "securepassword")?
            .set_default("db_name", "restaurant_db")?
            .set_default("db_pool_size", 16)?
            .set_default("migrations_dir", "migrations")?
            // Kafka
            .set_default("kafka_brokers", vec!["localhost:9092"])?
            .set_default("kafka_topic", "order-events")?
            // HTTP
            .set_default("http_port", 8081)?
            // Shutdown
            .set_default("shutdown_timeout", "5s")?
            // Payment webhook
            .set_default("payment_webhook_secret", "dev-webhook-secret")?
            // Diagnostics
            .set_default("debug_errors", false)?
            .add_source(config::Environment::default().separator("_"))
            .build()?;

        settings
            .try_deserialize()
            .context("Failed to load configuration")
    }
}
