use app_config::AppConfig;
use std::time::Duration;

#[test]
fn test_load_default_config() {
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.db_name, "restaurant_db");
    assert_eq!(cfg.db_pool_size, 16);
    assert_eq!(cfg.kafka_topic, "order-events");
    assert_eq!(cfg.shutdown_timeout, Duration::from_secs(5));
    assert!(!cfg.debug_errors);
}
