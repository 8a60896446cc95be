//! Application settings.
//!
//! Every field defaults to the value the application was written for, so an
//! empty file (or no file at all) reproduces the stock behavior.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use uros_core::{UrosError, UrosResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub node_name: String,
    pub namespace: String,
    pub publisher_topic: String,
    pub subscriber_topic: String,
    pub timer_period_ms: u64,
    /// Upper bound of each executor wait
    pub spin_timeout_ms: u64,
    /// Idle sleep after every spin
    pub idle_sleep_us: u64,
    pub executor_capacity: usize,
    pub domain_id: usize,
    pub task: TaskConfig,
}

/// Attributes of the task the binary spawns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub name: String,
    pub stack_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_name: "freertos_int32_publisher".to_string(),
            namespace: String::new(),
            publisher_topic: "freertos_int32_publisher".to_string(),
            subscriber_topic: "/microROS/int32_subscriber".to_string(),
            timer_period_ms: 3000,
            spin_timeout_ms: 10,
            idle_sleep_us: 100_000,
            executor_capacity: 3,
            domain_id: 0,
            task: TaskConfig::default(),
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            name: "uros_app".to_string(),
            stack_size: 64 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> UrosResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            UrosError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> UrosResult<Self> {
        toml::from_str(contents)
            .map_err(|e| UrosError::config(format!("Failed to parse TOML: {}", e)))
    }

    pub fn to_toml(&self) -> UrosResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| UrosError::config(format!("Failed to write TOML: {}", e)))
    }

    pub fn timer_period(&self) -> Duration {
        Duration::from_millis(self.timer_period_ms)
    }

    pub fn spin_timeout(&self) -> Duration {
        Duration::from_millis(self.spin_timeout_ms)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_micros(self.idle_sleep_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_application() {
        let config = AppConfig::default();
        assert_eq!(config.node_name, "freertos_int32_publisher");
        assert_eq!(config.namespace, "");
        assert_eq!(config.publisher_topic, "freertos_int32_publisher");
        assert_eq!(config.subscriber_topic, "/microROS/int32_subscriber");
        assert_eq!(config.timer_period(), Duration::from_millis(3000));
        assert_eq!(config.spin_timeout(), Duration::from_millis(10));
        assert_eq!(config.idle_sleep(), Duration::from_millis(100));
        assert_eq!(config.executor_capacity, 3);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            timer_period_ms = 500
            namespace = "robot"

            [task]
            name = "pubsub"
            "#,
        )
        .unwrap();

        assert_eq!(config.timer_period_ms, 500);
        assert_eq!(config.namespace, "robot");
        assert_eq!(config.task.name, "pubsub");
        assert_eq!(config.task.stack_size, TaskConfig::default().stack_size);
        assert_eq!(config.subscriber_topic, "/microROS/int32_subscriber");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = AppConfig::from_toml("timer_period_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, UrosError::Config(_)));
        assert_eq!(err.code(), 11);
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }
}
