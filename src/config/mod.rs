//! 静态配置
//!
//! 优先级：ENV > config.toml > 默认值
//! ENV 前缀：LG，分隔符：__，示例：LG__SERVER__PORT=9999

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 初始化全局配置（只允许一次，重复调用忽略）
pub fn init_config(config: AppConfig) {
    let _ = CONFIG.set(config);
}

/// 获取全局配置；未初始化时按默认方式加载
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::load)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub visits: VisitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 从 TOML 文件和环境变量加载配置
    pub fn load() -> Self {
        use config::{Config, Environment, File};

        let path = "config.toml";

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("LG")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<AppConfig>() {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// 主域名；Host 与它相同的请求落在默认 scope，其余按自定义域处理
    #[serde(default = "default_primary_domain")]
    pub primary_domain: String,
    /// 访问根路径时跳转的地址，空则返回通用不可用页
    #[serde(default)]
    pub default_url: Option<String>,
    /// 签发 splash 确认标记用的种子
    #[serde(default = "default_ack_seed")]
    pub ack_seed: String,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 单次读操作的超时（毫秒），超时按存储故障处理
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 解析缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl_secs: u64,
    #[serde(default = "default_negative_capacity")]
    pub negative_capacity: u64,
    /// 并发回源时跟随者等待首个读取结果的上限（毫秒）
    #[serde(default = "default_flight_wait_ms")]
    pub flight_wait_ms: u64,
}

/// 访问记录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitConfig {
    #[serde(default = "default_visit_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_visit_workers")]
    pub workers: usize,
    #[serde(default = "default_visit_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
    #[serde(default = "default_log_backups")]
    pub max_backups: u32,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_primary_domain() -> String {
    "localhost".to_string()
}

fn default_ack_seed() -> String {
    "change-me".to_string()
}

fn default_database_url() -> String {
    "sqlite://linkgate.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_op_timeout_ms() -> u64 {
    2000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_cache_ttl() -> u64 {
    120
}

fn default_cache_capacity() -> u64 {
    50_000
}

fn default_negative_ttl() -> u64 {
    30
}

fn default_negative_capacity() -> u64 {
    100_000
}

fn default_flight_wait_ms() -> u64 {
    3000
}

fn default_visit_queue_capacity() -> usize {
    16_384
}

fn default_visit_workers() -> usize {
    2
}

fn default_visit_batch_size() -> usize {
    256
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_backups() -> u32 {
    7
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            primary_domain: default_primary_domain(),
            default_url: None,
            ack_seed: default_ack_seed(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            op_timeout_ms: default_op_timeout_ms(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_cache_ttl(),
            max_capacity: default_cache_capacity(),
            negative_ttl_secs: default_negative_ttl(),
            negative_capacity: default_negative_capacity(),
            flight_wait_ms: default_flight_wait_ms(),
        }
    }
}

impl Default for VisitConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_visit_queue_capacity(),
            workers: default_visit_workers(),
            batch_size: default_visit_batch_size(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            format: default_log_format(),
            enable_rotation: default_true(),
            max_backups: default_log_backups(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.default_ttl_secs, 120);
        assert!(config.cache.negative_ttl_secs < config.cache.default_ttl_secs);
        assert!(config.visits.queue_capacity > 0);
        assert_eq!(config.logging.level, "info");
    }
}
