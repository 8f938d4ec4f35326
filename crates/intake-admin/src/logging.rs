//! 日志初始化
//!
//! 进程启动时根据 `LoggingConfig` 安装全局 tracing 订阅者

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// 构建日志过滤器；`override_level` 优先于配置中的级别
pub fn build_filter(config: &LoggingConfig, override_level: Option<&str>) -> Result<EnvFilter> {
    let directives = override_level.unwrap_or(&config.level);
    EnvFilter::try_new(directives)
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", directives, e))
}

/// 安装全局日志订阅者，只能调用一次
pub fn init_logging(config: &LoggingConfig, override_level: Option<&str>) -> Result<()> {
    let filter = build_filter(config, override_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
