//! # 分诊系统管理模块
//!
//! 提供配置加载与验证、日志初始化和Prometheus监控指标。

pub mod config;
pub mod logging;
pub mod monitoring;

pub use config::{
    ClassifierConfig, ConfigValidator, IntakeConfig, LoggingConfig, PatientSeed, QueueConfig,
    ServerConfig, SeverityDurations, StaffConfig, MAX_MINUTES,
};
pub use logging::{build_filter, init_logging};
pub use monitoring::IntakeMetrics;
