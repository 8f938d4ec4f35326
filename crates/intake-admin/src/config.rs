//! 配置管理
//!
//! 启动时一次性解析配置文件与环境变量，之后以只读形式传入各服务

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 单项服务时长与分诊时隙的上限（分钟）
pub const MAX_MINUTES: u32 = 24 * 60;

/// 分诊系统完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntakeConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 队列配置
    pub queue: QueueConfig,
    /// 内存人员登记的初始人数
    pub staff: StaffConfig,
    /// 症状分类服务配置
    pub classifier: ClassifierConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 内存身份库的初始患者
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patients: Vec<PatientSeed>,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 队列配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueueConfig {
    /// 每个分诊台处理一位患者的时隙（分钟）
    pub triage_slot_minutes: u32,
    pub durations: SeverityDurations,
}

/// 各严重程度的预计服务时长（分钟）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeverityDurations {
    pub light: u32,
    pub moderate: u32,
    pub severe: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StaffConfig {
    pub triage: u32,
    pub attendance: u32,
}

/// 症状分类服务配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// 未设置时不启用分类服务
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// 过滤指令，如 `info` 或 `intake_workflow=debug,info`
    pub level: String,
    pub with_target: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSeed {
    pub subject_id: String,
    pub display_name: String,
}

impl IntakeConfig {
    /// 加载配置：可选配置文件，再叠加 `INTAKE__SECTION__KEY` 环境变量
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(env_source())
            .build()
            .context("Failed to build configuration")?;

        let config: IntakeConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// 从TOML文本解析配置
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .context("Failed to parse configuration")?;

        let config: IntakeConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// 以TOML格式输出当前生效的配置
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        ConfigValidator::new().validate(self)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("INTAKE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    field_path: &'static str,
    validator: fn(&IntakeConfig) -> Result<()>,
}

impl ConfigValidator {
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "server.port",
                validator: |config| {
                    if config.server.port == 0 {
                        Err(anyhow::anyhow!("Server port cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "queue.triage_slot_minutes",
                validator: |config| {
                    let slot = config.queue.triage_slot_minutes;
                    if slot == 0 {
                        Err(anyhow::anyhow!("Triage slot cannot be 0 minutes"))
                    } else if slot > MAX_MINUTES {
                        Err(anyhow::anyhow!("Triage slot cannot exceed {} minutes", MAX_MINUTES))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "queue.durations",
                validator: |config| {
                    let d = &config.queue.durations;
                    let all = [d.light, d.moderate, d.severe];
                    if all.contains(&0) {
                        Err(anyhow::anyhow!("Severity durations must be positive"))
                    } else if all.iter().any(|minutes| *minutes > MAX_MINUTES) {
                        Err(anyhow::anyhow!("Severity durations cannot exceed {} minutes", MAX_MINUTES))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "classifier.timeout_secs",
                validator: |config| {
                    if config.classifier.endpoint.is_some() && config.classifier.timeout_secs == 0 {
                        Err(anyhow::anyhow!("Classifier timeout cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "patients",
                validator: |config| {
                    let mut seen = HashSet::new();
                    for patient in &config.patients {
                        let id = patient.subject_id.trim();
                        if id.is_empty() {
                            return Err(anyhow::anyhow!("Patient subject_id cannot be empty"));
                        }
                        if !seen.insert(id) {
                            return Err(anyhow::anyhow!("Duplicate patient subject_id: {}", id));
                        }
                    }
                    Ok(())
                },
            },
        ];

        Self { validation_rules }
    }

    pub fn validate(&self, config: &IntakeConfig) -> Result<()> {
        for rule in &self.validation_rules {
            (rule.validator)(config)
                .with_context(|| format!("Invalid configuration at {}", rule.field_path))?;
        }
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            triage_slot_minutes: 5,
            durations: SeverityDurations::default(),
        }
    }
}

impl Default for SeverityDurations {
    fn default() -> Self {
        Self {
            light: 20,
            moderate: 40,
            severe: 70,
        }
    }
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            triage: 1,
            attendance: 1,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = IntakeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.queue.durations.severe, 70);
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_from_toml_with_partial_sections() {
        let config = IntakeConfig::from_toml(
            r#"
            [server]
            port = 9090

            [queue]
            triage_slot_minutes = 10

            [staff]
            triage = 3
            attendance = 4

            [[patients]]
            subject_id = "12345678900"
            display_name = "Usuario Teste"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.queue.triage_slot_minutes, 10);
        assert_eq!(config.queue.durations.moderate, 40);
        assert_eq!(config.staff.attendance, 4);
        assert_eq!(config.patients.len(), 1);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = IntakeConfig::default();
        config.queue.durations.light = 0;
        assert!(config.validate().is_err());

        let mut config = IntakeConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = IntakeConfig::default();
        config.patients = vec![
            PatientSeed { subject_id: "1".into(), display_name: "A".into() },
            PatientSeed { subject_id: " 1".into(), display_name: "B".into() },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_oversized_minutes() {
        let mut config = IntakeConfig::default();
        config.queue.durations.severe = 3_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("queue.durations"));

        let mut config = IntakeConfig::default();
        config.queue.triage_slot_minutes = MAX_MINUTES + 1;
        assert!(config.validate().is_err());

        let mut config = IntakeConfig::default();
        config.queue.durations.light = MAX_MINUTES;
        config.queue.triage_slot_minutes = MAX_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_output() {
        let rendered = IntakeConfig::default().to_toml().unwrap();
        assert!(rendered.contains("triage_slot_minutes = 5"));
        assert_eq!(IntakeConfig::from_toml(&rendered).unwrap(), IntakeConfig::default());
    }
}
