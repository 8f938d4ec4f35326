//! 错误定义模块

use thiserror::Error;

/// 分诊系统统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("患者已在队列中: {0}")]
    DuplicateSubject(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("未知严重程度: {0}")]
    UnknownSeverity(String),

    #[error("无可用人员: {0}")]
    NoStaffAvailable(String),

    #[error("无效状态转换: 从 {from} 经 {event}")]
    InvalidTransition { from: String, event: String },

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("外部系统错误: {0}")]
    Integration(String),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

impl IntakeError {
    /// 错误类别的稳定名称，用于日志与指标标签
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::DuplicateSubject(_) => "duplicate_subject",
            IntakeError::NotFound(_) => "not_found",
            IntakeError::UnknownSeverity(_) => "unknown_severity",
            IntakeError::NoStaffAvailable(_) => "no_staff_available",
            IntakeError::InvalidTransition { .. } => "invalid_transition",
            IntakeError::Validation(_) => "validation",
            IntakeError::Config(_) => "config",
            IntakeError::Integration(_) => "integration",
            IntakeError::Internal(_) => "internal",
        }
    }
}

/// 分诊系统统一结果类型
pub type Result<T> = std::result::Result<T, IntakeError>;
