//! 核心数据模型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{IntakeError, Result};
use crate::utils::normalize_label;

/// 严重程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Light,    // 轻度
    Moderate, // 中度
    Severe,   // 重度
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Light, Severity::Moderate, Severity::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Light => "light",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = IntakeError;

    /// 大小写与首尾空白不敏感，其余输入一律拒绝
    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "light" => Ok(Severity::Light),
            "moderate" => Ok(Severity::Moderate),
            "severe" => Ok(Severity::Severe),
            _ => Err(IntakeError::UnknownSeverity(s.to_string())),
        }
    }
}

/// 患者标识（跨两个队列唯一）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IntakeError::Validation("subject id cannot be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = IntakeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 人员角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Triage,     // 分诊
    Attendance, // 接诊
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Triage => "triage",
            StaffRole::Attendance => "attendance",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 某一时刻各角色的可用人数快照
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffAvailability {
    pub triage: u32,
    pub attendance: u32,
}

impl StaffAvailability {
    pub fn new(triage: u32, attendance: u32) -> Self {
        Self { triage, attendance }
    }

    pub fn count(&self, role: StaffRole) -> u32 {
        match role {
            StaffRole::Triage => self.triage,
            StaffRole::Attendance => self.attendance,
        }
    }

    /// 返回指定角色的可用人数，为零时报错
    pub fn require(&self, role: StaffRole) -> Result<u32> {
        match self.count(role) {
            0 => Err(IntakeError::NoStaffAvailable(format!(
                "no {} staff available",
                role
            ))),
            n => Ok(n),
        }
    }
}

/// 队列类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    Triage,
    Attendance,
}

impl QueueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueKind::Triage => "triage",
            QueueKind::Attendance => "attendance",
        }
    }
}

/// 队列条目（分诊队列与接诊队列共用）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueEntry {
    /// 入队时生成的稳定内部键，跨队列迁移时保持不变
    pub key: Uuid,
    pub subject_id: SubjectId,
    /// 入队时从患者档案复制，之后不再同步
    pub display_name: String,
    pub severity_estimate: Option<Severity>,
    pub severity_official: Option<Severity>,
    /// 队列内从1开始的连续排名
    pub position: u32,
    pub admitted_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(subject_id: SubjectId, display_name: String, severity_estimate: Severity) -> Self {
        Self {
            key: Uuid::new_v4(),
            subject_id,
            display_name,
            severity_estimate: Some(severity_estimate),
            severity_official: None,
            position: 0,
            admitted_at: Utc::now(),
        }
    }
}
