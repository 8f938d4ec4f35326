//! 严重程度时长表
//!
//! 严重程度到预计服务时长（分钟）的只读映射，启动时构建，之后不可变

use intake_core::{IntakeError, Result, Severity};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIGHT_MINUTES: u32 = 20;
pub const DEFAULT_MODERATE_MINUTES: u32 = 40;
pub const DEFAULT_SEVERE_MINUTES: u32 = 70;

/// 严重程度时长表
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityTable {
    light: u32,
    moderate: u32,
    severe: u32,
}

impl SeverityTable {
    /// 创建时长表，所有时长必须为正
    pub fn new(light: u32, moderate: u32, severe: u32) -> Result<Self> {
        if light == 0 || moderate == 0 || severe == 0 {
            return Err(IntakeError::Config(
                "severity durations must be positive".into(),
            ));
        }
        Ok(Self {
            light,
            moderate,
            severe,
        })
    }

    pub fn duration_of(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Light => self.light,
            Severity::Moderate => self.moderate,
            Severity::Severe => self.severe,
        }
    }

    pub fn durations_of<'a, I>(&self, severities: I) -> Vec<u32>
    where
        I: IntoIterator<Item = &'a Severity>,
    {
        severities
            .into_iter()
            .map(|severity| self.duration_of(*severity))
            .collect()
    }
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            light: DEFAULT_LIGHT_MINUTES,
            moderate: DEFAULT_MODERATE_MINUTES,
            severe: DEFAULT_SEVERE_MINUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_durations() {
        let table = SeverityTable::default();
        assert_eq!(table.duration_of(Severity::Light), 20);
        assert_eq!(table.duration_of(Severity::Moderate), 40);
        assert_eq!(table.duration_of(Severity::Severe), 70);
    }

    #[test]
    fn test_rejects_zero_duration() {
        assert!(SeverityTable::new(0, 40, 70).is_err());
        assert!(SeverityTable::new(10, 30, 60).is_ok());
    }
}
