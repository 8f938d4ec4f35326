//! 接诊队列
//!
//! 已确认严重程度、等待接诊的患者

use intake_core::{IntakeError, QueueEntry, Result, Severity, SubjectId};
use serde::{Deserialize, Serialize};

use crate::estimator::estimate_completion;
use crate::severity::SeverityTable;

/// 接诊队列
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AttendanceQueue {
    entries: Vec<QueueEntry>,
}

impl AttendanceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, subject_id: &SubjectId) -> bool {
        self.get(subject_id).is_some()
    }

    pub fn get(&self, subject_id: &SubjectId) -> Option<&QueueEntry> {
        self.entries.iter().find(|entry| &entry.subject_id == subject_id)
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// 接收从分诊队列转入的条目，写入正式严重程度并分配位置 `len + 1`
    pub(crate) fn admit_transition(&mut self, mut entry: QueueEntry, severity_official: Severity) -> u32 {
        let position = self.entries.len() as u32 + 1;
        entry.position = position;
        entry.severity_official = Some(severity_official);
        self.entries.push(entry);
        position
    }

    /// 移除条目后按原位置排序并重新连续编号
    pub(crate) fn complete(&mut self, subject_id: &SubjectId) -> Result<QueueEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.subject_id == subject_id)
            .ok_or_else(|| IntakeError::NotFound(format!("{} is not in the attendance queue", subject_id)))?;

        let removed = self.entries.remove(index);
        self.entries.sort_by_key(|entry| entry.position);
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.position = index as u32 + 1;
        }

        Ok(removed)
    }

    /// 全部条目的正式严重程度，按位置顺序
    pub fn officials(&self) -> Vec<Severity> {
        self.officials_ahead_of(u32::MAX)
    }

    /// 位置严格小于 `position` 的条目的正式严重程度
    pub fn officials_ahead_of(&self, position: u32) -> Vec<Severity> {
        self.entries
            .iter()
            .filter(|entry| entry.position < position)
            .filter_map(|entry| entry.severity_official)
            .collect()
    }

    /// 位于 `position` 且严重程度为 `own` 的患者，到接诊结束的预计时长
    pub fn time_to_attendance(
        &self,
        position: u32,
        own: Severity,
        attendance_staff: u32,
        table: &SeverityTable,
    ) -> Result<u32> {
        if attendance_staff == 0 {
            return Err(IntakeError::NoStaffAvailable("no attendance staff available".into()));
        }
        let ahead = table.durations_of(&self.officials_ahead_of(position));
        estimate_completion(&ahead, attendance_staff, table.duration_of(own))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> QueueEntry {
        QueueEntry::new(SubjectId::parse(id).unwrap(), format!("Patient {}", id), Severity::Light)
    }

    fn filled(severities: &[(&str, Severity)]) -> AttendanceQueue {
        let mut queue = AttendanceQueue::new();
        for (id, severity) in severities {
            queue.admit_transition(entry(id), *severity);
        }
        queue
    }

    #[test]
    fn test_admit_transition_sets_official() {
        let queue = filled(&[("a", Severity::Severe)]);
        let stored = queue.get(&SubjectId::parse("a").unwrap()).unwrap();
        assert_eq!(stored.position, 1);
        assert_eq!(stored.severity_official, Some(Severity::Severe));
        assert_eq!(stored.severity_estimate, Some(Severity::Light));
    }

    #[test]
    fn test_complete_renumbers_preserving_order() {
        let mut queue = filled(&[
            ("a", Severity::Light),
            ("b", Severity::Moderate),
            ("c", Severity::Severe),
        ]);

        let removed = queue.complete(&SubjectId::parse("b").unwrap()).unwrap();
        assert_eq!(removed.severity_official, Some(Severity::Moderate));

        let remaining: Vec<(&str, u32)> = queue
            .entries()
            .iter()
            .map(|e| (e.subject_id.as_str(), e.position))
            .collect();
        assert_eq!(remaining, vec![("a", 1), ("c", 2)]);
    }

    #[test]
    fn test_complete_missing_subject() {
        let mut queue = filled(&[("a", Severity::Light)]);
        let result = queue.complete(&SubjectId::parse("z").unwrap());
        assert!(matches!(result, Err(IntakeError::NotFound(_))));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_time_to_attendance() {
        let queue = filled(&[
            ("a", Severity::Light),
            ("b", Severity::Moderate),
            ("c", Severity::Light),
            ("d", Severity::Light),
        ]);
        let table = SeverityTable::default();

        // 前方 [20,40,20]，两人接诊：等待40，加上本人20
        assert_eq!(queue.time_to_attendance(4, Severity::Light, 2, &table).unwrap(), 60);
        assert_eq!(queue.time_to_attendance(1, Severity::Severe, 2, &table).unwrap(), 70);
        assert_eq!(queue.time_to_attendance(4, Severity::Light, 1, &table).unwrap(), 100);
    }

    #[test]
    fn test_time_to_attendance_without_staff() {
        let queue = filled(&[("a", Severity::Light)]);
        let table = SeverityTable::default();
        assert!(matches!(
            queue.time_to_attendance(1, Severity::Light, 0, &table),
            Err(IntakeError::NoStaffAvailable(_))
        ));
    }
}
