//! 分诊队列
//!
//! 等待评估严重程度的患者，按入队顺序排列

use intake_core::{IntakeError, QueueEntry, Result, Severity, SubjectId};
use serde::{Deserialize, Serialize};

/// 默认分诊时隙（分钟）
pub const DEFAULT_TRIAGE_SLOT_MINUTES: u32 = 5;

/// 分诊队列
///
/// 条目始终按 `position` 升序保存，位置构成连续区间 `1..=len`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TriageQueue {
    entries: Vec<QueueEntry>,
}

impl TriageQueue {
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

    /// 下一位入队者将获得的位置
    pub fn next_position(&self) -> u32 {
        self.entries.len() as u32 + 1
    }

    /// 追加条目，分配位置 `len + 1`
    pub(crate) fn push(&mut self, mut entry: QueueEntry) -> u32 {
        let position = self.next_position();
        entry.position = position;
        self.entries.push(entry);
        position
    }

    /// 移除条目，位置大于被移除者的条目依次减一
    pub(crate) fn remove(&mut self, subject_id: &SubjectId) -> Result<QueueEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.subject_id == subject_id)
            .ok_or_else(|| IntakeError::NotFound(format!("{} is not in the triage queue", subject_id)))?;

        let removed = self.entries.remove(index);
        for entry in self.entries.iter_mut() {
            if entry.position > removed.position {
                entry.position -= 1;
            }
        }

        Ok(removed)
    }

    /// 位置严格小于 `position` 的条目的预估严重程度，保持队列顺序
    pub fn estimates_ahead_of(&self, position: u32) -> Vec<Severity> {
        self.entries
            .iter()
            .filter(|entry| entry.position < position)
            .filter_map(|entry| entry.severity_estimate)
            .collect()
    }
}

/// 轮转分配到 `triage_staff` 个并行分诊台，每台每个时隙处理一人
pub fn time_to_triage(position: u32, triage_staff: u32, slot_minutes: u32) -> Result<u32> {
    if triage_staff == 0 {
        return Err(IntakeError::NoStaffAvailable("no triage staff available".into()));
    }
    if position == 0 {
        return Err(IntakeError::Validation("position is 1-based".into()));
    }
    Ok(((position - 1) / triage_staff)
        .saturating_mul(slot_minutes)
        .saturating_add(slot_minutes))
}
