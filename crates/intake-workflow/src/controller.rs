//! 队列转换控制器
//!
//! 同时持有分诊队列与接诊队列，负责入队、升级、完成三种转换，
//! 并在每次读取时根据当前队列内容与人员快照重新估算等待时间。
//! 所有变更在 `&mut self` 下完成，调用方只需用一把锁保护整个看板。

use intake_core::{
    IntakeError, QueueEntry, Result, Severity, StaffAvailability, StaffRole, SubjectId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    attendance_queue::AttendanceQueue,
    estimator::estimate_completion,
    severity::SeverityTable,
    state_machine::{IntakeEvent, SubjectState, SubjectStateMachine},
    triage_queue::{time_to_triage, TriageQueue, DEFAULT_TRIAGE_SLOT_MINUTES},
};

/// 入队结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Admission {
    pub key: Uuid,
    pub subject_id: SubjectId,
    pub position: u32,
    pub estimated_triage_time: u32,
    pub estimated_attendance_time: u32,
}

/// 预估结果（不改变状态）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Projection {
    pub position: u32,
    pub estimated_triage_time: u32,
    pub estimated_attendance_time: u32,
}

/// 升级结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Promotion {
    pub subject_id: SubjectId,
    pub severity: Severity,
    pub position: u32,
}

/// 完成结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    pub removed_subject_id: SubjectId,
    pub severity: Severity,
    pub display_name: String,
}

/// 患者队列状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueueStatus {
    /// 评估尚未完成，调用方需轮询
    Pending { triage_position: Option<u32> },
    Waiting { position: u32, estimated_wait: u32 },
}

/// 队列看板
#[derive(Debug)]
pub struct QueueBoard {
    triage: TriageQueue,
    attendance: AttendanceQueue,
    table: SeverityTable,
    triage_slot_minutes: u32,
    state_machine: SubjectStateMachine,
}

impl QueueBoard {
    /// 创建新的队列看板
    pub fn new(table: SeverityTable, triage_slot_minutes: u32) -> Result<Self> {
        if triage_slot_minutes == 0 {
            return Err(IntakeError::Config("triage slot must be positive".into()));
        }
        Ok(Self {
            triage: TriageQueue::new(),
            attendance: AttendanceQueue::new(),
            table,
            triage_slot_minutes,
            state_machine: SubjectStateMachine::new(),
        })
    }

    pub fn triage(&self) -> &TriageQueue {
        &self.triage
    }

    pub fn attendance(&self) -> &AttendanceQueue {
        &self.attendance
    }

    pub fn severity_table(&self) -> &SeverityTable {
        &self.table
    }

    /// 根据队列成员关系推出患者当前状态；已完成者不再保留记录
    pub fn state_of(&self, subject_id: &SubjectId) -> SubjectState {
        if self.triage.contains(subject_id) {
            SubjectState::InTriageQueue
        } else if self.attendance.contains(subject_id) {
            SubjectState::InAttendanceQueue
        } else {
            SubjectState::Unseen
        }
    }

    /// 患者进入分诊队列
    ///
    /// 估算先于变更完成，任何失败都不会留下条目。
    pub fn admit(
        &mut self,
        subject_id: SubjectId,
        display_name: String,
        severity_estimate: Severity,
        staff: StaffAvailability,
    ) -> Result<Admission> {
        let state = self.state_of(&subject_id);
        if state != SubjectState::Unseen {
            tracing::warn!("Rejected duplicate admission for {} ({:?})", subject_id, state);
            return Err(IntakeError::DuplicateSubject(subject_id.to_string()));
        }
        self.state_machine.transition(state, IntakeEvent::Admit)?;

        let position = self.triage.next_position();
        let projection = self.project(position, severity_estimate, staff)?;

        let entry = QueueEntry::new(subject_id.clone(), display_name, severity_estimate);
        let key = entry.key;
        let assigned = self.triage.push(entry);
        debug_assert_eq!(assigned, position);

        tracing::info!(
            "Admitted {} to triage queue at position {} (estimate {})",
            subject_id, assigned, severity_estimate
        );

        Ok(Admission {
            key,
            subject_id,
            position: assigned,
            estimated_triage_time: projection.estimated_triage_time,
            estimated_attendance_time: projection.estimated_attendance_time,
        })
    }

    /// "如果现在入队"的预估
    ///
    /// 已在分诊队列中的患者按其当前位置估算，其余按队尾估算。
    pub fn estimate(
        &self,
        subject_id: Option<&SubjectId>,
        severity: Severity,
        staff: StaffAvailability,
    ) -> Result<Projection> {
        let position = match subject_id {
            Some(id) => {
                let state = self.state_of(id);
                match state {
                    SubjectState::InTriageQueue => self
                        .triage
                        .get(id)
                        .map(|entry| entry.position)
                        .unwrap_or_else(|| self.triage.next_position()),
                    _ if self.state_machine.can_transition(state, IntakeEvent::Admit) => {
                        self.triage.next_position()
                    }
                    _ => {
                        return Err(IntakeError::InvalidTransition {
                            from: format!("{:?}", state),
                            event: "Estimate".to_string(),
                        });
                    }
                }
            }
            None => self.triage.next_position(),
        };

        let projection = self.project(position, severity, staff)?;
        tracing::debug!("Projected {:?} for severity {}", projection, severity);
        Ok(projection)
    }

    /// 员工确认严重程度，患者从分诊队列移入接诊队列
    pub fn promote(&mut self, subject_id: &SubjectId, severity_official: Severity) -> Result<Promotion> {
        let state = self.require_present(subject_id)?;
        self.state_machine.transition(state, IntakeEvent::Promote)?;

        // remove 成功后 admit_transition 不会失败，两步之间不存在部分提交
        let entry = self.triage.remove(subject_id)?;
        let position = self.attendance.admit_transition(entry, severity_official);

        tracing::info!(
            "Promoted {} to attendance queue at position {} (official {})",
            subject_id, position, severity_official
        );

        Ok(Promotion {
            subject_id: subject_id.clone(),
            severity: severity_official,
            position,
        })
    }

    /// 接诊完成，删除条目并重新编号
    pub fn complete(&mut self, subject_id: &SubjectId) -> Result<Completion> {
        let state = self.require_present(subject_id)?;
        self.state_machine.transition(state, IntakeEvent::Complete)?;

        let removed = self.attendance.complete(subject_id)?;
        let severity = removed
            .severity_official
            .ok_or_else(|| IntakeError::Internal(format!("{} has no official severity", subject_id)))?;

        tracing::info!("Completed attendance for {} ({})", subject_id, severity);

        Ok(Completion {
            removed_subject_id: removed.subject_id,
            severity,
            display_name: removed.display_name,
        })
    }

    /// 患者当前状态下允许的后续事件
    pub fn next_events(&self, subject_id: &SubjectId) -> Vec<IntakeEvent> {
        self.state_machine.get_possible_events(self.state_of(subject_id))
    }

    /// 查询患者状态
    pub fn status(&self, subject_id: &SubjectId, staff: StaffAvailability) -> Result<QueueStatus> {
        match self.state_of(subject_id) {
            SubjectState::InTriageQueue => Ok(QueueStatus::Pending {
                triage_position: self.triage.get(subject_id).map(|entry| entry.position),
            }),
            SubjectState::InAttendanceQueue => {
                let entry = self
                    .attendance
                    .get(subject_id)
                    .ok_or_else(|| IntakeError::NotFound(subject_id.to_string()))?;
                match entry.severity_official {
                    None => Ok(QueueStatus::Pending { triage_position: None }),
                    Some(severity) => {
                        let estimated_wait = self.attendance.time_to_attendance(
                            entry.position,
                            severity,
                            staff.require(StaffRole::Attendance)?,
                            &self.table,
                        )?;
                        Ok(QueueStatus::Waiting {
                            position: entry.position,
                            estimated_wait,
                        })
                    }
                }
            }
            _ => Err(IntakeError::NotFound(format!("{} is not queued", subject_id))),
        }
    }

    /// 估算排序：接诊队列全部条目（正式严重程度）在前，
    /// 随后是分诊队列中位置在前者（预估严重程度）
    pub fn severities_ahead_of_triage_position(&self, position: u32) -> Vec<Severity> {
        let mut ahead = self.attendance.officials();
        ahead.extend(self.triage.estimates_ahead_of(position));
        ahead
    }

    fn project(&self, position: u32, severity: Severity, staff: StaffAvailability) -> Result<Projection> {
        let estimated_triage_time = time_to_triage(
            position,
            staff.require(StaffRole::Triage)?,
            self.triage_slot_minutes,
        )?;

        let ahead = self
            .table
            .durations_of(&self.severities_ahead_of_triage_position(position));
        let estimated_attendance_time = estimate_completion(
            &ahead,
            staff.require(StaffRole::Attendance)?,
            self.table.duration_of(severity),
        )?;

        Ok(Projection {
            position,
            estimated_triage_time,
            estimated_attendance_time,
        })
    }

    fn require_present(&self, subject_id: &SubjectId) -> Result<SubjectState> {
        match self.state_of(subject_id) {
            SubjectState::Unseen => Err(IntakeError::NotFound(format!("{} is not queued", subject_id))),
            state => Ok(state),
        }
    }
}

impl Default for QueueBoard {
    fn default() -> Self {
        Self {
            triage: TriageQueue::new(),
            attendance: AttendanceQueue::new(),
            table: SeverityTable::default(),
            triage_slot_minutes: DEFAULT_TRIAGE_SLOT_MINUTES,
            state_machine: SubjectStateMachine::new(),
        }
    }
}
