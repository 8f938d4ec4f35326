//! 患者状态机
//!
//! 管理患者在分诊队列与接诊队列之间的生命周期状态转换

use intake_core::{IntakeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 患者所处状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SubjectState {
    Unseen,            // 未入队
    InTriageQueue,     // 等待分诊
    InAttendanceQueue, // 等待接诊
    Completed,         // 已完成
}

/// 状态转换事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntakeEvent {
    Admit,
    Promote,
    Complete,
}

/// 患者状态机
#[derive(Debug)]
pub struct SubjectStateMachine {
    transitions: HashMap<(SubjectState, IntakeEvent), SubjectState>,
}

impl SubjectStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        // 只允许顺序前进，不可跳过或回退
        transitions.insert((SubjectState::Unseen, IntakeEvent::Admit), SubjectState::InTriageQueue);
        transitions.insert((SubjectState::InTriageQueue, IntakeEvent::Promote), SubjectState::InAttendanceQueue);
        transitions.insert((SubjectState::InAttendanceQueue, IntakeEvent::Complete), SubjectState::Completed);

        Self { transitions }
    }

    pub fn can_transition(&self, from: SubjectState, event: IntakeEvent) -> bool {
        self.transitions.contains_key(&(from, event))
    }

    /// 执行状态转换
    pub fn transition(&self, from: SubjectState, event: IntakeEvent) -> Result<SubjectState> {
        match self.transitions.get(&(from, event)) {
            Some(to) => Ok(*to),
            None => Err(IntakeError::InvalidTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 获取状态的所有可能事件，按事件顺序排列
    pub fn get_possible_events(&self, current_state: SubjectState) -> Vec<IntakeEvent> {
        let mut events: Vec<IntakeEvent> = self
            .transitions
            .keys()
            .filter(|(state, _)| *state == current_state)
            .map(|(_, event)| *event)
            .collect();
        events.sort();
        events
    }
}

impl Default for SubjectStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
