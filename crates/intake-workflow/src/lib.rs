//! # 分诊工作流模块
//!
//! 提供门诊分诊排队与等待时间估算的核心功能，包括：
//! - 严重程度时长表：严重程度到预计服务时长的映射
//! - 负载均衡估算：按到达顺序把前方患者分配给最早空闲的人员
//! - 分诊队列与接诊队列：保证位置连续的有序队列
//! - 队列转换控制器：入队、升级、完成三种转换及患者状态机

pub mod attendance_queue;
pub mod controller;
pub mod estimator;
pub mod severity;
pub mod state_machine;
pub mod triage_queue;

// 重新导出主要类型
pub use attendance_queue::AttendanceQueue;
pub use controller::{Admission, Completion, Projection, Promotion, QueueBoard, QueueStatus};
pub use estimator::{estimate_completion, estimate_wait};
pub use severity::SeverityTable;
pub use state_machine::{IntakeEvent, SubjectState, SubjectStateMachine};
pub use triage_queue::{time_to_triage, TriageQueue, DEFAULT_TRIAGE_SLOT_MINUTES};
