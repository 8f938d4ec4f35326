//! # 分诊集成模块
//!
//! 核心依赖的外部协作方边界：
//! - 患者身份库：患者是否存在及其显示名称
//! - 人员登记：各角色当前可用人数
//! - 症状分类服务：自由文本症状到严重程度的转换

pub mod classifier;
pub mod identity;
pub mod staff;

pub use classifier::{HttpSeverityClassifier, SeverityClassifier, UnconfiguredClassifier};
pub use identity::{IdentityStore, InMemoryIdentityStore, PatientRecord};
pub use staff::{InMemoryStaffRegistry, StaffRegistry};
