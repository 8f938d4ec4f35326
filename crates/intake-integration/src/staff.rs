//! 人员登记
//!
//! 可用人数由外部登记方维护，核心只读取

use async_trait::async_trait;
use intake_core::{Result, StaffAvailability, StaffRole};
use tokio::sync::RwLock;
use tracing::info;

/// 人员登记接口
#[async_trait]
pub trait StaffRegistry: Send + Sync {
    /// 指定角色当前可用人数
    async fn available(&self, role: StaffRole) -> Result<u32>;

    /// 两种角色的可用人数快照
    async fn availability(&self) -> Result<StaffAvailability> {
        Ok(StaffAvailability {
            triage: self.available(StaffRole::Triage).await?,
            attendance: self.available(StaffRole::Attendance).await?,
        })
    }
}

/// 内存人员登记
#[derive(Debug, Default)]
pub struct InMemoryStaffRegistry {
    counts: RwLock<StaffAvailability>,
}

impl InMemoryStaffRegistry {
    pub fn new(initial: StaffAvailability) -> Self {
        Self {
            counts: RwLock::new(initial),
        }
    }

    pub async fn set_available(&self, role: StaffRole, count: u32) {
        let mut counts = self.counts.write().await;
        match role {
            StaffRole::Triage => counts.triage = count,
            StaffRole::Attendance => counts.attendance = count,
        }
        info!("Staff availability for {} set to {}", role, count);
    }
}

#[async_trait]
impl StaffRegistry for InMemoryStaffRegistry {
    async fn available(&self, role: StaffRole) -> Result<u32> {
        Ok(self.counts.read().await.count(role))
    }

    // 单次加锁读取，保证两个计数来自同一时刻
    async fn availability(&self) -> Result<StaffAvailability> {
        Ok(*self.counts.read().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_availability_snapshot() {
        let registry = InMemoryStaffRegistry::new(StaffAvailability::new(2, 3));
        assert_eq!(registry.available(StaffRole::Attendance).await.unwrap(), 3);

        registry.set_available(StaffRole::Triage, 0).await;
        let snapshot = registry.availability().await.unwrap();
        assert_eq!(snapshot, StaffAvailability::new(0, 3));
    }
}
