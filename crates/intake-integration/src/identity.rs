//! 患者身份库
//!
//! 核心只关心"该患者是否存在"以及其显示名称

use async_trait::async_trait;
use intake_core::{Result, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// 患者档案中核心需要的部分
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientRecord {
    pub subject_id: SubjectId,
    pub display_name: String,
}

/// 身份库接口
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// 查询患者，不存在时返回 `None`
    async fn find_patient(&self, subject_id: &SubjectId) -> Result<Option<PatientRecord>>;
}

/// 内存身份库
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    patients: RwLock<HashMap<SubjectId, PatientRecord>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patients<I>(patients: I) -> Self
    where
        I: IntoIterator<Item = PatientRecord>,
    {
        let patients = patients
            .into_iter()
            .map(|record| (record.subject_id.clone(), record))
            .collect();
        Self {
            patients: RwLock::new(patients),
        }
    }

    /// 登记或更新患者
    pub async fn register(&self, record: PatientRecord) {
        info!("Registering patient {}", record.subject_id);
        self.patients
            .write()
            .await
            .insert(record.subject_id.clone(), record);
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_patient(&self, subject_id: &SubjectId) -> Result<Option<PatientRecord>> {
        Ok(self.patients.read().await.get(subject_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str) -> PatientRecord {
        PatientRecord {
            subject_id: SubjectId::parse(id).unwrap(),
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_registered_patient() {
        let store = InMemoryIdentityStore::with_patients(vec![record("12345678900", "Usuario Teste")]);

        let found = store
            .find_patient(&SubjectId::parse("12345678900").unwrap())
            .await
            .unwrap();
        assert_eq!(found.unwrap().display_name, "Usuario Teste");

        let missing = store
            .find_patient(&SubjectId::parse("00000000000").unwrap())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_register_overwrites() {
        let store = InMemoryIdentityStore::new();
        store.register(record("1", "Old")).await;
        store.register(record("1", "New")).await;

        let found = store.find_patient(&SubjectId::parse("1").unwrap()).await.unwrap();
        assert_eq!(found.unwrap().display_name, "New");
    }
}
