//! 分诊服务
//!
//! 显式持有队列看板与外部协作方。看板由一把读写锁保护：
//! 写操作独占两个队列，读操作共享同一致快照。
//! 外部调用（身份、人员、分类）都在加锁之前完成。

use intake_admin::IntakeMetrics;
use intake_core::{IntakeError, QueueEntry, QueueKind, Result, Severity, SubjectId};
use intake_integration::{IdentityStore, SeverityClassifier, StaffRegistry};
use intake_workflow::{
    Admission, Completion, IntakeEvent, Projection, Promotion, QueueBoard, QueueStatus,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// 分诊服务
#[derive(Clone)]
pub struct IntakeService {
    board: Arc<RwLock<QueueBoard>>,
    identity: Arc<dyn IdentityStore>,
    staff: Arc<dyn StaffRegistry>,
    classifier: Arc<dyn SeverityClassifier>,
    metrics: IntakeMetrics,
}

impl IntakeService {
    pub fn new(
        board: QueueBoard,
        identity: Arc<dyn IdentityStore>,
        staff: Arc<dyn StaffRegistry>,
        classifier: Arc<dyn SeverityClassifier>,
        metrics: IntakeMetrics,
    ) -> Self {
        Self {
            board: Arc::new(RwLock::new(board)),
            identity,
            staff,
            classifier,
            metrics,
        }
    }

    pub fn metrics(&self) -> &IntakeMetrics {
        &self.metrics
    }

    /// 患者进入分诊队列；患者必须存在于身份库
    pub async fn admit(&self, subject_id: SubjectId, severity_estimate: Severity) -> Result<Admission> {
        let result = self.admit_inner(subject_id, severity_estimate).await;
        self.observe("admit", result)
    }

    /// 先由分类服务把症状转为严重程度，再入队
    pub async fn admit_with_symptoms(&self, subject_id: SubjectId, symptoms: &str) -> Result<Admission> {
        let severity = match self.classifier.classify(symptoms).await {
            Ok(severity) => severity,
            Err(e) => return self.observe("admit", Err(e)),
        };
        debug!("Classifier assigned {} to {}", severity, subject_id);
        self.admit(subject_id, severity).await
    }

    async fn admit_inner(&self, subject_id: SubjectId, severity_estimate: Severity) -> Result<Admission> {
        let patient = self
            .identity
            .find_patient(&subject_id)
            .await?
            .ok_or_else(|| IntakeError::NotFound(format!("patient {} is not registered", subject_id)))?;
        let staff = self.staff.availability().await?;

        let mut board = self.board.write().await;
        let admission = board.admit(subject_id, patient.display_name, severity_estimate, staff)?;
        self.refresh_queue_lengths(&board);
        Ok(admission)
    }

    /// 只读预估，不改变任何状态
    pub async fn estimate(&self, subject_id: Option<&SubjectId>, severity: Severity) -> Result<Projection> {
        let staff = self.staff.availability().await?;
        let board = self.board.read().await;
        board.estimate(subject_id, severity, staff)
    }

    pub async fn promote(&self, subject_id: &SubjectId, severity_official: Severity) -> Result<Promotion> {
        let result = {
            let mut board = self.board.write().await;
            let result = board.promote(subject_id, severity_official);
            self.refresh_queue_lengths(&board);
            result
        };
        self.observe("promote", result)
    }

    pub async fn complete(&self, subject_id: &SubjectId) -> Result<Completion> {
        let result = {
            let mut board = self.board.write().await;
            let result = board.complete(subject_id);
            self.refresh_queue_lengths(&board);
            result
        };
        self.observe("complete", result)
    }

    /// 患者状态及其允许的后续事件，取自同一快照
    pub async fn status(&self, subject_id: &SubjectId) -> Result<(QueueStatus, Vec<IntakeEvent>)> {
        let staff = self.staff.availability().await?;
        let board = self.board.read().await;
        let status = board.status(subject_id, staff)?;
        Ok((status, board.next_events(subject_id)))
    }

    /// 队列条目快照，按位置排序
    pub async fn entries(&self, queue: QueueKind) -> Vec<QueueEntry> {
        let board = self.board.read().await;
        match queue {
            QueueKind::Triage => board.triage().entries().to_vec(),
            QueueKind::Attendance => board.attendance().entries().to_vec(),
        }
    }

    fn refresh_queue_lengths(&self, board: &QueueBoard) {
        self.metrics.set_queue_length(QueueKind::Triage, board.triage().len());
        self.metrics.set_queue_length(QueueKind::Attendance, board.attendance().len());
    }

    fn observe<T>(&self, event: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.metrics.record_transition(event),
            Err(e) => {
                warn!("{} rejected: {}", event, e);
                self.metrics.record_rejection(e);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::StaffAvailability;
    use intake_integration::{InMemoryIdentityStore, InMemoryStaffRegistry, PatientRecord, UnconfiguredClassifier};

    fn id(raw: &str) -> SubjectId {
        SubjectId::parse(raw).unwrap()
    }

    fn service_with(patients: &[&str], staff: StaffAvailability) -> IntakeService {
        let identity = InMemoryIdentityStore::with_patients(patients.iter().map(|raw| PatientRecord {
            subject_id: id(raw),
            display_name: format!("Patient {}", raw),
        }));
        IntakeService::new(
            QueueBoard::default(),
            Arc::new(identity),
            Arc::new(InMemoryStaffRegistry::new(staff)),
            Arc::new(UnconfiguredClassifier),
            IntakeMetrics::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_admit_requires_registered_patient() {
        let service = service_with(&["a"], StaffAvailability::new(1, 1));

        let admission = service.admit(id("a"), Severity::Light).await.unwrap();
        assert_eq!(admission.position, 1);

        let missing = service.admit(id("b"), Severity::Light).await;
        assert!(matches!(missing, Err(IntakeError::NotFound(_))));

        assert_eq!(service.metrics().transitions("admit"), 1);
        assert_eq!(service.metrics().queue_length(QueueKind::Triage), 1);
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let service = service_with(&["a", "b"], StaffAvailability::new(1, 1));
        service.admit(id("a"), Severity::Light).await.unwrap();
        service.admit(id("b"), Severity::Light).await.unwrap();

        let promotion = service.promote(&id("a"), Severity::Severe).await.unwrap();
        assert_eq!(promotion.position, 1);

        let (status, next_events) = service.status(&id("a")).await.unwrap();
        assert_eq!(status, QueueStatus::Waiting { position: 1, estimated_wait: 70 });
        assert_eq!(next_events, vec![IntakeEvent::Complete]);

        let completion = service.complete(&id("a")).await.unwrap();
        assert_eq!(completion.display_name, "Patient a");
        assert!(service.entries(QueueKind::Attendance).await.is_empty());
        assert_eq!(service.entries(QueueKind::Triage).await.len(), 1);
        assert_eq!(service.metrics().queue_length(QueueKind::Attendance), 0);
    }

    #[tokio::test]
    async fn test_symptoms_without_classifier() {
        let service = service_with(&["a"], StaffAvailability::new(1, 1));
        let result = service.admit_with_symptoms(id("a"), "chest pain").await;
        assert!(matches!(result, Err(IntakeError::Integration(_))));
        assert!(service.entries(QueueKind::Triage).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_admission() {
        let service = service_with(&["same"], StaffAvailability::new(2, 2));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.admit(id("same"), Severity::Moderate).await })
            })
            .collect();

        let mut successes = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(IntakeError::DuplicateSubject(_)) => duplicates += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(service.entries(QueueKind::Triage).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mutations_keep_positions_contiguous() {
        let names: Vec<String> = (0..40).map(|i| format!("p{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let service = service_with(&refs, StaffAvailability::new(3, 3));

        // 先让一半患者进入接诊队列
        for name in &names[..20] {
            service.admit(id(name), Severity::Light).await.unwrap();
            service.promote(&id(name), Severity::Light).await.unwrap();
        }

        let mut handles = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let service = service.clone();
            let name = name.clone();
            handles.push(tokio::spawn(async move {
                if i < 20 {
                    service.complete(&id(&name)).await.map(|_| ())
                } else {
                    service.admit(id(&name), Severity::Severe).await.map(|_| ())
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let triage = service.entries(QueueKind::Triage).await;
        let positions: Vec<u32> = triage.iter().map(|e| e.position).collect();
        assert_eq!(positions, (1..=20).collect::<Vec<u32>>());
        assert!(service.entries(QueueKind::Attendance).await.is_empty());
    }
}
