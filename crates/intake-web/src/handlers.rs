//! HTTP处理器

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use intake_core::{utils::format_minutes, IntakeError, QueueEntry, QueueKind, Severity, SubjectId};
use intake_workflow::QueueStatus;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::service::IntakeService;

/// 处理器统一结果类型
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// 对外暴露的错误，包装核心错误并映射HTTP状态码
#[derive(Debug)]
pub struct ApiError(pub IntakeError);

impl From<IntakeError> for ApiError {
    fn from(error: IntakeError) -> Self {
        Self(error)
    }
}

// 请求体或查询参数无法解析时按校验错误返回400
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(IntakeError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(IntakeError::Validation(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            IntakeError::DuplicateSubject(_) => StatusCode::CONFLICT,
            IntakeError::NotFound(_) => StatusCode::NOT_FOUND,
            IntakeError::UnknownSeverity(_) => StatusCode::BAD_REQUEST,
            IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::NoStaffAvailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            IntakeError::InvalidTransition { .. } => StatusCode::CONFLICT,
            IntakeError::Integration(_) => StatusCode::BAD_GATEWAY,
            IntakeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            IntakeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": true,
            "kind": self.0.kind(),
            "message": self.0.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Intake Queue API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "metrics": "/metrics",
            "api": "/api/v1"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus指标
pub async fn metrics(State(service): State<IntakeService>) -> Response {
    match service.metrics().export() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => ApiError(IntakeError::Internal(e.to_string())).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct AdmitRequest {
    pub subject_id: String,
    pub severity: Option<String>,
    pub symptoms: Option<String>,
}

/// 患者进入分诊队列
pub async fn admit(
    State(service): State<IntakeService>,
    payload: Result<Json<AdmitRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let subject_id = SubjectId::parse(&request.subject_id)?;
    info!("Admission request for {}", subject_id);

    let admission = match (request.severity.as_deref(), request.symptoms.as_deref()) {
        (Some(label), _) => service.admit(subject_id, label.parse()?).await?,
        (None, Some(symptoms)) => service.admit_with_symptoms(subject_id, symptoms).await?,
        (None, None) => {
            return Err(IntakeError::Validation("either severity or symptoms is required".into()).into());
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "subject_id": admission.subject_id,
            "position": admission.position,
            "estimated_triage_time": admission.estimated_triage_time,
            "estimated_attendance_time": admission.estimated_attendance_time,
            "estimated_attendance_display": format_minutes(admission.estimated_attendance_time)
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    pub subject_id: Option<String>,
    pub severity: String,
}

/// "如果现在入队"的只读预估
pub async fn estimate(
    State(service): State<IntakeService>,
    query: Result<Query<EstimateQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let severity: Severity = query.severity.parse()?;
    let subject_id = query
        .subject_id
        .as_deref()
        .map(SubjectId::parse)
        .transpose()?;

    let projection = service.estimate(subject_id.as_ref(), severity).await?;

    Ok(Json(json!({
        "position": projection.position,
        "estimated_triage_time": projection.estimated_triage_time,
        "estimated_attendance_time": projection.estimated_attendance_time,
        "estimated_attendance_display": format_minutes(projection.estimated_attendance_time)
    })))
}

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub severity: String,
}

/// 员工确认严重程度
pub async fn promote(
    State(service): State<IntakeService>,
    Path(subject_id): Path<String>,
    payload: Result<Json<PromoteRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let subject_id = SubjectId::parse(&subject_id)?;
    let severity: Severity = request.severity.parse()?;

    let promotion = service.promote(&subject_id, severity).await?;

    Ok(Json(json!({
        "ok": true,
        "subject_id": promotion.subject_id,
        "severity": promotion.severity,
        "position": promotion.position
    })))
}

/// 患者状态：评估未完成返回202
pub async fn status(
    State(service): State<IntakeService>,
    Path(subject_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let subject_id = SubjectId::parse(&subject_id)?;

    let (status, next_events) = service.status(&subject_id).await?;
    let response = match status {
        QueueStatus::Pending { triage_position } => (
            StatusCode::ACCEPTED,
            Json(json!({
                "pending": true,
                "triage_position": triage_position,
                "next_events": next_events
            })),
        ),
        QueueStatus::Waiting { position, estimated_wait } => (
            StatusCode::OK,
            Json(json!({
                "position": position,
                "estimated_wait": estimated_wait,
                "estimated_wait_display": format_minutes(estimated_wait),
                "next_events": next_events
            })),
        ),
    };

    Ok(response)
}

/// 接诊完成
pub async fn complete(
    State(service): State<IntakeService>,
    Path(subject_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let subject_id = SubjectId::parse(&subject_id)?;
    let completion = service.complete(&subject_id).await?;

    Ok(Json(json!({
        "removed_subject_id": completion.removed_subject_id,
        "severity": completion.severity,
        "display_name": completion.display_name
    })))
}

pub async fn triage_queue(State(service): State<IntakeService>) -> Json<Value> {
    queue_listing(QueueKind::Triage, service.entries(QueueKind::Triage).await)
}

pub async fn attendance_queue(State(service): State<IntakeService>) -> Json<Value> {
    queue_listing(QueueKind::Attendance, service.entries(QueueKind::Attendance).await)
}

fn queue_listing(queue: QueueKind, entries: Vec<QueueEntry>) -> Json<Value> {
    let items: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "position": entry.position,
                "subject_id": entry.subject_id,
                "display_name": entry.display_name,
                "severity_estimate": entry.severity_estimate,
                "severity_official": entry.severity_official,
                "admitted_at": entry.admitted_at.to_rfc3339()
            })
        })
        .collect();

    Json(json!({
        "queue": queue.as_str(),
        "entries": items,
        "total": entries.len()
    }))
}
