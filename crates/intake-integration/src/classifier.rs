//! 症状分类服务适配器
//!
//! 外部文本分类服务根据自由文本症状返回严重程度。
//! 适配器只向核心交付校验过的 `Severity`，从不传递原始文本。

use async_trait::async_trait;
use intake_core::{IntakeError, Result, Severity};
use regex::Regex;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// 症状分类接口
#[async_trait]
pub trait SeverityClassifier: Send + Sync {
    async fn classify(&self, symptoms: &str) -> Result<Severity>;
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

/// 基于HTTP的分类服务客户端
#[derive(Debug)]
pub struct HttpSeverityClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    label_pattern: Regex,
}

impl HttpSeverityClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IntakeError::Config(format!("failed to build classifier client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            label_pattern: label_pattern()?,
        })
    }
}

#[async_trait]
impl SeverityClassifier for HttpSeverityClassifier {
    async fn classify(&self, symptoms: &str) -> Result<Severity> {
        if symptoms.trim().is_empty() {
            return Err(IntakeError::Validation("symptoms cannot be empty".into()));
        }

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { text: symptoms });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Classifier request to {} failed: {}", self.endpoint, e);
            IntakeError::Integration(format!("classifier unreachable: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(IntakeError::Integration(format!(
                "classifier returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IntakeError::Integration(format!("failed to read classifier response: {}", e)))?;
        debug!("Classifier response: {}", body);

        extract_severity(&self.label_pattern, &body)
    }
}

/// 未配置分类服务时使用，所有调用都失败
#[derive(Debug, Default)]
pub struct UnconfiguredClassifier;

#[async_trait]
impl SeverityClassifier for UnconfiguredClassifier {
    async fn classify(&self, _symptoms: &str) -> Result<Severity> {
        Err(IntakeError::Integration("no symptom classifier configured".into()))
    }
}

fn label_pattern() -> Result<Regex> {
    Regex::new(r"(?i)\b(light|moderate|severe)\b")
        .map_err(|e| IntakeError::Internal(format!("invalid label pattern: {}", e)))
}

/// 在分类服务的响应中查找第一个已知标签
pub fn extract_severity(pattern: &Regex, body: &str) -> Result<Severity> {
    pattern
        .find(body)
        .ok_or_else(|| IntakeError::UnknownSeverity(body.trim().to_string()))?
        .as_str()
        .parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_plain_text() {
        let pattern = label_pattern().unwrap();
        assert_eq!(extract_severity(&pattern, "Severe").unwrap(), Severity::Severe);
        assert_eq!(extract_severity(&pattern, "  light\n").unwrap(), Severity::Light);
    }

    #[test]
    fn test_extract_from_json() {
        let pattern = label_pattern().unwrap();
        let body = r#"{"label": "MODERATE", "score": 0.91}"#;
        assert_eq!(extract_severity(&pattern, body).unwrap(), Severity::Moderate);
    }

    #[test]
    fn test_extract_requires_whole_word() {
        let pattern = label_pattern().unwrap();
        assert!(matches!(
            extract_severity(&pattern, "lightheaded"),
            Err(IntakeError::UnknownSeverity(_))
        ));
        assert!(matches!(
            extract_severity(&pattern, "critical"),
            Err(IntakeError::UnknownSeverity(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_classifier_fails() {
        let result = UnconfiguredClassifier.classify("chest pain").await;
        assert!(matches!(result, Err(IntakeError::Integration(_))));
    }

    #[tokio::test]
    async fn test_unreachable_classifier_is_integration_error() {
        let classifier =
            HttpSeverityClassifier::new("http://127.0.0.1:9/classify", Duration::from_secs(2), None).unwrap();
        let result = classifier.classify("headache").await;
        assert!(matches!(result, Err(IntakeError::Integration(_))));
    }

    #[tokio::test]
    async fn test_empty_symptoms_rejected() {
        let classifier =
            HttpSeverityClassifier::new("http://127.0.0.1:9/classify", Duration::from_secs(2), None).unwrap();
        let result = classifier.classify("   ").await;
        assert!(matches!(result, Err(IntakeError::Validation(_))));
    }
}
