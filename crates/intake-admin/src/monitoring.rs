//! 队列监控指标
//!
//! 以Prometheus文本格式导出队列长度、转换次数与拒绝次数

use anyhow::Result;
use intake_core::{IntakeError, QueueKind};
use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

/// 分诊系统指标
#[derive(Debug, Clone)]
pub struct IntakeMetrics {
    registry: Registry,
    /// 成功的状态转换次数，按事件区分
    transitions_total: IntCounterVec,
    /// 被拒绝的操作次数，按错误类别区分
    rejections_total: IntCounterVec,
    queue_length: IntGaugeVec,
}

impl IntakeMetrics {
    /// 创建指标并注册到独立的注册表
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let transitions_total = IntCounterVec::new(
            Opts::new("intake_transitions_total", "Total number of queue transitions"),
            &["event"],
        )?;

        let rejections_total = IntCounterVec::new(
            Opts::new("intake_rejections_total", "Total number of rejected queue operations"),
            &["kind"],
        )?;

        let queue_length = IntGaugeVec::new(
            Opts::new("intake_queue_length", "Current number of entries per queue"),
            &["queue"],
        )?;

        registry.register(Box::new(transitions_total.clone()))?;
        registry.register(Box::new(rejections_total.clone()))?;
        registry.register(Box::new(queue_length.clone()))?;

        Ok(Self {
            registry,
            transitions_total,
            rejections_total,
            queue_length,
        })
    }

    pub fn record_transition(&self, event: &str) {
        self.transitions_total.with_label_values(&[event]).inc();
    }

    pub fn record_rejection(&self, error: &IntakeError) {
        debug!("Recording rejection: {}", error.kind());
        self.rejections_total.with_label_values(&[error.kind()]).inc();
    }

    pub fn set_queue_length(&self, queue: QueueKind, length: usize) {
        self.queue_length
            .with_label_values(&[queue.as_str()])
            .set(length as i64);
    }

    pub fn transitions(&self, event: &str) -> u64 {
        self.transitions_total.with_label_values(&[event]).get()
    }

    pub fn queue_length(&self, queue: QueueKind) -> i64 {
        self.queue_length.with_label_values(&[queue.as_str()]).get()
    }

    /// 导出Prometheus文本格式
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
