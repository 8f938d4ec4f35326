//! 分诊服务器主程序

use anyhow::Context;
use clap::Parser;
use intake_admin::{init_logging, IntakeConfig, IntakeMetrics};
use intake_core::{StaffAvailability, SubjectId};
use intake_integration::{
    HttpSeverityClassifier, InMemoryIdentityStore, InMemoryStaffRegistry, PatientRecord,
    SeverityClassifier, UnconfiguredClassifier,
};
use intake_web::{IntakeService, WebServer};
use intake_workflow::{QueueBoard, SeverityTable};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 分诊服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "intake-server")]
#[command(about = "门诊分诊排队与等待时间估算服务")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 监听地址，覆盖配置
    #[arg(long)]
    host: Option<String>,

    /// 监听端口，覆盖配置
    #[arg(short, long)]
    port: Option<u16>,

    /// 日志级别，覆盖配置
    #[arg(short, long)]
    log_level: Option<String>,

    /// 输出生效配置后退出
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = IntakeConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    // 初始化日志
    init_logging(&config.logging, args.log_level.as_deref())?;

    info!("启动分诊服务器...");
    info!("  配置来源: {}", args.config.as_deref().unwrap_or("defaults + environment"));
    info!("  监听地址: {}", config.listen_addr());
    info!("  分诊时隙: {} 分钟", config.queue.triage_slot_minutes);
    info!(
        "  可用人员: 分诊 {} / 接诊 {}",
        config.staff.triage, config.staff.attendance
    );

    let service = build_service(&config)?;
    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.listen_addr()))?;

    if let Err(e) = WebServer::new(addr, service).run(shutdown_signal()).await {
        error!("服务器运行失败: {}", e);
        return Err(e);
    }

    info!("分诊服务器已停止");
    Ok(())
}

/// 构建队列看板与协作方
fn build_service(config: &IntakeConfig) -> anyhow::Result<IntakeService> {
    let durations = &config.queue.durations;
    let table = SeverityTable::new(durations.light, durations.moderate, durations.severe)?;
    let board = QueueBoard::new(table, config.queue.triage_slot_minutes)?;

    let patients = config
        .patients
        .iter()
        .map(|seed| {
            Ok(PatientRecord {
                subject_id: SubjectId::parse(&seed.subject_id)?,
                display_name: seed.display_name.clone(),
            })
        })
        .collect::<intake_core::Result<Vec<_>>>()?;
    info!("  登记患者: {}", patients.len());
    let identity = InMemoryIdentityStore::with_patients(patients);

    let staff = InMemoryStaffRegistry::new(StaffAvailability::new(
        config.staff.triage,
        config.staff.attendance,
    ));

    let classifier: Arc<dyn SeverityClassifier> = match &config.classifier.endpoint {
        Some(endpoint) => {
            info!("  症状分类服务: {}", endpoint);
            Arc::new(HttpSeverityClassifier::new(
                endpoint.clone(),
                Duration::from_secs(config.classifier.timeout_secs),
                config.classifier.api_key.clone(),
            )?)
        }
        None => {
            warn!("未配置症状分类服务，入队请求必须提供严重程度");
            Arc::new(UnconfiguredClassifier)
        }
    };

    Ok(IntakeService::new(
        board,
        Arc::new(identity),
        Arc::new(staff),
        classifier,
        IntakeMetrics::new()?,
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
