// ==========================================
// 供应链管理系统 - 定额监控守护进程
// ==========================================
// 按 cycle_interval_secs 周期执行评估, Ctrl-C 退出
// 环境变量:
// - PSM_QUOTA_DB_PATH: 数据库路径
// - PSM_QUOTA_FEED_PATH: 库存读数 CSV 馈送 (文件变化后才重新接入)
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use psm_quota_engine::api::{ApiResult, MonitorApi};
use psm_quota_engine::app::{get_default_db_path, AppState};
use psm_quota_engine::config::{QuotaEngineConfigReader, QuotaEngineParams};
use psm_quota_engine::engine::CycleReport;
use psm_quota_engine::importer::SnapshotFeedReader;
use psm_quota_engine::{i18n, logging};
use tokio::time::MissedTickBehavior;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", psm_quota_engine::APP_NAME);
    tracing::info!("系统版本: {}", psm_quota_engine::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let locale = state
        .config_manager
        .get_alert_locale()
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    i18n::set_locale(&locale);

    let interval_secs = state
        .config_manager
        .get_cycle_interval_secs()
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    let feed_path = std::env::var("PSM_QUOTA_FEED_PATH")
        .ok()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);
    tracing::info!(interval_secs, feed = ?feed_path, "定额监控已启动");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_feed_mtime: Option<SystemTime> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let feed = take_changed_feed(feed_path.as_ref(), &mut last_feed_mtime);
                run_once(state.monitor_api.clone(), feed).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到退出信号，定额监控停止");
                break;
            }
        }
    }

    Ok(())
}

/// 馈送文件自上次接入后有变化时返回其路径
fn take_changed_feed(path: Option<&PathBuf>, last_mtime: &mut Option<SystemTime>) -> Option<PathBuf> {
    let path = path?;
    let mtime = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(mtime) => mtime,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "馈送文件不可读，本周期仅用已存快照");
            return None;
        }
    };
    if *last_mtime == Some(mtime) {
        return None;
    }
    *last_mtime = Some(mtime);
    Some(path.clone())
}

async fn run_once(api: Arc<MonitorApi>, feed: Option<PathBuf>) {
    let params = match api.load_params().await {
        Ok(params) => params,
        Err(e) => {
            tracing::warn!(error = %e, "配置读取失败，使用默认参数");
            QuotaEngineParams::default()
        }
    };

    let joined = tokio::task::spawn_blocking(move || -> ApiResult<CycleReport> {
        let readings = match feed {
            Some(path) => {
                let feed = SnapshotFeedReader::new().read_file(&path)?;
                for rejected in &feed.rejected {
                    tracing::warn!(row = rejected.row, reason = %rejected.reason, "馈送行未接入");
                }
                feed.readings
            }
            None => Vec::new(),
        };
        api.run_cycle_with(params, &readings)
    })
    .await;

    match joined {
        Ok(Ok(report)) => {
            for warning in &report.warnings {
                tracing::debug!(cycle_id = %report.cycle_id, "{}", warning);
            }
        }
        Ok(Err(e)) => tracing::error!(error = %e, "评估周期失败"),
        Err(e) => tracing::error!(error = %e, "评估周期任务异常退出"),
    }
}
