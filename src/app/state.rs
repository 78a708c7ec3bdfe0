// ==========================================
// 供应链管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接、仓储与 API 实例
// 约束: 所有仓储共享同一连接 (Arc<Mutex<Connection>>)
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{MonitorApi, PlanEntryApi, QuotaApi};
use crate::config::ConfigManager;
use crate::db::open_and_migrate;
use crate::engine::{QuotaRegistry, StockSnapshotIngester};
use crate::repository::{
    AlertRepository, PlanEntryRepository, StockQuotaRepository, StockSnapshotRepository,
};

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 储备定额API
    pub quota_api: Arc<QuotaApi>,

    /// 采购计划条目API
    pub plan_entry_api: Arc<PlanEntryApi>,

    /// 定额监控API
    pub monitor_api: Arc<MonitorApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 定额登记 (夹具加载使用)
    pub quota_registry: Arc<QuotaRegistry>,

    /// 快照接入 (夹具加载使用)
    pub snapshot_ingester: Arc<StockSnapshotIngester>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径 (不存在时创建并建表)
    ///
    /// # 返回
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_and_migrate(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 基于已有连接装配 (连接需已建表)
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let quota_repo = Arc::new(StockQuotaRepository::from_connection(conn.clone()));
        let snapshot_repo = Arc::new(StockSnapshotRepository::from_connection(conn.clone()));
        let plan_repo = Arc::new(PlanEntryRepository::from_connection(conn.clone()));
        let alert_repo = Arc::new(AlertRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let quota_registry = Arc::new(QuotaRegistry::new(quota_repo));
        let snapshot_ingester = Arc::new(StockSnapshotIngester::new(snapshot_repo.clone()));

        // ==========================================
        // 初始化API层
        // ==========================================
        let quota_api = Arc::new(QuotaApi::new(quota_registry.clone()));
        let plan_entry_api = Arc::new(PlanEntryApi::new(plan_repo.clone(), quota_registry.clone()));
        let monitor_api = Arc::new(MonitorApi::new(
            quota_registry.clone(),
            snapshot_repo,
            plan_repo,
            alert_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            quota_api,
            plan_entry_api,
            monitor_api,
            config_manager,
            quota_registry,
            snapshot_ingester,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 PSM_QUOTA_DB_PATH (非空时)
/// - 开发环境: 用户数据目录/psm-quota-engine-dev/psm_quota.db
/// - 生产环境: 用户数据目录/psm-quota-engine/psm_quota.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("PSM_QUOTA_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./psm_quota.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("psm-quota-engine-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("psm-quota-engine");
        }

        // 目录创建失败时由打开数据库报错
        std::fs::create_dir_all(&path).ok();
        path = path.join("psm_quota.db");
    }

    path.to_string_lossy().to_string()
}
