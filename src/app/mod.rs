// ==========================================
// 供应链管理系统 - 应用层
// ==========================================
// 职责: 装配仓储/引擎/API, 供守护进程与命令行工具使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
