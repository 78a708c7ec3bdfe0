// ==========================================
// 供应链管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 并发: 所有仓储共享同一个 Arc<Mutex<Connection>>,
//       保护不变量的读-查-写序列在 IMMEDIATE 事务内完成
// ==========================================

pub mod alert_repo;
pub mod error;
pub mod plan_entry_repo;
pub mod quota_repo;
pub mod snapshot_repo;

// 重导出核心仓储
pub use alert_repo::AlertRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use plan_entry_repo::{AutoEntryOutcome, PlanEntryRepository};
pub use quota_repo::{QuotaDeleteOutcome, StockQuotaRepository};
pub use snapshot_repo::{SnapshotWriteOutcome, StockSnapshotRepository};
