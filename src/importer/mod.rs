// ==========================================
// 供应链管理系统 - 导入层
// ==========================================
// 职责: 外部数据导入 (库存读数馈送 / 演示夹具)
// 支持: CSV
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod fixture_loader;
pub mod snapshot_feed;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, FileParser, RawRecord};
pub use fixture_loader::{FixtureLoadReport, FixtureLoader};
pub use snapshot_feed::{RejectedRow, SnapshotFeed, SnapshotFeedReader};
