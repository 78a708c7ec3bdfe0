// ==========================================
// 供应链管理系统 - 确定性夹具加载
// ==========================================
// 职责: 从 CSV 夹具加载定额与库存快照 (演示库/测试库)
// 约束: 相同夹具多次加载结果一致; 不使用随机数
// 文件: <dir>/quotas.csv, <dir>/snapshots.csv
// ==========================================

use crate::domain::quota::StockQuota;
use crate::engine::quota_registry::QuotaRegistry;
use crate::engine::snapshot_ingester::{IngestBatchReport, StockSnapshotIngester};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{CsvParser, FileParser};
use crate::importer::snapshot_feed::{RejectedRow, SnapshotFeedReader};
use serde::Serialize;
use std::path::Path;

pub const QUOTA_FIXTURE_FILE: &str = "quotas.csv";
pub const SNAPSHOT_FIXTURE_FILE: &str = "snapshots.csv";

/// 夹具加载报告
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixtureLoadReport {
    pub quotas_loaded: usize,
    pub snapshots: IngestBatchReport,
    pub rejected_rows: Vec<RejectedRow>,
}

// ==========================================
// FixtureLoader - 夹具加载
// ==========================================
pub struct FixtureLoader<'a> {
    registry: &'a QuotaRegistry,
    ingester: &'a StockSnapshotIngester,
}

impl<'a> FixtureLoader<'a> {
    pub fn new(registry: &'a QuotaRegistry, ingester: &'a StockSnapshotIngester) -> Self {
        Self { registry, ingester }
    }

    /// 加载目录下的定额与快照夹具
    pub fn load_dir<P: AsRef<Path>>(&self, dir: P) -> ImportResult<FixtureLoadReport> {
        let dir = dir.as_ref();
        let quotas_loaded = self.load_quotas(dir.join(QUOTA_FIXTURE_FILE))?;

        let feed = SnapshotFeedReader::new().read_file(dir.join(SNAPSHOT_FIXTURE_FILE))?;
        let snapshots = self.ingester.ingest_batch(&feed.readings);

        tracing::info!(
            dir = %dir.display(),
            quotas = quotas_loaded,
            snapshots = snapshots.accepted.len(),
            "夹具加载完成"
        );

        Ok(FixtureLoadReport {
            quotas_loaded,
            snapshots,
            rejected_rows: feed.rejected,
        })
    }

    /// 加载定额夹具 (任一行非法即失败, 已写入的行保留)
    pub fn load_quotas<P: AsRef<Path>>(&self, path: P) -> ImportResult<usize> {
        let records = CsvParser.parse_to_raw_records(path.as_ref())?;
        let mapper = FieldMapper;

        for (idx, record) in records.iter().enumerate() {
            let row = idx + 2;
            let quota = StockQuota::new(
                mapper.require_string(record, "part_id", row)?,
                mapper.get_string(record, "drawing_no").unwrap_or_default(),
                mapper.get_string(record, "part_name").unwrap_or_default(),
                mapper.require_i64(record, "low_quota", row)?,
                mapper.require_i64(record, "reserve_quota", row)?,
                mapper.require_i64(record, "high_quota", row)?,
            );
            self.registry
                .upsert(&quota)
                .map_err(|source| ImportError::RowRejected { row, source })?;
        }

        Ok(records.len())
    }
}
