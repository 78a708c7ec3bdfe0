// ==========================================
// 供应链管理系统 - 库存读数 CSV 馈送
// ==========================================
// 职责: CSV 文件 → StockReading 列表 (不落库, 交由评估周期接入)
// 列: part_id, current_stock, pending_supply_qty?, ordered_qty?, arrived_qty?, observed_at
// 规则:
// - 同一 (part_id, observed_at) 的多行合并为一条读数, 每行的
//   供货量/到货量作为一条在途明细
// - 单行解析失败只拒绝该行, 不影响其他行
// - 数量列为负的行在合并前拒绝; 合并后溢出的行同样拒绝
// ==========================================

use crate::domain::snapshot::{StockReading, SupplyLine};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{CsvParser, FileParser, RawRecord};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// 被拒绝的馈送行
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub reason: String,
}

/// 馈送解析结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct SnapshotFeed {
    pub readings: Vec<StockReading>,
    pub rejected: Vec<RejectedRow>,
}

// ==========================================
// SnapshotFeedReader - 库存读数馈送
// ==========================================
pub struct SnapshotFeedReader {
    parser: CsvParser,
    mapper: FieldMapper,
}

impl Default for SnapshotFeedReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotFeedReader {
    pub fn new() -> Self {
        Self {
            parser: CsvParser,
            mapper: FieldMapper,
        }
    }

    /// 读取馈送文件
    ///
    /// # 错误
    /// 文件不存在/格式不支持/CSV 结构损坏时返回错误; 行级错误记入 rejected
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> ImportResult<SnapshotFeed> {
        let path = path.as_ref();
        let records = self.parser.parse_to_raw_records(path)?;
        let feed = self.map_records(&records);
        tracing::info!(
            path = %path.display(),
            readings = feed.readings.len(),
            rejected = feed.rejected.len(),
            "库存读数馈送解析完成"
        );
        Ok(feed)
    }

    /// 从读取器解析 (如标准输入)
    pub fn read_from<R: std::io::Read>(&self, source: R) -> ImportResult<SnapshotFeed> {
        let records = self.parser.parse_reader(source)?;
        Ok(self.map_records(&records))
    }

    fn map_records(&self, records: &[RawRecord]) -> SnapshotFeed {
        let mut feed = SnapshotFeed::default();
        let mut index: HashMap<(String, NaiveDateTime), usize> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            let row_number = idx + 2; // 第 1 行为表头
            let mapped = self.map_row(record, row_number).and_then(|(reading, line)| {
                let key = (reading.part_id.clone(), reading.observed_at);
                match index.get(&key) {
                    Some(&pos) => merge_into(&mut feed.readings[pos], reading, line, row_number),
                    None => {
                        index.insert(key, feed.readings.len());
                        let mut reading = reading;
                        reading.supply_lines.extend(line);
                        feed.readings.push(reading);
                        Ok(())
                    }
                }
            });

            if let Err(e) = mapped {
                tracing::warn!(row = row_number, error = %e, "馈送行被拒绝");
                feed.rejected.push(RejectedRow {
                    row: row_number,
                    reason: e.to_string(),
                });
            }
        }

        feed
    }

    fn map_row(
        &self,
        record: &RawRecord,
        row_number: usize,
    ) -> ImportResult<(StockReading, Option<SupplyLine>)> {
        let part_id = self.mapper.require_string(record, "part_id", row_number)?;
        let current_stock = self.mapper.require_i64(record, "current_stock", row_number)?;
        let pending_supply_qty = self
            .mapper
            .parse_i64(record, "pending_supply_qty", row_number)?;
        let observed_at = self
            .mapper
            .require_datetime(record, "observed_at", row_number)?;

        let ordered = self.mapper.parse_i64(record, "ordered_qty", row_number)?;
        let arrived = self.mapper.parse_i64(record, "arrived_qty", row_number)?;
        let line = match (ordered, arrived) {
            (None, None) => None,
            (Some(ordered_qty), arrived) => Some(SupplyLine {
                ordered_qty,
                arrived_qty: arrived.unwrap_or(0),
            }),
            (None, Some(_)) => {
                return Err(ImportError::MissingField {
                    row: row_number,
                    field: "ordered_qty".to_string(),
                })
            }
        };

        for (field, value) in [
            ("current_stock", Some(current_stock)),
            ("pending_supply_qty", pending_supply_qty),
            ("ordered_qty", ordered),
            ("arrived_qty", arrived),
        ] {
            if let Some(value) = value.filter(|v| *v < 0) {
                return Err(ImportError::InvalidQuantity {
                    row: row_number,
                    field: field.to_string(),
                    value,
                });
            }
        }

        let reading = StockReading {
            part_id,
            current_stock,
            pending_supply_qty,
            supply_lines: Vec::new(),
            observed_at,
        };
        Ok((reading, line))
    }
}

/// 合并同一时刻的后续行: 在途明细追加, 显式在途量累加, 现有库存以首行为准
///
/// 累加溢出时拒绝该行, 目标读数保持不变
fn merge_into(
    target: &mut StockReading,
    extra: StockReading,
    line: Option<SupplyLine>,
    row_number: usize,
) -> ImportResult<()> {
    if let Some(extra_pending) = extra.pending_supply_qty {
        let merged = target
            .pending_supply_qty
            .unwrap_or(0)
            .checked_add(extra_pending)
            .ok_or_else(|| ImportError::TypeConversionError {
                row: row_number,
                field: "pending_supply_qty".to_string(),
                message: "合并后的在途量超出 i64 范围".to_string(),
            })?;
        target.pending_supply_qty = Some(merged);
    }
    target.supply_lines.extend(line);
    Ok(())
}
