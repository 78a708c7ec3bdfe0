// ==========================================
// 供应链管理系统 - 字段映射器
// ==========================================
// 职责: 原始记录 → 标准字段 + 类型转换
// 列名同时接受英文标准名与中文台账列名
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRecord;
use chrono::{NaiveDate, NaiveDateTime};

/// 标准字段 → 可接受的列名
fn aliases(key: &str) -> &'static [&'static str] {
    match key {
        "part_id" => &["part_id", "部件ID", "编号"],
        "drawing_no" => &["drawing_no", "图号"],
        "part_name" => &["part_name", "名称", "部件名称"],
        "low_quota" => &["low_quota", "低储"],
        "reserve_quota" => &["reserve_quota", "储备"],
        "high_quota" => &["high_quota", "高储"],
        "current_stock" => &["current_stock", "当前库存", "当前"],
        "pending_supply_qty" => &["pending_supply_qty", "在途量"],
        "ordered_qty" => &["ordered_qty", "供货量"],
        "arrived_qty" => &["arrived_qty", "到货量"],
        "observed_at" => &["observed_at", "观测时间"],
        _ => &[],
    }
}

pub struct FieldMapper;

impl FieldMapper {
    /// 提取字段文本 (空单元格视为缺失)
    pub fn get_string<'a>(&self, row: &'a RawRecord, key: &str) -> Option<&'a str> {
        aliases(key)
            .iter()
            .filter_map(|alias| row.get(*alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    pub fn require_string(&self, row: &RawRecord, key: &str, row_number: usize) -> ImportResult<String> {
        self.get_string(row, key)
            .map(str::to_string)
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: key.to_string(),
            })
    }

    /// 解析整数 (允许千分位逗号)
    pub fn parse_i64(&self, row: &RawRecord, key: &str, row_number: usize) -> ImportResult<Option<i64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value
                .replace(',', "")
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为整数: {}", value),
                }),
        }
    }

    pub fn require_i64(&self, row: &RawRecord, key: &str, row_number: usize) -> ImportResult<i64> {
        self.parse_i64(row, key, row_number)?
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: key.to_string(),
            })
    }

    /// 解析时间
    ///
    /// # 支持格式
    /// - YYYY-MM-DD HH:MM:SS[.fff]
    /// - YYYY-MM-DDTHH:MM:SS[.fff]
    /// - YYYY-MM-DD / YYYYMMDD (按 00:00:00)
    pub fn require_datetime(
        &self,
        row: &RawRecord,
        key: &str,
        row_number: usize,
    ) -> ImportResult<NaiveDateTime> {
        let value = self
            .get_string(row, key)
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: key.to_string(),
            })?;

        parse_datetime(value).ok_or_else(|| ImportError::DateFormatError {
            row: row_number,
            field: key.to_string(),
            value: value.to_string(),
        })
    }
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_chinese_alias() {
        let r = row(&[("部件ID", "Q001"), ("当前库存", "1,200")]);
        assert_eq!(FieldMapper.require_string(&r, "part_id", 2).unwrap(), "Q001");
        assert_eq!(FieldMapper.require_i64(&r, "current_stock", 2).unwrap(), 1200);
        assert_eq!(FieldMapper.parse_i64(&r, "pending_supply_qty", 2).unwrap(), None);
    }

    #[test]
    fn test_bad_integer() {
        let r = row(&[("current_stock", "abc")]);
        assert!(matches!(
            FieldMapper.require_i64(&r, "current_stock", 3),
            Err(ImportError::TypeConversionError { row: 3, .. })
        ));
    }

    #[test]
    fn test_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2026-03-01 08:00:00"), Some(expected));
        assert_eq!(parse_datetime("2026-03-01T08:00:00"), Some(expected));
        assert_eq!(
            parse_datetime("20260301"),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_datetime("03/01/2026"), None);
    }
}
