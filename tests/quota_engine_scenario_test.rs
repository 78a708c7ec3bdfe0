// ==========================================
// 定额监控端到端场景测试
// ==========================================
// 测试目标: 定额登记 → 快照接入 → 判定 → 补库规划 → 告警 全链路
// 覆盖: 场景 A-D, 规划/告警幂等, 定额删除保护, 接入边界值
// ==========================================


use psm_quota_engine::api::{ApiError, UpsertQuotaRequest};
use psm_quota_engine::config::QuotaEngineParams;
use psm_quota_engine::domain::{
    AlertKind, AlertSeverity, PlanEntryStatus, PlanSource, QuotaClassification, StockReading,
    SupplyLine,
};
use psm_quota_engine::engine::{GapReplenishmentPlanner, ThresholdEvaluator};
use psm_quota_engine::repository::PlanEntryRepository;
use std::sync::{Arc, Mutex};
use test_helpers::{
    create_test_db, create_test_state, open_test_connection, standard_quota, ts, ts_micro,
};

fn upsert_standard(state: &psm_quota_engine::app::AppState, part_id: &str) {
    state
        .quota_api
        .upsert_quota(UpsertQuotaRequest {
            part_id: part_id.to_string(),
            drawing_no: "DWG-100".to_string(),
            part_name: "齿轮 A-12".to_string(),
            low_quota: 100,
            reserve_quota: 500,
            high_quota: 1000,
        })
        .expect("定额写入失败");
}

#[tokio::test]
async fn test_scenario_a_shortage_creates_draft_of_415() {
    println!("\n=== 场景A: 低于低储生成补库草稿 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");

    let report = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 85, 0, ts(1, 8))])
        .await
        .unwrap();

    assert_eq!(report.statuses.len(), 1);
    assert_eq!(report.statuses[0].classification, QuotaClassification::Shortage);
    assert_eq!(report.gaps[0].suggested_qty, 415, "建议量应为 500-85");
    assert_eq!(report.gaps[0].deficit_qty, 15);

    assert_eq!(report.new_entries.len(), 1);
    let entry = &report.new_entries[0];
    assert_eq!(entry.quantity, 415);
    assert_eq!(entry.source, PlanSource::Auto);
    assert_eq!(entry.status, PlanEntryStatus::Draft);

    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].kind, AlertKind::Shortage);
    println!("✓ 场景A通过");
}

#[tokio::test]
async fn test_scenario_b_excess_creates_no_plan_entry() {
    println!("\n=== 场景B: 预计库存超高储仅告警 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");

    let report = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 300, 750, ts(1, 8))])
        .await
        .unwrap();

    assert_eq!(report.statuses[0].classification, QuotaClassification::Excess);
    assert_eq!(report.statuses[0].projected_stock, 1050);
    assert!(report.new_entries.is_empty(), "EXCESS 不应生成采购计划");
    assert!(state.plan_entry_api.list_by_part("Q001").unwrap().is_empty());

    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].kind, AlertKind::Excess);
    assert_eq!(report.alerts[0].quota, 1000);
    println!("✓ 场景B通过");
}

#[tokio::test]
async fn test_scenario_c_low_boundary_is_normal() {
    println!("\n=== 场景C: 等于低储判为正常 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");

    let report = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 100, 0, ts(1, 8))])
        .await
        .unwrap();

    assert_eq!(report.statuses[0].classification, QuotaClassification::Normal);
    assert!(report.new_entries.is_empty());
    assert!(report.alerts.is_empty(), "NORMAL 不应产生告警");
    println!("✓ 场景C通过");
}

#[tokio::test]
async fn test_scenario_d_consecutive_cycles_keep_single_open_auto_entry() {
    println!("\n=== 场景D: 连续两个周期仅一条未结自动条目 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");

    let first = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 50, 0, ts(1, 8))])
        .await
        .unwrap();
    let second = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 50, 0, ts(1, 9))])
        .await
        .unwrap();

    assert_eq!(first.new_entries.len(), 1);
    assert!(second.new_entries.is_empty(), "第二周期不应重复生成");
    let open = state.plan_entry_api.list_entries(true).unwrap();
    assert_eq!(open.len(), 1);

    // 新快照时刻产生新告警, 但条目仍唯一
    assert_eq!(second.new_alert_count, 1);
    println!("✓ 场景D通过");
}

#[tokio::test]
async fn test_approved_entry_still_blocks_and_ordered_entry_releases() {
    println!("\n=== 审批/下单对自动条目唯一性的影响 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");

    let first = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 50, 0, ts(1, 8))])
        .await
        .unwrap();
    let entry_id = first.new_entries[0].id.clone();

    state.plan_entry_api.approve(&entry_id).unwrap();
    let second = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 50, 0, ts(1, 9))])
        .await
        .unwrap();
    assert!(second.new_entries.is_empty(), "APPROVED 仍为未结, 不应新建");

    state.plan_entry_api.mark_ordered(&entry_id).unwrap();
    let third = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 50, 0, ts(1, 10))])
        .await
        .unwrap();
    assert_eq!(third.new_entries.len(), 1, "已下单后仍不足, 应生成新草稿");
    assert_eq!(state.plan_entry_api.list_entries(true).unwrap().len(), 1);
    println!("✓ 审批流转测试通过");
}

#[test]
fn test_plan_gaps_twice_is_idempotent() {
    println!("\n=== 补库规划幂等 ===");
    let (_tmp, state) = create_test_state().unwrap();
    state.quota_registry.upsert(&standard_quota("Q001")).unwrap();
    state.quota_registry.upsert(&standard_quota("Q002")).unwrap();

    let statuses = state.monitor_api.current_statuses().unwrap();
    assert!(statuses.is_empty(), "尚无快照时无判定结果");

    state
        .snapshot_ingester
        .ingest("Q001", 10, 0, ts(1, 8))
        .unwrap();
    state
        .snapshot_ingester
        .ingest("Q002", 20, 0, ts(1, 8))
        .unwrap();
    let statuses = state.monitor_api.current_statuses().unwrap();
    assert_eq!(statuses.len(), 2);

    let cycle = state.monitor_api.build_cycle(QuotaEngineParams::default());
    let first = cycle.run_cycle(&[]).unwrap();
    let second = cycle.run_cycle(&[]).unwrap();

    assert_eq!(first.new_entries.len(), 2);
    assert!(second.new_entries.is_empty());
    assert_eq!(state.plan_entry_api.list_entries(true).unwrap().len(), 2);
    println!("✓ 补库规划幂等通过");
}

#[test]
fn test_concurrent_planners_share_single_open_entry() {
    println!("\n=== 并发规划仍只有一条未结自动条目 ===");
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = Arc::new(Mutex::new(open_test_connection(&db_path).unwrap()));
    let state = psm_quota_engine::app::AppState::from_connection(db_path.clone(), conn).unwrap();
    state.quota_registry.upsert(&standard_quota("Q001")).unwrap();

    let evaluator = ThresholdEvaluator::new();
    let snapshot = psm_quota_engine::domain::StockSnapshot {
        part_id: "Q001".to_string(),
        current_stock: 50,
        pending_supply_qty: 0,
        observed_at: ts(1, 8),
    };
    let status = evaluator.evaluate(&standard_quota("Q001"), &snapshot);

    // 两个独立连接模拟两个进程
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = db_path.clone();
            let registry = state.quota_registry.clone();
            let status = status.clone();
            std::thread::spawn(move || {
                let conn = Arc::new(Mutex::new(open_test_connection(&path).unwrap()));
                let planner = GapReplenishmentPlanner::new(
                    Arc::new(PlanEntryRepository::from_connection(conn)),
                    registry,
                    1,
                );
                planner.plan_gaps(&[status]).created.len()
            })
        })
        .collect();

    let created: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(created, 1, "并发下只能有一个规划器成功写入");
    assert_eq!(state.plan_entry_api.list_by_part("Q001").unwrap().len(), 1);
    println!("✓ 并发规划通过");
}

#[tokio::test]
async fn test_emit_replay_keeps_same_dedup_keys() {
    println!("\n=== 告警重放去重 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");
    upsert_standard(&state, "Q002");

    let first = state
        .monitor_api
        .run_cycle(&[
            StockReading::new("Q001", 50, 0, ts(1, 8)),
            StockReading::new("Q002", 900, 500, ts(1, 8)),
        ])
        .await
        .unwrap();
    // 同一快照重放 (过期读数不覆盖)
    let second = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 50, 0, ts(1, 8))])
        .await
        .unwrap();

    assert_eq!(second.ingest.stale.len(), 1);
    assert_eq!(first.new_alert_count, 2);
    assert_eq!(second.new_alert_count, 0);

    let mut k1: Vec<_> = first.alerts.iter().map(|a| a.dedup_key.clone()).collect();
    let mut k2: Vec<_> = second.alerts.iter().map(|a| a.dedup_key.clone()).collect();
    k1.sort();
    k2.sort();
    assert_eq!(k1, k2);
    assert_eq!(state.monitor_api.list_alerts(None, None, None).unwrap().len(), 2);
    println!("✓ 告警重放去重通过");
}

#[tokio::test]
async fn test_quota_removal_guard() {
    println!("\n=== 定额删除保护 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");

    let report = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 50, 0, ts(1, 8))])
        .await
        .unwrap();

    let err = state.quota_api.remove_quota("Q001").unwrap_err();
    assert!(matches!(err, ApiError::QuotaInUse(_)), "未结条目存在时不可删除");

    state.plan_entry_api.reject(&report.new_entries[0].id).unwrap();
    state.quota_api.remove_quota("Q001").unwrap();
    assert!(matches!(
        state.quota_api.get_quota("Q001").unwrap_err(),
        ApiError::NotFound(_)
    ));

    // 删除后残留快照被报告为孤立快照
    let after = state.monitor_api.run_cycle(&[]).await.unwrap();
    assert!(after.statuses.is_empty());
    assert_eq!(after.warnings.len(), 1);
    assert_eq!(after.warnings[0].part_id(), "Q001");
    println!("✓ 定额删除保护通过");
}

#[tokio::test]
async fn test_invalid_quota_rejected_and_state_unchanged() {
    println!("\n=== 非法定额被拒绝 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");

    let err = state
        .quota_api
        .upsert_quota(UpsertQuotaRequest {
            part_id: "Q001".to_string(),
            drawing_no: "DWG-100".to_string(),
            part_name: "齿轮 A-12".to_string(),
            low_quota: 100,
            reserve_quota: 1200,
            high_quota: 1000,
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidQuotaRange(_)));

    let stored = state.quota_api.get_quota("Q001").unwrap();
    assert_eq!(stored.reserve_quota, 500);
    assert!(stored.low_quota <= stored.reserve_quota && stored.reserve_quota <= stored.high_quota);
    println!("✓ 非法定额测试通过");
}

#[tokio::test]
async fn test_snapshots_within_same_millisecond_keep_distinct_alerts() {
    println!("\n=== 同一毫秒内的两次快照各自告警 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");

    let first = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 80, 0, ts_micro(1, 8, 100))])
        .await
        .unwrap();
    let second = state
        .monitor_api
        .run_cycle(&[StockReading::new("Q001", 10, 0, ts_micro(1, 8, 200))])
        .await
        .unwrap();

    assert_eq!(second.ingest.accepted.len(), 1, "更晚的快照应被接入");
    assert_eq!(first.new_alert_count, 1);
    assert_eq!(second.new_alert_count, 1, "第二条告警应落库");
    assert_ne!(first.alerts[0].id, second.alerts[0].id);
    assert_eq!(first.alerts[0].severity, AlertSeverity::Warning);
    assert_eq!(second.alerts[0].severity, AlertSeverity::Critical);

    let stored = state
        .monitor_api
        .list_alerts(Some("Q001"), None, None)
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].severity, AlertSeverity::Critical, "新的在前");
    assert_eq!(stored[0].current_stock, 10);
    println!("✓ 同毫秒告警通过");
}

#[tokio::test]
async fn test_invalid_quantities_rejected_at_ingest() {
    println!("\n=== 接入数量边界 ===");
    let (_tmp, state) = create_test_state().unwrap();
    upsert_standard(&state, "Q001");
    upsert_standard(&state, "Q002");
    upsert_standard(&state, "Q003");

    // 负的显式在途量不与在途明细相抵
    let mut netted = StockReading::new("Q001", 100, -40, ts(1, 8));
    netted.supply_lines = vec![SupplyLine {
        ordered_qty: 50,
        arrived_qty: 0,
    }];
    // 预计库存溢出
    let overflow = StockReading::new("Q002", i64::MAX, 1, ts(1, 8));

    let report = state
        .monitor_api
        .run_cycle(&[
            netted,
            overflow,
            StockReading::new("Q003", 85, 0, ts(1, 8)),
        ])
        .await
        .unwrap();

    assert_eq!(report.ingest.failed.len(), 2);
    assert_eq!(report.ingest.accepted.len(), 1);
    assert_eq!(report.statuses.len(), 1, "仅 Q003 有快照");
    assert_eq!(report.statuses[0].part_id, "Q003");
    assert_eq!(report.new_entries.len(), 1);
    println!("✓ 接入数量边界通过");
}
