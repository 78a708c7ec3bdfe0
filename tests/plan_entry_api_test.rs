// ==========================================
// PlanEntryApi 集成测试
// ==========================================
// 测试目标: 人工录入、审批流转、非法流转拒绝、查询过滤
// ==========================================


use psm_quota_engine::api::ApiError;
use psm_quota_engine::domain::{PlanEntryStatus, PlanSource};
use test_helpers::{create_test_state, standard_quota};

#[test]
fn test_create_manual_entry() {
    let (_tmp, state) = create_test_state().expect("Failed to create test state");
    state.quota_registry.upsert(&standard_quota("Q001")).unwrap();

    let entry = state
        .plan_entry_api
        .create_manual_entry("Q001", 120)
        .expect("人工条目创建失败");

    assert_eq!(entry.source, PlanSource::Manual);
    assert_eq!(entry.status, PlanEntryStatus::Draft);
    assert_eq!(entry.drawing_no, "DWG-100", "图号应取自定额");
    assert_eq!(entry.part_name, "齿轮 A-12");

    let stored = state.plan_entry_api.get_entry(&entry.id).unwrap();
    assert_eq!(stored.quantity, 120);
}

#[test]
fn test_manual_entry_validation() {
    let (_tmp, state) = create_test_state().unwrap();
    state.quota_registry.upsert(&standard_quota("Q001")).unwrap();

    assert!(matches!(
        state.plan_entry_api.create_manual_entry("Q001", 0),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        state.plan_entry_api.create_manual_entry("NOPE", 10),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_full_workflow_draft_approved_ordered() {
    let (_tmp, state) = create_test_state().unwrap();
    state.quota_registry.upsert(&standard_quota("Q001")).unwrap();
    let entry = state.plan_entry_api.create_manual_entry("Q001", 50).unwrap();

    let approved = state.plan_entry_api.approve(&entry.id).unwrap();
    assert_eq!(approved.status, PlanEntryStatus::Approved);
    assert!(approved.updated_at >= entry.updated_at);

    let ordered = state.plan_entry_api.mark_ordered(&entry.id).unwrap();
    assert_eq!(ordered.status, PlanEntryStatus::Ordered);

    // 终态不可再流转
    let err = state.plan_entry_api.reject(&entry.id).unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
}

#[test]
fn test_illegal_transitions_rejected() {
    let (_tmp, state) = create_test_state().unwrap();
    state.quota_registry.upsert(&standard_quota("Q001")).unwrap();
    let entry = state.plan_entry_api.create_manual_entry("Q001", 50).unwrap();

    // DRAFT 不能直接下单
    let err = state.plan_entry_api.mark_ordered(&entry.id).unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
    assert_eq!(
        state.plan_entry_api.get_entry(&entry.id).unwrap().status,
        PlanEntryStatus::Draft,
        "非法流转后状态应保持不变"
    );

    // APPROVED 不能驳回
    state.plan_entry_api.approve(&entry.id).unwrap();
    assert!(matches!(
        state.plan_entry_api.reject(&entry.id),
        Err(ApiError::InvalidStateTransition { .. })
    ));

    assert!(matches!(
        state.plan_entry_api.approve("PLAN-missing"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_list_open_only() {
    let (_tmp, state) = create_test_state().unwrap();
    state.quota_registry.upsert(&standard_quota("Q001")).unwrap();
    state.quota_registry.upsert(&standard_quota("Q002")).unwrap();

    let a = state.plan_entry_api.create_manual_entry("Q001", 10).unwrap();
    let b = state.plan_entry_api.create_manual_entry("Q001", 20).unwrap();
    let _c = state.plan_entry_api.create_manual_entry("Q002", 30).unwrap();
    state.plan_entry_api.reject(&a.id).unwrap();
    state.plan_entry_api.approve(&b.id).unwrap();

    assert_eq!(state.plan_entry_api.list_entries(false).unwrap().len(), 3);
    let open = state.plan_entry_api.list_entries(true).unwrap();
    assert_eq!(open.len(), 2);
    assert!(open.iter().all(|e| e.status.is_open()));

    // 人工条目可以并存多条
    assert_eq!(state.plan_entry_api.list_by_part("Q001").unwrap().len(), 2);
}
