mod common;

use chrono::Utc;
use common::{assign, date, hire, morning_shift, setup};
use hrm_sync::RepoError;
use hrm_sync::model::{ShiftSwapRequest, SwapStatus, day_start};
use serde_json::{Map, json};

fn swap(requester: &str, target: &str) -> ShiftSwapRequest {
    ShiftSwapRequest {
        id: String::new(),
        requester_id: requester.to_string(),
        target_employee_id: target.to_string(),
        requester_shift_date: day_start(date(2024, 3, 4)),
        target_shift_date: day_start(date(2024, 3, 5)),
        reason: "appointment".into(),
        status: SwapStatus::Pending,
        created_at: Utc::now(),
        reviewed_by_id: None,
        reviewed_at: None,
    }
}

#[tokio::test]
async fn approval_exchanges_both_assignments() {
    let f = setup();
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let b = hire(&f.ctx, "EMP-002", "ub").await;
    let shift = morning_shift(&f.ctx).await;
    let slot_a = assign(&f.ctx, &shift, &a.id, date(2024, 3, 4)).await;
    let slot_b = assign(&f.ctx, &shift, &b.id, date(2024, 3, 5)).await;
    let request = f.ctx.shifts.request_swap(swap(&a.id, &b.id)).await.unwrap();
    let commits = f.store.commit_count();

    let approved = f
        .ctx
        .coordinator
        .process_shift_swap(&request.id, "admin")
        .await
        .unwrap();
    assert_eq!(approved.status, SwapStatus::Approved);
    assert_eq!(approved.reviewed_by_id.as_deref(), Some("admin"));

    // One atomic batch for the request and both slots
    assert_eq!(f.store.commit_count(), commits + 1);

    let assignments = f.ctx.shifts.assignments();
    assert_eq!(assignments.require(&slot_a.id).await.unwrap().employee_id, b.id);
    assert_eq!(assignments.require(&slot_b.id).await.unwrap().employee_id, a.id);
    let stored = f.ctx.shifts.swap_request(&request.id).await.unwrap();
    assert_eq!(stored.status, SwapStatus::Approved);
}

#[tokio::test]
async fn processed_requests_are_not_applied_twice() {
    let f = setup();
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let b = hire(&f.ctx, "EMP-002", "ub").await;
    let shift = morning_shift(&f.ctx).await;
    let slot_a = assign(&f.ctx, &shift, &a.id, date(2024, 3, 4)).await;
    assign(&f.ctx, &shift, &b.id, date(2024, 3, 5)).await;
    let request = f.ctx.shifts.request_swap(swap(&a.id, &b.id)).await.unwrap();

    f.ctx
        .coordinator
        .process_shift_swap(&request.id, "admin")
        .await
        .unwrap();
    let err = f
        .ctx
        .coordinator
        .process_shift_swap(&request.id, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidState(_)));

    // Still swapped exactly once
    let slot = f.ctx.shifts.assignments().require(&slot_a.id).await.unwrap();
    assert_eq!(slot.employee_id, b.id);

    let rejected = f.ctx.shifts.reject_swap(&request.id, "admin").await;
    assert!(matches!(rejected, Err(RepoError::InvalidState(_))));
}

#[tokio::test]
async fn missing_assignment_changes_nothing() {
    let f = setup();
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let b = hire(&f.ctx, "EMP-002", "ub").await;
    let shift = morning_shift(&f.ctx).await;
    let slot_a = assign(&f.ctx, &shift, &a.id, date(2024, 3, 4)).await;
    let request = f.ctx.shifts.request_swap(swap(&a.id, &b.id)).await.unwrap();
    let commits = f.store.commit_count();

    let err = f
        .ctx
        .coordinator
        .process_shift_swap(&request.id, "admin")
        .await
        .unwrap_err();
    match err {
        RepoError::AssignmentNotFound { employee_id, date: day } => {
            assert_eq!(employee_id, b.id);
            assert_eq!(day, date(2024, 3, 5));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(f.store.commit_count(), commits);
    let slot = f.ctx.shifts.assignments().require(&slot_a.id).await.unwrap();
    assert_eq!(slot.employee_id, a.id);
    let stored = f.ctx.shifts.swap_request(&request.id).await.unwrap();
    assert_eq!(stored.status, SwapStatus::Pending);
}

#[tokio::test]
async fn reassigned_slot_makes_the_swap_stale() {
    let f = setup();
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let b = hire(&f.ctx, "EMP-002", "ub").await;
    let c = hire(&f.ctx, "EMP-003", "uc").await;
    let shift = morning_shift(&f.ctx).await;
    let slot_a = assign(&f.ctx, &shift, &a.id, date(2024, 3, 4)).await;
    let slot_b = assign(&f.ctx, &shift, &b.id, date(2024, 3, 5)).await;
    let request = f.ctx.shifts.request_swap(swap(&a.id, &b.id)).await.unwrap();

    // An admin hands A's slot to C while the swap is being processed
    let mut patch = Map::new();
    patch.insert("employeeId".into(), json!(c.id));
    f.store.before_next_commit("shiftAssignments", &slot_a.id, patch);

    let err = f
        .ctx
        .coordinator
        .process_shift_swap(&request.id, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::StaleState(_)));

    let assignments = f.ctx.shifts.assignments();
    assert_eq!(assignments.require(&slot_a.id).await.unwrap().employee_id, c.id);
    assert_eq!(assignments.require(&slot_b.id).await.unwrap().employee_id, b.id);
    let stored = f.ctx.shifts.swap_request(&request.id).await.unwrap();
    assert_eq!(stored.status, SwapStatus::Pending);
}

#[tokio::test]
async fn swap_that_double_books_is_refused() {
    let f = setup();
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let b = hire(&f.ctx, "EMP-002", "ub").await;
    let shift = morning_shift(&f.ctx).await;
    assign(&f.ctx, &shift, &a.id, date(2024, 3, 4)).await;
    assign(&f.ctx, &shift, &b.id, date(2024, 3, 5)).await;
    // B already works on the day they would take over
    assign(&f.ctx, &shift, &b.id, date(2024, 3, 4)).await;
    let request = f.ctx.shifts.request_swap(swap(&a.id, &b.id)).await.unwrap();

    let err = f
        .ctx
        .coordinator
        .process_shift_swap(&request.id, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidState(_)));
    assert_eq!(
        f.ctx.shifts.assignments_on(&b.id, date(2024, 3, 4)).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn second_assignment_for_the_same_day_already_exists() {
    let f = setup();
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let shift = morning_shift(&f.ctx).await;
    let first = assign(&f.ctx, &shift, &a.id, date(2024, 3, 4)).await;

    let mut again = first.clone();
    again.id = String::new();
    let err = f.ctx.shifts.assign(again).await.unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExists { .. }));
}

#[tokio::test]
async fn rejection_leaves_assignments_alone() {
    let f = setup();
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let b = hire(&f.ctx, "EMP-002", "ub").await;
    let shift = morning_shift(&f.ctx).await;
    let slot_a = assign(&f.ctx, &shift, &a.id, date(2024, 3, 4)).await;
    assign(&f.ctx, &shift, &b.id, date(2024, 3, 5)).await;
    let request = f.ctx.shifts.request_swap(swap(&a.id, &b.id)).await.unwrap();

    let rejected = f.ctx.shifts.reject_swap(&request.id, "admin").await.unwrap();
    assert_eq!(rejected.status, SwapStatus::Rejected);
    let slot = f.ctx.shifts.assignments().require(&slot_a.id).await.unwrap();
    assert_eq!(slot.employee_id, a.id);

    let err = f
        .ctx
        .coordinator
        .process_shift_swap(&request.id, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidState(_)));
    assert_eq!(f.ctx.shifts.swaps_for_employee(&b.id).await.unwrap().len(), 1);
}
