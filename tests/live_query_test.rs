mod common;

use std::time::Duration;

use common::{date, eventually, hire, leave, setup};
use futures::StreamExt;
use hrm_sync::model::{LeaveRequest, LeaveType};
use hrm_sync::{LiveQuery, RepoError, RepoResult};
use tokio::time::timeout;

async fn next<T: hrm_sync::model::Entity>(live: &mut LiveQuery<T>) -> Option<RepoResult<Vec<T>>> {
    timeout(Duration::from_secs(2), live.next())
        .await
        .expect("timed out waiting for a snapshot")
}

#[tokio::test]
async fn subscribers_of_one_query_share_a_listener() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;
    let listeners_before = f.store.active_listeners();

    let mut first = f.ctx.leave.subscribe_for_employee(&emp.id).unwrap();
    let mut second = f.ctx.leave.subscribe_for_employee(&emp.id).unwrap();

    assert!(next(&mut first).await.unwrap().unwrap().is_empty());
    assert!(next(&mut second).await.unwrap().unwrap().is_empty());
    assert_eq!(f.store.active_listeners(), listeners_before + 1);
    assert_eq!(f.ctx.live.active_keys(), 1);

    let submitted = f
        .ctx
        .leave
        .submit(leave(&emp.id, LeaveType::Sick, date(2024, 3, 4), date(2024, 3, 4)))
        .await
        .unwrap();

    for live in [&mut first, &mut second] {
        let snapshot: Vec<LeaveRequest> = next(live).await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, submitted.id);
    }
}

#[tokio::test]
async fn late_subscriber_starts_from_the_latest_snapshot() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;
    f.ctx
        .leave
        .submit(leave(&emp.id, LeaveType::Sick, date(2024, 3, 4), date(2024, 3, 4)))
        .await
        .unwrap();

    let mut first = f.ctx.leave.subscribe_pending().unwrap();
    assert_eq!(next(&mut first).await.unwrap().unwrap().len(), 1);

    let mut late = f.ctx.leave.subscribe_pending().unwrap();
    assert_eq!(next(&mut late).await.unwrap().unwrap().len(), 1);
    assert_eq!(f.ctx.live.active_keys(), 1);
}

#[tokio::test]
async fn cancelling_one_consumer_keeps_the_other() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;
    let mut first = f.ctx.leave.subscribe_for_employee(&emp.id).unwrap();
    let mut second = f.ctx.leave.subscribe_for_employee(&emp.id).unwrap();
    next(&mut first).await.unwrap().unwrap();
    next(&mut second).await.unwrap().unwrap();

    first.cancel();
    assert!(first.is_cancelled());
    assert!(first.next().await.is_none());

    f.ctx
        .leave
        .submit(leave(&emp.id, LeaveType::Sick, date(2024, 3, 4), date(2024, 3, 4)))
        .await
        .unwrap();
    assert_eq!(next(&mut second).await.unwrap().unwrap().len(), 1);
    assert_eq!(f.ctx.live.active_keys(), 1);
}

#[tokio::test]
async fn last_cancel_releases_the_store_listener() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;
    let mut first = f.ctx.leave.subscribe_for_employee(&emp.id).unwrap();
    let second = f.ctx.leave.subscribe_for_employee(&emp.id).unwrap();
    next(&mut first).await.unwrap().unwrap();

    first.cancel();
    drop(second);
    assert_eq!(f.ctx.live.active_keys(), 0);

    let store = f.store.clone();
    assert!(eventually(|| store.active_listeners() == 0).await);
}

#[tokio::test]
async fn listener_error_reaches_every_consumer_and_evicts_the_key() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;
    let mut first = f.ctx.leave.subscribe_for_employee(&emp.id).unwrap();
    let mut second = f.ctx.leave.subscribe_for_employee(&emp.id).unwrap();
    next(&mut first).await.unwrap().unwrap();
    next(&mut second).await.unwrap().unwrap();

    f.store.fail_listeners("leaveRequests");

    for live in [&mut first, &mut second] {
        let err = next(live).await.unwrap().unwrap_err();
        assert!(matches!(err, RepoError::StoreUnavailable(_)));
    }
    let live = f.ctx.live.clone();
    assert!(eventually(|| live.active_keys() == 0).await);

    // A new subscriber opens a fresh listener
    let mut again = f.ctx.leave.subscribe_for_employee(&emp.id).unwrap();
    assert!(next(&mut again).await.unwrap().unwrap().is_empty());
    assert_eq!(f.ctx.live.active_keys(), 1);
}

#[tokio::test]
async fn different_queries_get_their_own_listeners() {
    let f = setup();
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let b = hire(&f.ctx, "EMP-002", "ub").await;
    let mut for_a = f.ctx.leave.subscribe_for_employee(&a.id).unwrap();
    let mut for_b = f.ctx.leave.subscribe_for_employee(&b.id).unwrap();
    next(&mut for_a).await.unwrap().unwrap();
    next(&mut for_b).await.unwrap().unwrap();
    assert_eq!(f.ctx.live.active_keys(), 2);

    f.ctx
        .leave
        .submit(leave(&a.id, LeaveType::Sick, date(2024, 3, 4), date(2024, 3, 4)))
        .await
        .unwrap();
    assert_eq!(next(&mut for_a).await.unwrap().unwrap().len(), 1);

    // B's result set did not change, so nothing is emitted for it
    let quiet = timeout(Duration::from_millis(50), for_b.next()).await;
    assert!(quiet.is_err());
}
