mod common;

use common::{employee, hire, hire_in, setup};
use hrm_sync::RepoError;
use serde_json::json;

#[tokio::test]
async fn deactivate_is_a_soft_and_idempotent_delete() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;

    f.ctx.employees.deactivate(&emp.id).await.unwrap();
    f.ctx.employees.deactivate(&emp.id).await.unwrap();

    let stored = f.ctx.employees.get(&emp.id).await.unwrap();
    assert!(!stored.is_active);
    assert_eq!(f.store.document_count("employees"), 1);
    assert!(f.ctx.employees.list_active().await.unwrap().is_empty());
    assert_eq!(f.ctx.employees.find_by_user_id("u1").await.unwrap(), None);
}

#[tokio::test]
async fn deactivating_a_missing_employee_is_not_found() {
    let f = setup();
    let err = f.ctx.employees.deactivate("ghost").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn codes_and_user_ids_are_unique_among_active_employees() {
    let f = setup();
    let first = hire(&f.ctx, "EMP-001", "u1").await;

    let same_code = f
        .ctx
        .employees
        .create_employee(employee("EMP-001", "u2"))
        .await
        .unwrap_err();
    assert!(matches!(same_code, RepoError::AlreadyExists { .. }));

    let same_user = f
        .ctx
        .employees
        .create_employee(employee("EMP-002", "u1"))
        .await
        .unwrap_err();
    assert!(matches!(same_user, RepoError::AlreadyExists { .. }));

    // Freed up once the holder leaves
    f.ctx.employees.deactivate(&first.id).await.unwrap();
    let rehired = hire(&f.ctx, "EMP-001", "u1").await;
    assert_eq!(
        f.ctx.employees.find_by_code("EMP-001").await.unwrap().map(|e| e.id),
        Some(rehired.id)
    );

    let err = f.ctx.employees.reactivate(&first.id).await.unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExists { .. }));
}

#[tokio::test]
async fn patch_updates_fields_but_not_protected_ones() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;

    let updated = f
        .ctx
        .employees
        .update_employee(&emp.id, &json!({ "designation": "Lead", "phone": "+880" }))
        .await
        .unwrap();
    assert_eq!(updated.designation, "Lead");
    assert_eq!(updated.phone.as_deref(), Some("+880"));
    assert_eq!(updated.name, emp.name);

    let err = f
        .ctx
        .employees
        .update_employee(&emp.id, &json!({ "isActive": false }))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let err = f
        .ctx
        .employees
        .update_employee(&emp.id, &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn patch_cannot_steal_another_employees_code() {
    let f = setup();
    hire(&f.ctx, "EMP-001", "u1").await;
    let other = hire(&f.ctx, "EMP-002", "u2").await;

    let err = f
        .ctx
        .employees
        .update_employee(&other.id, &json!({ "employeeId": "EMP-001" }))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExists { .. }));
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let f = setup();
    let mut record = employee("EMP-001", "u1");
    record.email = "not-an-address".into();
    let err = f.ctx.employees.create_employee(record).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(f.store.document_count("employees"), 0);
}

#[tokio::test]
async fn department_listing_and_active_user_ids() {
    let f = setup();
    hire_in(&f.ctx, "EMP-001", "u1", "Sales").await;
    hire_in(&f.ctx, "EMP-002", "u2", "Engineering").await;
    let leaver = hire_in(&f.ctx, "EMP-003", "u3", "Sales").await;
    f.ctx.employees.deactivate(&leaver.id).await.unwrap();

    let sales = f.ctx.employees.list_by_department("Sales").await.unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].employee_id, "EMP-001");
    assert_eq!(
        f.ctx.employees.active_user_ids().await.unwrap(),
        vec!["u1".to_string(), "u2".to_string()]
    );
}
