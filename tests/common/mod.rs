//! Shared fixture: an `AppContext` over the in-memory adapters.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use hrm_sync::model::{
    AssignmentStatus, Employee, LeaveRequest, LeaveStatus, LeaveType, Role, Shift,
    ShiftAssignment, day_start,
};
use hrm_sync::{AppContext, MemoryBlobStore, MemoryStore, Policy};

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub ctx: AppContext,
}

pub fn setup() -> Fixture {
    setup_with(MemoryStore::new(), Policy::default())
}

pub fn setup_with(store: MemoryStore, policy: Policy) -> Fixture {
    let store = Arc::new(store);
    let blobs = Arc::new(MemoryBlobStore::new());
    let ctx = AppContext::new(store.clone(), blobs.clone(), policy);
    Fixture { store, blobs, ctx }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn employee(code: &str, user_id: &str) -> Employee {
    Employee {
        id: String::new(),
        name: format!("Employee {code}"),
        email: format!("{user_id}@company.com"),
        phone: None,
        employee_id: code.to_string(),
        user_id: user_id.to_string(),
        department: "Engineering".into(),
        designation: "Engineer".into(),
        role: Role::User,
        joining_date: day_start(date(2023, 1, 2)),
        added_by: "admin".into(),
        is_active: true,
        created_at: Utc::now(),
    }
}

pub async fn hire(ctx: &AppContext, code: &str, user_id: &str) -> Employee {
    ctx.employees
        .create_employee(employee(code, user_id))
        .await
        .unwrap()
}

pub async fn hire_in(ctx: &AppContext, code: &str, user_id: &str, department: &str) -> Employee {
    let mut record = employee(code, user_id);
    record.department = department.to_string();
    ctx.employees.create_employee(record).await.unwrap()
}

pub fn leave(employee_id: &str, leave_type: LeaveType, from: NaiveDate, to: NaiveDate) -> LeaveRequest {
    LeaveRequest {
        id: String::new(),
        employee_id: employee_id.to_string(),
        employee_name: String::new(),
        leave_type,
        start_date: day_start(from),
        end_date: day_start(to),
        reason: "personal".into(),
        status: LeaveStatus::Pending,
        applied_date: Utc::now(),
        reviewer_id: None,
        reviewed_date: None,
        reviewer_comments: None,
    }
}

pub async fn morning_shift(ctx: &AppContext) -> Shift {
    ctx.shifts
        .create_shift(Shift {
            id: String::new(),
            name: "Morning".into(),
            start_time: "09:00".into(),
            end_time: "17:00".into(),
            is_active: true,
        })
        .await
        .unwrap()
}

pub async fn assign(ctx: &AppContext, shift: &Shift, employee_id: &str, day: NaiveDate) -> ShiftAssignment {
    ctx.shifts
        .assign(ShiftAssignment {
            id: String::new(),
            employee_id: employee_id.to_string(),
            shift_id: shift.id.clone(),
            date: day_start(day),
            status: AssignmentStatus::Assigned,
            assigned_by_admin_id: "admin".into(),
        })
        .await
        .unwrap()
}

/// Polls `check` until it holds; listener teardown happens on another task.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
