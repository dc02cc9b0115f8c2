mod common;

use common::{at, hire, setup};
use hrm_sync::model::{Employee, PayrollStatus};
use hrm_sync::repository::PayrollInput;
use hrm_sync::{AppContext, RepoError};

fn march(base_salary: f64, bonuses: f64) -> PayrollInput {
    PayrollInput {
        month: 3,
        year: 2024,
        base_salary,
        bonuses,
    }
}

/// Three days in March 2024: one with two hours overtime, one late.
async fn work_march(ctx: &AppContext, emp: &Employee) {
    for (day, (in_h, in_m), (out_h, out_m)) in [
        (4, (9, 0), (19, 0)),
        (5, (9, 30), (17, 30)),
        (6, (9, 0), (17, 0)),
    ] {
        ctx.attendance
            .check_in(emp, "HQ", at(2024, 3, day, in_h, in_m))
            .await
            .unwrap();
        ctx.attendance
            .check_out(&emp.id, "HQ", at(2024, 3, day, out_h, out_m))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn generated_payroll_follows_attendance() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;
    work_march(&f.ctx, &emp).await;

    let attendance = f
        .ctx
        .reports
        .attendance_month_summary(&emp.id, 3, 2024)
        .await
        .unwrap();
    assert_eq!(attendance.present_days, 3);
    assert_eq!(attendance.late_days, 1);
    assert_eq!(attendance.overtime_hours, 2.0);

    // 21 working days, so 1000 a day
    let record = f
        .ctx
        .payroll
        .generate(&emp, march(21_000.0, 500.0), &attendance)
        .await
        .unwrap();
    assert_eq!(record.working_days, 21);
    assert_eq!(record.gross_salary, 3000.0);
    assert_eq!(record.overtime_pay, 375.0);
    assert_eq!(record.deductions, 250.0);
    assert_eq!(record.net_salary, 3625.0);
    assert_eq!(record.status, PayrollStatus::Pending);

    let stored = f.ctx.payroll.records().require(&record.id).await.unwrap();
    assert_eq!(stored.net_salary, 3625.0);
}

#[tokio::test]
async fn one_record_per_employee_and_month() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;
    let none = Default::default();
    f.ctx
        .payroll
        .generate(&emp, march(21_000.0, 0.0), &none)
        .await
        .unwrap();

    let err = f
        .ctx
        .payroll
        .generate(&emp, march(30_000.0, 0.0), &none)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExists { .. }));
}

#[tokio::test]
async fn invalid_period_or_salary_is_rejected() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;
    let none = Default::default();

    let mut bad_month = march(1000.0, 0.0);
    bad_month.month = 13;
    let err = f.ctx.payroll.generate(&emp, bad_month, &none).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let err = f
        .ctx
        .payroll
        .generate(&emp, march(-1.0, 0.0), &none)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn adjust_rederives_net_until_paid() {
    let f = setup();
    let emp = hire(&f.ctx, "EMP-001", "u1").await;
    work_march(&f.ctx, &emp).await;
    let attendance = f
        .ctx
        .reports
        .attendance_month_summary(&emp.id, 3, 2024)
        .await
        .unwrap();
    let record = f
        .ctx
        .payroll
        .generate(&emp, march(21_000.0, 0.0), &attendance)
        .await
        .unwrap();

    let adjusted = f
        .ctx
        .payroll
        .adjust(&record.id, Some(1000.0), None)
        .await
        .unwrap();
    assert_eq!(adjusted.bonuses, 1000.0);
    assert_eq!(adjusted.net_salary, 3000.0 + 375.0 + 1000.0 - 250.0);

    let err = f.ctx.payroll.adjust(&record.id, None, None).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let paid = f.ctx.payroll.mark_paid(&record.id).await.unwrap();
    assert_eq!(paid.status, PayrollStatus::Paid);
    assert!(paid.paid_at.is_some());

    let err = f
        .ctx
        .payroll
        .adjust(&record.id, None, Some(0.0))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidState(_)));
    let err = f.ctx.payroll.mark_paid(&record.id).await.unwrap_err();
    assert!(matches!(err, RepoError::InvalidState(_)));

    let stored = f.ctx.payroll.records().require(&record.id).await.unwrap();
    assert_eq!(stored.net_salary, adjusted.net_salary);
}

#[tokio::test]
async fn monthly_summary_totals_records() {
    let f = setup();
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let b = hire(&f.ctx, "EMP-002", "ub").await;
    work_march(&f.ctx, &a).await;
    let summary_a = f
        .ctx
        .reports
        .attendance_month_summary(&a.id, 3, 2024)
        .await
        .unwrap();
    let paid = f
        .ctx
        .payroll
        .generate(&a, march(21_000.0, 500.0), &summary_a)
        .await
        .unwrap();
    f.ctx.payroll.mark_paid(&paid.id).await.unwrap();
    f.ctx
        .payroll
        .generate(&b, march(42_000.0, 0.0), &Default::default())
        .await
        .unwrap();

    let summary = f.ctx.reports.payroll_summary(3, 2024).await.unwrap();
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.employee_count, 2);
    assert_eq!(summary.paid_count, 1);
    assert_eq!(summary.pending_count, 1);
    assert_eq!(summary.total_net_pay, 3625.0);
    assert_eq!(summary.total_bonuses, 500.0);

    let empty = f.ctx.reports.payroll_summary(4, 2024).await.unwrap();
    assert_eq!(empty.record_count, 0);
    assert_eq!(empty.total_net_pay, 0.0);
}
