//! Dashboard figures: fetch through the repositories, then aggregate.
//!
//! Reads here are lenient. A `NotFound` from a fetch counts as an empty
//! contribution so a dashboard still renders over partial data; every
//! other error is returned.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::aggregate::{
    self, AttendanceMonthSummary, AttendanceStats, DepartmentStats, LeaveBalance, PayrollSummary,
    PerformanceSummary,
};
use crate::config::Policy;
use crate::error::{RepoError, RepoResult};
use crate::model::LeaveType;
use crate::repository::{
    AttendanceRepository, EmployeeRepository, LeaveRepository, PayrollRepository,
    PerformanceRepository,
};

#[derive(Clone)]
pub struct Reports {
    employees: EmployeeRepository,
    attendance: AttendanceRepository,
    leave: LeaveRepository,
    payroll: PayrollRepository,
    performance: PerformanceRepository,
    standard_hours_per_day: f64,
}

impl Reports {
    pub fn new(
        employees: EmployeeRepository,
        attendance: AttendanceRepository,
        leave: LeaveRepository,
        payroll: PayrollRepository,
        performance: PerformanceRepository,
        policy: &Policy,
    ) -> Self {
        Self {
            employees,
            attendance,
            leave,
            payroll,
            performance,
            standard_hours_per_day: policy.standard_hours_per_day,
        }
    }

    /// Balance of one leave type for the calendar year containing `today`.
    pub async fn leave_balance(
        &self,
        employee_id: &str,
        leave_type: LeaveType,
        today: NaiveDate,
    ) -> RepoResult<LeaveBalance> {
        let approved = lenient(
            self.leave
                .approved_in_year(employee_id, Some(leave_type), today.year())
                .await,
        )?;
        Ok(aggregate::leave_balance(leave_type, &approved))
    }

    pub async fn leave_balances(
        &self,
        employee_id: &str,
        today: NaiveDate,
    ) -> RepoResult<Vec<LeaveBalance>> {
        let approved = lenient(
            self.leave
                .approved_in_year(employee_id, None, today.year())
                .await,
        )?;
        Ok(aggregate::leave_balances(&approved))
    }

    pub async fn payroll_summary(&self, month: u32, year: i32) -> RepoResult<PayrollSummary> {
        let records = lenient(self.payroll.for_period(month, year).await)?;
        Ok(aggregate::payroll_summary(&records))
    }

    /// Company-wide attendance against the active headcount.
    pub async fn attendance_for(&self, date: NaiveDate) -> RepoResult<AttendanceStats> {
        let employees = lenient(self.employees.list_active().await)?;
        let records = lenient(self.attendance.for_date(date).await)?;
        Ok(aggregate::attendance_stats(date, &employees, &records))
    }

    pub async fn department_attendance(&self, date: NaiveDate) -> RepoResult<Vec<DepartmentStats>> {
        let employees = lenient(self.employees.list_active().await)?;
        let records = lenient(self.attendance.for_date(date).await)?;
        Ok(aggregate::department_stats(date, &employees, &records))
    }

    pub async fn performance_summary(&self, employee_id: &str) -> RepoResult<PerformanceSummary> {
        let reviews = lenient(self.performance.for_employee(employee_id).await)?;
        Ok(aggregate::performance_summary(&reviews))
    }

    pub async fn attendance_month_summary(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> RepoResult<AttendanceMonthSummary> {
        let (first, last) = month_bounds(month, year)?;
        let records = lenient(
            self.attendance
                .for_employee_between(employee_id, first, last)
                .await,
        )?;
        Ok(aggregate::attendance_month_summary(
            &records,
            self.standard_hours_per_day,
        ))
    }
}

fn lenient<T>(fetched: RepoResult<Vec<T>>) -> RepoResult<Vec<T>> {
    match fetched {
        Err(err) if err.is_not_found() => {
            debug!(error = %err, "Treating missing data as empty");
            Ok(Vec::new())
        }
        other => other,
    }
}

fn month_bounds(month: u32, year: i32) -> RepoResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| RepoError::Validation(format!("invalid month {month}/{year}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| RepoError::Validation(format!("invalid month {month}/{year}")))?;
    Ok((first, last))
}
