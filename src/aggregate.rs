//! Derived figures computed from already-fetched records.
//!
//! Nothing here touches the store. Every function is total: empty input
//! gives a zero-valued result.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::model::payroll::round_money;
use crate::model::{
    AttendanceRecord, AttendanceStatus, Employee, LeaveRequest, LeaveStatus, LeaveType,
    PayrollRecord, PayrollStatus, PerformanceReview,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    pub leave_type: LeaveType,
    /// `None` for unbounded types.
    pub allocation: Option<u32>,
    pub used_days: i64,
    /// May go negative; `None` when the allocation is unbounded.
    pub remaining: Option<i64>,
}

/// Balance of one leave type over `requests`. Only approved requests of
/// that type count; callers narrow the set to one employee and year.
pub fn leave_balance(leave_type: LeaveType, requests: &[LeaveRequest]) -> LeaveBalance {
    let used_days = used_days(leave_type, requests);
    let allocation = leave_type.allocation();
    LeaveBalance {
        leave_type,
        allocation,
        used_days,
        remaining: allocation.map(|days| i64::from(days) - used_days),
    }
}

/// One balance per leave type, in declaration order.
pub fn leave_balances(requests: &[LeaveRequest]) -> Vec<LeaveBalance> {
    LeaveType::iter()
        .map(|leave_type| leave_balance(leave_type, requests))
        .collect()
}

pub fn used_days(leave_type: LeaveType, requests: &[LeaveRequest]) -> i64 {
    requests
        .iter()
        .filter(|r| r.status == LeaveStatus::Approved && r.leave_type == leave_type)
        .map(LeaveRequest::days)
        .sum()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    pub total_gross_pay: f64,
    pub total_net_pay: f64,
    pub total_deductions: f64,
    pub total_overtime_pay: f64,
    pub total_bonuses: f64,
    pub record_count: usize,
    /// Distinct employees; one employee may have several records.
    pub employee_count: usize,
    pub paid_count: usize,
    pub pending_count: usize,
}

pub fn payroll_summary(records: &[PayrollRecord]) -> PayrollSummary {
    let mut summary = PayrollSummary::default();
    let mut employees = HashSet::new();

    for record in records {
        summary.total_gross_pay += record.gross_salary;
        summary.total_net_pay += record.net_salary;
        summary.total_deductions += record.deductions;
        summary.total_overtime_pay += record.overtime_pay;
        summary.total_bonuses += record.bonuses;
        match record.status {
            PayrollStatus::Paid => summary.paid_count += 1,
            PayrollStatus::Pending => summary.pending_count += 1,
        }
        employees.insert(record.employee_id.as_str());
    }

    summary.total_gross_pay = round_money(summary.total_gross_pay);
    summary.total_net_pay = round_money(summary.total_net_pay);
    summary.total_deductions = round_money(summary.total_deductions);
    summary.total_overtime_pay = round_money(summary.total_overtime_pay);
    summary.total_bonuses = round_money(summary.total_bonuses);
    summary.record_count = records.len();
    summary.employee_count = employees.len();
    summary
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub date: NaiveDate,
    pub total_employees: usize,
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    /// Exact `present / total`, 0 when there is nobody to count.
    pub ratio: f64,
    /// `ratio` as a percentage rounded to one decimal, for display only.
    pub percentage: f64,
}

impl AttendanceStats {
    fn new(date: NaiveDate, total_employees: usize, present: usize, late: usize) -> Self {
        let ratio = if total_employees == 0 {
            0.0
        } else {
            present as f64 / total_employees as f64
        };
        Self {
            date,
            total_employees,
            present,
            late,
            absent: total_employees.saturating_sub(present),
            ratio,
            percentage: (ratio * 1000.0).round() / 10.0,
        }
    }
}

/// Present = distinct `employees` with a non-absent record on `date`; late =
/// those among them with any late record. Records of anyone else are
/// ignored, so `present` never exceeds the headcount.
pub fn attendance_stats(
    date: NaiveDate,
    employees: &[Employee],
    records: &[AttendanceRecord],
) -> AttendanceStats {
    let staff: HashSet<&str> = employees.iter().map(|e| e.id.as_str()).collect();
    let (present, late) = presence(
        date,
        records
            .iter()
            .filter(|r| staff.contains(r.employee_id.as_str())),
    );
    AttendanceStats::new(date, staff.len(), present.len(), late.len())
}

fn presence<'a>(
    date: NaiveDate,
    records: impl Iterator<Item = &'a AttendanceRecord>,
) -> (HashSet<&'a str>, HashSet<&'a str>) {
    let mut present = HashSet::new();
    let mut late = HashSet::new();
    for record in records {
        if record.day() != date || record.status == AttendanceStatus::Absent {
            continue;
        }
        present.insert(record.employee_id.as_str());
        if record.is_late {
            late.insert(record.employee_id.as_str());
        }
    }
    (present, late)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStats {
    pub department: String,
    #[serde(flatten)]
    pub stats: AttendanceStats,
}

/// Per-department attendance on `date`, sorted by department name. Only
/// records of the given employees count.
pub fn department_stats(
    date: NaiveDate,
    employees: &[Employee],
    records: &[AttendanceRecord],
) -> Vec<DepartmentStats> {
    let mut departments: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for employee in employees {
        departments
            .entry(employee.department.as_str())
            .or_default()
            .insert(employee.id.as_str());
    }

    departments
        .into_iter()
        .map(|(department, members)| {
            let (present, late) = presence(
                date,
                records
                    .iter()
                    .filter(|r| members.contains(r.employee_id.as_str())),
            );
            DepartmentStats {
                department: department.to_string(),
                stats: AttendanceStats::new(date, members.len(), present.len(), late.len()),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub review_count: usize,
    /// 0 when there are no reviews.
    pub average_rating: f64,
    pub highest_rating: Option<f64>,
    pub lowest_rating: Option<f64>,
    pub latest_rating: Option<f64>,
    pub latest_period: Option<String>,
}

pub fn performance_summary(reviews: &[PerformanceReview]) -> PerformanceSummary {
    if reviews.is_empty() {
        return PerformanceSummary::default();
    }
    let total: f64 = reviews.iter().map(|r| r.rating).sum();
    let latest = reviews.iter().max_by_key(|r| r.review_date);
    PerformanceSummary {
        review_count: reviews.len(),
        average_rating: round_money(total / reviews.len() as f64),
        highest_rating: reviews.iter().map(|r| r.rating).reduce(f64::max),
        lowest_rating: reviews.iter().map(|r| r.rating).reduce(f64::min),
        latest_rating: latest.map(|r| r.rating),
        latest_period: latest.map(|r| r.review_period.clone()),
    }
}

/// One employee's month, the attendance input to payroll generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMonthSummary {
    pub present_days: u32,
    pub late_days: u32,
    /// Hours beyond the standard day, summed per day.
    pub overtime_hours: f64,
    pub total_hours: f64,
}

pub fn attendance_month_summary(
    records: &[AttendanceRecord],
    standard_hours_per_day: f64,
) -> AttendanceMonthSummary {
    let mut days: BTreeMap<NaiveDate, (bool, f64)> = BTreeMap::new();
    for record in records {
        if record.status == AttendanceStatus::Absent {
            continue;
        }
        let entry = days.entry(record.day()).or_insert((false, 0.0));
        entry.0 |= record.is_late;
        entry.1 += record.worked_hours().unwrap_or(0.0);
    }

    let mut summary = AttendanceMonthSummary::default();
    for (late, hours) in days.values() {
        summary.present_days += 1;
        if *late {
            summary.late_days += 1;
        }
        summary.total_hours += hours;
        summary.overtime_hours += (hours - standard_hours_per_day).max(0.0);
    }
    summary.total_hours = round_money(summary.total_hours);
    summary.overtime_hours = round_money(summary.overtime_hours);
    summary
}

/// Monday–Friday count of the month; 0 for an invalid month.
pub fn working_days(month: u32, year: i32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    first
        .iter_days()
        .take_while(|day| day.month() == month)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn leave(start: (u32, u32), end: (u32, u32), kind: LeaveType, status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id: String::new(),
            employee_id: "e1".into(),
            employee_name: "Ana".into(),
            leave_type: kind,
            start_date: at(2024, start.0, start.1, 0, 0),
            end_date: at(2024, end.0, end.1, 0, 0),
            reason: String::new(),
            status,
            applied_date: at(2024, 1, 1, 0, 0),
            reviewer_id: None,
            reviewed_date: None,
            reviewer_comments: None,
        }
    }

    fn payroll(employee: &str, gross: f64, deductions: f64, status: PayrollStatus) -> PayrollRecord {
        PayrollRecord {
            id: String::new(),
            employee_id: employee.into(),
            employee_name: String::new(),
            month: 3,
            year: 2024,
            base_salary: gross,
            working_days: 21,
            present_days: 21,
            late_days: 0,
            overtime_hours: 0.0,
            overtime_pay: 0.0,
            deductions,
            bonuses: 0.0,
            gross_salary: gross,
            net_salary: gross - deductions,
            status,
            generated_at: at(2024, 4, 1, 0, 0),
            paid_at: None,
        }
    }

    fn visit(employee: &str, day: u32, hours: f64, late: bool) -> AttendanceRecord {
        let check_in = at(2024, 3, day, 9, 0);
        AttendanceRecord {
            id: String::new(),
            employee_id: employee.into(),
            employee_name: String::new(),
            date: at(2024, 3, day, 0, 0),
            check_in_time: check_in,
            check_out_time: None,
            check_in_location: String::new(),
            check_out_location: None,
            total_working_hours: Some(hours),
            is_late: late,
            status: AttendanceStatus::CheckedOut,
        }
    }

    #[test]
    fn casual_leave_scenario() {
        let requests = vec![
            leave((3, 1), (3, 5), LeaveType::Casual, LeaveStatus::Approved),
            leave((3, 10), (3, 10), LeaveType::Casual, LeaveStatus::Approved),
            leave((4, 1), (4, 3), LeaveType::Casual, LeaveStatus::Rejected),
            leave((5, 1), (5, 2), LeaveType::Sick, LeaveStatus::Approved),
        ];
        let balance = leave_balance(LeaveType::Casual, &requests);
        assert_eq!(balance.used_days, 6);
        assert_eq!(balance.allocation, Some(10));
        assert_eq!(balance.remaining, Some(4));
    }

    #[test]
    fn used_days_add_up_across_partitions() {
        let requests = vec![
            leave((1, 2), (1, 4), LeaveType::Earned, LeaveStatus::Approved),
            leave((2, 7), (2, 7), LeaveType::Earned, LeaveStatus::Approved),
            leave((6, 10), (6, 20), LeaveType::Earned, LeaveStatus::Approved),
        ];
        let whole = used_days(LeaveType::Earned, &requests);
        for split in 0..=requests.len() {
            let (left, right) = requests.split_at(split);
            assert_eq!(
                used_days(LeaveType::Earned, left) + used_days(LeaveType::Earned, right),
                whole
            );
        }
        let balance = leave_balance(LeaveType::Earned, &requests);
        assert_eq!(balance.remaining, Some(15 - 15));
    }

    #[test]
    fn overdrawn_and_unbounded_balances() {
        let requests = vec![leave((3, 1), (3, 12), LeaveType::Sick, LeaveStatus::Approved)];
        assert_eq!(leave_balance(LeaveType::Sick, &requests).remaining, Some(-2));

        let unpaid = leave_balance(LeaveType::Unpaid, &requests);
        assert_eq!(unpaid.used_days, 0);
        assert_eq!(unpaid.remaining, None);

        let all = leave_balances(&[]);
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|b| b.used_days == 0));
    }

    #[test]
    fn payroll_summary_scenario() {
        let records = vec![
            payroll("e1", 50000.0, 500.0, PayrollStatus::Paid),
            payroll("e2", 60000.0, 0.0, PayrollStatus::Pending),
        ];
        let summary = payroll_summary(&records);
        assert_eq!(summary.total_gross_pay, 110000.0);
        assert_eq!(summary.total_deductions, 500.0);
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.employee_count, 2);
        assert_eq!(summary.paid_count, 1);

        assert_eq!(payroll_summary(&[]), PayrollSummary::default());
    }

    #[test]
    fn records_and_employees_are_counted_separately() {
        let mut april = payroll("e1", 1000.0, 0.0, PayrollStatus::Pending);
        april.month = 4;
        let records = vec![payroll("e1", 1000.0, 0.0, PayrollStatus::Pending), april];
        let summary = payroll_summary(&records);
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.employee_count, 1);
    }

    fn employee(id: &str, department: &str) -> Employee {
        Employee {
            id: id.into(),
            name: id.into(),
            email: format!("{id}@corp.test"),
            phone: None,
            employee_id: id.to_uppercase(),
            user_id: format!("u-{id}"),
            department: department.into(),
            designation: String::new(),
            role: Role::User,
            joining_date: at(2023, 1, 1, 0, 0),
            added_by: "admin".into(),
            is_active: true,
            created_at: at(2023, 1, 1, 0, 0),
        }
    }

    #[test]
    fn attendance_ratio_keeps_precision() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let staff = vec![employee("e1", "Ops"), employee("e2", "Ops"), employee("e3", "Ops")];
        let records = vec![visit("e1", 4, 8.0, false), visit("e1", 4, 1.0, true), visit("e2", 4, 8.0, false)];
        let stats = attendance_stats(date, &staff, &records);
        assert_eq!(stats.present, 2);
        assert_eq!(stats.late, 1);
        assert_eq!(stats.absent, 1);
        assert!((stats.ratio - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.percentage, 66.7);

        let empty = attendance_stats(date, &[], &[]);
        assert_eq!(empty.ratio, 0.0);
        assert_eq!(empty.present, 0);
    }

    #[test]
    fn records_outside_the_headcount_are_ignored() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let staff = vec![employee("e1", "Ops")];
        let records = vec![visit("e1", 4, 8.0, false), visit("gone", 4, 8.0, true)];
        let stats = attendance_stats(date, &staff, &records);
        assert_eq!(stats.total_employees, 1);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.late, 0);
        assert_eq!(stats.ratio, 1.0);
    }

    #[test]
    fn department_rollup() {
        let employees = vec![employee("a", "Ops"), employee("b", "Ops"), employee("c", "Sales")];
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let records = vec![visit("a", 4, 8.0, true), visit("c", 5, 8.0, false)];

        let stats = department_stats(date, &employees, &records);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].department, "Ops");
        assert_eq!(stats[0].stats.present, 1);
        assert_eq!(stats[0].stats.late, 1);
        assert_eq!(stats[0].stats.percentage, 50.0);
        assert_eq!(stats[1].department, "Sales");
        assert_eq!(stats[1].stats.present, 0);
    }

    #[test]
    fn month_summary_counts_days_not_records() {
        let records = vec![
            visit("e1", 4, 5.0, true),
            visit("e1", 4, 5.0, false),
            visit("e1", 5, 7.5, false),
        ];
        let summary = attendance_month_summary(&records, 8.0);
        assert_eq!(summary.present_days, 2);
        assert_eq!(summary.late_days, 1);
        assert_eq!(summary.total_hours, 17.5);
        assert_eq!(summary.overtime_hours, 2.0);
    }

    #[test]
    fn weekday_counts() {
        assert_eq!(working_days(3, 2024), 21);
        assert_eq!(working_days(2, 2024), 21);
        assert_eq!(working_days(13, 2024), 0);
    }

    #[test]
    fn performance_average() {
        let review = |rating: f64, day: u32, period: &str| PerformanceReview {
            id: String::new(),
            employee_id: "e1".into(),
            reviewed_by_id: "m1".into(),
            review_period: period.into(),
            rating,
            strengths: String::new(),
            improvements: String::new(),
            comments: String::new(),
            review_date: at(2024, 3, day, 0, 0),
        };
        let summary = performance_summary(&[review(4.0, 1, "Q1"), review(3.0, 20, "Q2"), review(5.0, 10, "Q1b")]);
        assert_eq!(summary.review_count, 3);
        assert_eq!(summary.average_rating, 4.0);
        assert_eq!(summary.highest_rating, Some(5.0));
        assert_eq!(summary.lowest_rating, Some(3.0));
        assert_eq!(summary.latest_period.as_deref(), Some("Q2"));
        assert_eq!(performance_summary(&[]).review_count, 0);
    }
}
