use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::Repository;
use crate::aggregate::{self, AttendanceMonthSummary};
use crate::config::Policy;
use crate::error::{RepoError, RepoResult};
use crate::model::payroll::round_money;
use crate::model::{Employee, Entity, PayrollRecord, PayrollStatus, instant_value};
use crate::store::{Direction, DocumentStore, Fields, Query};
use crate::subscription::{LiveQuery, SubscriptionManager};

/// What an admin supplies when generating one month's pay.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollInput {
    pub month: u32,
    pub year: i32,
    pub base_salary: f64,
    pub bonuses: f64,
}

#[derive(Clone)]
pub struct PayrollRepository {
    records: Repository<PayrollRecord>,
    policy: Policy,
}

impl PayrollRepository {
    pub fn new(store: Arc<dyn DocumentStore>, live: SubscriptionManager, policy: Policy) -> Self {
        Self {
            records: Repository::new(store, live),
            policy,
        }
    }

    pub fn records(&self) -> &Repository<PayrollRecord> {
        &self.records
    }

    pub fn working_days(month: u32, year: i32) -> u32 {
        aggregate::working_days(month, year)
    }

    /// Computes and stores the month's record for `employee`.
    ///
    /// `netSalary` is fixed here from the components; at most one record
    /// exists per (employee, month, year).
    pub async fn generate(
        &self,
        employee: &Employee,
        input: PayrollInput,
        attendance: &AttendanceMonthSummary,
    ) -> RepoResult<PayrollRecord> {
        let working_days = Self::working_days(input.month, input.year);
        if working_days == 0 {
            return Err(RepoError::Validation(format!(
                "no working days in {}/{}",
                input.month, input.year
            )));
        }
        if !input.base_salary.is_finite() || input.base_salary < 0.0 {
            return Err(RepoError::Validation(format!(
                "baseSalary must be a non-negative amount, got {}",
                input.base_salary
            )));
        }

        let existing = self
            .records
            .first(self.period_query(input.month, input.year).eq("employeeId", employee.id.as_str()))
            .await?;
        if existing.is_some() {
            return Err(RepoError::already_exists(
                PayrollRecord::NAME,
                "employeeId/month/year",
                format!("{} {}/{}", employee.id, input.month, input.year),
            ));
        }

        let policy = &self.policy;
        let daily_rate = input.base_salary / f64::from(working_days);
        let gross_salary = round_money(daily_rate * f64::from(attendance.present_days));
        let overtime_pay = round_money(
            attendance.overtime_hours * daily_rate / policy.standard_hours_per_day
                * policy.overtime_multiplier,
        );
        let deductions =
            round_money(f64::from(attendance.late_days) * daily_rate * policy.late_deduction_ratio);

        let mut record = PayrollRecord {
            id: String::new(),
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            month: input.month,
            year: input.year,
            base_salary: input.base_salary,
            working_days,
            present_days: attendance.present_days,
            late_days: attendance.late_days,
            overtime_hours: attendance.overtime_hours,
            overtime_pay,
            deductions,
            bonuses: round_money(input.bonuses),
            gross_salary,
            net_salary: 0.0,
            status: PayrollStatus::Pending,
            generated_at: Utc::now(),
            paid_at: None,
        };
        record.net_salary = record.derived_net();

        let id = self.records.create(&record).await?;
        record.set_id(id);
        info!(
            id = %record.id,
            employee = %record.employee_id,
            month = record.month,
            year = record.year,
            net = record.net_salary,
            "Payroll generated"
        );
        Ok(record)
    }

    /// Changes bonuses and/or deductions of a pending record and re-derives
    /// `netSalary`. Paid records are frozen.
    pub async fn adjust(
        &self,
        id: &str,
        bonuses: Option<f64>,
        deductions: Option<f64>,
    ) -> RepoResult<PayrollRecord> {
        let mut record = self.records.require(id).await?;
        if record.status != PayrollStatus::Pending {
            return Err(RepoError::InvalidState(format!(
                "payroll {id} is {} and can no longer be adjusted",
                record.status
            )));
        }
        if bonuses.is_none() && deductions.is_none() {
            return Err(RepoError::Validation("nothing to adjust".into()));
        }

        if let Some(bonuses) = bonuses {
            record.bonuses = round_money(bonuses);
        }
        if let Some(deductions) = deductions {
            record.deductions = round_money(deductions);
        }
        record.net_salary = record.derived_net();
        record.validate()?;

        let mut fields = Fields::new();
        fields.insert("bonuses".into(), json!(record.bonuses));
        fields.insert("deductions".into(), json!(record.deductions));
        fields.insert("netSalary".into(), json!(record.net_salary));
        self.records
            .update_if(id, "status", PayrollStatus::Pending.to_string(), fields)
            .await?;
        info!(id, net = record.net_salary, "Payroll adjusted");
        Ok(record)
    }

    pub async fn mark_paid(&self, id: &str) -> RepoResult<PayrollRecord> {
        let mut record = self.records.require(id).await?;
        if record.status == PayrollStatus::Paid {
            return Err(RepoError::InvalidState(format!("payroll {id} is already paid")));
        }

        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(PayrollStatus::Paid.to_string()));
        fields.insert("paidAt".into(), json!(instant_value(now)));
        self.records
            .update_if(id, "status", PayrollStatus::Pending.to_string(), fields)
            .await?;

        record.status = PayrollStatus::Paid;
        record.paid_at = Some(now);
        info!(id, "Payroll marked paid");
        Ok(record)
    }

    pub async fn for_period(&self, month: u32, year: i32) -> RepoResult<Vec<PayrollRecord>> {
        self.records
            .query(
                &self
                    .period_query(month, year)
                    .order_by("employeeName", Direction::Ascending),
            )
            .await
    }

    pub fn subscribe_for_period(&self, month: u32, year: i32) -> RepoResult<LiveQuery<PayrollRecord>> {
        self.records.subscribe(
            self.period_query(month, year)
                .order_by("employeeName", Direction::Ascending),
        )
    }

    pub async fn for_employee(&self, employee_id: &str) -> RepoResult<Vec<PayrollRecord>> {
        self.records
            .query(
                &self
                    .records
                    .query_all()
                    .eq("employeeId", employee_id)
                    .order_by("generatedAt", Direction::Descending),
            )
            .await
    }

    fn period_query(&self, month: u32, year: i32) -> Query {
        self.records
            .query_all()
            .eq("month", month)
            .eq("year", year)
    }
}
