use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{RepoError, RepoResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum PayrollStatus {
    Pending,
    Paid,
}

/// One employee's pay for one month.
///
/// `net_salary` is derived when the record is generated (and re-derived on
/// adjustment while still pending); it is never recomputed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRecord {
    #[serde(skip)]
    pub id: String,
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    pub month: u32,
    pub year: i32,
    pub base_salary: f64,
    pub working_days: u32,
    pub present_days: u32,
    pub late_days: u32,
    pub overtime_hours: f64,
    pub overtime_pay: f64,
    pub deductions: f64,
    pub bonuses: f64,
    pub gross_salary: f64,
    pub net_salary: f64,
    pub status: PayrollStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub generated_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl PayrollRecord {
    pub fn derived_net(&self) -> f64 {
        round_money(self.gross_salary + self.overtime_pay + self.bonuses - self.deductions)
    }

    fn check(&self) -> RepoResult<()> {
        if !(1..=12).contains(&self.month) {
            return Err(RepoError::Validation(format!(
                "month must be 1-12, got {}",
                self.month
            )));
        }
        let amounts = [
            ("baseSalary", self.base_salary),
            ("overtimePay", self.overtime_pay),
            ("deductions", self.deductions),
            ("bonuses", self.bonuses),
            ("grossSalary", self.gross_salary),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(RepoError::Validation(format!(
                    "{name} must be a non-negative amount, got {value}"
                )));
            }
        }
        Ok(())
    }
}

pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl_entity!(PayrollRecord, "payroll", "PayrollRecord");
