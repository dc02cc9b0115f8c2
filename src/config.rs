use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::store::MAX_BATCH_OPERATIONS;

/// Ten years; longer warning windows are configuration mistakes.
const MAX_WARNING_DAYS: i64 = 3650;

/// Business rules shared by repositories, the coordinator and reports.
#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    /// Max write operations per committed batch (≤ the store's ceiling).
    pub batch_ceiling: usize,
    /// Check-ins strictly after this time of day are late.
    pub late_after: NaiveTime,
    pub standard_hours_per_day: f64,
    pub overtime_multiplier: f64,
    /// Fraction of one day's pay deducted per late day.
    pub late_deduction_ratio: f64,
    pub document_expiry_warning_days: i64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            batch_ceiling: MAX_BATCH_OPERATIONS,
            late_after: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            standard_hours_per_day: 8.0,
            overtime_multiplier: 1.5,
            late_deduction_ratio: 0.25,
            document_expiry_warning_days: 30,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub policy: Policy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Policy::default();
        let late_after = match env::var("LATE_AFTER") {
            Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .with_context(|| format!("LATE_AFTER must be HH:MM, got {raw:?}"))?,
            Err(_) => defaults.late_after,
        };

        let policy = Policy {
            batch_ceiling: parse_or("BATCH_CEILING", defaults.batch_ceiling)?
                .clamp(1, MAX_BATCH_OPERATIONS),
            late_after,
            standard_hours_per_day: positive(parse_or(
                "STANDARD_HOURS_PER_DAY",
                defaults.standard_hours_per_day,
            )?)?,
            overtime_multiplier: parse_or("OVERTIME_MULTIPLIER", defaults.overtime_multiplier)?,
            late_deduction_ratio: parse_or("LATE_DEDUCTION_RATIO", defaults.late_deduction_ratio)?,
            document_expiry_warning_days: warning_days(parse_or(
                "DOCUMENT_EXPIRY_WARNING_DAYS",
                defaults.document_expiry_warning_days,
            )?)?,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,
            policy,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

fn positive(value: f64) -> Result<f64> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(anyhow!("STANDARD_HOURS_PER_DAY must be positive, got {value}"))
    }
}

fn warning_days(value: i64) -> Result<i64> {
    if (0..=MAX_WARNING_DAYS).contains(&value) {
        Ok(value)
    } else {
        Err(anyhow!(
            "DOCUMENT_EXPIRY_WARNING_DAYS must be between 0 and {MAX_WARNING_DAYS}, got {value}"
        ))
    }
}
