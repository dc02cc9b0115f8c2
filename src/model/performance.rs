use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReview {
    #[serde(skip)]
    pub id: String,
    pub employee_id: String,
    pub reviewed_by_id: String,
    /// Free-form label such as `2024-Q1`.
    pub review_period: String,
    pub rating: f64,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub improvements: String,
    #[serde(default)]
    pub comments: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub review_date: DateTime<Utc>,
}

impl PerformanceReview {
    fn check(&self) -> RepoResult<()> {
        if !(1.0..=5.0).contains(&self.rating) {
            return Err(RepoError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                self.rating
            )));
        }
        if self.reviewed_by_id == self.employee_id {
            return Err(RepoError::Validation("employees cannot review themselves".into()));
        }
        Ok(())
    }
}

impl_entity!(PerformanceReview, "performanceReviews", "PerformanceReview");
