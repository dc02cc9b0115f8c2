use std::sync::Arc;

use tracing::info;

use super::Repository;
use crate::error::RepoResult;
use crate::model::{Entity, PerformanceReview};
use crate::store::{Direction, DocumentStore, Query};
use crate::subscription::{LiveQuery, SubscriptionManager};

#[derive(Clone)]
pub struct PerformanceRepository {
    records: Repository<PerformanceReview>,
}

impl PerformanceRepository {
    pub fn new(store: Arc<dyn DocumentStore>, live: SubscriptionManager) -> Self {
        Self {
            records: Repository::new(store, live),
        }
    }

    pub fn records(&self) -> &Repository<PerformanceReview> {
        &self.records
    }

    pub async fn add_review(&self, mut review: PerformanceReview) -> RepoResult<PerformanceReview> {
        let id = self.records.create(&review).await?;
        review.set_id(id);
        info!(
            id = %review.id,
            employee = %review.employee_id,
            rating = review.rating,
            "Performance review added"
        );
        Ok(review)
    }

    pub async fn for_employee(&self, employee_id: &str) -> RepoResult<Vec<PerformanceReview>> {
        self.records.query(&self.employee_query(employee_id)).await
    }

    pub async fn for_period(&self, period: &str) -> RepoResult<Vec<PerformanceReview>> {
        self.records
            .query(
                &self
                    .records
                    .query_all()
                    .eq("reviewPeriod", period)
                    .order_by("rating", Direction::Descending),
            )
            .await
    }

    pub fn subscribe_for_employee(
        &self,
        employee_id: &str,
    ) -> RepoResult<LiveQuery<PerformanceReview>> {
        self.records.subscribe(self.employee_query(employee_id))
    }

    fn employee_query(&self, employee_id: &str) -> Query {
        self.records
            .query_all()
            .eq("employeeId", employee_id)
            .order_by("reviewDate", Direction::Descending)
    }
}
