use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use super::Repository;
use crate::error::{RepoError, RepoResult};
use crate::model::{Employee, Entity};
use crate::store::{Direction, DocumentStore, Fields};
use crate::subscription::{LiveQuery, SubscriptionManager};
use crate::utils::fields::{PatchRules, build_patch};

const PATCH_RULES: PatchRules<'static> = PatchRules {
    protected: &["isActive", "createdAt", "addedBy"],
    timestamps: &["joiningDate"],
};

#[derive(Clone)]
pub struct EmployeeRepository {
    records: Repository<Employee>,
}

impl EmployeeRepository {
    pub fn new(store: Arc<dyn DocumentStore>, live: SubscriptionManager) -> Self {
        Self {
            records: Repository::new(store, live),
        }
    }

    pub fn records(&self) -> &Repository<Employee> {
        &self.records
    }

    /// Creates an active employee after checking that no active employee
    /// already holds the same business code or auth identity.
    ///
    /// The check and the write are separate store calls; two concurrent
    /// creates with the same code can still both land.
    pub async fn create_employee(&self, mut employee: Employee) -> RepoResult<Employee> {
        employee.is_active = true;
        employee.validate()?;
        self.ensure_unique(&employee, None).await?;

        let id = self.records.create(&employee).await?;
        employee.set_id(id);
        info!(id = %employee.id, code = %employee.employee_id, "Employee created");
        Ok(employee)
    }

    pub async fn get(&self, id: &str) -> RepoResult<Employee> {
        self.records.require(id).await
    }

    pub async fn find_by_user_id(&self, user_id: &str) -> RepoResult<Option<Employee>> {
        self.records
            .first(
                self.records
                    .query_all()
                    .eq("userId", user_id)
                    .eq("isActive", true),
            )
            .await
    }

    /// Any employee (active or not) with this business code.
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<Employee>> {
        let mut matches = self
            .records
            .query(&self.records.query_all().eq("employeeId", code))
            .await?;
        // Prefer the active holder when a deactivated one shares the code.
        matches.sort_by_key(|e| !e.is_active);
        Ok(matches.into_iter().next())
    }

    pub async fn list_active(&self) -> RepoResult<Vec<Employee>> {
        self.records
            .query(
                &self
                    .records
                    .query_all()
                    .eq("isActive", true)
                    .order_by("name", Direction::Ascending),
            )
            .await
    }

    pub fn subscribe_active(&self) -> RepoResult<LiveQuery<Employee>> {
        self.records.subscribe(
            self.records
                .query_all()
                .eq("isActive", true)
                .order_by("name", Direction::Ascending),
        )
    }

    pub async fn list_by_department(&self, department: &str) -> RepoResult<Vec<Employee>> {
        self.records
            .query(
                &self
                    .records
                    .query_all()
                    .eq("department", department)
                    .eq("isActive", true)
                    .order_by("name", Direction::Ascending),
            )
            .await
    }

    /// Applies a partial JSON update. Changing `employeeId` or `userId`
    /// re-runs the uniqueness check against the other active employees.
    pub async fn update_employee(&self, id: &str, payload: &Value) -> RepoResult<Employee> {
        let patch = build_patch(payload, PATCH_RULES)?;
        let current = self.records.require(id).await?;

        if patch.contains_key("employeeId") || patch.contains_key("userId") {
            let mut candidate = current.clone();
            if let Some(Value::String(code)) = patch.get("employeeId") {
                candidate.employee_id = code.clone();
            }
            if let Some(Value::String(user_id)) = patch.get("userId") {
                candidate.user_id = user_id.clone();
            }
            if current.is_active {
                self.ensure_unique(&candidate, Some(id)).await?;
            }
        }

        self.records.update(id, patch).await?;
        info!(id, "Employee updated");
        self.records.require(id).await
    }

    /// Soft delete. Deactivating an inactive employee succeeds unchanged.
    pub async fn deactivate(&self, id: &str) -> RepoResult<()> {
        let employee = self.records.require(id).await?;
        if !employee.is_active {
            info!(id, "Employee already inactive");
            return Ok(());
        }
        self.records.update(id, flag(false)).await?;
        info!(id, "Employee deactivated");
        Ok(())
    }

    pub async fn reactivate(&self, id: &str) -> RepoResult<()> {
        let employee = self.records.require(id).await?;
        if employee.is_active {
            return Ok(());
        }
        self.ensure_unique(&employee, Some(id)).await?;
        self.records.update(id, flag(true)).await?;
        info!(id, "Employee reactivated");
        Ok(())
    }

    /// Auth identities of every active employee, the fan-out audience.
    pub async fn active_user_ids(&self) -> RepoResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .list_active()
            .await?
            .into_iter()
            .map(|e| e.user_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn ensure_unique(&self, employee: &Employee, except: Option<&str>) -> RepoResult<()> {
        let active = self.records.query_all().eq("isActive", true);
        let checks = [
            ("employeeId", employee.employee_id.as_str()),
            ("userId", employee.user_id.as_str()),
        ];
        for (field, value) in checks {
            let holders = self
                .records
                .query(&active.clone().eq(field, value))
                .await?;
            if holders.iter().any(|e| Some(e.id.as_str()) != except) {
                warn!(field, value, "Duplicate active employee rejected");
                return Err(RepoError::already_exists(Employee::NAME, field, value));
            }
        }
        Ok(())
    }
}

fn flag(active: bool) -> Fields {
    let mut fields = Fields::new();
    fields.insert("isActive".into(), json!(active));
    fields
}
