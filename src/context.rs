use std::sync::Arc;

use crate::config::Policy;
use crate::coordinator::MutationCoordinator;
use crate::reports::Reports;
use crate::repository::{
    AttendanceRepository, ChatRepository, DocumentRepository, EmployeeRepository, LeaveRepository,
    NotificationRepository, PayrollRepository, PerformanceRepository, ShiftRepository,
};
use crate::store::{BlobStore, DocumentStore};
use crate::subscription::SubscriptionManager;

/// Every repository, the coordinator and reports, wired to one store.
///
/// Built once at startup and shared (cheap to clone).
#[derive(Clone)]
pub struct AppContext {
    pub policy: Policy,
    pub live: SubscriptionManager,
    pub employees: EmployeeRepository,
    pub attendance: AttendanceRepository,
    pub leave: LeaveRepository,
    pub shifts: ShiftRepository,
    pub payroll: PayrollRepository,
    pub documents: DocumentRepository,
    pub performance: PerformanceRepository,
    pub notifications: NotificationRepository,
    pub chat: ChatRepository,
    pub coordinator: MutationCoordinator,
    pub reports: Reports,
}

impl AppContext {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>, policy: Policy) -> Self {
        let live = SubscriptionManager::new(Arc::clone(&store));

        let employees = EmployeeRepository::new(Arc::clone(&store), live.clone());
        let attendance =
            AttendanceRepository::new(Arc::clone(&store), live.clone(), policy.late_after);
        let leave = LeaveRepository::new(Arc::clone(&store), live.clone());
        let shifts = ShiftRepository::new(Arc::clone(&store), live.clone());
        let payroll = PayrollRepository::new(Arc::clone(&store), live.clone(), policy.clone());
        let documents = DocumentRepository::new(
            Arc::clone(&store),
            live.clone(),
            blobs,
            policy.document_expiry_warning_days,
        );
        let performance = PerformanceRepository::new(Arc::clone(&store), live.clone());
        let notifications = NotificationRepository::new(Arc::clone(&store), live.clone());
        let chat = ChatRepository::new(store, live.clone());

        let coordinator = MutationCoordinator::new(
            employees.clone(),
            shifts.clone(),
            notifications.clone(),
            chat.clone(),
            &policy,
        );
        let reports = Reports::new(
            employees.clone(),
            attendance.clone(),
            leave.clone(),
            payroll.clone(),
            performance.clone(),
            &policy,
        );

        Self {
            policy,
            live,
            employees,
            attendance,
            leave,
            shifts,
            payroll,
            documents,
            performance,
            notifications,
            chat,
            coordinator,
            reports,
        }
    }
}
