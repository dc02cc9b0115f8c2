use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, ReviewLeave};
use crate::api::notification::Broadcast;
use crate::api::payroll::{CreatePayroll, PayrollListResponse, PayrollQuery, UpdatePayroll};
use crate::api::shift::CreateSwap;
use crate::api::attendance::AttendanceLocation;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Sync API",
        version = "1.0.0",
        description = r#"
## Human Resource Management (HRM) System

HTTP surface over the HRM record store. Records live in a document store;
every mutation here goes through typed repositories, and multi-document
changes are committed in atomic batches.

### 🔹 Key Features
- **Employee Management**
  - Create, update, list, view and deactivate employee profiles
- **Leave Management**
  - Apply for leave, approve/reject/cancel requests, per-type balances
- **Attendance Management**
  - Daily check-in and check-out, company and department attendance rates
- **Payroll Management**
  - Generate monthly payroll from attendance, adjust, mark paid, monthly totals
- **Shift Swaps**
  - Request swaps; approval exchanges both assignments atomically
- **Notifications and Chat**
  - Broadcasts and bulk read-marking in chunked batches, chat group removal

### 🔐 Security
All endpoints need a **JWT Bearer** session token issued by the identity
provider. Admin-only operations are marked in their descriptions.

### 📦 Bulk writes
Bulk endpoints answer `{ "written", "batches" }`. If one stops part way the
error body carries `committed` and `requested` so the caller knows what is
already durable.

---
Built with **Rust**, **Actix Web**, **Tokio**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::leave_balances,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::attendance_stats,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::deactivate_employee,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::mark_paid,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::payroll_summary,

        crate::api::shift::request_swap,
        crate::api::shift::list_swaps,
        crate::api::shift::approve_swap,
        crate::api::shift::reject_swap,

        crate::api::notification::my_notifications,
        crate::api::notification::mark_read,
        crate::api::notification::mark_all_read,
        crate::api::notification::broadcast,

        crate::api::chat::my_groups,
        crate::api::chat::delete_group
    ),
    components(
        schemas(
            LeaveFilter,
            CreateLeave,
            ReviewLeave,
            LeaveListResponse,
            AttendanceLocation,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            PayrollListResponse,
            CreatePayroll,
            UpdatePayroll,
            PayrollQuery,
            CreateSwap,
            Broadcast
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Payroll", description = "Payroll management APIs"),
        (name = "Shift", description = "Shift swap APIs"),
        (name = "Notification", description = "Notification APIs"),
        (name = "Chat", description = "Chat group APIs"),
    )
)]
pub struct ApiDoc;
