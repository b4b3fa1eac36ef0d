//! Attendance ledger engine: write path, monthly reconstruction and daily stats.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppError;
use crate::model::employee::Employee;
use crate::store::EmployeeDirectory;
use crate::utils::clock::Clock;

pub mod lateness;
pub mod ledger;
pub mod monthly;
pub mod stats;

use lateness::{Lateness, ShiftPolicy};

/// Owns the store, the clock and the local-time policy.
/// Request handlers share one instance through `web::Data`.
pub struct AttendanceEngine<S> {
    store: S,
    clock: Arc<dyn Clock>,
    policy: ShiftPolicy,
}

impl<S> AttendanceEngine<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, policy: ShiftPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &ShiftPolicy {
        &self.policy
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current local wall-clock time.
    pub fn local_now(&self) -> NaiveDateTime {
        self.policy.local(self.clock.now())
    }

    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    /// Lateness for a local wall-clock instant.
    pub fn compute_lateness(&self, local: NaiveDateTime) -> Lateness {
        lateness::compute_lateness(local)
    }
}

impl<S: EmployeeDirectory> AttendanceEngine<S> {
    /// Directory entry for `employee_id`, or `NotFound`.
    pub async fn employee(&self, employee_id: u64) -> Result<Employee, AppError> {
        self.store
            .find_employee(employee_id)
            .await?
            .ok_or(AppError::NotFound(employee_id))
    }
}
