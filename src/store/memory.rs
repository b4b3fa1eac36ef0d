use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::NaiveDate;

use super::{AttendanceStore, EmployeeDirectory, OnConflict, SlotWrite};
use crate::error::AppError;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;

#[derive(Default)]
struct Ledger {
    next_id: u64,
    slots: BTreeMap<(u64, NaiveDate), AttendanceRecord>,
}

/// In-process ledger for tests. A single mutex makes each upsert atomic.
#[derive(Default)]
pub struct MemoryStore {
    employees: Mutex<HashMap<u64, Employee>>,
    ledger: Mutex<Ledger>,
    offline: Mutex<bool>,
}

impl MemoryStore {
    pub fn with_employees(ids: impl IntoIterator<Item = u64>) -> Self {
        let store = Self::default();
        {
            let mut employees = store.employees.lock().unwrap();
            for id in ids {
                employees.insert(
                    id,
                    Employee {
                        id,
                        employee_code: format!("EMP-{id:03}"),
                        full_name: format!("Employee {id}"),
                        photo_url: None,
                    },
                );
            }
        }
        store
    }

    /// Seeds a row directly, bypassing the write path (legacy data, fixtures).
    pub fn seed(&self, record: AttendanceRecord) {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.next_id = ledger.next_id.max(record.id);
        ledger
            .slots
            .insert((record.employee_id, record.date), record);
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn len(&self) -> usize {
        self.ledger.lock().unwrap().slots.len()
    }

    fn check_online(&self) -> Result<(), AppError> {
        if *self.offline.lock().unwrap() {
            Err(AppError::StoreUnavailable)
        } else {
            Ok(())
        }
    }
}

impl AttendanceStore for MemoryStore {
    async fn find_slot(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        self.check_online()?;
        let ledger = self.ledger.lock().unwrap();
        Ok(ledger.slots.get(&(employee_id, date)).cloned())
    }

    async fn find_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        self.check_online()?;
        if from >= until {
            return Ok(Vec::new());
        }
        let ledger = self.ledger.lock().unwrap();
        Ok(ledger
            .slots
            .range((employee_id, from)..(employee_id, until))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, AppError> {
        self.check_online()?;
        let ledger = self.ledger.lock().unwrap();
        Ok(ledger
            .slots
            .values()
            .filter(|record| record.date == date)
            .cloned()
            .collect())
    }

    async fn upsert_slot(&self, write: SlotWrite) -> Result<AttendanceRecord, AppError> {
        self.check_online()?;
        let mut guard = self.ledger.lock().unwrap();
        let ledger = &mut *guard;

        let key = (write.employee_id, write.date);
        if let Some(existing) = ledger.slots.get_mut(&key) {
            existing.status = write.status;
            if let OnConflict::ResetLateness { note } = write.on_conflict {
                existing.late_minutes = Some(0);
                if note.is_some() {
                    existing.note = note;
                }
            }
            return Ok(existing.clone());
        }

        ledger.next_id += 1;
        let record = AttendanceRecord {
            id: ledger.next_id,
            employee_id: write.employee_id,
            date: write.date,
            status: write.status,
            late_minutes: Some(write.late_minutes),
            created_at: write.created_at,
            photo_url: write.photo_url.clone(),
            note: write.note().map(str::to_owned),
        };
        ledger.slots.insert(key, record.clone());
        Ok(record)
    }
}

impl EmployeeDirectory for MemoryStore {
    async fn find_employee(&self, employee_id: u64) -> Result<Option<Employee>, AppError> {
        self.check_online()?;
        Ok(self.employees.lock().unwrap().get(&employee_id).cloned())
    }

    async fn count_employees(&self) -> Result<u64, AppError> {
        self.check_online()?;
        Ok(self.employees.lock().unwrap().len() as u64)
    }
}
