use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::employee::Employee;

/// Directory lookups in front of the `employees` table.
/// Only hits are cached; a missing id always goes back to the database.
#[derive(Clone)]
pub struct EmployeeCache {
    by_id: Cache<u64, Employee>,
    head_count: Cache<(), u64>,
}

impl Default for EmployeeCache {
    fn default() -> Self {
        Self::new(100_000, Duration::from_secs(3600), Duration::from_secs(60))
    }
}

impl EmployeeCache {
    pub fn new(capacity: u64, entry_ttl: Duration, count_ttl: Duration) -> Self {
        Self {
            by_id: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(entry_ttl)
                .build(),
            head_count: Cache::builder()
                .max_capacity(1)
                .time_to_live(count_ttl)
                .build(),
        }
    }

    pub async fn get(&self, employee_id: u64) -> Option<Employee> {
        self.by_id.get(&employee_id).await
    }

    pub async fn remember(&self, employee: Employee) {
        self.by_id.insert(employee.id, employee).await;
    }

    pub async fn head_count(&self) -> Option<u64> {
        self.head_count.get(&()).await
    }

    pub async fn remember_head_count(&self, count: u64) {
        self.head_count.insert((), count).await;
    }

    async fn batch_remember(&self, employees: &mut Vec<Employee>) {
        let futures: Vec<_> = employees
            .drain(..)
            .map(|e| self.by_id.insert(e.id, e))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Streams the whole directory into the cache in batches.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<usize> {
        let batch_size = batch_size.max(1);
        let mut stream = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, employee_code, full_name, photo_url
            FROM employees
            ORDER BY id
            "#,
        )
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            batch.push(row?);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_remember(&mut batch).await;
            }
        }

        if !batch.is_empty() {
            self.batch_remember(&mut batch).await;
        }

        self.remember_head_count(total_count as u64).await;

        log::info!(
            "Employee cache warmup complete: {} employees (batch size {})",
            total_count,
            batch_size
        );

        Ok(total_count)
    }
}
