pub mod clock;
pub mod employee_cache;
