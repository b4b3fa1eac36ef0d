use anyhow::{Context, Result, bail};
use chrono::FixedOffset;
use std::env;
use std::str::FromStr;

use crate::service::lateness::ShiftPolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    // Attendance rules
    pub utc_offset_minutes: i32,
    pub closing_hour: u32,
    pub employee_cache_warmup_batch: usize,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", 900)?, // 15 min
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            utc_offset_minutes: or_default("ATTENDANCE_UTC_OFFSET_MINUTES", 0)?,
            closing_hour: or_default("ATTENDANCE_CLOSING_HOUR", 22)?,
            employee_cache_warmup_batch: or_default("EMPLOYEE_CACHE_WARMUP_BATCH", 250)?,
        };

        config.shift_policy()?;
        Ok(config)
    }

    /// Local-time rules derived from the attendance settings.
    pub fn shift_policy(&self) -> Result<ShiftPolicy> {
        if self.closing_hour > 23 {
            bail!(
                "ATTENDANCE_CLOSING_HOUR must be between 0 and 23, got {}",
                self.closing_hour
            );
        }

        let offset = self
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .with_context(|| {
                format!(
                    "ATTENDANCE_UTC_OFFSET_MINUTES out of range: {}",
                    self.utc_offset_minutes
                )
            })?;

        Ok(ShiftPolicy::new(offset, self.closing_hour))
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/attendance_test".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 900,
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
            rate_login_per_min: 60,
            rate_protected_per_min: 1000,
            utc_offset_minutes: 0,
            closing_hour: 22,
            employee_cache_warmup_batch: 250,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_policy_from_offset_and_closing_hour() {
        let config = Config {
            utc_offset_minutes: 360,
            ..Config::for_tests()
        };
        let policy = config.shift_policy().unwrap();
        assert_eq!(policy.offset.local_minus_utc(), 6 * 3600);
        assert_eq!(policy.closing_hour, 22);
    }

    #[test]
    fn rejects_out_of_range_attendance_settings() {
        let late_close = Config {
            closing_hour: 24,
            ..Config::for_tests()
        };
        assert!(late_close.shift_policy().is_err());

        let wide_offset = Config {
            utc_offset_minutes: 24 * 60,
            ..Config::for_tests()
        };
        assert!(wide_offset.shift_policy().is_err());
    }
}
