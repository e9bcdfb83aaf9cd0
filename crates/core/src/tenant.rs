//! Tenant metadata consumed by the engines.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use ledgerline_shared::types::{Currency, TenantId};
use serde::{Deserialize, Serialize};

/// A tenant of the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant ID.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// IANA time zone used for accounting dates.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    /// Functional currency of the ledger.
    #[serde(default)]
    pub base_currency: Currency,
    /// Whether the scheduler should process this tenant.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Granularity used to find the end of a DST gap; zone offsets move in
/// multiples of 15 minutes.
const STEP_MINUTES: i64 = 15;
const DAY_STEPS: i64 = 24 * 60 / STEP_MINUTES;

fn default_timezone() -> Tz {
    chrono_tz::Asia::Kolkata
}

fn default_active() -> bool {
    true
}

impl Tenant {
    /// Creates an active INR tenant in `Asia/Kolkata`.
    #[must_use]
    pub fn new(id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            timezone: default_timezone(),
            base_currency: Currency::Inr,
            is_active: true,
        }
    }

    /// Tenant-local calendar date of an instant.
    #[must_use]
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// UTC instant of the first local moment of `date`.
    ///
    /// That is local midnight, or the end of the gap when a DST change skips
    /// midnight. `None` when the zone skips the whole day.
    #[must_use]
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        (0..DAY_STEPS)
            .map(|step| midnight + Duration::minutes(step * STEP_MINUTES))
            .take_while(|local| local.date() == date)
            .find_map(|local| self.timezone.from_local_datetime(&local).earliest())
            .map(|local| local.with_timezone(&Utc))
    }

    /// Today's date in the tenant's time zone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_date_crosses_midnight() {
        let tenant = Tenant::new(TenantId::new(), "Acme");
        // 2024-03-31 20:00 UTC is 2024-04-01 01:30 in Kolkata
        let instant = Utc.with_ymd_and_hms(2024, 3, 31, 20, 0, 0).unwrap();
        assert_eq!(
            tenant.local_date(instant),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
    }

    #[test]
    fn test_start_of_day_is_utc_offset() {
        let tenant = Tenant::new(TenantId::new(), "Acme");
        let start = tenant
            .start_of_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_start_of_day_skips_dst_gap() {
        let mut tenant = Tenant::new(TenantId::new(), "Andes Retail");
        tenant.timezone = chrono_tz::America::Santiago;
        // clocks jump from 00:00 to 01:00 local on 2024-09-08
        let start = tenant
            .start_of_day(NaiveDate::from_ymd_opt(2024, 9, 8).unwrap())
            .unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap());
        assert_eq!(tenant.local_date(start), NaiveDate::from_ymd_opt(2024, 9, 8).unwrap());

        let before = tenant
            .start_of_day(NaiveDate::from_ymd_opt(2024, 9, 7).unwrap())
            .unwrap();
        assert_eq!(before, Utc.with_ymd_and_hms(2024, 9, 7, 4, 0, 0).unwrap());
    }

    #[test]
    fn test_deserialize_defaults() {
        let id = TenantId::new();
        let tenant: Tenant =
            serde_json::from_str(&format!(r#"{{"id":"{id}","name":"Acme"}}"#)).unwrap();
        assert_eq!(tenant.timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(tenant.base_currency, Currency::Inr);
        assert!(tenant.is_active);
    }
}
