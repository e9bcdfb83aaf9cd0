//! Accounting periods (one calendar month per tenant).

use std::fmt;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use ledgerline_shared::types::TenantId;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Upper bound on [`PeriodKey::trailing`] windows (ten years).
pub const MAX_TRAILING_PERIODS: u32 = 120;

/// Period lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Entries may be posted.
    Open,
    /// Held by exactly one sync.
    Syncing,
    /// No posting without an explicit reopen.
    Closed,
}

/// Identifies a tenant's accounting month.
///
/// Always names a real calendar month; construction is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PeriodRef", into = "PeriodRef")]
pub struct PeriodKey {
    tenant_id: TenantId,
    first_day: NaiveDate,
}

/// Wire form of [`PeriodKey`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PeriodRef {
    tenant_id: TenantId,
    year: i32,
    month: u32,
}

impl TryFrom<PeriodRef> for PeriodKey {
    type Error = LedgerError;

    fn try_from(value: PeriodRef) -> Result<Self, Self::Error> {
        Self::new(value.tenant_id, value.year, value.month)
    }
}

impl From<PeriodKey> for PeriodRef {
    fn from(key: PeriodKey) -> Self {
        Self {
            tenant_id: key.tenant_id,
            year: key.year(),
            month: key.month(),
        }
    }
}

impl PeriodKey {
    /// Validates year/month and builds the key.
    pub fn new(tenant_id: TenantId, year: i32, month: u32) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidPeriod { year, month });
        }
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(LedgerError::InvalidPeriod { year, month })?;
        Ok(Self {
            tenant_id,
            first_day,
        })
    }

    /// The period containing `date`.
    #[must_use]
    pub fn containing(tenant_id: TenantId, date: NaiveDate) -> Self {
        let first_day = date
            .checked_sub_days(Days::new(u64::from(date.day0())))
            .unwrap_or(date);
        Self {
            tenant_id,
            first_day,
        }
    }

    /// Owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// Calendar month (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    /// First day of the month.
    #[must_use]
    pub const fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Last day of the month.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Whether `date` falls in this month.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day && date <= self.last_day()
    }

    /// The preceding month.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        self.first_day
            .checked_sub_months(Months::new(1))
            .map(|first_day| Self {
                tenant_id: self.tenant_id,
                first_day,
            })
    }

    /// The `count` months before this one, oldest first.
    ///
    /// At most [`MAX_TRAILING_PERIODS`] are returned.
    #[must_use]
    pub fn trailing(&self, count: u32) -> Vec<Self> {
        let count = count.min(MAX_TRAILING_PERIODS);
        let mut periods = Vec::with_capacity(count as usize);
        let mut cursor = *self;
        for _ in 0..count {
            match cursor.previous() {
                Some(prev) => {
                    periods.push(prev);
                    cursor = prev;
                }
                None => break,
            }
        }
        periods.reverse();
        periods
    }

    /// `YYYY-MM` label.
    #[must_use]
    pub fn label(&self) -> String {
        self.first_day.format("%Y-%m").to_string()
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day.format("%Y-%m"))
    }
}

/// A tenant's accounting period and its sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Which month.
    pub key: PeriodKey,
    /// Current state.
    pub status: PeriodStatus,
    /// When the last sync released the period.
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Period {
    /// A never-synced open period.
    #[must_use]
    pub const fn open(key: PeriodKey) -> Self {
        Self {
            key,
            status: PeriodStatus::Open,
            last_synced_at: None,
        }
    }

    /// Whether any sync has completed on this period.
    #[must_use]
    pub const fn has_synced(&self) -> bool {
        self.last_synced_at.is_some()
    }
}

/// Outcome of the conditional open → syncing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodTransition {
    /// The caller now holds the period.
    Acquired,
    /// Another sync holds it.
    AlreadySyncing,
    /// The period is closed.
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(2024, 0)]
    #[case(2024, 13)]
    fn test_rejects_invalid_month(#[case] year: i32, #[case] month: u32) {
        assert_eq!(
            PeriodKey::new(TenantId::new(), year, month),
            Err(LedgerError::InvalidPeriod { year, month })
        );
    }

    #[rstest]
    #[case(2024, 2, 29)]
    #[case(2023, 2, 28)]
    #[case(2024, 3, 31)]
    #[case(2024, 4, 30)]
    #[case(2024, 12, 31)]
    fn test_last_day(#[case] year: i32, #[case] month: u32, #[case] last: u32) {
        let key = PeriodKey::new(TenantId::new(), year, month).unwrap();
        assert_eq!(key.first_day(), date(year, month, 1));
        assert_eq!(key.last_day(), date(year, month, last));
    }

    #[test]
    fn test_containing_and_contains() {
        let tenant = TenantId::new();
        let key = PeriodKey::containing(tenant, date(2024, 3, 17));
        assert_eq!(key, PeriodKey::new(tenant, 2024, 3).unwrap());
        assert!(key.contains(date(2024, 3, 31)));
        assert!(!key.contains(date(2024, 4, 1)));
    }

    #[test]
    fn test_previous_crosses_year() {
        let tenant = TenantId::new();
        let jan = PeriodKey::new(tenant, 2024, 1).unwrap();
        assert_eq!(jan.previous(), Some(PeriodKey::new(tenant, 2023, 12).unwrap()));
    }

    #[test]
    fn test_trailing_is_oldest_first() {
        let tenant = TenantId::new();
        let labels: Vec<String> = PeriodKey::new(tenant, 2024, 2)
            .unwrap()
            .trailing(3)
            .iter()
            .map(PeriodKey::label)
            .collect();
        assert_eq!(labels, ["2023-11", "2023-12", "2024-01"]);
    }

    #[test]
    fn test_trailing_is_capped() {
        let key = PeriodKey::new(TenantId::new(), 2024, 2).unwrap();
        let window = key.trailing(u32::MAX);
        assert_eq!(window.len(), MAX_TRAILING_PERIODS as usize);
        assert_eq!(window[0].label(), "2014-02");
        assert_eq!(window[119].label(), "2024-01");
    }

    #[test]
    fn test_serde_wire_form() {
        let tenant = TenantId::new();
        let key = PeriodKey::new(tenant, 2024, 3).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!(r#"{{"tenant_id":"{tenant}","year":2024,"month":3}}"#));
        let back: PeriodKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);

        let bad = format!(r#"{{"tenant_id":"{tenant}","year":2024,"month":13}}"#);
        assert!(serde_json::from_str::<PeriodKey>(&bad).is_err());
    }

    #[test]
    fn test_display_label() {
        let key = PeriodKey::new(TenantId::new(), 2024, 3).unwrap();
        assert_eq!(key.to_string(), "2024-03");
        assert_eq!(key.label(), "2024-03");
    }
}
