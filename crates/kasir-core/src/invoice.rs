//! # Invoice Numbers
//!
//! Human-visible sale identifiers and the clock that scopes them to a day.
//!
//! ## Format
//! ```text
//! INV-20240115-0001
//! │   │        │
//! │   │        └── daily sequence, zero-padded to 4 digits (wider past 9999)
//! │   └─────────── business day (UTC), YYYYMMDD
//! └─────────────── fixed prefix
//! ```
//!
//! The sequence itself comes from a per-day counter that the storage layer
//! increments inside the checkout transaction; this module only formats and
//! parses.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};

/// Prefix of every invoice number.
pub const INVOICE_PREFIX: &str = "INV";

/// Formats an invoice number for `day` and sequence `seq` (1-based).
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use kasir_core::invoice::format_invoice_number;
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(format_invoice_number(day, 1), "INV-20240115-0001");
/// ```
pub fn format_invoice_number(day: NaiveDate, seq: u32) -> String {
    format!("{}-{}-{:04}", INVOICE_PREFIX, day.format("%Y%m%d"), seq)
}

/// Splits an invoice number back into its day and sequence.
///
/// Returns `None` for anything that does not follow the format.
pub fn parse_invoice_number(invoice: &str) -> Option<(NaiveDate, u32)> {
    let mut parts = invoice.splitn(3, '-');
    if parts.next()? != INVOICE_PREFIX {
        return None;
    }

    let day = parts.next()?;
    if day.len() != 8 {
        return None;
    }
    let day = NaiveDate::parse_from_str(day, "%Y%m%d").ok()?;

    let seq = parts.next()?;
    if seq.len() < 4 || !seq.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let seq = seq.parse().ok()?;
    if seq == 0 {
        return None;
    }

    Some((day, seq))
}

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for everything date-scoped (invoice day, sale_date,
/// dashboard periods).
///
/// Injected instead of read globally so tests can pin the date.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The business day, as a UTC calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use kasir_core::invoice::{Clock, FixedClock};
///
/// let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap());
/// assert_eq!(clock.today().to_string(), "2024-01-15");
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        FixedClock {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
