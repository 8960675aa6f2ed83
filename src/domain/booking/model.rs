//! Booking domain entity and lifecycle rules
//!
//! All transitions take the current time explicitly so that grace windows,
//! overtime and refund tiers are decided against one consistent instant.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{DomainError, DomainResult, TimingError};

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Booking lifecycle status
///
/// ```text
/// PENDING --> CONFIRMED --> ACTIVE --> COMPLETED
///    |            |
///    +------------+--> CANCELLED / EXPIRED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    /// Created, waiting for payment
    Pending,
    /// Paid, waiting for check-in
    Confirmed,
    /// Vehicle checked in
    Active,
    /// Vehicle checked out
    Completed,
    /// Cancelled by the owner
    Cancelled,
    /// Never used before the window closed
    Expired,
}

impl BookingStatus {
    /// Statuses that hold the slot and take part in overlap checks
    pub const HOLDING: [BookingStatus; 3] = [Self::Pending, Self::Confirmed, Self::Active];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            "EXPIRED" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }

    pub fn holds_slot(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timing rules for check-in and cancellation refunds
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Tolerance before start and after end during which check-in is allowed
    pub check_in_grace: Duration,
    /// Cancelling earlier than this before start refunds everything
    pub full_refund_lead: Duration,
    /// Cancelling earlier than this (but inside the full-refund lead) refunds partially
    pub partial_refund_lead: Duration,
    /// Share refunded in the partial tier, in percent
    pub partial_refund_percent: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            check_in_grace: Duration::minutes(15),
            full_refund_lead: Duration::minutes(60),
            partial_refund_lead: Duration::minutes(30),
            partial_refund_percent: 50,
        }
    }
}

impl BookingPolicy {
    /// Refund owed when cancelling `time_to_start` before the booked start.
    pub fn refund_amount(&self, total_amount: i64, time_to_start: Duration) -> i64 {
        if time_to_start > self.full_refund_lead {
            total_amount
        } else if time_to_start > self.partial_refund_lead {
            total_amount * self.partial_refund_percent / 100
        } else {
            0
        }
    }
}

/// Charge for parking longer than booked, billed per started hour.
pub fn overtime_charge(actual: Duration, planned: Duration, base_price: i64) -> i64 {
    let excess_ms = (actual - planned).num_milliseconds();
    if excess_ms <= 0 {
        return 0;
    }
    let hours = (excess_ms + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR;
    hours * base_price
}

/// Outcome of a check-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutSummary {
    /// Overtime charge added to the booking total
    pub additional_charges: i64,
    /// Booking total after overtime
    pub total_amount: i64,
    /// Parked duration, rounded to the nearest minute
    pub duration_minutes: i64,
}

/// A reservation of one slot for a bounded interval
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub slot_id: String,
    /// Requested start of the interval (inclusive)
    pub start_time: DateTime<Utc>,
    /// Requested end of the interval (exclusive)
    pub end_time: DateTime<Utc>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    /// Amount owed in the smallest currency unit; grows with extensions and overtime
    pub total_amount: i64,
    pub status: BookingStatus,
    pub qr_code: String,
    pub check_in_code: String,
    pub extended_times: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        user_id: impl Into<String>,
        slot_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        total_amount: i64,
        qr_code: impl Into<String>,
        check_in_code: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            slot_id: slot_id.into(),
            start_time,
            end_time,
            actual_start_time: None,
            actual_end_time: None,
            total_amount,
            status: BookingStatus::Pending,
            qr_code: qr_code.into(),
            check_in_code: check_in_code.into(),
            extended_times: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn planned_duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Half-open interval overlap with `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }

    /// Whether this booking occupies the window another booking wants to
    /// extend into, `[current_end, new_end)`.
    pub fn blocks_extension(&self, current_end: DateTime<Utc>, new_end: DateTime<Utc>) -> bool {
        self.start_time < new_end && self.end_time > current_end
    }

    /// First and last instants at which check-in is accepted (both inclusive)
    pub fn check_in_window(&self, grace: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start_time - grace, self.end_time + grace)
    }

    /// Whether the check-in window closed without the booking being used
    pub fn is_overdue(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
            && now > self.end_time + grace
    }

    /// PENDING -> CONFIRMED
    pub fn confirm(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(&[BookingStatus::Pending], BookingStatus::Confirmed, now)
    }

    /// CONFIRMED -> ACTIVE, inside the grace window
    pub fn check_in(&mut self, now: DateTime<Utc>, grace: Duration) -> DomainResult<()> {
        if self.status != BookingStatus::Confirmed {
            return Err(DomainError::InvalidState(format!(
                "Booking {} is not confirmed (status: {})",
                self.id, self.status
            )));
        }

        let (opens, closes) = self.check_in_window(grace);
        if now < opens {
            return Err(TimingError::TooEarly.into());
        }
        if now > closes {
            return Err(TimingError::Expired.into());
        }

        self.transition(&[BookingStatus::Confirmed], BookingStatus::Active, now)?;
        self.actual_start_time = Some(now);
        Ok(())
    }

    /// ACTIVE -> COMPLETED, recording overtime against the slot's hourly price
    pub fn check_out(&mut self, now: DateTime<Utc>, base_price: i64) -> DomainResult<CheckOutSummary> {
        if self.status != BookingStatus::Active {
            return Err(DomainError::InvalidState(format!(
                "Booking {} is not active (status: {})",
                self.id, self.status
            )));
        }

        let parked_since = self.actual_start_time.unwrap_or(self.start_time);
        let actual = now - parked_since;
        let additional_charges = overtime_charge(actual, self.planned_duration(), base_price);

        self.transition(&[BookingStatus::Active], BookingStatus::Completed, now)?;
        self.actual_end_time = Some(now);
        self.total_amount += additional_charges;

        Ok(CheckOutSummary {
            additional_charges,
            total_amount: self.total_amount,
            duration_minutes: (actual.num_milliseconds() as f64 / 60_000.0).round() as i64,
        })
    }

    /// Push the end time out by whole hours. Returns the amount added.
    ///
    /// Conflicts with other bookings are checked by the caller, which
    /// can see the rest of the slot's bookings.
    pub fn extend(&mut self, additional_hours: i64, base_price: i64, now: DateTime<Utc>) -> DomainResult<i64> {
        if additional_hours <= 0 {
            return Err(DomainError::Validation(
                "additional_hours must be positive".to_string(),
            ));
        }
        if !matches!(self.status, BookingStatus::Confirmed | BookingStatus::Active) {
            return Err(DomainError::InvalidState(format!(
                "Cannot extend booking {} (status: {})",
                self.id, self.status
            )));
        }

        let too_long = || DomainError::Validation(format!("Cannot extend by {additional_hours} hours"));
        let additional_amount = additional_hours.checked_mul(base_price).ok_or_else(too_long)?;
        let total_amount = self.total_amount.checked_add(additional_amount).ok_or_else(too_long)?;
        let end_time = Duration::try_hours(additional_hours)
            .and_then(|d| self.end_time.checked_add_signed(d))
            .ok_or_else(too_long)?;

        self.end_time = end_time;
        self.total_amount = total_amount;
        self.extended_times += 1;
        self.updated_at = now;
        Ok(additional_amount)
    }

    /// PENDING/CONFIRMED -> CANCELLED by the owner. Returns the refund owed.
    pub fn cancel(&mut self, requester_id: &str, now: DateTime<Utc>, policy: &BookingPolicy) -> DomainResult<i64> {
        if self.user_id != requester_id {
            return Err(DomainError::Unauthorized(format!(
                "Booking {} belongs to another user",
                self.id
            )));
        }

        self.transition(
            &[BookingStatus::Pending, BookingStatus::Confirmed],
            BookingStatus::Cancelled,
            now,
        )?;

        Ok(policy.refund_amount(self.total_amount, self.start_time - now))
    }

    /// PENDING/CONFIRMED -> EXPIRED
    pub fn expire(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(
            &[BookingStatus::Pending, BookingStatus::Confirmed],
            BookingStatus::Expired,
            now,
        )
    }

    fn transition(
        &mut self,
        allowed: &[BookingStatus],
        to: BookingStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !allowed.contains(&self.status) {
            return Err(DomainError::InvalidState(format!(
                "Booking {} cannot move from {} to {}",
                self.id, self.status, to
            )));
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn booking(start: DateTime<Utc>, end: DateTime<Utc>, total: i64) -> Booking {
        Booking::new("user-1", "slot-1", start, end, total, "WP-1-2-3", "123456")
    }

    fn confirmed(start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
        let mut b = booking(start, end, 850);
        b.confirm(start).unwrap();
        b
    }

    #[test]
    fn new_booking_is_pending_and_holds_slot() {
        let b = booking(at(10, 0), at(12, 0), 1700);
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(b.status.holds_slot());
        assert_eq!(b.planned_duration(), Duration::hours(2));
        assert_eq!(b.extended_times, 0);
    }

    #[test]
    fn overlap_is_half_open() {
        let b = booking(at(10, 0), at(12, 0), 0);
        assert!(b.overlaps(at(11, 0), at(13, 0)));
        assert!(b.overlaps(at(9, 0), at(10, 1)));
        assert!(!b.overlaps(at(12, 0), at(13, 0)));
        assert!(!b.overlaps(at(8, 0), at(10, 0)));
    }

    #[test]
    fn extension_blocking_only_considers_new_window() {
        let other = booking(at(12, 0), at(13, 0), 0);
        // extending 11:00 -> 12:00 ends exactly where the other starts
        assert!(!other.blocks_extension(at(11, 0), at(12, 0)));
        assert!(other.blocks_extension(at(11, 0), at(12, 30)));
        // a booking that ended before the current end never blocks
        let earlier = booking(at(8, 0), at(9, 0), 0);
        assert!(!earlier.blocks_extension(at(11, 0), at(14, 0)));
    }

    #[test]
    fn check_in_boundaries_are_inclusive() {
        let grace = Duration::minutes(15);

        let mut b = confirmed(at(10, 0), at(11, 0));
        assert!(b.check_in(at(9, 45), grace).is_ok());
        assert_eq!(b.status, BookingStatus::Active);
        assert_eq!(b.actual_start_time, Some(at(9, 45)));

        let mut b = confirmed(at(10, 0), at(11, 0));
        assert!(b.check_in(at(11, 15), grace).is_ok());
    }

    #[test]
    fn check_in_outside_window_fails() {
        let grace = Duration::minutes(15);

        let mut b = confirmed(at(10, 0), at(11, 0));
        let err = b.check_in(at(9, 44), grace).unwrap_err();
        assert!(matches!(err, DomainError::Timing(TimingError::TooEarly)));
        assert_eq!(b.status, BookingStatus::Confirmed);

        let err = b.check_in(at(11, 16), grace).unwrap_err();
        assert!(matches!(err, DomainError::Timing(TimingError::Expired)));
    }

    #[test]
    fn check_in_requires_confirmation() {
        let mut b = booking(at(10, 0), at(11, 0), 850);
        let err = b.check_in(at(10, 0), Duration::minutes(15)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn check_out_bills_started_overtime_hours() {
        let mut b = confirmed(at(10, 0), at(11, 0));
        b.check_in(at(10, 0), Duration::minutes(15)).unwrap();

        let summary = b.check_out(at(11, 10), 850).unwrap();
        assert_eq!(summary.additional_charges, 850);
        assert_eq!(summary.total_amount, 1700);
        assert_eq!(summary.duration_minutes, 70);
        assert_eq!(b.status, BookingStatus::Completed);
        assert_eq!(b.actual_end_time, Some(at(11, 10)));
    }

    #[test]
    fn check_out_on_time_adds_nothing() {
        let mut b = confirmed(at(10, 0), at(11, 0));
        b.check_in(at(10, 5), Duration::minutes(15)).unwrap();

        let summary = b.check_out(at(11, 0), 850).unwrap();
        assert_eq!(summary.additional_charges, 0);
        assert_eq!(summary.total_amount, 850);
        assert_eq!(summary.duration_minutes, 55);
    }

    #[test]
    fn check_out_requires_active_booking() {
        let mut b = confirmed(at(10, 0), at(11, 0));
        let err = b.check_out(at(11, 0), 850).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn overtime_rounds_up_to_whole_hours() {
        let planned = Duration::hours(1);
        assert_eq!(overtime_charge(Duration::minutes(60), planned, 500), 0);
        assert_eq!(overtime_charge(Duration::minutes(61), planned, 500), 500);
        assert_eq!(overtime_charge(Duration::minutes(120), planned, 500), 500);
        assert_eq!(overtime_charge(Duration::minutes(121), planned, 500), 1000);
        assert_eq!(overtime_charge(Duration::minutes(30), planned, 500), 0);
    }

    #[test]
    fn extend_adds_hours_and_amount() {
        let mut b = confirmed(at(10, 0), at(11, 0));
        let added = b.extend(2, 675, at(10, 30)).unwrap();
        assert_eq!(added, 1350);
        assert_eq!(b.end_time, at(13, 0));
        assert_eq!(b.total_amount, 850 + 1350);
        assert_eq!(b.extended_times, 1);
    }

    #[test]
    fn extend_rejects_pending_and_non_positive_hours() {
        let mut pending = booking(at(10, 0), at(11, 0), 850);
        assert!(matches!(
            pending.extend(1, 675, at(9, 0)),
            Err(DomainError::InvalidState(_))
        ));

        let mut b = confirmed(at(10, 0), at(11, 0));
        assert!(matches!(b.extend(0, 675, at(9, 0)), Err(DomainError::Validation(_))));
        assert_eq!(b.end_time, at(11, 0));
    }

    #[test]
    fn extend_rejects_overflowing_hours_without_changes() {
        let mut b = confirmed(at(10, 0), at(11, 0));
        assert!(matches!(
            b.extend(i64::MAX / 100, 675, at(10, 30)),
            Err(DomainError::Validation(_))
        ));
        // amount fits but the end time does not
        assert!(matches!(
            b.extend(i64::MAX / 1_000_000, 1, at(10, 30)),
            Err(DomainError::Validation(_))
        ));

        assert_eq!(b.end_time, at(11, 0));
        assert_eq!(b.total_amount, 850);
        assert_eq!(b.extended_times, 0);
    }

    #[test]
    fn cancel_refund_tiers() {
        let policy = BookingPolicy::default();
        let start = at(12, 0);

        let mut b = booking(start, at(13, 0), 1000);
        assert_eq!(b.cancel("user-1", start - Duration::minutes(61), &policy).unwrap(), 1000);
        assert_eq!(b.status, BookingStatus::Cancelled);

        let mut b = booking(start, at(13, 0), 1000);
        assert_eq!(b.cancel("user-1", start - Duration::minutes(45), &policy).unwrap(), 500);

        let mut b = booking(start, at(13, 0), 1000);
        assert_eq!(b.cancel("user-1", start - Duration::minutes(15), &policy).unwrap(), 0);
    }

    #[test]
    fn refund_tier_edges_fall_to_lower_tier() {
        let policy = BookingPolicy::default();
        assert_eq!(policy.refund_amount(1000, Duration::minutes(60)), 500);
        assert_eq!(policy.refund_amount(1000, Duration::minutes(30)), 0);
        assert_eq!(policy.refund_amount(1000, Duration::minutes(-10)), 0);
    }

    #[test]
    fn cancel_checks_owner_then_status() {
        let policy = BookingPolicy::default();
        let mut b = booking(at(12, 0), at(13, 0), 1000);
        assert!(matches!(
            b.cancel("intruder", at(9, 0), &policy),
            Err(DomainError::Unauthorized(_))
        ));

        let mut active = confirmed(at(12, 0), at(13, 0));
        active.check_in(at(12, 0), policy.check_in_grace).unwrap();
        assert!(matches!(
            active.cancel("user-1", at(12, 5), &policy),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn terminal_states_are_absorbing() {
        let mut b = booking(at(10, 0), at(11, 0), 850);
        b.expire(at(12, 0)).unwrap();
        assert!(b.status.is_terminal());
        assert!(b.confirm(at(12, 1)).is_err());
        assert!(b.expire(at(12, 2)).is_err());
        assert_eq!(b.status, BookingStatus::Expired);
    }

    #[test]
    fn overdue_only_after_grace() {
        let grace = Duration::minutes(15);
        let b = confirmed(at(10, 0), at(11, 0));
        assert!(!b.is_overdue(at(11, 15), grace));
        assert!(b.is_overdue(at(11, 16), grace));
    }

    #[test]
    fn status_parses_stored_values() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Active,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Expired,
        ] {
            assert_eq!(BookingStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::from_str("Booked"), None);
    }
}
