//! Expiry and revocation semantics shared by access tokens and grants.

use time::{Duration, OffsetDateTime};

/// Read-time expiry and revocation predicates.
///
/// Nothing is ever swept or deleted: "expired" is computed from
/// `inserted_at + expires_in` whenever it is asked, and revocation only ever
/// sets `revoked_at` once.
pub trait Lifecycle {
    /// When the record was created. Authoritative for expiry.
    fn inserted_at(&self) -> OffsetDateTime;

    /// Lifetime in seconds. `None` never expires.
    fn expires_in(&self) -> Option<i64>;

    /// When the record was revoked, if ever.
    fn revoked_at(&self) -> Option<OffsetDateTime>;

    /// Stamps the revocation time.
    fn set_revoked_at(&mut self, at: OffsetDateTime);

    /// The instant at which the record stops being accessible.
    ///
    /// A lifetime that runs past the largest representable date never
    /// expires; one that runs before the smallest is expired from the start.
    fn expires_at(&self) -> Option<OffsetDateTime> {
        let secs = self.expires_in()?;
        match self.inserted_at().checked_add(Duration::seconds(secs)) {
            Some(at) => Some(at),
            None if secs < 0 => Some(self.inserted_at()),
            None => None,
        }
    }

    /// Returns `true` if the record has been revoked. Revocation is permanent.
    fn is_revoked(&self) -> bool {
        self.revoked_at().is_some()
    }

    /// Returns `true` if the record is expired at `now`.
    ///
    /// Expiry is inclusive: at exactly `inserted_at + expires_in` the record
    /// is already expired.
    fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at().is_some_and(|exp| now >= exp)
    }

    /// Returns `true` if the record is expired now.
    fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Returns `true` if the record is neither revoked nor expired at `now`.
    fn is_accessible_at(&self, now: OffsetDateTime) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }

    /// Returns `true` if the record is neither revoked nor expired now.
    fn is_accessible(&self) -> bool {
        self.is_accessible_at(OffsetDateTime::now_utc())
    }
}

/// Accessibility of a possibly-missing record. A missing record is never
/// accessible.
pub fn is_accessible<T: Lifecycle>(record: Option<&T>) -> bool {
    record.is_some_and(|r| r.is_accessible())
}

/// Revocation status of a possibly-missing record.
pub fn is_revoked<T: Lifecycle>(record: Option<&T>) -> bool {
    record.is_some_and(|r| r.is_revoked())
}
