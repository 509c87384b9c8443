//! # Reading: one immutable measurement snapshot.
//!
//! A [`Reading`] is produced by a [`DataSource`](crate::DataSource) and owned by the
//! [`SharedStore`](crate::SharedStore) afterwards. It is never edited; the next
//! successful fetch supersedes it.

use chrono::{DateTime, Local};

/// Measurement event plus the moment it was acquired.
///
/// The payload is opaque to the supervisor.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<T> {
    at: DateTime<Local>,
    payload: T,
}

impl<T> Reading<T> {
    /// Creates a reading acquired at `at`.
    pub fn new(at: DateTime<Local>, payload: T) -> Self {
        Self { at, payload }
    }

    /// Creates a reading stamped with the current local time.
    pub fn now(payload: T) -> Self {
        Self::new(Local::now(), payload)
    }

    /// Acquisition timestamp.
    pub fn at(&self) -> DateTime<Local> {
        self.at
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn keeps_timestamp_and_payload() {
        let at = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let r = Reading::new(at, 21.5_f32);
        assert_eq!(r.at(), at);
        assert_eq!(*r.payload(), 21.5);
        assert_eq!(r.into_payload(), 21.5);
    }
}
