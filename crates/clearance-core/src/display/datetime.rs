//! Timestamp formatting for audit-trail output.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// Renders an action-log timestamp in the system timezone as
/// `YYYY-MM-DD HH:MM:SS TZ`. Log entries are stored as UTC instants;
/// the port operates on Gulf time, so display always goes through the
/// system zone.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .to_zoned(TimeZone::system())
                .strftime("%Y-%m-%d %H:%M:%S %Z")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_renders_date_and_time_fields() {
        let rendered = format!("{}", LocalDateTime(&Timestamp::UNIX_EPOCH));
        // Zone-dependent, but the date portion always leads.
        assert!(rendered.starts_with("19"));
        assert!(rendered.contains(':'));
    }
}
