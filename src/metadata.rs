use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Versioning metadata carried by a decoded primitive. Every field is
/// optional; sources stripped of history produce all-`None` metadata and
/// the corresponding output columns surface as nulls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementMeta {
    pub version: Option<i64>,
    pub timestamp: Option<String>,
    pub changeset: Option<i64>,
}

impl ElementMeta {
    pub fn new(version: Option<i64>, timestamp: Option<String>, changeset: Option<i64>) -> Self {
        Self {
            version,
            timestamp,
            changeset,
        }
    }

    /// Build metadata from a millisecond epoch timestamp, as decoders that
    /// read PBF info blocks hold them.
    pub fn from_millis(version: Option<i64>, millis: Option<i64>, changeset: Option<i64>) -> Self {
        Self {
            version,
            timestamp: millis.and_then(format_timestamp_millis),
            changeset,
        }
    }
}

pub fn format_timestamp_millis(millis: i64) -> Option<String> {
    let nanos = i128::from(millis) * 1_000_000;
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
    dt.format(&Rfc3339).ok()
}
