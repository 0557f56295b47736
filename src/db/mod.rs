pub mod analysis;
pub mod connection;
pub mod jobs;
pub mod migrations;
#[cfg(test)]
pub mod test_support;
pub mod videos;

/// Current UTC time as RFC 3339 with second precision, the timestamp format
/// used everywhere in the database.
pub fn utc_now() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
