use bgwork_core::JobConfiguration;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

/// Compute the earliest-begin instant for the next wake-up after `from`.
///
/// The opportunistic platform has no periodic primitive, so every job is
/// re-armed `interval_in_millis` after the moment of arming. Intervals past
/// the representable range saturate at [`DateTime::<Utc>::MAX_UTC`] so the
/// wake-up chain is never dropped.
pub fn next_trigger(config: &JobConfiguration, from: DateTime<Utc>) -> DateTime<Utc> {
    let next = i64::try_from(config.interval_in_millis)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .and_then(|delta| from.checked_add_signed(delta));
    match next {
        Some(next) => next,
        None => {
            warn!(
                interval_ms = config.interval_in_millis,
                "interval exceeds representable range; arming at the latest instant"
            );
            DateTime::<Utc>::MAX_UTC
        }
    }
}
