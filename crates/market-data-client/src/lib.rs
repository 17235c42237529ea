//! Historical series clients for the equity price and macroeconomic providers,
//! plus the memoizing fetcher that sits in front of them.

use chrono::{Duration, NaiveDate, Utc};

use analysis_core::AnalysisError;

pub mod fetcher;
pub mod fred;
pub mod yahoo;

pub use fetcher::{CachedFetcher, SeriesCache, DEFAULT_CACHE_CAPACITY};
pub use fred::FredClient;
pub use yahoo::YahooClient;

/// `[today - days, today]` in UTC. `days` must be positive and the start
/// date representable.
pub fn lookback_window(days: i64) -> Result<(NaiveDate, NaiveDate), AnalysisError> {
    window_ending(Utc::now().date_naive(), days)
}

fn window_ending(end: NaiveDate, days: i64) -> Result<(NaiveDate, NaiveDate), AnalysisError> {
    if days <= 0 {
        return Err(AnalysisError::Fetch(format!(
            "Lookback window must be a positive number of days, got {}",
            days
        )));
    }
    let start = Duration::try_days(days)
        .and_then(|span| end.checked_sub_signed(span))
        .ok_or_else(|| {
            AnalysisError::Fetch(format!("Lookback window of {} days is out of range", days))
        })?;
    Ok((start, end))
}

/// Shared mapping for transport-level failures
pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> AnalysisError {
    AnalysisError::Fetch(format!("{} request failed: {}", provider, e))
}
