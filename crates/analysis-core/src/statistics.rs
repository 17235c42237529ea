//! Descriptive statistics over a fetched series.

use statrs::statistics::Statistics;

use crate::{AnalysisError, Series, StatisticsSummary};

/// Summarize a series. Fails on an empty series instead of producing NaN.
pub fn summarize(series: &Series) -> Result<StatisticsSummary, AnalysisError> {
    summarize_values(series.values()).map_err(|e| match e {
        AnalysisError::InsufficientData(_) => AnalysisError::InsufficientData(format!(
            "no observations for {}",
            series.symbol()
        )),
        other => other,
    })
}

pub fn summarize_values(values: &[f64]) -> Result<StatisticsSummary, AnalysisError> {
    let (first, last) = match (values.first(), values.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            return Err(AnalysisError::InsufficientData(
                "cannot summarize an empty series".to_string(),
            ))
        }
    };

    Ok(StatisticsSummary {
        mean: Statistics::mean(values),
        std: Statistics::population_std_dev(values),
        min: Statistics::min(values),
        max: Statistics::max(values),
        last_value: last,
        pct_change: pct_change(first, last, values.len()),
    })
}

/// Percent change from first to last observation. Zero when there is no range.
pub fn pct_change(first: f64, last: f64, len: usize) -> f64 {
    if len < 2 {
        return 0.0;
    }
    (last / first - 1.0) * 100.0
}
