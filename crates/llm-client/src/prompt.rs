use analysis_core::Series;
use chrono::NaiveDate;

/// Number of observations taken from each end of the series.
pub const PREVIEW_LEN: usize = 5;

/// Build the analysis prompt from the series head/tail and the user's query.
pub fn build_prompt(query: &str, series: &Series) -> String {
    let dates = series.dates();
    let values = series.values();

    let mut prompt = format!("Analyze the following financial data for {}:\n\n", series.symbol());
    prompt.push_str(&format!(
        "Dates: {}...{}\n",
        quoted_dates(head(dates)),
        quoted_dates(tail(dates))
    ));
    prompt.push_str(&format!("Values: {:?}...{:?}\n\n", head(values), tail(values)));
    prompt.push_str(&format!("User query: {}\n", query));
    prompt.push_str("Provide a concise analysis based on the data and the user's query.");
    prompt
}

/// `['2024-01-02', '2024-01-03']`
fn quoted_dates(dates: &[NaiveDate]) -> String {
    let quoted: Vec<String> = dates
        .iter()
        .map(|d| format!("'{}'", d.format("%Y-%m-%d")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

fn head<T>(items: &[T]) -> &[T] {
    &items[..items.len().min(PREVIEW_LEN)]
}

fn tail<T>(items: &[T]) -> &[T] {
    &items[items.len().saturating_sub(PREVIEW_LEN)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn series(n: usize) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Series::from_points(
            "AAPL",
            (0..n).map(|i| (start + Duration::days(i as i64), i as f64)).collect(),
        )
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = build_prompt("stock price of AAPL", &series(3));
        assert_eq!(
            prompt,
            "Analyze the following financial data for AAPL:\n\n\
             Dates: ['2024-01-01', '2024-01-02', '2024-01-03']...['2024-01-01', '2024-01-02', '2024-01-03']\n\
             Values: [0.0, 1.0, 2.0]...[0.0, 1.0, 2.0]\n\n\
             User query: stock price of AAPL\n\
             Provide a concise analysis based on the data and the user's query."
        );
    }

    #[test]
    fn test_prompt_is_bounded() {
        let prompt = build_prompt("stock AAPL", &series(1000));
        assert!(prompt.contains("[0.0, 1.0, 2.0, 3.0, 4.0]...[995.0, 996.0, 997.0, 998.0, 999.0]"));
        assert!(!prompt.contains("500.0"));
        assert!(prompt.len() < 600);
    }

    #[test]
    fn test_quoted_dates() {
        assert_eq!(quoted_dates(&[]), "[]");
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(quoted_dates(&[d]), "['2024-03-09']");
    }

    #[test]
    fn test_head_tail_short_slices() {
        let empty: [u8; 0] = [];
        assert!(head(&empty).is_empty());
        assert!(tail(&empty).is_empty());
        assert_eq!(tail(&[1, 2, 3, 4, 5, 6, 7]), &[3, 4, 5, 6, 7]);
    }
}
