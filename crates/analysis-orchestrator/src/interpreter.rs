//! Keyword heuristic that maps a free-text query to a data source.
//!
//! "stock" is checked before "fred", so a query naming both resolves to the
//! equity path. The identifier is always the query's last whitespace token.

use analysis_core::{AnalysisError, DataSource};

pub const UNRECOGNIZED_QUERY: &str = "Unable to interpret the query";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub source: DataSource,
    pub identifier: String,
}

pub fn interpret(query: &str) -> Result<ResolvedQuery, AnalysisError> {
    let lowered = query.to_lowercase();
    let last_token = query.split_whitespace().last();

    let resolved = if lowered.contains("stock") {
        last_token.map(|t| ResolvedQuery {
            source: DataSource::Equity,
            identifier: t.to_uppercase(),
        })
    } else if lowered.contains("fred") {
        last_token.map(|t| ResolvedQuery {
            source: DataSource::Macro,
            identifier: t.to_string(),
        })
    } else {
        None
    };

    resolved.ok_or_else(|| AnalysisError::Interpretation(UNRECOGNIZED_QUERY.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_query_uppercases_last_token() {
        let resolved = interpret("Show me the stock price of aapl").unwrap();
        assert_eq!(resolved.source, DataSource::Equity);
        assert_eq!(resolved.identifier, "AAPL");
    }

    #[test]
    fn test_stock_match_is_case_insensitive() {
        let resolved = interpret("STOCK msft").unwrap();
        assert_eq!(resolved.source, DataSource::Equity);
        assert_eq!(resolved.identifier, "MSFT");
    }

    #[test]
    fn test_fred_query_keeps_token_verbatim() {
        let resolved = interpret("fred series gdpC1").unwrap();
        assert_eq!(resolved.source, DataSource::Macro);
        assert_eq!(resolved.identifier, "gdpC1");
    }

    #[test]
    fn test_stock_wins_over_fred() {
        let resolved = interpret("fred or stock? tsla").unwrap();
        assert_eq!(resolved.source, DataSource::Equity);
        assert_eq!(resolved.identifier, "TSLA");

        let resolved = interpret("stock data from FRED dgs10").unwrap();
        assert_eq!(resolved.source, DataSource::Equity);
        assert_eq!(resolved.identifier, "DGS10");
    }

    #[test]
    fn test_token_is_substring_match() {
        // "stocks" contains "stock"; the last token is taken whatever it is
        let resolved = interpret("compare stocks").unwrap();
        assert_eq!(resolved.identifier, "STOCKS");
    }

    #[test]
    fn test_unrecognized_query() {
        for query in ["what is the weather", "", "   ", "bond yields 10Y"] {
            match interpret(query) {
                Err(AnalysisError::Interpretation(msg)) => assert_eq!(msg, UNRECOGNIZED_QUERY),
                other => panic!("expected interpretation error for {:?}, got {:?}", query, other),
            }
        }
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let resolved = interpret("  fred UNRATE \n").unwrap();
        assert_eq!(resolved.identifier, "UNRATE");
    }
}
