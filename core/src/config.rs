use crate::error::{Result, SearchError};
use crate::qgram::MatchStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// BM25 tuning. `k1` controls term-frequency saturation, `b` controls how
/// strongly scores are normalized by record length (0 disables it).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 0.75, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(SearchError::invalid(format!(
                "bm25 k1 must be finite and >= 0, got {}",
                self.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(SearchError::invalid(format!(
                "bm25 b must be within [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }
}

/// An optional tab-separated column carried through to results under `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayColumn {
    pub name: String,
    pub column: usize,
}

impl DisplayColumn {
    pub fn new<S: Into<String>>(name: S, column: usize) -> Self {
        Self { name: name.into(), column }
    }
}

/// Layout of one corpus line. The title column is required; display and text
/// columns missing from a line default to the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineFormat {
    pub title_column: usize,
    /// Columns the term index tokenizes, joined by a space. `None` means the
    /// whole line.
    pub text_columns: Option<Vec<usize>>,
    pub display_columns: Vec<DisplayColumn>,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self { title_column: 0, text_columns: None, display_columns: Vec::new() }
    }
}

impl LineFormat {
    /// `title \t description` corpora such as movie lists; both columns are
    /// searchable.
    pub fn title_description() -> Self {
        Self {
            title_column: 0,
            text_columns: None,
            display_columns: vec![DisplayColumn::new("description", 1)],
        }
    }

    /// `city \t country_code \t latitude \t population` corpora; only the city
    /// name is searchable.
    pub fn cities() -> Self {
        Self {
            title_column: 0,
            text_columns: Some(vec![0]),
            display_columns: vec![
                DisplayColumn::new("country_code", 1),
                DisplayColumn::new("population", 3),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub bm25: Bm25Params,
    /// Q-gram length for the fuzzy index.
    pub q: usize,
    /// Strategy `SearchIndex::find_matches` uses unless told otherwise.
    pub match_strategy: MatchStrategy,
    pub format: LineFormat,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bm25: Bm25Params::default(),
            q: 3,
            match_strategy: MatchStrategy::Indexed,
            format: LineFormat::default(),
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.q == 0 {
            return Err(SearchError::invalid("q must be at least 1"));
        }
        self.bm25.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(json: &str) -> bool {
        matches!(SearchConfig::from_json(json), Err(SearchError::InvalidParameter(_)))
    }

    #[test]
    fn defaults_are_length_normalized() {
        let c = SearchConfig::default();
        assert_eq!(c.bm25, Bm25Params { k1: 0.75, b: 0.75 });
        assert_eq!(c.q, 3);
        assert_eq!(c.match_strategy, MatchStrategy::Indexed);
        assert_eq!(c.format.text_columns, None);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = SearchConfig::from_json(r#"{ "bm25": { "b": 0.0 } }"#).unwrap();
        assert_eq!(c.bm25.k1, 0.75);
        assert_eq!(c.bm25.b, 0.0);
        assert_eq!(c.q, 3);
    }

    #[test]
    fn format_from_json() {
        let c = SearchConfig::from_json(
            r#"{
                "q": 2,
                "match_strategy": "baseline",
                "format": {
                    "title_column": 0,
                    "text_columns": [0, 1],
                    "display_columns": [ { "name": "year", "column": 2 } ]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(c.q, 2);
        assert_eq!(c.match_strategy, MatchStrategy::Baseline);
        assert_eq!(c.format.text_columns, Some(vec![0, 1]));
        assert_eq!(c.format.display_columns, vec![DisplayColumn::new("year", 2)]);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(invalid(r#"{ "q": 0 }"#));
        assert!(invalid(r#"{ "bm25": { "b": 1.5 } }"#));
        assert!(invalid(r#"{ "bm25": { "k1": -1.0 } }"#));
        assert!(matches!(SearchConfig::from_json("{ not json"), Err(SearchError::Config(_))));
    }
}
