//! Business-data analysis and spreadsheet generation.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::Aura;
use crate::error::{Error, Result};

/// Name of the analysis function.
pub const ANALYSIS_FUNCTION: &str = "analyze-business-data";

/// What the analysis function should do with the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Produce a written analysis.
    Analyze,
    /// Restructure the data as spreadsheet rows.
    Generate,
}

/// Focus of a written analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisFocus {
    /// Condition, finances, operations, market position, risks.
    #[default]
    Comprehensive,
    /// Revenue, cash flow, costs, ratios.
    Financial,
    /// Sales metrics, channels, pricing.
    Sales,
    /// Position, competitors, trends.
    Market,
    /// Growth strategy and roadmap.
    Strategy,
}

impl AnalysisFocus {
    /// All focuses, in display order.
    pub const ALL: [Self; 5] = [
        Self::Comprehensive,
        Self::Financial,
        Self::Sales,
        Self::Market,
        Self::Strategy,
    ];

    /// Wire name of the focus.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Financial => "financial",
            Self::Sales => "sales",
            Self::Market => "market",
            Self::Strategy => "strategy",
        }
    }
}

impl fmt::Display for AnalysisFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisFocus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|focus| focus.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_request(format!("unknown analysis type: {s}")))
    }
}

/// Body of an analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Raw business data, free-form.
    pub data: String,
    /// Analyze or generate.
    #[serde(rename = "type")]
    pub mode: AnalysisMode,
    /// Focus; the function defaults to comprehensive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<AnalysisFocus>,
}

/// Answer of the analysis function.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalysisResponse {
    /// Model output.
    pub analysis: String,
}

/// A spreadsheet row: column name to cell value.
pub type SpreadsheetRow = Map<String, Value>;

static JSON_ARRAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[\s\S]*\]").unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

impl Aura {
    /// Requests a written analysis of `data`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRequest`] for blank data, otherwise any transport error.
    pub async fn analyze(&self, data: &str, focus: Option<AnalysisFocus>) -> Result<String> {
        let response = self
            .run_analysis(AnalysisRequest {
                data: non_blank(data)?.to_owned(),
                mode: AnalysisMode::Analyze,
                analysis_type: focus,
            })
            .await?;
        Ok(response.analysis)
    }

    /// Asks the function to restructure `data` as spreadsheet rows.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRequest`] for blank data, otherwise any transport error.
    /// An unusable answer is not an error; see [`rows_from_analysis`].
    pub async fn generate_spreadsheet(&self, data: &str) -> Result<Vec<SpreadsheetRow>> {
        let data = non_blank(data)?;
        let response = self
            .run_analysis(AnalysisRequest {
                data: data.to_owned(),
                mode: AnalysisMode::Generate,
                analysis_type: None,
            })
            .await?;
        Ok(rows_from_analysis(&response.analysis, data))
    }

    async fn run_analysis(&self, request: AnalysisRequest) -> Result<AnalysisResponse> {
        tracing::debug!(mode = ?request.mode, focus = ?request.analysis_type, "running analysis");
        self.invoke(ANALYSIS_FUNCTION, &request).await
    }
}

fn non_blank(data: &str) -> Result<&str> {
    if data.trim().is_empty() {
        return Err(Error::invalid_request("please enter some data to analyze"));
    }
    Ok(data)
}

/// Extracts spreadsheet rows from a model answer.
///
/// Takes the outermost `[...]` in `analysis` and keeps its object elements.
/// When there is no array, it does not parse, or it holds no objects, falls
/// back to one `{ "Row": n, "Data": line }` row per line of `data`.
#[must_use]
pub fn rows_from_analysis(analysis: &str, data: &str) -> Vec<SpreadsheetRow> {
    let parsed = JSON_ARRAY
        .find(analysis)
        .and_then(|m| serde_json::from_str::<Vec<Value>>(m.as_str()).ok())
        .map(|values| {
            values
                .into_iter()
                .filter_map(|value| match value {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect::<Vec<_>>()
        })
        .filter(|rows| !rows.is_empty());

    parsed.unwrap_or_else(|| {
        tracing::debug!("no usable JSON array in analysis, using raw lines");
        fallback_rows(data)
    })
}

fn fallback_rows(data: &str) -> Vec<SpreadsheetRow> {
    data.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            let mut row = Map::new();
            row.insert("Row".to_owned(), Value::from(idx + 1));
            row.insert("Data".to_owned(), Value::from(line.trim()));
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = AnalysisRequest {
            data: "q1: 100".into(),
            mode: AnalysisMode::Analyze,
            analysis_type: Some(AnalysisFocus::Sales),
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"data": "q1: 100", "type": "analyze", "analysisType": "sales"})
        );

        let request = AnalysisRequest {
            data: "x".into(),
            mode: AnalysisMode::Generate,
            analysis_type: None,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert!(json.get("analysisType").is_none());
        assert_eq!(json["type"], "generate");
    }

    #[test]
    fn test_focus_from_str() {
        assert_eq!("Financial".parse::<AnalysisFocus>().expect("parse"), AnalysisFocus::Financial);
        assert!("weather".parse::<AnalysisFocus>().is_err());
    }

    #[test]
    fn test_rows_from_embedded_array() {
        let analysis = "Here you go:\n```json\n[{\"Month\":\"Jan\",\"Sales\":10},{\"Month\":\"Feb\",\"Sales\":12}]\n```";
        let rows = rows_from_analysis(analysis, "ignored");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["Month"], "Feb");
        assert_eq!(rows[1]["Sales"], 12);
    }

    #[test]
    fn test_rows_fallback_on_missing_array() {
        let rows = rows_from_analysis("Sorry, I cannot help.", "jan 10\n feb 12 ");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Row"], 1);
        assert_eq!(rows[1]["Data"], "feb 12");
    }

    #[test]
    fn test_rows_fallback_on_invalid_array() {
        let rows = rows_from_analysis("[not json]", "only line");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Data"], "only line");
    }
}
