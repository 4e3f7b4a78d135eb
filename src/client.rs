use crate::rows::Row;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build()
}

// ---------------------------------------------------------------------------
// Explore API
// ---------------------------------------------------------------------------

/// Client for the explore backend, which performs all real computation
/// (joins, aggregation, filtering) server-side. Each call is independent;
/// a failure in one never affects another chart card, and nothing is
/// retried automatically.
pub struct ExploreClient {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct ColumnsResponse {
    columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub data_type: String,
    pub unique_count: u64,
    #[serde(default)]
    pub unique_values: Vec<Value>,
    pub is_numerical: bool,
}

#[derive(Debug, Deserialize)]
struct ColumnSummaryResponse {
    summary: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRange {
    pub min_date: String,
    pub max_date: String,
    pub row_count: u64,
}

#[derive(Debug, Deserialize)]
struct DateRangeResponse {
    #[allow(dead_code)]
    status: String,
    date_range: DateRange,
}

#[derive(Debug, Deserialize)]
struct SelectDimensionsResponse {
    explore_atom_id: String,
}

#[derive(Debug, Deserialize)]
struct ChartDataResponse {
    data: Vec<Row>,
}

/// Server-side operations for one chart request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExploreOperations {
    pub file_key: String,
    pub filters: HashMap<String, Vec<String>>,
    pub group_by: Vec<String>,
    pub measures_config: Vec<MeasureConfig>,
    pub chart_type: String,
    pub x_axis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_column: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasureConfig {
    pub field: String,
    pub aggregator: String,
}

impl ExploreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            agent: agent(),
        }
    }

    pub fn columns(&self, object_name: &str) -> Result<Vec<String>> {
        let url = format!("{}/columns", self.base_url);
        log::debug!("GET {} object_name={}", url, object_name);
        let response: ColumnsResponse = self
            .agent
            .get(&url)
            .query("object_name", object_name)
            .call()
            .with_context(|| format!("Failed to fetch columns for '{}'", object_name))?
            .into_json()
            .context("Failed to decode columns response")?;
        Ok(response.columns)
    }

    pub fn column_summary(&self, object_name: &str) -> Result<Vec<ColumnSummary>> {
        let url = format!("{}/column_summary", self.base_url);
        let response: ColumnSummaryResponse = self
            .agent
            .get(&url)
            .query("object_name", object_name)
            .call()
            .with_context(|| format!("Failed to fetch column summary for '{}'", object_name))?
            .into_json()
            .context("Failed to decode column summary response")?;
        Ok(response.summary)
    }

    pub fn date_range(&self, data_source: &str) -> Result<DateRange> {
        let url = format!("{}/get-date-range", self.base_url);
        let response: DateRangeResponse = self
            .agent
            .get(&url)
            .query("data_source", data_source)
            .call()
            .with_context(|| format!("Failed to fetch date range for '{}'", data_source))?
            .into_json()
            .context("Failed to decode date range response")?;
        Ok(response.date_range)
    }

    /// Register the dimension/measure selection for a validator atom and
    /// return the explore atom id the backend allocates for it.
    pub fn select_dimensions_and_measures(
        &self,
        validator_atom_id: &str,
        atom_name: &str,
        dimensions: &[String],
        measures: &[String],
    ) -> Result<String> {
        let url = format!("{}/select-dimensions-and-measures", self.base_url);
        let dimensions_json =
            serde_json::to_string(dimensions).context("Failed to encode dimensions")?;
        let measures_json = serde_json::to_string(measures).context("Failed to encode measures")?;
        let response: SelectDimensionsResponse = self
            .agent
            .post(&url)
            .send_form(&[
                ("validator_atom_id", validator_atom_id),
                ("atom_name", atom_name),
                ("selected_dimensions", dimensions_json.as_str()),
                ("selected_measures", measures_json.as_str()),
            ])
            .context("Failed to select dimensions and measures")?
            .into_json()
            .context("Failed to decode dimension selection response")?;
        Ok(response.explore_atom_id)
    }

    pub fn specify_operations(
        &self,
        explore_atom_id: &str,
        operations: &ExploreOperations,
    ) -> Result<()> {
        let url = format!("{}/specify-operations", self.base_url);
        let operations_json =
            serde_json::to_string(operations).context("Failed to encode operations")?;
        log::debug!("POST {} atom={}", url, explore_atom_id);
        self.agent
            .post(&url)
            .send_form(&[
                ("explore_atom_id", explore_atom_id),
                ("operations", operations_json.as_str()),
            ])
            .with_context(|| format!("Failed to specify operations for '{}'", explore_atom_id))?;
        Ok(())
    }

    pub fn chart_data(&self, explore_atom_id: &str) -> Result<Vec<Row>> {
        let url = format!("{}/chart-data-multidim/{}", self.base_url, explore_atom_id);
        let response: ChartDataResponse = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("Failed to fetch chart data for '{}'", explore_atom_id))?
            .into_json()
            .context("Failed to decode chart data response")?;
        Ok(response.data)
    }
}

// ---------------------------------------------------------------------------
// Merge API
// ---------------------------------------------------------------------------

/// Client for the two-file dataset merge backend. The dataframes behind
/// the file keys are read-only from this side; the join happens per
/// request on the server.
pub struct MergeClient {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct MergeInitResponse {
    common_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeResult {
    pub row_count: u64,
    pub columns: Vec<String>,
    pub data: Vec<Row>,
}

impl MergeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            agent: agent(),
        }
    }

    /// Start a merge session and return the columns the two files share.
    pub fn init(&self, file1: &str, file2: &str, bucket_name: &str) -> Result<Vec<String>> {
        let url = format!("{}/init", self.base_url);
        let response: MergeInitResponse = self
            .agent
            .post(&url)
            .send_form(&[
                ("file1", file1),
                ("file2", file2),
                ("bucket_name", bucket_name),
            ])
            .context("Failed to initialize merge")?
            .into_json()
            .context("Failed to decode merge init response")?;
        Ok(response.common_columns)
    }

    pub fn perform(
        &self,
        file1: &str,
        file2: &str,
        bucket_name: &str,
        join_columns: &[String],
        join_type: &str,
    ) -> Result<MergeResult> {
        let url = format!("{}/perform", self.base_url);
        let join_columns_json =
            serde_json::to_string(join_columns).context("Failed to encode join columns")?;
        log::debug!("POST {} join_type={}", url, join_type);
        let result: MergeResult = self
            .agent
            .post(&url)
            .send_form(&[
                ("file1", file1),
                ("file2", file2),
                ("bucket_name", bucket_name),
                ("join_columns", join_columns_json.as_str()),
                ("join_type", join_type),
            ])
            .with_context(|| format!("Failed to perform {} merge", join_type))?
            .into_json()
            .context("Failed to decode merge result")?;
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Chart-maker API
// ---------------------------------------------------------------------------

pub struct ChartMakerClient {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    pub x_column: String,
    pub y_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateChartRequest {
    pub file_id: String,
    pub chart_type: String,
    pub traces: Vec<TraceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub filters: HashMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_data: Option<Vec<Row>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    pub data: Vec<Row>,
    pub chart_type: String,
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub y_axis: Option<String>,
    #[serde(default)]
    pub traces: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateChartResponse {
    chart_config: ChartConfig,
}

impl ChartMakerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            agent: agent(),
        }
    }

    pub fn generate_chart(&self, request: &GenerateChartRequest) -> Result<ChartConfig> {
        let url = format!("{}/generate-chart", self.base_url);
        log::debug!("POST {} type={}", url, request.chart_type);
        let response: GenerateChartResponse = self
            .agent
            .post(&url)
            .send_json(request)
            .with_context(|| format!("Failed to generate {} chart", request.chart_type))?
            .into_json()
            .context("Failed to decode chart config response")?;
        Ok(response.chart_config)
    }
}

// ---------------------------------------------------------------------------
// Request sequencing
// ---------------------------------------------------------------------------

/// Monotonic request sequencing for one chart card. Two fetches may be in
/// flight at once (requests are never canceled); a response is applied
/// only when it carries the latest issued sequence number, so a slow
/// stale response can never overwrite a newer one.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the sequence number for a new request.
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a response with this sequence number may be applied. True
    /// at most once per number, and only for the latest issued request.
    pub fn try_apply(&self, seq: u64) -> bool {
        let latest = self.issued.load(Ordering::SeqCst);
        if seq != latest {
            log::debug!("discarding stale response {} (latest {})", seq, latest);
            return false;
        }
        self.applied.fetch_max(seq, Ordering::SeqCst) < seq
    }
}
