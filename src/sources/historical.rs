//! Historical samples stored in MongoDB Atlas, read through the Atlas Data API.
//!
//! The location document looks like `{ "index": "SF", "datos": ... }` where
//! `datos` is either a list of `{TEMP, HUM}` rows or the column layout produced
//! by a pandas `to_dict()`, `{ "TEMP": {"0": 14.2, ...}, "HUM": {...} }`.
//! Non-finite doubles arrive as extended JSON (`{"$numberDouble": "NaN"}`) and
//! are treated as missing.

use crate::config::{required, AtlasConfig};
use crate::sources::error::ConnectionError;
use crate::sources::send_checked;
use crate::types::history::HistoricalFrame;
use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;

/// Supplies the historical samples models are trained on.
pub trait HistoricalSource: Send + Sync {
    fn fetch_history(
        &self,
    ) -> impl Future<Output = Result<HistoricalFrame, ConnectionError>> + Send;
}

#[derive(Debug, Clone)]
pub struct AtlasSource {
    config: AtlasConfig,
    client: Client,
}

impl AtlasSource {
    pub fn new(config: AtlasConfig, timeout: Duration) -> Result<Self, ConnectionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConnectionError::ClientBuild)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }
}

impl HistoricalSource for AtlasSource {
    async fn fetch_history(&self) -> Result<HistoricalFrame, ConnectionError> {
        let user = required(&self.config.user, "USER_ATLAS")?;
        let password = required(&self.config.password, "PSW_ATLAS")?;
        let endpoint = required(&self.config.endpoint, "ATLAS_DATA_API_URL")?;

        let url = format!("{}/action/findOne", endpoint.trim_end_matches('/'));
        let body = FindOneRequest {
            data_source: &self.config.data_source,
            database: &self.config.database,
            collection: &self.config.collection,
            filter: json!({ "index": self.config.location_key }),
        };
        info!(
            "Fetching historical samples for '{}' from {}",
            self.config.location_key, url
        );

        let request = self
            .client
            .post(&url)
            .header("email", user)
            .header("password", password)
            .json(&body);
        let response = send_checked(request, &url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConnectionError::NetworkRequest(url.clone(), e))?;

        let frame = parse_find_one(&bytes, &self.config.location_key, &url)?;
        info!("Received {} historical samples", frame.len());
        Ok(frame)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindOneRequest<'a> {
    data_source: &'a str,
    database: &'a str,
    collection: &'a str,
    filter: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct FindOneResponse {
    document: Option<HistoricalDocument>,
}

#[derive(Debug, Deserialize)]
struct HistoricalDocument {
    #[serde(rename = "datos")]
    samples: SampleTable,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SampleTable {
    Rows(Vec<SampleRow>),
    Columns(SampleColumns),
}

#[derive(Debug, Deserialize)]
struct SampleRow {
    #[serde(rename = "TEMP", default)]
    temp: Option<SampleValue>,
    #[serde(rename = "HUM", default)]
    hum: Option<SampleValue>,
}

#[derive(Debug, Deserialize)]
struct SampleColumns {
    #[serde(rename = "TEMP")]
    temp: ColumnValues,
    #[serde(rename = "HUM")]
    hum: ColumnValues,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnValues {
    Sequence(Vec<Option<SampleValue>>),
    Indexed(BTreeMap<String, Option<SampleValue>>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SampleValue {
    Number(f64),
    Extended {
        #[serde(rename = "$numberDouble")]
        value: String,
    },
}

impl SampleValue {
    fn into_f64(self) -> Option<f64> {
        match self {
            SampleValue::Number(v) => Some(v),
            // "NaN", "Infinity" and "-Infinity"; all are unusable samples.
            SampleValue::Extended { value } => value.parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }
}

fn sample(value: Option<SampleValue>) -> Option<f64> {
    value.and_then(SampleValue::into_f64)
}

impl ColumnValues {
    fn into_indexed(self, name: &str, url: &str) -> Result<BTreeMap<usize, Option<f64>>, ConnectionError> {
        match self {
            ColumnValues::Sequence(values) => {
                Ok(values.into_iter().map(sample).enumerate().collect())
            }
            ColumnValues::Indexed(values) => values
                .into_iter()
                .map(|(key, value)| {
                    key.parse::<usize>()
                        .map(|index| (index, sample(value)))
                        .map_err(|_| ConnectionError::SchemaViolation {
                            url: url.to_string(),
                            message: format!("column {} has non-numeric row key '{}'", name, key),
                        })
                })
                .collect(),
        }
    }
}

impl SampleTable {
    fn into_frame(self, url: &str) -> Result<HistoricalFrame, ConnectionError> {
        let (temp, hum): (Vec<_>, Vec<_>) = match self {
            SampleTable::Rows(rows) => rows
                .into_iter()
                .map(|row| (sample(row.temp), sample(row.hum)))
                .unzip(),
            SampleTable::Columns(columns) => {
                let temp = columns.temp.into_indexed("TEMP", url)?;
                let hum = columns.hum.into_indexed("HUM", url)?;
                let rows: BTreeSet<usize> = temp.keys().chain(hum.keys()).copied().collect();
                rows.into_iter()
                    .map(|row| {
                        (
                            temp.get(&row).copied().flatten(),
                            hum.get(&row).copied().flatten(),
                        )
                    })
                    .unzip()
            }
        };
        HistoricalFrame::from_samples(temp, hum).map_err(ConnectionError::Frame)
    }
}

/// Parses a Data API `findOne` reply into a frame of samples.
fn parse_find_one(
    body: &[u8],
    location_key: &str,
    url: &str,
) -> Result<HistoricalFrame, ConnectionError> {
    let reply: FindOneResponse =
        serde_json::from_slice(body).map_err(|e| ConnectionError::InvalidResponse {
            url: url.to_string(),
            source: e,
        })?;
    let document = reply
        .document
        .ok_or_else(|| ConnectionError::DocumentNotFound(location_key.to_string()))?;
    document.samples.into_frame(url)
}
