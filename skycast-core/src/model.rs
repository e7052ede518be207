use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider-shaped JSON object as returned by an adapter.
pub type RawPayload = Map<String, Value>;

/// Unified weather record every provider shape is mapped into.
///
/// Temperatures are degrees Celsius, wind is km/h. Numeric fields are either a
/// finite value or `None`; `hourly` and `daily` are empty rather than absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub source: String,
    pub city: String,
    pub temperature: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub humidity: Option<f64>,
    pub wind: Option<f64>,
    pub condition: String,
    pub icon: Option<String>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub air_quality_raw: Option<Map<String, Value>>,
    pub epa_index: Option<u8>,
    pub aqi: Option<u16>,
    pub uv: Option<f64>,
    pub visibility: Option<f64>,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub time: Option<String>,
    pub temp: Option<f64>,
    pub condition: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: Option<String>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub condition: Option<String>,
}
