//! Conversion of provider-shaped payloads into [`WeatherRecord`].
//!
//! Shape detection looks only at top-level member names and runs in a fixed
//! order, so exactly one conversion applies to any payload.

use crate::{
    aqi::{epa_to_display_aqi, valid_epa},
    fields::Lookup,
    model::{DailyEntry, HourlyEntry, RawPayload, WeatherRecord},
    provider::{dataset, openweather},
    text::mps_to_kph,
};

pub const WEATHERAPI_SOURCE: &str = "WeatherAPI.com";
pub const UNIFIED_SOURCE: &str = "unified";
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Provider shape recognised from a payload's member names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Already carries unified fields (`temperature`).
    Unified,
    /// weatherapi.com: `location` + `current`.
    WeatherApi,
    /// OpenWeatherMap: `main` + `weather`.
    OpenWeather,
    /// Dataset row: `city` + `condition`.
    Dataset,
    Unknown,
}

impl PayloadShape {
    pub fn detect(payload: &RawPayload) -> Self {
        let has = |key: &str| payload.contains_key(key);

        if has("temperature") {
            PayloadShape::Unified
        } else if has("location") && has("current") {
            PayloadShape::WeatherApi
        } else if has("main") && has("weather") {
            PayloadShape::OpenWeather
        } else if has("city") && has("condition") {
            PayloadShape::Dataset
        } else {
            PayloadShape::Unknown
        }
    }
}

/// Map any supported payload into a fresh [`WeatherRecord`].
pub fn to_record(payload: &RawPayload) -> WeatherRecord {
    let root = Lookup::root(payload);

    match PayloadShape::detect(payload) {
        PayloadShape::Unified => from_unified(root),
        PayloadShape::WeatherApi => from_weatherapi(root),
        PayloadShape::OpenWeather => from_openweather(root),
        PayloadShape::Dataset => from_dataset(root),
        PayloadShape::Unknown => {
            WeatherRecord { source: UNKNOWN_SOURCE.to_string(), ..Default::default() }
        }
    }
}

fn from_weatherapi(root: Lookup<'_>) -> WeatherRecord {
    let current = root.get("current");
    let condition = current.get("condition");
    let air = current.get("air_quality");
    let epa = valid_epa(air.get("us-epa-index").integer());

    let mut out = WeatherRecord {
        source: WEATHERAPI_SOURCE.to_string(),
        city: root.get("location").get("name").text().unwrap_or_default(),
        temperature: current.get("temp_c").number(),
        humidity: current.get("humidity").number(),
        wind: current.get("wind_kph").number(),
        condition: condition.get("text").text().unwrap_or_default(),
        icon: condition.get("icon").text(),
        uv: current.get("uv").number(),
        visibility: current.get("vis_km").number(),
        air_quality_raw: Some(air.to_object()).filter(|m| !m.is_empty()),
        epa_index: epa,
        aqi: epa_to_display_aqi(epa.map(i64::from)),
        ..Default::default()
    };

    let days = root.get("forecast").get("forecastday").objects();
    if let Some(today) = days.first() {
        let astro = today.get("astro");
        out.sunrise = astro.get("sunrise").text();
        out.sunset = astro.get("sunset").text();
        out.high = today.get("day").get("maxtemp_c").number();
        out.low = today.get("day").get("mintemp_c").number();

        out.hourly = today
            .get("hour")
            .objects()
            .into_iter()
            .map(|h| HourlyEntry {
                time: h.get("time").text(),
                temp: h.get("temp_c").number(),
                condition: h.get("condition").get("text").text(),
                icon: h.get("condition").get("icon").text(),
            })
            .collect();
    }

    out.daily = days
        .iter()
        .map(|d| {
            let day = d.get("day");
            DailyEntry {
                date: d.get("date").text(),
                max: day.get("maxtemp_c").number(),
                min: day.get("mintemp_c").number(),
                condition: day.get("condition").get("text").text(),
            }
        })
        .collect();

    out
}

fn from_openweather(root: Lookup<'_>) -> WeatherRecord {
    let main = root.get("main");
    let first = root.get("weather").objects().into_iter().next();

    WeatherRecord {
        source: openweather::SOURCE_LABEL.to_string(),
        city: root.get("name").text().unwrap_or_default(),
        temperature: main.get("temp").number(),
        high: main.get("temp_max").number(),
        low: main.get("temp_min").number(),
        humidity: main.get("humidity").number(),
        wind: root.get("wind").get("speed").number().map(mps_to_kph),
        condition: first.and_then(|w| w.get("description").text()).unwrap_or_default(),
        icon: first.and_then(|w| w.get("icon").text()),
        ..Default::default()
    }
}

fn from_dataset(root: Lookup<'_>) -> WeatherRecord {
    WeatherRecord {
        source: dataset::SOURCE_LABEL.to_string(),
        city: root.get("city").text().unwrap_or_default(),
        temperature: root.get("temperature").number(),
        humidity: root.get("humidity").number(),
        wind: root.get("wind").number(),
        condition: root.get("condition").text().unwrap_or_default(),
        ..Default::default()
    }
}

fn from_unified(root: Lookup<'_>) -> WeatherRecord {
    let epa = valid_epa(root.get("epaIndex").integer());

    WeatherRecord {
        source: root.get("source").text().unwrap_or_else(|| UNIFIED_SOURCE.to_string()),
        city: root.get("city").text().unwrap_or_default(),
        temperature: root.get("temperature").number(),
        high: root.get("high").number(),
        low: root.get("low").number(),
        humidity: root.get("humidity").number(),
        wind: root.get("wind").number(),
        condition: root.get("condition").text().unwrap_or_default(),
        icon: root.get("icon").text(),
        sunrise: root.get("sunrise").text(),
        sunset: root.get("sunset").text(),
        air_quality_raw: Some(root.get("airQualityRaw").to_object()).filter(|m| !m.is_empty()),
        epa_index: epa,
        aqi: root
            .get("aqi")
            .integer()
            .filter(|a| (0..=500).contains(a))
            .map(|a| a as u16)
            .or_else(|| epa_to_display_aqi(epa.map(i64::from))),
        uv: root.get("uv").number(),
        visibility: root.get("visibility").number(),
        hourly: root
            .get("hourly")
            .objects()
            .into_iter()
            .map(|h| HourlyEntry {
                time: h.get("time").text(),
                temp: h.get("temp").number(),
                condition: h.get("condition").text(),
                icon: h.get("icon").text(),
            })
            .collect(),
        daily: root
            .get("daily")
            .objects()
            .into_iter()
            .map(|d| DailyEntry {
                date: d.get("date").text(),
                max: d.get("max").number(),
                min: d.get("min").number(),
                condition: d.get("condition").text(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn object(v: Value) -> RawPayload {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    fn weatherapi_forecast() -> RawPayload {
        object(json!({
            "location": {"name": "London", "country": "United Kingdom"},
            "current": {
                "temp_c": 14.0,
                "humidity": 72,
                "wind_kph": 19.1,
                "uv": 3.0,
                "vis_km": 10.0,
                "condition": {"text": "Partly cloudy", "icon": "//cdn/116.png"},
                "air_quality": {"pm2_5": 8.4, "us-epa-index": 2}
            },
            "forecast": {"forecastday": [
                {
                    "date": "2026-10-19",
                    "day": {"maxtemp_c": 16.1, "mintemp_c": 9.3, "condition": {"text": "Rain"}},
                    "astro": {"sunrise": "07:24 AM", "sunset": "05:58 PM"},
                    "hour": [
                        {
                            "time": "2026-10-19 00:00",
                            "temp_c": 10.2,
                            "condition": {"text": "Clear", "icon": "//cdn/113.png"}
                        },
                        {
                            "time": "2026-10-19 01:00",
                            "temp_c": 9.8,
                            "condition": {"text": "Clear", "icon": "//cdn/113.png"}
                        }
                    ]
                },
                {
                    "date": "2026-10-20",
                    "day": {"maxtemp_c": 13.0, "mintemp_c": 8.0, "condition": {"text": "Showers"}}
                }
            ]}
        }))
    }

    #[test]
    fn detection_follows_fixed_order() {
        let cases = [
            (json!({"temperature": 1, "location": {}, "current": {}}), PayloadShape::Unified),
            (
                json!({"location": {}, "current": {}, "main": {}, "weather": []}),
                PayloadShape::WeatherApi,
            ),
            (
                json!({"main": {}, "weather": [], "city": "x", "condition": "y"}),
                PayloadShape::OpenWeather,
            ),
            (json!({"city": "x", "condition": "y"}), PayloadShape::Dataset),
            (json!({"location": {}}), PayloadShape::Unknown),
        ];

        for (payload, expected) in cases {
            assert_eq!(PayloadShape::detect(&object(payload)), expected);
        }
    }

    #[test]
    fn weatherapi_payload_maps_current_and_forecast() {
        let rec = to_record(&weatherapi_forecast());

        assert_eq!(rec.source, WEATHERAPI_SOURCE);
        assert_eq!(rec.city, "London");
        assert_eq!(rec.temperature, Some(14.0));
        assert_eq!(rec.wind, Some(19.1));
        assert_eq!(rec.condition, "Partly cloudy");
        assert_eq!(rec.icon.as_deref(), Some("//cdn/116.png"));
        assert_eq!(rec.epa_index, Some(2));
        assert_eq!(rec.aqi, Some(75));
        assert!(rec.air_quality_raw.is_some());
        assert_eq!(rec.sunrise.as_deref(), Some("07:24 AM"));
        assert_eq!(rec.high, Some(16.1));
        assert_eq!(rec.hourly.len(), 2);
        assert_eq!(rec.hourly[1].temp, Some(9.8));
        assert_eq!(rec.daily.len(), 2);
        assert_eq!(rec.daily[1].condition.as_deref(), Some("Showers"));
    }

    #[test]
    fn weatherapi_out_of_range_epa_is_absent() {
        let rec = to_record(&object(json!({
            "location": {"name": "X"},
            "current": {"temp_c": 1, "air_quality": {"us-epa-index": 9}}
        })));

        assert_eq!(rec.epa_index, None);
        assert_eq!(rec.aqi, None);
        assert!(rec.hourly.is_empty());
        assert!(rec.daily.is_empty());
    }

    #[test]
    fn weatherapi_wrong_typed_blocks_do_not_fail() {
        let rec = to_record(&object(json!({"location": "nope", "current": [1, 2]})));

        assert_eq!(rec.source, WEATHERAPI_SOURCE);
        assert_eq!(rec.city, "");
        assert_eq!(rec.temperature, None);
    }

    #[test]
    fn openweather_payload_converts_wind() {
        let rec = to_record(&object(json!({
            "name": "Paris",
            "main": {"temp": 18.5, "humidity": 60, "temp_max": 20, "temp_min": 16},
            "wind": {"speed": 10},
            "weather": [{"description": "clear sky", "icon": "01d"}]
        })));

        assert_eq!(rec.source, openweather::SOURCE_LABEL);
        assert_eq!(rec.city, "Paris");
        assert_eq!(rec.wind, Some(36.0));
        assert_eq!(rec.condition, "clear sky");
        assert_eq!(rec.low, Some(16.0));
        assert!(rec.hourly.is_empty());
    }

    #[test]
    fn openweather_empty_weather_list_leaves_condition_blank() {
        let rec = to_record(&object(json!({"main": {"temp": 3}, "weather": []})));
        assert_eq!(rec.condition, "");
        assert_eq!(rec.wind, None);
    }

    #[test]
    fn dataset_row_is_copied() {
        let rec = to_record(&object(json!({
            "city": "Oslo", "condition": "Snow", "humidity": "85", "wind": 12.0
        })));

        assert_eq!(rec.source, dataset::SOURCE_LABEL);
        assert_eq!(rec.city, "Oslo");
        assert_eq!(rec.humidity, Some(85.0));
        assert_eq!(rec.temperature, None);
    }

    #[test]
    fn unified_payload_is_copied_with_default_source() {
        let rec = to_record(&object(json!({
            "city": "Rome",
            "temperature": 24.0,
            "condition": "Sunny",
            "hourly": [{"time": "10:00", "temp": 23.0}],
            "daily": "not a list"
        })));

        assert_eq!(rec.source, UNIFIED_SOURCE);
        assert_eq!(rec.temperature, Some(24.0));
        assert_eq!(rec.hourly.len(), 1);
        assert!(rec.daily.is_empty());
    }

    #[test]
    fn unified_payload_keeps_its_source() {
        let rec =
            to_record(&object(json!({"temperature": 5, "source": "Offline CSV", "city": "Bern"})));
        assert_eq!(rec.source, "Offline CSV");
    }

    #[test]
    fn unknown_payload_gets_empty_defaults() {
        let rec = to_record(&object(json!({"foo": "bar"})));

        assert_eq!(rec.source, UNKNOWN_SOURCE);
        assert_eq!(rec.city, "");
        assert_eq!(rec.condition, "");
        assert!(rec.hourly.is_empty() && rec.daily.is_empty());
        assert_eq!(rec.temperature, None);
    }
}
