/// Map a US EPA air-quality category (1..=6) onto a 0-500 display scale.
///
/// Each category lands roughly in the middle of its band on the familiar AQI bar.
pub fn epa_to_display_aqi(epa: Option<i64>) -> Option<u16> {
    match epa? {
        1 => Some(25),
        2 => Some(75),
        3 => Some(125),
        4 => Some(175),
        5 => Some(250),
        6 => Some(350),
        _ => None,
    }
}

/// Keep an EPA category only when it is inside the defined 1..=6 range.
pub fn valid_epa(epa: Option<i64>) -> Option<u8> {
    epa.filter(|e| (1..=6).contains(e)).map(|e| e as u8)
}

/// Band label for a display AQI value.
pub fn aqi_category(aqi: u16) -> &'static str {
    match aqi {
        0..=50 => "Good",
        51..=100 => "Moderate",
        101..=150 => "Unhealthy for Sensitive Groups",
        151..=200 => "Unhealthy",
        201..=300 => "Very Unhealthy",
        _ => "Hazardous",
    }
}
