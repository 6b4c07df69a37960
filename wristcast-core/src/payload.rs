use serde::Serialize;

use crate::{error::FetchError, model::ForecastState};

/// Substituted when reverse geocoding found no city or town. The watch
/// renders it verbatim, so it has to be a defined string.
pub const CITY_PLACEHOLDER: &str = "Unknown";

/// Fixed-layout record delivered to the paired watch. Field names are the
/// wire contract: they must match the message keys the watch firmware
/// registers, byte for byte. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    /// Rounded hourly temperatures as signed 16-bit little-endian values,
    /// flattened to bytes (low byte first).
    #[serde(rename = "TEMP_TREND_INT16")]
    pub temp_trend_int16: Vec<u8>,
    /// Hourly precipitation probabilities as integer percentages in [0, 100].
    #[serde(rename = "PRECIP_TREND_UINT8")]
    pub precip_trend_uint8: Vec<u8>,
    /// Hour-of-day the trend series starts at.
    #[serde(rename = "TEMP_START")]
    pub temp_start: u8,
    #[serde(rename = "NUM_ENTRIES")]
    pub num_entries: u16,
    /// Current temperature rounded to the nearest degree.
    #[serde(rename = "CURRENT_TEMP")]
    pub current_temp: i16,
    #[serde(rename = "CITY")]
    pub city: String,
}

/// Build the device payload from a complete [`ForecastState`].
///
/// Pure function of the state: encoding the same state twice yields
/// byte-identical payloads. Trend series longer than `num_entries` are
/// truncated to exactly `num_entries`; shorter series fail fast with
/// [`FetchError::IncompletePayload`], since the watch expects exactly the
/// declared number of values.
pub fn encode(state: &ForecastState, num_entries: usize) -> Result<Payload, FetchError> {
    let temp_trend = state.temp_trend.as_ref().ok_or(FetchError::IncompleteData)?;
    let precip_trend = state.precip_trend.as_ref().ok_or(FetchError::IncompleteData)?;
    let start_hour = state.start_hour.ok_or(FetchError::IncompleteData)?;
    let current_temp = state.current_temp.ok_or(FetchError::IncompleteData)?;

    // The pipeline validates trend lengths before encoding; this backstops
    // callers that encode a state directly.
    for trend in [temp_trend, precip_trend] {
        if trend.len() < num_entries {
            return Err(FetchError::IncompletePayload {
                expected: num_entries,
                actual: trend.len(),
            });
        }
    }

    let mut temp_bytes = Vec::with_capacity(num_entries * 2);
    for temperature in &temp_trend[..num_entries] {
        let rounded = temperature.round() as i16;
        temp_bytes.extend_from_slice(&rounded.to_le_bytes());
    }

    let precip_bytes = precip_trend[..num_entries]
        .iter()
        .map(|probability| (probability.clamp(0.0, 1.0) * 100.0).round() as u8)
        .collect();

    Ok(Payload {
        temp_trend_int16: temp_bytes,
        precip_trend_uint8: precip_bytes,
        temp_start: start_hour,
        num_entries: num_entries as u16,
        current_temp: current_temp.round() as i16,
        city: state.city_name.clone().unwrap_or_else(|| CITY_PLACEHOLDER.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SunEvent, SunEventKind};
    use chrono::{TimeZone, Utc};

    fn state_with_trends(temp: Vec<f64>, precip: Vec<f64>) -> ForecastState {
        let sunset = Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap();
        let sunrise = Utc.with_ymd_and_hms(2026, 3, 2, 6, 30, 0).unwrap();
        ForecastState {
            city_name: Some("Delft".to_string()),
            sun_events: Some([
                SunEvent { kind: SunEventKind::Sunset, at: sunset },
                SunEvent { kind: SunEventKind::Sunrise, at: sunrise },
            ]),
            start_hour: Some(13),
            current_temp: Some(8.6),
            temp_trend: Some(temp),
            precip_trend: Some(precip),
        }
    }

    #[test]
    fn temperatures_round_trip_through_little_endian_bytes() {
        let temps = vec![-32768.0, -12.6, -0.4, 0.0, 0.5, 21.3, 32767.0, 7.0];
        let mut precip = vec![0.0; temps.len()];
        precip[0] = 1.0;
        let state = state_with_trends(temps.clone(), precip);

        let payload = encode(&state, temps.len()).unwrap();
        assert_eq!(payload.temp_trend_int16.len(), temps.len() * 2);

        let decoded: Vec<i16> = payload
            .temp_trend_int16
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let expected: Vec<i16> = temps.iter().map(|t| t.round() as i16).collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn precipitation_rounds_half_up_and_clamps() {
        let precip = vec![0.0, 1.0, 0.005, 0.554, 0.25, 1.7, -0.3, 0.999];
        let temps = vec![10.0; precip.len()];
        let state = state_with_trends(temps, precip);

        let payload = encode(&state, 8).unwrap();
        assert_eq!(payload.precip_trend_uint8, vec![0, 100, 1, 55, 25, 100, 0, 100]);
    }

    #[test]
    fn trends_truncate_to_exactly_num_entries() {
        let state = state_with_trends(vec![5.0; 48], vec![0.5; 48]);
        let payload = encode(&state, 24).unwrap();

        assert_eq!(payload.num_entries, 24);
        assert_eq!(payload.temp_trend_int16.len(), 48);
        assert_eq!(payload.precip_trend_uint8.len(), 24);
    }

    #[test]
    fn short_trend_fails_instead_of_truncating_short() {
        let state = state_with_trends(vec![5.0; 23], vec![0.5; 24]);
        let err = encode(&state, 24).unwrap_err();
        assert!(matches!(
            err,
            FetchError::IncompletePayload { expected: 24, actual: 23 }
        ));
    }

    #[test]
    fn missing_required_field_fails_encode() {
        let mut state = state_with_trends(vec![5.0; 24], vec![0.5; 24]);
        state.current_temp = None;
        assert!(matches!(encode(&state, 24), Err(FetchError::IncompleteData)));
    }

    #[test]
    fn encoding_is_idempotent() {
        let state = state_with_trends(vec![3.3; 24], vec![0.42; 24]);
        let first = encode(&state, 24).unwrap();
        let second = encode(&state, 24).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_city_becomes_placeholder() {
        let mut state = state_with_trends(vec![5.0; 24], vec![0.5; 24]);
        state.city_name = None;
        let payload = encode(&state, 24).unwrap();
        assert_eq!(payload.city, CITY_PLACEHOLDER);
    }

    #[test]
    fn current_temp_and_start_hour_carried_over() {
        let state = state_with_trends(vec![5.0; 24], vec![0.5; 24]);
        let payload = encode(&state, 24).unwrap();
        assert_eq!(payload.current_temp, 9); // 8.6 rounded
        assert_eq!(payload.temp_start, 13);
        assert_eq!(payload.city, "Delft");
    }

    #[test]
    fn wire_field_names_match_device_contract() {
        let state = state_with_trends(vec![5.0; 24], vec![0.5; 24]);
        let payload = encode(&state, 24).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        for key in [
            "TEMP_TREND_INT16",
            "PRECIP_TREND_UINT8",
            "TEMP_START",
            "NUM_ENTRIES",
            "CURRENT_TEMP",
            "CITY",
        ] {
            assert!(json.get(key).is_some(), "missing wire key {key}");
        }
    }
}
