//! Maps raw OpenWeatherMap JSON onto [`WeatherReport`].
//!
//! The endpoints share field names but not shapes: `clouds` is either a bare
//! percentage or `{"all": n}`, `rain` is either a bare 24h total or a
//! single-window object like `{"3h": 1.2}`, and temperatures live under
//! `main` for observations and 3-hourly entries but under `temp` for daily
//! aggregates. The document is walked as a [`serde_json::Value`] so each of
//! these can be checked explicitly; a recognized key with an unexpected type
//! fails the whole decode.

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    error::{DecodeError, Error},
    model::{WeatherReport, WeatherSample},
    units::kelvin_to_celsius,
};

type Object = Map<String, Value>;

const OK_STATUS: i64 = 200;
const BARE_RAIN_WINDOW_HOURS: f64 = 24.0;

/// Decode a response body into a report.
///
/// Returns [`Error::Api`] when the document carries a status code other than
/// 200, and [`Error::Decode`] when it is not valid JSON or a known field has
/// the wrong shape.
pub fn decode(raw: &[u8]) -> Result<WeatherReport, Error> {
    let document: Value = serde_json::from_slice(raw)
        .map_err(|e| DecodeError::malformed(format!("invalid JSON: {e}")))?;

    let root = document
        .as_object()
        .ok_or_else(|| DecodeError::malformed("top-level value is not an object"))?;

    check_status(root)?;

    let (city_name, country_name) = decode_place(root)?;

    let samples = match opt_array(root, "", "list")? {
        Some([]) => return Err(DecodeError::malformed("`list` is empty").into()),
        Some(entries) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let path = format!("list[{i}]");
                let entry = entry
                    .as_object()
                    .ok_or_else(|| mismatch(&path, "an object", entry))?;
                decode_sample(entry, &path)
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![decode_sample(root, "")?],
    };

    debug!(
        city = city_name.as_deref().unwrap_or_default(),
        samples = samples.len(),
        "decoded weather report"
    );

    Ok(WeatherReport {
        city_name,
        country_name,
        samples,
    })
}

fn check_status(root: &Object) -> Result<(), Error> {
    let Some(cod) = field(root, "cod") else {
        return Ok(());
    };

    let (status, label) = match cod {
        Value::Number(n) => (
            n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            n.to_string(),
        ),
        Value::String(s) => (s.trim().parse::<i64>().ok(), s.clone()),
        other => return Err(mismatch("cod", "a string or a number", other).into()),
    };

    if status == Some(OK_STATUS) {
        return Ok(());
    }

    // Successful forecast responses carry a numeric `message`; only a string
    // is meaningful here.
    let message = match field(root, "message") {
        Some(Value::String(message)) => message.clone(),
        _ => format!("API returned status {label}"),
    };

    Err(Error::Api(message))
}

fn decode_place(root: &Object) -> Result<(Option<String>, Option<String>), DecodeError> {
    let mut city_name = opt_string(root, "", "name")?;
    let mut country_name = match opt_object(root, "", "sys")? {
        Some(sys) => opt_string(sys, "sys", "country")?,
        None => None,
    };

    if let Some(city) = opt_object(root, "", "city")? {
        if let Some(name) = opt_string(city, "city", "name")? {
            city_name = Some(name);
        }
        if let Some(country) = opt_string(city, "city", "country")? {
            country_name = Some(country);
        }
    }

    Ok((city_name, country_name))
}

/// Reads one period. Used for the top-level object of a single observation
/// and for each `list` entry of a collection.
fn decode_sample(obj: &Object, path: &str) -> Result<WeatherSample, DecodeError> {
    let mut sample = WeatherSample::default();

    if let Some(dt) = field(obj, "dt") {
        sample.timestamp = timestamp(dt, &join(path, "dt"))?;
    }

    if let Some(conditions) = opt_array(obj, path, "weather")? {
        if let Some(first) = conditions.first() {
            let p = format!("{}[0]", join(path, "weather"));
            let first = first
                .as_object()
                .ok_or_else(|| mismatch(&p, "an object", first))?;
            sample.condition = opt_string(first, &p, "main")?.unwrap_or_default();
            sample.condition_detail = opt_string(first, &p, "description")?.unwrap_or_default();
        }
    }

    if let Some(clouds) = field(obj, "clouds") {
        sample.cloud_cover_percent = cloud_cover(clouds, &join(path, "clouds"))?;
    }

    if let Some(rain) = field(obj, "rain") {
        sample.rain_mm_per_hour = rain_rate(rain, &join(path, "rain"))?;
    }

    if let Some(main) = opt_object(obj, path, "main")? {
        let p = join(path, "main");
        if let Some(k) = opt_f64(main, &p, "temp")? {
            sample.temperature = kelvin_to_celsius(k);
        }
        if let Some(k) = opt_f64(main, &p, "temp_min")? {
            sample.min_temperature = kelvin_to_celsius(k);
        }
        if let Some(k) = opt_f64(main, &p, "temp_max")? {
            sample.max_temperature = kelvin_to_celsius(k);
        }
        if let Some(humidity) = field(main, "humidity") {
            sample.humidity_percent = percent(humidity, &join(&p, "humidity"))?;
        }
    }

    if let Some(temp) = field(obj, "temp") {
        let p = join(path, "temp");
        match temp {
            Value::Number(_) => sample.temperature = kelvin_to_celsius(number(temp, &p)?),
            Value::Object(daily) => {
                if let Some(k) = opt_f64(daily, &p, "day")? {
                    sample.temperature = kelvin_to_celsius(k);
                }
                if let Some(k) = opt_f64(daily, &p, "min")? {
                    sample.min_temperature = kelvin_to_celsius(k);
                }
                if let Some(k) = opt_f64(daily, &p, "max")? {
                    sample.max_temperature = kelvin_to_celsius(k);
                }
            }
            other => return Err(mismatch(&p, "a number or an object", other)),
        }
    }

    if let Some(humidity) = field(obj, "humidity") {
        sample.humidity_percent = percent(humidity, &join(path, "humidity"))?;
    }

    Ok(sample)
}

fn cloud_cover(value: &Value, path: &str) -> Result<u8, DecodeError> {
    match value {
        Value::Number(_) => percent(value, path),
        Value::Object(obj) => match field(obj, "all") {
            Some(all) => percent(all, &join(path, "all")),
            None => Ok(0),
        },
        other => Err(mismatch(path, "a number or an object", other)),
    }
}

/// Normalizes a rain accumulation to mm per hour.
///
/// A bare number is a 24h total. Daily entries use that form, but it is
/// accepted at the top level of an observation too.
fn rain_rate(value: &Value, path: &str) -> Result<f64, DecodeError> {
    match value {
        Value::Number(_) => Ok(number(value, path)? / BARE_RAIN_WINDOW_HOURS),
        Value::Object(obj) => {
            let mut entries = obj.iter();
            let Some((window, amount)) = entries.next() else {
                return Ok(0.0);
            };
            if entries.next().is_some() {
                return Err(DecodeError::malformed(format!(
                    "`{path}` has {} keys, expected a single accumulation window",
                    obj.len()
                )));
            }
            let p = join(path, window);
            Ok(number(amount, &p)? / window_hours(window, &p)?)
        }
        other => Err(mismatch(path, "a number or an object", other)),
    }
}

/// `"3h"` -> 3.0: a numeric prefix followed by a one-character unit.
fn window_hours(key: &str, path: &str) -> Result<f64, DecodeError> {
    let mut chars = key.chars();
    chars.next_back();

    match chars.as_str().parse::<f64>() {
        Ok(hours) if hours.is_finite() && hours > 0.0 => Ok(hours),
        _ => Err(DecodeError::malformed(format!(
            "`{path}`: no accumulation window in key {key:?}"
        ))),
    }
}

fn timestamp(value: &Value, path: &str) -> Result<i64, DecodeError> {
    match value.as_i64() {
        Some(seconds) => Ok(seconds),
        None => Ok(number(value, path)?.trunc() as i64),
    }
}

fn percent(value: &Value, path: &str) -> Result<u8, DecodeError> {
    let n = number(value, path)?;
    if !(0.0..=100.0).contains(&n) {
        return Err(DecodeError::malformed(format!(
            "`{path}` = {n} is not a percentage"
        )));
    }
    Ok(n as u8)
}

fn number(value: &Value, path: &str) -> Result<f64, DecodeError> {
    value.as_f64().ok_or_else(|| mismatch(path, "a number", value))
}

/// Looks up `key`, treating an explicit JSON `null` as absent.
fn field<'a>(obj: &'a Object, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn opt_string(obj: &Object, path: &str, key: &str) -> Result<Option<String>, DecodeError> {
    match field(obj, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(mismatch(&join(path, key), "a string", other)),
    }
}

fn opt_f64(obj: &Object, path: &str, key: &str) -> Result<Option<f64>, DecodeError> {
    field(obj, key)
        .map(|v| number(v, &join(path, key)))
        .transpose()
}

fn opt_object<'a>(
    obj: &'a Object,
    path: &str,
    key: &str,
) -> Result<Option<&'a Object>, DecodeError> {
    match field(obj, key) {
        None => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(other) => Err(mismatch(&join(path, key), "an object", other)),
    }
}

fn opt_array<'a>(
    obj: &'a Object,
    path: &str,
    key: &str,
) -> Result<Option<&'a [Value]>, DecodeError> {
    match field(obj, key) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.as_slice())),
        Some(other) => Err(mismatch(&join(path, key), "an array", other)),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn mismatch(path: &str, expected: &str, found: &Value) -> DecodeError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    DecodeError::malformed(format!("`{path}` should be {expected}, found {found}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn decode_json(value: Value) -> Result<WeatherReport, Error> {
        decode(&serde_json::to_vec(&value).unwrap())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_malformed(result: Result<WeatherReport, Error>) -> String {
        match result {
            Err(Error::Decode(DecodeError::Malformed(message))) => message,
            other => panic!("expected a malformed-document error, got {other:?}"),
        }
    }

    fn current_document() -> Value {
        json!({
            "coord": {"lon": -21.9, "lat": 64.14},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "base": "stations",
            "main": {
                "temp": 280.32,
                "pressure": 1012,
                "humidity": 81,
                "temp_min": 279.15,
                "temp_max": 281.15
            },
            "visibility": 10000,
            "wind": {"speed": 4.1, "deg": 80},
            "clouds": {"all": 90},
            "rain": {"3h": 0.75},
            "dt": 1485789600,
            "sys": {
                "type": 1,
                "id": 5091,
                "country": "IS",
                "sunrise": 1485762037,
                "sunset": 1485794875
            },
            "id": 3413829,
            "name": "Reykjavik",
            "cod": 200
        })
    }

    #[test]
    fn decodes_current_observation() {
        let report = decode_json(current_document()).unwrap();

        assert_eq!(report.city_name.as_deref(), Some("Reykjavik"));
        assert_eq!(report.country_name.as_deref(), Some("IS"));
        assert_eq!(report.samples.len(), 1);

        let sample = &report.samples[0];
        assert_eq!(sample.timestamp, 1485789600);
        assert_eq!(sample.condition, "Rain");
        assert_eq!(sample.condition_detail, "light rain");
        assert_close(sample.temperature, 7.17);
        assert_close(sample.min_temperature, 6.0);
        assert_close(sample.max_temperature, 8.0);
        assert_eq!(sample.cloud_cover_percent, 90);
        assert_eq!(sample.humidity_percent, 81);
        assert_close(sample.rain_mm_per_hour, 0.25);
    }

    #[test]
    fn kelvin_is_converted_to_celsius() {
        let report = decode_json(json!({"main": {"temp": 300.0}})).unwrap();
        assert_close(report.samples[0].temperature, 26.85);
    }

    #[test]
    fn three_hour_rain_is_normalized_to_hourly() {
        let report = decode_json(json!({"rain": {"3h": 6.0}})).unwrap();
        assert_close(report.samples[0].rain_mm_per_hour, 2.0);
    }

    #[test]
    fn one_hour_rain_is_kept() {
        let report = decode_json(json!({"rain": {"1h": 0.4}})).unwrap();
        assert_close(report.samples[0].rain_mm_per_hour, 0.4);
    }

    #[test]
    fn bare_rain_in_list_entry_is_a_daily_total() {
        let report = decode_json(json!({"list": [{"dt": 1, "rain": 24}]})).unwrap();
        assert_close(report.samples[0].rain_mm_per_hour, 1.0);
    }

    #[test]
    fn bare_rain_on_an_observation_is_also_a_daily_total() {
        let report = decode_json(json!({"rain": 12})).unwrap();
        assert_close(report.samples[0].rain_mm_per_hour, 0.5);
    }

    #[test]
    fn empty_rain_object_means_no_rain() {
        let report = decode_json(json!({"rain": {}})).unwrap();
        assert_eq!(report.samples[0].rain_mm_per_hour, 0.0);
    }

    #[test]
    fn rain_object_with_several_windows_is_rejected() {
        let message = assert_malformed(decode_json(json!({"rain": {"1h": 0.5, "3h": 1.5}})));
        assert!(message.contains("single accumulation window"));
    }

    #[rstest]
    #[case(json!({"h": 1.0}))]
    #[case(json!({"xh": 1.0}))]
    #[case(json!({"0h": 1.0}))]
    #[case(json!({"": 1.0}))]
    fn rain_window_without_a_positive_length_is_rejected(#[case] rain: Value) {
        assert_malformed(decode_json(json!({"rain": rain})));
    }

    #[rstest]
    #[case::string_code(json!({"cod": "404", "message": "city not found"}))]
    #[case::numeric_code(json!({"cod": 404, "message": "city not found"}))]
    fn error_status_surfaces_api_message(#[case] document: Value) {
        match decode_json(document) {
            Err(Error::Api(message)) => assert_eq!(message, "city not found"),
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[test]
    fn error_status_wins_over_a_well_formed_body() {
        let mut document = current_document();
        document["cod"] = json!("401");
        document["message"] = json!("Invalid API key");

        assert!(matches!(decode_json(document), Err(Error::Api(m)) if m == "Invalid API key"));
    }

    #[test]
    fn error_status_without_message_names_the_code() {
        match decode_json(json!({"cod": "500"})) {
            Err(Error::Api(message)) => assert_eq!(message, "API returned status 500"),
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_status_is_an_api_error() {
        assert!(matches!(decode_json(json!({"cod": "oops"})), Err(Error::Api(_))));
    }

    #[test]
    fn boolean_status_is_malformed() {
        assert_malformed(decode_json(json!({"cod": true})));
    }

    #[test]
    fn string_200_with_numeric_message_is_success() {
        let report = decode_json(json!({
            "cod": "200",
            "message": 0,
            "cnt": 1,
            "list": [{"dt": 10, "main": {"temp": 273.15}}]
        }))
        .unwrap();
        assert_eq!(report.samples.len(), 1);
    }

    #[test]
    fn list_keeps_length_and_order() {
        let entries: Vec<Value> = (0..7)
            .map(|day| {
                json!({
                    "dt": 1_700_000_000 + day * 86_400,
                    "temp": {"day": 280.0 + day as f64}
                })
            })
            .collect();

        let report = decode_json(json!({
            "city": {"name": "Oslo", "country": "NO"},
            "list": entries
        }))
        .unwrap();

        assert_eq!(report.samples.len(), 7);
        for (day, sample) in report.samples.iter().enumerate() {
            assert_eq!(sample.timestamp, 1_700_000_000 + day as i64 * 86_400);
            assert_close(sample.temperature, kelvin_to_celsius(280.0 + day as f64));
        }
        assert_eq!(report.city_name.as_deref(), Some("Oslo"));
        assert_eq!(report.country_name.as_deref(), Some("NO"));
    }

    #[test]
    fn decodes_daily_aggregate_entry() {
        let report = decode_json(json!({
            "city": {"name": "Reykjavik", "country": "IS"},
            "cod": "200",
            "list": [{
                "dt": 1485777600,
                "temp": {
                    "day": 275.15,
                    "min": 270.15,
                    "max": 278.15,
                    "night": 271.0,
                    "eve": 273.0,
                    "morn": 270.5
                },
                "pressure": 1002.5,
                "humidity": 92,
                "weather": [{"main": "Snow", "description": "light snow"}],
                "clouds": 76,
                "rain": 4.8
            }]
        }))
        .unwrap();

        let sample = &report.samples[0];
        assert_close(sample.temperature, 2.0);
        assert_close(sample.min_temperature, -3.0);
        assert_close(sample.max_temperature, 5.0);
        assert_eq!(sample.humidity_percent, 92);
        assert_eq!(sample.cloud_cover_percent, 76);
        assert_close(sample.rain_mm_per_hour, 0.2);
        assert_eq!(sample.condition, "Snow");
    }

    #[test]
    fn daily_temp_without_humidity_leaves_it_zero() {
        let report = decode_json(json!({
            "list": [{"dt": 1485777600, "temp": {"day": 283.15, "min": 278.15, "max": 288.15}}]
        }))
        .unwrap();

        let sample = &report.samples[0];
        assert_close(sample.temperature, 10.0);
        assert_close(sample.min_temperature, 5.0);
        assert_close(sample.max_temperature, 15.0);
        assert_eq!(sample.humidity_percent, 0);
    }

    #[test]
    fn decodes_three_hourly_entry() {
        let report = decode_json(json!({
            "cod": "200",
            "city": {"name": "Reykjavik", "country": "IS"},
            "list": [{
                "dt": 1485799200,
                "main": {
                    "temp": 261.45,
                    "temp_min": 259.086,
                    "temp_max": 261.45,
                    "humidity": 79
                },
                "weather": [{"main": "Clear", "description": "clear sky"}],
                "clouds": {"all": 0},
                "rain": {"3h": 0.3}
            }]
        }))
        .unwrap();

        let sample = &report.samples[0];
        assert_close(sample.temperature, -11.7);
        assert_eq!(sample.humidity_percent, 79);
        assert_close(sample.rain_mm_per_hour, 0.1);
    }

    #[test]
    fn scalar_temp_sets_only_the_temperature() {
        let report = decode_json(json!({"list": [{"temp": 283.15}]})).unwrap();
        let sample = &report.samples[0];
        assert_close(sample.temperature, 10.0);
        assert_eq!(sample.min_temperature, 0.0);
        assert_eq!(sample.max_temperature, 0.0);
    }

    #[rstest]
    #[case::bare_number(json!(40))]
    #[case::nested_object(json!({"all": 40}))]
    fn both_cloud_encodings_are_accepted(#[case] clouds: Value) {
        let top_level = decode_json(json!({"clouds": clouds.clone()})).unwrap();
        assert_eq!(top_level.samples[0].cloud_cover_percent, 40);

        let in_list = decode_json(json!({"list": [{"clouds": clouds}]})).unwrap();
        assert_eq!(in_list.samples[0].cloud_cover_percent, 40);
    }

    #[test]
    fn absent_fields_default_to_zero() {
        // Missing numbers are reported as zero rather than unknown.
        let report = decode_json(json!({})).unwrap();

        assert_eq!(report.city_name, None);
        assert_eq!(report.country_name, None);
        assert_eq!(report.samples, vec![WeatherSample::default()]);
    }

    #[test]
    fn null_fields_are_treated_as_absent() {
        let report = decode_json(json!({"name": null, "rain": null, "main": {"temp": null}}))
            .expect("nulls are absent values");
        assert_eq!(report.city_name, None);
        assert_eq!(report.samples[0], WeatherSample::default());
    }

    #[test]
    fn empty_weather_array_leaves_condition_blank() {
        let report = decode_json(json!({"weather": []})).unwrap();
        assert!(report.samples[0].condition.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let report = decode_json(json!({"wind": {"speed": "fast"}, "visibility": "far"}))
            .expect("unknown keys are skipped");
        assert_eq!(report.samples.len(), 1);
    }

    #[test]
    fn list_replaces_top_level_sample() {
        let report = decode_json(json!({
            "main": {"temp": 300.0},
            "list": [{"dt": 1}, {"dt": 2}]
        }))
        .unwrap();
        assert_eq!(report.samples.len(), 2);
        assert_eq!(report.samples[0].temperature, 0.0);
    }

    #[test]
    fn fractional_timestamp_is_truncated() {
        let report = decode_json(json!({"dt": 1485789600.9})).unwrap();
        assert_eq!(report.samples[0].timestamp, 1485789600);
    }

    #[rstest]
    #[case::not_json(b"{not json".to_vec())]
    #[case::truncated(br#"{"main": {"temp": 3"#.to_vec())]
    #[case::empty(Vec::new())]
    fn invalid_json_is_malformed(#[case] raw: Vec<u8>) {
        assert_malformed(decode(&raw));
    }

    #[test]
    fn non_object_document_is_malformed() {
        assert_malformed(decode_json(json!([1, 2, 3])));
    }

    #[rstest]
    #[case::main_not_object(json!({"main": "warm"}), "`main` should be an object")]
    #[case::temp_not_number(json!({"main": {"temp": "300"}}), "`main.temp` should be a number")]
    #[case::weather_not_array(
        json!({"weather": {"main": "Clear"}}),
        "`weather` should be an array"
    )]
    #[case::name_not_string(json!({"name": 42}), "`name` should be a string")]
    #[case::clouds_string(json!({"clouds": "many"}), "`clouds` should be a number or an object")]
    #[case::list_entry_not_object(json!({"list": [1]}), "`list[0]` should be an object")]
    #[case::nested_path(
        json!({"list": [{}, {"main": {"humidity": "wet"}}]}),
        "`list[1].main.humidity`"
    )]
    fn type_mismatch_names_the_field(#[case] document: Value, #[case] expected: &str) {
        let message = assert_malformed(decode_json(document));
        assert!(message.contains(expected), "{message}");
    }

    #[test]
    fn out_of_range_percentage_is_malformed() {
        assert_malformed(decode_json(json!({"main": {"humidity": 150}})));
    }

    #[test]
    fn empty_list_is_malformed() {
        assert_malformed(decode_json(json!({"cod": "200", "list": []})));
    }
}
