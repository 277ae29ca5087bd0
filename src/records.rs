//! Records exchanged with the Fulcrum records API
//!
//! A [`Record`] is built once per joystick press from a fresh [`Sample`] and
//! is never modified afterwards. A [`ResultPage`] is one page of previously
//! submitted records, fetched for the dashboard.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize};

use crate::sensors::Sample;
use crate::status::Status;

/// Form every record belongs to.
pub const FORM_ID: &str = "5a7cffe6-05b2-4916-a510-16b30b869905";

/// Field keys of the form's numeric fields.
pub mod field_keys {
    pub const TEMPERATURE: &str = "ebf0";
    pub const HUMIDITY: &str = "0a86";
    pub const PRESSURE: &str = "e633";
    pub const ROLL: &str = "840e";
    pub const PITCH: &str = "1611";
    pub const YAW: &str = "2987";
}

const LATITUDE_LIMIT: f64 = 90.0;
const LONGITUDE_LIMIT: f64 = 180.0;

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keep string form values, render numbers as text, and drop everything else,
/// so one odd field never fails the whole page.
fn lenient_form_values<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(text) => Some((key, text)),
            serde_json::Value::Number(number) => Some((key, number.to_string())),
            _ => None,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "null_as_default")]
    pub form_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub longitude: f64,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "lenient_form_values")]
    pub form_values: BTreeMap<String, String>,
}

impl Record {
    /// Build a record with a simulated location drawn from a generator seeded
    /// with the current time.
    pub fn new(status: Status, sample: &Sample) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        Self::with_rng(status, sample, &mut SmallRng::seed_from_u64(seed))
    }

    /// Build a record drawing the simulated location from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(status: Status, sample: &Sample, rng: &mut R) -> Self {
        let latitude = random_coordinate(rng, LATITUDE_LIMIT);
        let longitude = random_coordinate(rng, LONGITUDE_LIMIT);

        let form_values = [
            (field_keys::TEMPERATURE, sample.temperature),
            (field_keys::HUMIDITY, sample.humidity),
            (field_keys::PRESSURE, sample.pressure),
            (field_keys::ROLL, sample.orientation.roll),
            (field_keys::PITCH, sample.orientation.pitch),
            (field_keys::YAW, sample.orientation.yaw),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_owned(), encode_value(value)))
        .collect();

        Self {
            form_id: FORM_ID.to_owned(),
            latitude,
            longitude,
            status,
            form_values,
        }
    }
}

/// Uniform magnitude in `[0, limit)` with an independent random sign.
fn random_coordinate<R: Rng + ?Sized>(rng: &mut R, limit: f64) -> f64 {
    let negative = rng.random_bool(0.5);
    let magnitude = rng.random::<f64>() * limit;
    if negative { -magnitude } else { magnitude }
}

/// Shortest decimal that parses back to the same value. `Display` for `f64`
/// never switches to exponent notation.
fn encode_value(value: f64) -> String {
    value.to_string()
}

/// One page of the records listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultPage {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub per_page: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub records: Vec<Record>,
}

impl ResultPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
