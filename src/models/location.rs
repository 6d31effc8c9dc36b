// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Location model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Last-known position of one identity, stored in `locations/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Degrees clockwise from north
    #[serde(default)]
    pub bearing: Option<f64>,
    /// Horizontal accuracy in meters
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Server time of the update
    pub last_update: DateTime<Utc>,
}

/// Position reported by a client.
///
/// There is no timestamp field: the server stamps updates with
/// its own clock and any client-sent `last_update` is ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationUpdate {
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 360.0))]
    pub bearing: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub accuracy: Option<f64>,
}

impl LocationUpdate {
    pub fn at(self, now: DateTime<Utc>) -> Location {
        Location {
            longitude: self.longitude,
            latitude: self.latitude,
            altitude: self.altitude,
            bearing: self.bearing,
            accuracy: self.accuracy,
            last_update: now,
        }
    }
}

/// Location as shown to friends.
///
/// A friend who never reported a position gets the zero location with a
/// null `last_update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct LocationDetails {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub last_update: Option<DateTime<Utc>>,
}

impl From<Option<Location>> for LocationDetails {
    fn from(location: Option<Location>) -> Self {
        match location {
            Some(loc) => Self {
                longitude: loc.longitude,
                latitude: loc.latitude,
                altitude: loc.altitude,
                bearing: loc.bearing,
                accuracy: loc.accuracy,
                last_update: Some(loc.last_update),
            },
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(longitude: f64, latitude: f64) -> LocationUpdate {
        LocationUpdate {
            longitude,
            latitude,
            altitude: None,
            bearing: None,
            accuracy: None,
        }
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(update(10.0, 20.0).validate().is_ok());
        assert!(update(-180.0, 90.0).validate().is_ok());
        assert!(update(180.5, 0.0).validate().is_err());
        assert!(update(0.0, -90.5).validate().is_err());
    }

    #[test]
    fn test_optional_fields_validated_when_present() {
        let mut loc = update(0.0, 0.0);
        loc.bearing = Some(400.0);
        assert!(loc.validate().is_err());

        let mut loc = update(0.0, 0.0);
        loc.accuracy = Some(-1.0);
        assert!(loc.validate().is_err());
    }

    #[test]
    fn test_client_timestamp_is_ignored() {
        let parsed: LocationUpdate = serde_json::from_str(
            r#"{"longitude": 1.0, "latitude": 2.0, "last_update": "1999-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let now = Utc::now();
        assert_eq!(parsed.at(now).last_update, now);
    }

    #[test]
    fn test_missing_location_is_zero_with_null_timestamp() {
        let details = LocationDetails::from(None);
        assert_eq!(details.longitude, 0.0);
        assert_eq!(details.latitude, 0.0);
        assert!(details.last_update.is_none());

        let json = serde_json::to_value(&details).unwrap();
        assert!(json["last_update"].is_null());
        assert!(json.get("altitude").is_none());
    }
}
