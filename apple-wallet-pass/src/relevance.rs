// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Relevance information: where and near what a pass should surface.

Coordinates are carried as [Decimal] values. A [Decimal] remembers the
exact decimal text it was constructed from and writes that text verbatim
as a JSON number, so a latitude such as `37.33182` never passes through
binary floating point on its way into `pass.json`.
*/

use {
    crate::error::PassError,
    once_cell::sync::Lazy,
    regex::Regex,
    serde::{ser::Error as _, Serialize, Serializer},
    serde_json::value::RawValue,
    std::{fmt, str::FromStr},
};

/// JSON number grammar (RFC 8259 section 6).
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$")
        .expect("decimal regex should compile")
});

/// An exact decimal number.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Construct an instance from decimal text, e.g. `-122.03118`.
    pub fn new(text: impl Into<String>) -> Result<Self, PassError> {
        let text = text.into();

        if DECIMAL_RE.is_match(&text) {
            Ok(Self(text))
        } else {
            Err(PassError::InvalidDecimal(text))
        }
    }

    /// The decimal text of this value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Decimal {
    type Err = PassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl TryFrom<f64> for Decimal {
    type Error = PassError;

    /// Uses the shortest decimal text that round-trips to `v`.
    fn try_from(v: f64) -> Result<Self, Self::Error> {
        if v.is_finite() {
            Self::new(v.to_string())
        } else {
            Err(PassError::InvalidDecimal(v.to_string()))
        }
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawValue::from_string(self.0.clone())
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// A geographic location at which a pass is relevant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: Decimal,
    pub longitude: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<Decimal>,
    /// Text shown on the lock screen when the device is near the location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

impl Location {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            relevant_text: None,
        }
    }

    /// Construct an instance from decimal text for latitude and longitude.
    pub fn from_text(latitude: &str, longitude: &str) -> Result<Self, PassError> {
        Ok(Self::new(Decimal::new(latitude)?, Decimal::new(longitude)?))
    }

    pub fn altitude(mut self, altitude: Decimal) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn relevant_text(mut self, text: impl Into<String>) -> Self {
        self.relevant_text = Some(text.into());
        self
    }
}

/// An iBeacon near which a pass is relevant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    #[serde(rename = "proximityUUID")]
    pub proximity_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

impl Beacon {
    pub fn new(proximity_uuid: impl Into<String>) -> Self {
        Self {
            proximity_uuid: proximity_uuid.into(),
            major: None,
            minor: None,
            relevant_text: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimal_validation() {
        for good in ["0", "-0", "37.33182", "-122.03118", "1e5", "2.5E-3", "100"] {
            assert_eq!(Decimal::new(good).unwrap().as_str(), good);
        }

        for bad in ["", "01", "1.", ".5", "1,5", "NaN", "inf", "+1", "1e", "0x10"] {
            assert!(
                matches!(Decimal::new(bad), Err(PassError::InvalidDecimal(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn decimal_from_numbers() {
        assert_eq!(Decimal::from(-42).as_str(), "-42");
        assert_eq!(Decimal::try_from(37.5).unwrap().as_str(), "37.5");
        assert!(Decimal::try_from(f64::NAN).is_err());
        assert!(Decimal::try_from(f64::INFINITY).is_err());
    }

    #[test]
    fn decimal_text_preserved_in_json() {
        // 0.1 + 0.2 style drift would show up as 37.331820000000001.
        let location = Location::from_text("37.33182", "-122.03118000")
            .unwrap()
            .relevant_text("Store nearby");

        let json = serde_json::to_string(&location).unwrap();
        assert_eq!(
            json,
            r#"{"latitude":37.33182,"longitude":-122.03118000,"relevantText":"Store nearby"}"#
        );
    }

    #[test]
    fn beacon_json() {
        let mut beacon = Beacon::new("F8F589E9-C07E-58B0-AEAB-A36BE4D48FAC");
        beacon.major = Some(7);

        assert_eq!(
            serde_json::to_string(&beacon).unwrap(),
            r#"{"proximityUUID":"F8F589E9-C07E-58B0-AEAB-A36BE4D48FAC","major":7}"#
        );
    }
}
