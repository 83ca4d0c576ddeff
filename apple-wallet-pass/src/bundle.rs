// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The in-memory description of a single pass.

A [PassBundle] is obtained from a [PassIssuer], which holds the
identifiers shared by every pass an issuer produces. Callers then
populate content and metadata, add asset files such as `icon.png`,
and hand the bundle to [crate::PassBuilder] to produce a signed
archive.
*/

use {
    crate::{
        archive::is_reserved_name,
        barcode::Barcode,
        content::ContentBlock,
        error::PassError,
        relevance::{Beacon, Location},
    },
    chrono::{DateTime, FixedOffset},
    serde::{Deserialize, Serialize},
    std::collections::{btree_map::Entry, BTreeMap},
};

/// Identifiers shared by all passes of an issuer.
///
/// Serializes with `camelCase` keys so it can be embedded in a caller's
/// configuration document.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassIssuer {
    /// Team identifier of the organization that signs passes.
    pub team_identifier: String,
    /// Pass type identifier, as registered with the wallet platform.
    pub pass_type_identifier: String,
    /// Organization name displayed on the lock screen.
    pub organization_name: String,
    /// Default description for new passes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PassIssuer {
    pub fn new(
        team_identifier: impl Into<String>,
        pass_type_identifier: impl Into<String>,
        organization_name: impl Into<String>,
    ) -> Self {
        Self {
            team_identifier: team_identifier.into(),
            pass_type_identifier: pass_type_identifier.into(),
            organization_name: organization_name.into(),
            description: None,
        }
    }

    /// Create a new pass of this issuer.
    ///
    /// The pass is assigned a random serial number.
    pub fn new_pass(&self, content: ContentBlock) -> PassBundle {
        PassBundle {
            serial_number: uuid::Uuid::new_v4().hyphenated().to_string().to_uppercase(),
            description: self.description.clone().unwrap_or_default(),
            organization_name: self.organization_name.clone(),
            pass_type_identifier: self.pass_type_identifier.clone(),
            team_identifier: self.team_identifier.clone(),
            suppress_strip_shine: false,
            content,
            barcode: None,
            relevant_date: None,
            background_color: None,
            foreground_color: None,
            label_color: None,
            logo_text: None,
            locations: vec![],
            beacons: vec![],
            user_info: None,
            associated_store_identifiers: vec![],
            app_launch_url: None,
            expiration_date: None,
            voided: false,
            web_service: None,
            grouping_identifier: None,
            sharing_prohibited: false,
            max_distance: None,
            files: BTreeMap::new(),
        }
    }
}

/// Web service a wallet application registers with to receive updates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WebService {
    pub url: String,
    /// Token the device presents to the web service. At least 16 characters.
    pub authentication_token: String,
}

impl WebService {
    pub fn new(url: impl Into<String>, authentication_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authentication_token: authentication_token.into(),
        }
    }
}

/// A pass prior to signing.
///
/// Metadata is exposed as public fields. `None`, empty strings and empty
/// lists are all omitted from `pass.json`.
#[derive(Clone, Debug, PartialEq)]
pub struct PassBundle {
    pub serial_number: String,
    pub description: String,
    pub organization_name: String,
    pub pass_type_identifier: String,
    pub team_identifier: String,
    pub suppress_strip_shine: bool,

    pub content: ContentBlock,

    /// The barcode. A legacy barcode is derived from it during serialization.
    pub barcode: Option<Barcode>,
    pub relevant_date: Option<DateTime<FixedOffset>>,
    /// CSS style color, e.g. `rgb(22, 55, 110)`.
    pub background_color: Option<String>,
    pub foreground_color: Option<String>,
    pub label_color: Option<String>,
    pub logo_text: Option<String>,
    pub locations: Vec<Location>,
    pub beacons: Vec<Beacon>,
    pub user_info: Option<serde_json::Value>,
    /// App Store identifiers of associated apps.
    pub associated_store_identifiers: Vec<u64>,
    pub app_launch_url: Option<String>,
    pub expiration_date: Option<DateTime<FixedOffset>>,
    pub voided: bool,
    pub web_service: Option<WebService>,
    pub grouping_identifier: Option<String>,
    pub sharing_prohibited: bool,
    /// Maximum distance in meters from a location at which the pass is relevant.
    pub max_distance: Option<u32>,

    files: BTreeMap<String, Vec<u8>>,
}

impl PassBundle {
    /// Add an asset file, e.g. `icon.png` or `en.lproj/pass.strings`.
    ///
    /// Names of files the pipeline generates are rejected, as are empty
    /// names and names already present.
    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Result<(), PassError> {
        let name = name.into();

        if name.is_empty() {
            return Err(PassError::EmptyFileName);
        }
        if is_reserved_name(&name) {
            return Err(PassError::ReservedFileName(name));
        }

        match self.files.entry(name) {
            Entry::Occupied(entry) => Err(PassError::DuplicateFile(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(data.into());
                Ok(())
            }
        }
    }

    /// Asset files, keyed by name.
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    /// Set custom data made available to companion apps.
    pub fn set_user_info<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), PassError> {
        self.user_info = Some(serde_json::to_value(value).map_err(PassError::Json)?);

        Ok(())
    }

    /// Ensure required attributes are present.
    pub fn validate(&self) -> Result<(), PassError> {
        for (name, value) in [
            ("description", &self.description),
            ("organizationName", &self.organization_name),
            ("passTypeIdentifier", &self.pass_type_identifier),
            ("serialNumber", &self.serial_number),
            ("teamIdentifier", &self.team_identifier),
        ] {
            if value.is_empty() {
                return Err(PassError::MissingRequiredAttribute(name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use {super::*, crate::error::ErrorKind};

    fn issuer() -> PassIssuer {
        let mut issuer = PassIssuer::new("T1", "pass.com.example.test", "Example");
        issuer.description = Some("Test pass".into());
        issuer
    }

    #[test]
    fn new_pass_assigns_fresh_serials() {
        let issuer = issuer();
        let a = issuer.new_pass(ContentBlock::generic());
        let b = issuer.new_pass(ContentBlock::generic());

        assert_ne!(a.serial_number, b.serial_number);
        assert_eq!(a.serial_number.len(), 36);
        assert_eq!(a.serial_number, a.serial_number.to_uppercase());
        assert_eq!(a.team_identifier, "T1");
        assert_eq!(a.description, "Test pass");
        a.validate().unwrap();
    }

    #[test]
    fn issuer_config_json() {
        let issuer: PassIssuer = serde_json::from_str(
            r#"{"teamIdentifier":"65QNR2XSA2","passTypeIdentifier":"pass.com.example","organizationName":"Example"}"#,
        )
        .unwrap();

        assert_eq!(issuer.team_identifier, "65QNR2XSA2");
        assert!(issuer.description.is_none());
        assert_eq!(issuer.new_pass(ContentBlock::coupon()).description, "");
    }

    #[test]
    fn add_file_preconditions() {
        let mut pass = issuer().new_pass(ContentBlock::generic());

        pass.add_file("icon.png", b"png".to_vec()).unwrap();
        pass.add_file("en.lproj/pass.strings", "\"a\" = \"b\";").unwrap();

        for reserved in ["pass.json", "manifest.json", "signature"] {
            let err = pass.add_file(reserved, vec![]).unwrap_err();
            assert!(matches!(err, PassError::ReservedFileName(_)));
            assert_eq!(err.kind(), ErrorKind::Precondition);
        }
        assert!(matches!(
            pass.add_file("icon.png", vec![1]),
            Err(PassError::DuplicateFile(_))
        ));
        assert!(matches!(
            pass.add_file("", vec![1]),
            Err(PassError::EmptyFileName)
        ));

        assert_eq!(pass.files().len(), 2);
        assert_eq!(pass.files()["icon.png"], b"png");
    }

    #[test]
    fn validate_required_attributes() {
        let mut pass = issuer().new_pass(ContentBlock::generic());
        pass.team_identifier.clear();

        assert!(matches!(
            pass.validate(),
            Err(PassError::MissingRequiredAttribute("teamIdentifier"))
        ));
    }

    #[test]
    fn user_info() {
        let mut pass = issuer().new_pass(ContentBlock::generic());
        pass.set_user_info(&BTreeMap::from([("tier", "gold")]))
            .unwrap();

        assert_eq!(pass.user_info, Some(serde_json::json!({"tier": "gold"})));
    }
}
