// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Style specific pass content.

use {
    crate::{
        error::PassError,
        fields::{Field, FieldGroup, FieldGroups},
    },
    serde::Serialize,
};

/// Mode of transport of a boarding pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum TransitType {
    #[default]
    #[serde(rename = "PKTransitTypeAir")]
    Air,
    #[serde(rename = "PKTransitTypeTrain")]
    Train,
    #[serde(rename = "PKTransitTypeBus")]
    Bus,
    #[serde(rename = "PKTransitTypeBoat")]
    Boat,
    #[serde(rename = "PKTransitTypeGeneric")]
    Generic,
}

/// The visual style of a pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PassStyle {
    BoardingPass { transit_type: TransitType },
    Coupon,
    EventTicket,
    Generic,
    StoreCard,
}

impl PassStyle {
    /// Key under which the content of this style is stored in `pass.json`.
    pub fn json_key(&self) -> &'static str {
        match self {
            Self::BoardingPass { .. } => "boardingPass",
            Self::Coupon => "coupon",
            Self::EventTicket => "eventTicket",
            Self::Generic => "generic",
            Self::StoreCard => "storeCard",
        }
    }
}

/// The field groups of a pass together with its style.
///
/// The style is fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentBlock {
    style: PassStyle,
    fields: FieldGroups,
}

impl ContentBlock {
    pub fn new(style: PassStyle) -> Self {
        Self {
            style,
            fields: FieldGroups::default(),
        }
    }

    pub fn boarding_pass(transit_type: TransitType) -> Self {
        Self::new(PassStyle::BoardingPass { transit_type })
    }

    pub fn coupon() -> Self {
        Self::new(PassStyle::Coupon)
    }

    pub fn event_ticket() -> Self {
        Self::new(PassStyle::EventTicket)
    }

    pub fn generic() -> Self {
        Self::new(PassStyle::Generic)
    }

    pub fn store_card() -> Self {
        Self::new(PassStyle::StoreCard)
    }

    pub fn style(&self) -> PassStyle {
        self.style
    }

    pub fn fields(&self) -> &FieldGroups {
        &self.fields
    }

    /// Append a field to a group.
    pub fn add_field(&mut self, group: FieldGroup, field: Field) -> Result<(), PassError> {
        self.fields.push(group, field)
    }

    pub fn add_header_field(&mut self, field: Field) -> Result<(), PassError> {
        self.add_field(FieldGroup::Header, field)
    }

    pub fn add_primary_field(&mut self, field: Field) -> Result<(), PassError> {
        self.add_field(FieldGroup::Primary, field)
    }

    pub fn add_secondary_field(&mut self, field: Field) -> Result<(), PassError> {
        self.add_field(FieldGroup::Secondary, field)
    }

    pub fn add_auxiliary_field(&mut self, field: Field) -> Result<(), PassError> {
        self.add_field(FieldGroup::Auxiliary, field)
    }

    pub fn add_back_field(&mut self, field: Field) -> Result<(), PassError> {
        self.add_field(FieldGroup::Back, field)
    }
}
