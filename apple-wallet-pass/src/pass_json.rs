// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Serialization of a [PassBundle] to `pass.json`.

The document is produced from borrowed view structs whose field order
is the key order of the output, so serializing an unmodified bundle
always yields identical bytes. Optional attributes are `Option`s on
the view skipped when `None`: a key is present exactly when the bundle
holds a non-empty value for it.
*/

use {
    crate::{
        barcode::Barcode,
        bundle::PassBundle,
        content::{PassStyle, TransitType},
        error::PassError,
        fields::{
            DataDetector, DateStyle, Field, FieldFormat, FieldGroup, FieldGroups, FieldValue,
            NumberStyle, TextAlignment,
        },
        relevance::{Beacon, Decimal, Location},
    },
    chrono::{DateTime, FixedOffset, SecondsFormat},
    serde::Serialize,
    std::borrow::Cow,
};

/// Value of `formatVersion`.
pub const FORMAT_VERSION: u8 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PassJson<'a> {
    description: &'a str,
    format_version: u8,
    organization_name: &'a str,
    pass_type_identifier: &'a str,
    serial_number: &'a str,
    team_identifier: &'a str,
    suppress_strip_shine: bool,
    #[serde(flatten)]
    style: StyleJson<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    barcodes: Option<[&'a Barcode; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    barcode: Option<Cow<'a, Barcode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relevant_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    background_color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    foreground_color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label_color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logo_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locations: Option<&'a [Location]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    beacons: Option<&'a [Beacon]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_info: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    associated_store_identifiers: Option<&'a [u64]>,
    #[serde(rename = "appLaunchURL", skip_serializing_if = "Option::is_none")]
    app_launch_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voided: Option<bool>,
    #[serde(rename = "webServiceURL", skip_serializing_if = "Option::is_none")]
    web_service_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grouping_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sharing_prohibited: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_distance: Option<u32>,
}

/// Style content, serialized as a single `styleKey: {...}` entry.
#[derive(Serialize)]
enum StyleJson<'a> {
    #[serde(rename = "boardingPass")]
    BoardingPass(BoardingPassJson<'a>),
    #[serde(rename = "coupon")]
    Coupon(FieldGroupsJson<'a>),
    #[serde(rename = "eventTicket")]
    EventTicket(FieldGroupsJson<'a>),
    #[serde(rename = "generic")]
    Generic(FieldGroupsJson<'a>),
    #[serde(rename = "storeCard")]
    StoreCard(FieldGroupsJson<'a>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoardingPassJson<'a> {
    #[serde(flatten)]
    fields: FieldGroupsJson<'a>,
    transit_type: TransitType,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldGroupsJson<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    header_fields: Vec<FieldJson<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    primary_fields: Vec<FieldJson<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    secondary_fields: Vec<FieldJson<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    back_fields: Vec<FieldJson<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    auxiliary_fields: Vec<FieldJson<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldJson<'a> {
    key: &'a str,
    value: ValueJson<'a>,
    label: &'a str,
    change_message: &'a str,
    text_alignment: TextAlignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_style: Option<DateStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_style: Option<DateStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_relative: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ignores_time_zone: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number_style: Option<NumberStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributed_value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_detector_types: Option<&'a [DataDetector]>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ValueJson<'a> {
    Text(&'a str),
    Integer(i64),
    Number(f64),
    Decimal(&'a Decimal),
    Date(String),
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn non_empty_slice<T>(value: &[T]) -> Option<&[T]> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn non_empty_value(value: &Option<serde_json::Value>) -> Option<&serde_json::Value> {
    value.as_ref().filter(|v| match v {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
        _ => true,
    })
}

fn date_text(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn field_json(field: &Field) -> Result<FieldJson<'_>, PassError> {
    let value = match &field.value {
        FieldValue::Text(v) => ValueJson::Text(v),
        FieldValue::Integer(v) => ValueJson::Integer(*v),
        FieldValue::Number(v) if v.is_finite() => ValueJson::Number(*v),
        FieldValue::Number(_) => return Err(PassError::NonFiniteNumber(field.key.clone())),
        FieldValue::Decimal(v) => ValueJson::Decimal(v),
        FieldValue::Date(v) => ValueJson::Date(date_text(v)),
    };

    let mut json = FieldJson {
        key: &field.key,
        value,
        label: field.label.as_deref().unwrap_or_default(),
        change_message: field.change_message.as_deref().unwrap_or_default(),
        text_alignment: field.text_alignment,
        date_style: None,
        time_style: None,
        is_relative: None,
        ignores_time_zone: None,
        number_style: None,
        currency_code: None,
        attributed_value: non_empty(&field.attributed_value),
        data_detector_types: non_empty_slice(&field.data_detector_types),
    };

    match &field.format {
        FieldFormat::Plain => {}
        FieldFormat::Date {
            date_style,
            time_style,
            is_relative,
            ignores_time_zone,
        } => {
            json.date_style = Some(*date_style);
            json.time_style = Some(*time_style);
            json.is_relative = Some(*is_relative);
            json.ignores_time_zone = ignores_time_zone.then_some(true);
        }
        FieldFormat::Number { number_style } => {
            json.number_style = Some(*number_style);
        }
        FieldFormat::Currency {
            number_style,
            currency_code,
        } => {
            json.number_style = Some(*number_style);
            json.currency_code = Some(currency_code);
        }
    }

    Ok(json)
}

fn field_groups_json(groups: &FieldGroups) -> Result<FieldGroupsJson<'_>, PassError> {
    let group = |g| {
        groups
            .fields(g)
            .iter()
            .map(field_json)
            .collect::<Result<Vec<_>, _>>()
    };

    Ok(FieldGroupsJson {
        header_fields: group(FieldGroup::Header)?,
        primary_fields: group(FieldGroup::Primary)?,
        secondary_fields: group(FieldGroup::Secondary)?,
        back_fields: group(FieldGroup::Back)?,
        auxiliary_fields: group(FieldGroup::Auxiliary)?,
    })
}

fn style_json(bundle: &PassBundle) -> Result<StyleJson<'_>, PassError> {
    let fields = field_groups_json(bundle.content.fields())?;

    Ok(match bundle.content.style() {
        PassStyle::BoardingPass { transit_type } => StyleJson::BoardingPass(BoardingPassJson {
            fields,
            transit_type,
        }),
        PassStyle::Coupon => StyleJson::Coupon(fields),
        PassStyle::EventTicket => StyleJson::EventTicket(fields),
        PassStyle::Generic => StyleJson::Generic(fields),
        PassStyle::StoreCard => StyleJson::StoreCard(fields),
    })
}

/// Serialize a bundle to the bytes of its `pass.json`.
pub fn serialize_pass(bundle: &PassBundle) -> Result<Vec<u8>, PassError> {
    let web_service = bundle
        .web_service
        .as_ref()
        .filter(|ws| !ws.url.is_empty());

    let doc = PassJson {
        description: &bundle.description,
        format_version: FORMAT_VERSION,
        organization_name: &bundle.organization_name,
        pass_type_identifier: &bundle.pass_type_identifier,
        serial_number: &bundle.serial_number,
        team_identifier: &bundle.team_identifier,
        suppress_strip_shine: bundle.suppress_strip_shine,
        style: style_json(bundle)?,
        barcodes: bundle.barcode.as_ref().map(|b| [b]),
        barcode: bundle.barcode.as_ref().map(|b| b.legacy_compatible()),
        relevant_date: bundle.relevant_date.as_ref().map(date_text),
        background_color: non_empty(&bundle.background_color),
        foreground_color: non_empty(&bundle.foreground_color),
        label_color: non_empty(&bundle.label_color),
        logo_text: non_empty(&bundle.logo_text),
        locations: non_empty_slice(&bundle.locations),
        beacons: non_empty_slice(&bundle.beacons),
        user_info: non_empty_value(&bundle.user_info),
        associated_store_identifiers: non_empty_slice(&bundle.associated_store_identifiers),
        app_launch_url: non_empty(&bundle.app_launch_url),
        expiration_date: bundle.expiration_date.as_ref().map(date_text),
        voided: bundle.voided.then_some(true),
        web_service_url: web_service.map(|ws| ws.url.as_str()),
        authentication_token: web_service.map(|ws| ws.authentication_token.as_str()),
        grouping_identifier: non_empty(&bundle.grouping_identifier),
        sharing_prohibited: bundle.sharing_prohibited.then_some(true),
        max_distance: bundle.max_distance,
    };

    serde_json::to_vec(&doc).map_err(PassError::Json)
}
