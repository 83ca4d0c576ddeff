// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Displayable fields and the groups holding them.

use {
    crate::{error::PassError, relevance::Decimal},
    chrono::{DateTime, FixedOffset},
    serde::Serialize,
};

/// Horizontal alignment of a field's text.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum TextAlignment {
    #[default]
    #[serde(rename = "PKTextAlignmentLeft")]
    Left,
    #[serde(rename = "PKTextAlignmentCenter")]
    Center,
    #[serde(rename = "PKTextAlignmentRight")]
    Right,
    #[serde(rename = "PKTextAlignmentJustified")]
    Justified,
    #[serde(rename = "PKTextAlignmentNatural")]
    Natural,
}

/// Style used to display a date or time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum DateStyle {
    #[serde(rename = "PKDateStyleNone")]
    None,
    #[serde(rename = "PKDateStyleShort")]
    Short,
    #[serde(rename = "PKDateStyleMedium")]
    Medium,
    #[serde(rename = "PKDateStyleLong")]
    Long,
    #[serde(rename = "PKDateStyleFull")]
    Full,
}

/// Style used to display a number.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum NumberStyle {
    #[default]
    #[serde(rename = "PKNumberStyleDecimal")]
    Decimal,
    #[serde(rename = "PKNumberStylePercent")]
    Percent,
    #[serde(rename = "PKNumberStyleScientific")]
    Scientific,
    #[serde(rename = "PKNumberStyleSpellOut")]
    SpellOut,
}

/// Data a wallet application should detect in back field text.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum DataDetector {
    #[serde(rename = "PKDataDetectorTypePhoneNumber")]
    PhoneNumber,
    #[serde(rename = "PKDataDetectorTypeLink")]
    Link,
    #[serde(rename = "PKDataDetectorTypeAddress")]
    Address,
    #[serde(rename = "PKDataDetectorTypeCalendarEvent")]
    CalendarEvent,
}

/// The value displayed by a field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    /// A floating point number. Must be finite to be serializable.
    Number(f64),
    Decimal(Decimal),
    Date(DateTime<FixedOffset>),
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::Date(v)
    }
}

/// Formatting metadata attached to a field.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FieldFormat {
    #[default]
    Plain,
    Date {
        date_style: DateStyle,
        time_style: DateStyle,
        /// Display the value as a time relative to now.
        is_relative: bool,
        ignores_time_zone: bool,
    },
    Number {
        number_style: NumberStyle,
    },
    Currency {
        number_style: NumberStyle,
        /// ISO 4217 currency code.
        currency_code: String,
    },
}

/// A single key/value entry displayed on a pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Unique within the containing [FieldGroup].
    pub key: String,
    pub value: FieldValue,
    pub label: Option<String>,
    /// Format string for the alert shown when the value changes. `%@` is
    /// replaced by the new value.
    pub change_message: Option<String>,
    pub text_alignment: TextAlignment,
    /// HTML-ish value with links, shown on the back of the pass.
    pub attributed_value: Option<String>,
    pub data_detector_types: Vec<DataDetector>,
    pub format: FieldFormat,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            label: None,
            change_message: None,
            text_alignment: TextAlignment::default(),
            attributed_value: None,
            data_detector_types: vec![],
            format: FieldFormat::Plain,
        }
    }

    /// Construct a field displaying a date.
    pub fn date(
        key: impl Into<String>,
        value: DateTime<FixedOffset>,
        date_style: DateStyle,
        time_style: DateStyle,
    ) -> Self {
        let mut field = Self::new(key, value);
        field.format = FieldFormat::Date {
            date_style,
            time_style,
            is_relative: false,
            ignores_time_zone: false,
        };

        field
    }

    /// Construct a field displaying a number.
    pub fn number(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let mut field = Self::new(key, value);
        field.format = FieldFormat::Number {
            number_style: NumberStyle::default(),
        };

        field
    }

    /// Construct a field displaying an amount of money.
    pub fn currency(
        key: impl Into<String>,
        value: impl Into<FieldValue>,
        currency_code: impl Into<String>,
    ) -> Self {
        let mut field = Self::new(key, value);
        field.format = FieldFormat::Currency {
            number_style: NumberStyle::default(),
            currency_code: currency_code.into(),
        };

        field
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn change_message(mut self, message: impl Into<String>) -> Self {
        self.change_message = Some(message.into());
        self
    }

    pub fn text_alignment(mut self, alignment: TextAlignment) -> Self {
        self.text_alignment = alignment;
        self
    }

    pub fn attributed_value(mut self, value: impl Into<String>) -> Self {
        self.attributed_value = Some(value.into());
        self
    }

    pub fn data_detector(mut self, detector: DataDetector) -> Self {
        if !self.data_detector_types.contains(&detector) {
            self.data_detector_types.push(detector);
        }
        self
    }

    /// Set the number style of a number or currency field.
    ///
    /// Has no effect on other fields.
    pub fn number_style(mut self, style: NumberStyle) -> Self {
        match &mut self.format {
            FieldFormat::Number { number_style } | FieldFormat::Currency { number_style, .. } => {
                *number_style = style;
            }
            FieldFormat::Plain | FieldFormat::Date { .. } => {}
        }
        self
    }

    /// Mark a date field as displayed relative to the current time.
    ///
    /// Has no effect on other fields.
    pub fn relative(mut self, relative: bool) -> Self {
        if let FieldFormat::Date { is_relative, .. } = &mut self.format {
            *is_relative = relative;
        }
        self
    }

    /// Display a date field in the time zone it was given in, not the device's.
    ///
    /// Has no effect on other fields.
    pub fn ignores_time_zone(mut self, ignores: bool) -> Self {
        if let FieldFormat::Date {
            ignores_time_zone, ..
        } = &mut self.format
        {
            *ignores_time_zone = ignores;
        }
        self
    }
}

/// Identifies one of the field groups of a pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FieldGroup {
    Header,
    Primary,
    Secondary,
    Auxiliary,
    Back,
}

impl FieldGroup {
    /// Key of the group in `pass.json`.
    pub fn json_key(&self) -> &'static str {
        match self {
            Self::Header => "headerFields",
            Self::Primary => "primaryFields",
            Self::Secondary => "secondaryFields",
            Self::Auxiliary => "auxiliaryFields",
            Self::Back => "backFields",
        }
    }
}

/// The ordered field groups of a pass.
///
/// Order within a group controls layout on the pass and is preserved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldGroups {
    header: Vec<Field>,
    primary: Vec<Field>,
    secondary: Vec<Field>,
    auxiliary: Vec<Field>,
    back: Vec<Field>,
}

impl FieldGroups {
    /// Obtain the fields of a group, in display order.
    pub fn fields(&self, group: FieldGroup) -> &[Field] {
        match group {
            FieldGroup::Header => &self.header,
            FieldGroup::Primary => &self.primary,
            FieldGroup::Secondary => &self.secondary,
            FieldGroup::Auxiliary => &self.auxiliary,
            FieldGroup::Back => &self.back,
        }
    }

    fn fields_mut(&mut self, group: FieldGroup) -> &mut Vec<Field> {
        match group {
            FieldGroup::Header => &mut self.header,
            FieldGroup::Primary => &mut self.primary,
            FieldGroup::Secondary => &mut self.secondary,
            FieldGroup::Auxiliary => &mut self.auxiliary,
            FieldGroup::Back => &mut self.back,
        }
    }

    /// Append a field to the end of a group.
    ///
    /// Errors if the group already holds a field with the same key.
    pub fn push(&mut self, group: FieldGroup, field: Field) -> Result<(), PassError> {
        let fields = self.fields_mut(group);

        if fields.iter().any(|f| f.key == field.key) {
            return Err(PassError::DuplicateFieldKey {
                group: group.json_key(),
                key: field.key,
            });
        }

        fields.push(field);

        Ok(())
    }

    /// Whether no group holds any field.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
            && self.primary.is_empty()
            && self.secondary.is_empty()
            && self.auxiliary.is_empty()
            && self.back.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn groups_preserve_order_and_reject_duplicates() {
        let mut groups = FieldGroups::default();
        groups
            .push(FieldGroup::Primary, Field::new("b", "2"))
            .unwrap();
        groups
            .push(FieldGroup::Primary, Field::new("a", "1"))
            .unwrap();
        // Same key in another group is fine.
        groups.push(FieldGroup::Back, Field::new("a", "x")).unwrap();

        let keys = groups
            .fields(FieldGroup::Primary)
            .iter()
            .map(|f| f.key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["b", "a"]);

        let err = groups
            .push(FieldGroup::Primary, Field::new("a", "again"))
            .unwrap_err();
        assert!(matches!(
            err,
            PassError::DuplicateFieldKey {
                group: "primaryFields",
                ..
            }
        ));
        assert_eq!(groups.fields(FieldGroup::Primary).len(), 2);
    }

    #[test]
    fn format_modifiers_only_touch_matching_formats() {
        let date = DateTime::parse_from_rfc3339("2026-10-19T20:00:00+02:00").unwrap();

        let field = Field::date("doors", date, DateStyle::Medium, DateStyle::Short)
            .relative(true)
            .ignores_time_zone(true)
            .number_style(NumberStyle::Percent);
        assert_eq!(
            field.format,
            FieldFormat::Date {
                date_style: DateStyle::Medium,
                time_style: DateStyle::Short,
                is_relative: true,
                ignores_time_zone: true,
            }
        );

        let field = Field::currency("price", Decimal::new("12.50").unwrap(), "EUR")
            .number_style(NumberStyle::Scientific)
            .relative(true);
        assert_eq!(
            field.format,
            FieldFormat::Currency {
                number_style: NumberStyle::Scientific,
                currency_code: "EUR".into(),
            }
        );

        let field = Field::new("plain", "text").number_style(NumberStyle::Percent);
        assert_eq!(field.format, FieldFormat::Plain);
    }
}
