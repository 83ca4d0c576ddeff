// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Barcodes displayed on a pass.

use {serde::Serialize, std::borrow::Cow};

/// Default text encoding of barcode messages.
pub const DEFAULT_MESSAGE_ENCODING: &str = "iso-8859-1";

/// Symbology of a barcode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum BarcodeFormat {
    #[serde(rename = "PKBarcodeFormatPDF417")]
    Pdf417,
    #[serde(rename = "PKBarcodeFormatQR")]
    Qr,
    #[serde(rename = "PKBarcodeFormatAztec")]
    Aztec,
    #[serde(rename = "PKBarcodeFormatCode128")]
    Code128,
}

impl BarcodeFormat {
    /// Whether consumers of the singular `barcode` key understand this format.
    ///
    /// Code 128 was introduced together with the `barcodes` list.
    pub fn is_legacy_compatible(&self) -> bool {
        matches!(self, Self::Pdf417 | Self::Qr | Self::Aztec)
    }
}

/// A barcode.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub format: BarcodeFormat,
    /// Payload encoded in the barcode.
    pub message: String,
    pub message_encoding: String,
    /// Text displayed near the barcode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl Barcode {
    pub fn new(message: impl Into<String>, format: BarcodeFormat) -> Self {
        Self {
            format,
            message: message.into(),
            message_encoding: DEFAULT_MESSAGE_ENCODING.to_string(),
            alt_text: None,
        }
    }

    pub fn alt_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.alt_text = if text.is_empty() { None } else { Some(text) };
        self
    }

    pub fn message_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.message_encoding = encoding.into();
        self
    }

    /// Obtain the barcode to advertise under the singular `barcode` key.
    ///
    /// Formats older consumers cannot render are replaced by a PDF417 barcode
    /// carrying the same message and alternate text.
    pub fn legacy_compatible(&self) -> Cow<'_, Barcode> {
        if self.format.is_legacy_compatible() {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(Barcode {
                format: BarcodeFormat::Pdf417,
                message: self.message.clone(),
                message_encoding: self.message_encoding.clone(),
                alt_text: self.alt_text.clone(),
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn legacy_formats_pass_through() {
        for format in [BarcodeFormat::Pdf417, BarcodeFormat::Qr, BarcodeFormat::Aztec] {
            let barcode = Barcode::new("123", format);
            assert!(matches!(barcode.legacy_compatible(), Cow::Borrowed(_)));
        }
    }

    #[test]
    fn code128_falls_back_to_pdf417() {
        let barcode = Barcode::new("TICKET-42", BarcodeFormat::Code128).alt_text("42");
        let legacy = barcode.legacy_compatible();

        assert_eq!(legacy.format, BarcodeFormat::Pdf417);
        assert_eq!(legacy.message, "TICKET-42");
        assert_eq!(legacy.alt_text.as_deref(), Some("42"));
        assert_eq!(barcode.format, BarcodeFormat::Code128);
    }

    #[test]
    fn json_shape() {
        let barcode = Barcode::new("abc", BarcodeFormat::Qr);

        assert_eq!(
            serde_json::to_string(&barcode).unwrap(),
            r#"{"format":"PKBarcodeFormatQR","message":"abc","messageEncoding":"iso-8859-1"}"#
        );
        assert_eq!(
            serde_json::to_string(&barcode.alt_text("alt")).unwrap(),
            r#"{"format":"PKBarcodeFormatQR","message":"abc","messageEncoding":"iso-8859-1","altText":"alt"}"#
        );
    }
}
