// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Build and sign Apple Wallet passes.
//!
//! A wallet pass is distributed as a `.pkpass` file: a zip archive holding
//! a `pass.json` document describing the pass, image and localization
//! assets, a `manifest.json` holding the SHA-1 digest of every other file
//! and a `signature` file holding a detached CMS signature over the
//! manifest. The signature is made with a Pass Type ID certificate issued
//! by Apple's Worldwide Developer Relations (WWDR) certificate authority.
//!
//! # Building a pass
//!
//! Passes are created from a [PassIssuer], which holds the identifiers
//! shared by all passes of an organization. The resulting [PassBundle] is
//! populated with [Field]s, a [Barcode], [Location]s and asset files and
//! then signed with [SigningCredentials] by a [PassBuilder].
//!
//! ```no_run
//! use apple_wallet_pass::{
//!     Barcode, BarcodeFormat, ContentBlock, Field, PassBuilder, PassIssuer,
//!     SigningCredentials,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let issuer = PassIssuer::new("65QNR2XSA2", "pass.com.example.event", "Example");
//!
//! let mut content = ContentBlock::event_ticket();
//! content.add_primary_field(Field::new("event", "Rust Meetup").label("EVENT"))?;
//!
//! let mut pass = issuer.new_pass(content);
//! pass.description = "Rust Meetup ticket".into();
//! pass.barcode = Some(Barcode::new("TICKET-0042", BarcodeFormat::Qr));
//! pass.add_file("icon.png", std::fs::read("icon.png")?)?;
//!
//! let credentials = SigningCredentials::from_pem(
//!     &std::fs::read("pass-certificate.pem")?,
//!     &std::fs::read("pass-key.pem")?,
//!     "passphrase",
//!     &std::fs::read("AppleWWDRCA.cer")?,
//! )?;
//!
//! PassBuilder::new(&credentials).build_to_path(&pass, "event.pkpass")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! All fallible operations return [PassError]. [PassError::kind] classifies
//! errors by the stage that produced them: content that cannot be
//! serialized, unusable credentials, a wrong passphrase, signing failures,
//! I/O failures and bundle precondition violations are all distinguishable.
//!
//! # Verification
//!
//! [verify_pass] performs the digest and signature checks a wallet
//! application performs on a finished archive.
//!
//! # Logging
//!
//! This crate logs through the [log] crate. Pipeline stages are logged at
//! `info` level and individual files at `debug` level. Credentials that a
//! wallet application is likely to reject are logged at `warn` level.

mod archive;
pub use archive::*;
mod barcode;
pub use barcode::*;
mod bundle;
pub use bundle::*;
mod content;
pub use content::*;
mod credentials;
pub use credentials::*;
mod error;
pub use error::*;
mod fields;
pub use fields::*;
mod manifest;
pub use manifest::*;
mod pass_json;
pub use pass_json::*;
mod pipeline;
pub use pipeline::*;
mod relevance;
pub use relevance::*;
mod signing;
pub use signing::*;
mod verify;
pub use verify::*;
