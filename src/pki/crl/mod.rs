//! Certificate Revocation List (CRL) freshness checking
//!
//! The CRL bytes are never parsed as a full ASN.1 structure. The issuer common
//! name and the `thisUpdate`/`nextUpdate` timestamps are located by scanning for
//! anchor byte patterns, then decoded and evaluated against the current time.
//!
//! # Features
//! - Anchor-based extraction of issuer CN, `thisUpdate` and `nextUpdate`
//! - Freshness evaluation (validity, age and remaining lifetime in hours)
//! - Fetching base and delta CRLs over HTTP

mod decoder;
mod errors;
mod fetcher;
mod fields;
mod freshness;
pub mod scanner;

// Re-export public types
pub use decoder::{CrlInfo, decode_crl};
pub use errors::{CrlDecodeError, CrlError, CrlField, CrlResult, DecodeError};
pub use fetcher::{CrlSource, HttpCrlFetcher, delta_crl_url};
pub use fields::{decode_common_name, decode_utc_time};
pub use freshness::{FreshnessReport, evaluate};
