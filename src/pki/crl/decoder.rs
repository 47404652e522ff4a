use chrono::{DateTime, Utc};
use tracing::debug;

use super::errors::{CrlDecodeError, CrlField, DecodeError};
use super::fields::{decode_common_name, decode_utc_time};
use super::scanner::{
    Anchor, AnchorMatch, COMMON_NAME_ANCHOR, ISSUER_CN_OCCURRENCE, NEXT_UPDATE_OCCURRENCE,
    THIS_UPDATE_OCCURRENCE, UTC_TIME_ANCHOR, UTC_TIME_LEN, find_anchored_region,
};

/// The fields read from a CRL
///
/// `next_update` is not guaranteed to follow `this_update`, a malformed CRL can
/// carry them in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlInfo {
    issuer_common_name: String,
    this_update: DateTime<Utc>,
    next_update: DateTime<Utc>,
}

impl CrlInfo {
    pub fn new(
        issuer_common_name: impl Into<String>,
        this_update: DateTime<Utc>,
        next_update: DateTime<Utc>,
    ) -> Self {
        Self {
            issuer_common_name: issuer_common_name.into(),
            this_update,
            next_update,
        }
    }

    /// Common name of the CRL issuer
    pub fn issuer_common_name(&self) -> &str {
        &self.issuer_common_name
    }

    /// Issuance time
    pub fn this_update(&self) -> DateTime<Utc> {
        self.this_update
    }

    /// Declared expiration time
    pub fn next_update(&self) -> DateTime<Utc> {
        self.next_update
    }
}

/// Decode the issuer CN, `thisUpdate` and `nextUpdate` from raw CRL bytes.
///
/// Fields are located with [`super::scanner`], see its documentation for the
/// limits of that approach. `thisUpdate` runs up to the next UTCTime tag, while
/// `nextUpdate` is cut at 13 bytes so trailing data never leaks into it. The
/// first failing field aborts the decode.
pub fn decode_crl(data: &[u8]) -> Result<CrlInfo, CrlDecodeError> {
    let issuer = locate(
        data,
        CrlField::Issuer,
        &COMMON_NAME_ANCHOR,
        ISSUER_CN_OCCURRENCE,
        None,
    )?;
    let issuer_common_name =
        decode_common_name(issuer.region).map_err(|e| CrlDecodeError::new(CrlField::Issuer, e))?;

    let this_update = locate(
        data,
        CrlField::ThisUpdate,
        &UTC_TIME_ANCHOR,
        THIS_UPDATE_OCCURRENCE,
        None,
    )?;
    let this_update = decode_utc_time(this_update.region)
        .map_err(|e| CrlDecodeError::new(CrlField::ThisUpdate, e))?;

    let next_update = locate(
        data,
        CrlField::NextUpdate,
        &UTC_TIME_ANCHOR,
        NEXT_UPDATE_OCCURRENCE,
        Some(UTC_TIME_LEN),
    )?;
    let next_update = decode_utc_time(next_update.region)
        .map_err(|e| CrlDecodeError::new(CrlField::NextUpdate, e))?;

    Ok(CrlInfo {
        issuer_common_name,
        this_update,
        next_update,
    })
}

fn locate<'a>(
    data: &'a [u8],
    field: CrlField,
    anchor: &Anchor,
    occurrence: usize,
    max_region_len: Option<usize>,
) -> Result<AnchorMatch<'a>, CrlDecodeError> {
    let found =
        find_anchored_region(data, anchor, occurrence, max_region_len).ok_or_else(|| {
            CrlDecodeError::new(
                field,
                DecodeError::AnchorNotFound {
                    anchor: anchor.name,
                    occurrence,
                },
            )
        })?;

    debug!(
        "Located {} at offset {}: {}",
        field,
        found.offset,
        hex::encode(found.region)
    );
    Ok(found)
}
