use chrono::{DateTime, NaiveDate, Utc};

use super::errors::DecodeError;

/// Century prepended to every two-digit UTCTime year.
///
/// UTCTime values before 2000 or after 2099 are therefore misread. This is a
/// known limitation kept so that decoded timestamps stay stable.
const CENTURY: i32 = 2000;

/// Decode the value following a commonName OID: `[tag][len][len bytes of text]`.
///
/// Only the short length form is understood, a long-form length byte is taken
/// literally and will almost always exceed the region.
pub fn decode_common_name(region: &[u8]) -> Result<String, DecodeError> {
    let [_tag, len, rest @ ..] = region else {
        return Err(DecodeError::MalformedLength {
            declared: 2,
            available: region.len(),
        });
    };

    let declared = usize::from(*len);
    let name = rest.get(..declared).ok_or(DecodeError::MalformedLength {
        declared,
        available: rest.len(),
    })?;

    Ok(String::from_utf8_lossy(name).into_owned())
}

/// Decode a UTCTime value of the form `YYMMDDHHMMSS` with an optional trailing `Z`.
pub fn decode_utc_time(region: &[u8]) -> Result<DateTime<Utc>, DecodeError> {
    let invalid = || DecodeError::InvalidTimeFormat(String::from_utf8_lossy(region).into_owned());

    let digits = region.strip_suffix(b"Z").unwrap_or(region);
    if digits.len() != 12 || !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }

    // Two ASCII digits at `i` as a number
    let pair = |i: usize| u32::from(digits[i] - b'0') * 10 + u32::from(digits[i + 1] - b'0');

    let year = CENTURY + pair(0) as i32;
    NaiveDate::from_ymd_opt(year, pair(2), pair(4))
        .and_then(|date| date.and_hms_opt(pair(6), pair(8), pair(10)))
        .map(|naive| naive.and_utc())
        .ok_or_else(invalid)
}
