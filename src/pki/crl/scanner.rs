//! Anchor-pattern scanning over raw CRL bytes
//!
//! This is deliberately not an ASN.1 parser. The three fields we care about are
//! preceded by short, distinctive tag sequences, so we locate them by searching
//! for those sequences in the DER stream.
//!
//! # Limitations
//! An anchor can appear by coincidence inside unrelated data (an issuer name
//! containing the UTCTime tag bytes, a serial number, an extension value). When
//! that happens a field is mis-located and the decode either fails or yields a
//! wrong value. Callers must treat results as a heuristic reading of the CRL.
//!
//! Timestamps from 2050 on are GeneralizedTime (`18 0F`), not UTCTime. For a
//! CRL with such a `nextUpdate` the next UTCTime tag is a revocation date, and
//! the `thisUpdate` region runs up to it and fails to decode.

/// A fixed byte sequence marking the start of a known tag-length structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub name: &'static str,
    pub pattern: &'static [u8],
}

/// OBJECT IDENTIFIER 2.5.4.3 (id-at-commonName), followed by the name value
pub const COMMON_NAME_ANCHOR: Anchor = Anchor {
    name: "commonName OID",
    pattern: &[0x06, 0x03, 0x55, 0x04, 0x03],
};

/// UTCTime tag with the 13-byte `YYMMDDHHMMSSZ` length
pub const UTC_TIME_ANCHOR: Anchor = Anchor {
    name: "UTCTime tag",
    pattern: &[0x17, 0x0D],
};

/// Occurrence of [`COMMON_NAME_ANCHOR`] holding the issuer CN
pub const ISSUER_CN_OCCURRENCE: usize = 0;
/// Occurrence of [`UTC_TIME_ANCHOR`] holding `thisUpdate`
pub const THIS_UPDATE_OCCURRENCE: usize = 0;
/// Occurrence of [`UTC_TIME_ANCHOR`] holding `nextUpdate`
pub const NEXT_UPDATE_OCCURRENCE: usize = 1;

/// Width of a UTCTime value in its `YYMMDDHHMMSSZ` form
pub const UTC_TIME_LEN: usize = 13;

/// A located anchor and the bytes that follow it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorMatch<'a> {
    /// Offset of the first anchor byte in the scanned buffer
    pub offset: usize,
    /// Bytes immediately after the anchor
    pub region: &'a [u8],
}

/// Find the `occurrence`-th (zero-based) non-overlapping match of `anchor`.
///
/// With `max_region_len` the region is at most that many bytes past the anchor.
/// Without it the region runs up to the next match of the same anchor, or to the
/// end of `data`. Returns `None` when the anchor occurs `occurrence` times or fewer.
pub fn find_anchored_region<'a>(
    data: &'a [u8],
    anchor: &Anchor,
    occurrence: usize,
    max_region_len: Option<usize>,
) -> Option<AnchorMatch<'a>> {
    let pattern_len = anchor.pattern.len();
    let offset = occurrences(data, anchor.pattern).nth(occurrence)?;
    let start = offset + pattern_len;

    let end = match max_region_len {
        Some(max) => start.saturating_add(max).min(data.len()),
        None => find_from(data, anchor.pattern, start).unwrap_or(data.len()),
    };

    Some(AnchorMatch {
        offset,
        region: &data[start..end],
    })
}

/// Offsets of all non-overlapping occurrences of `pattern` in `data`
fn occurrences<'a>(data: &'a [u8], pattern: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    let mut cursor = 0;
    std::iter::from_fn(move || {
        let found = find_from(data, pattern, cursor)?;
        cursor = found + pattern.len();
        Some(found)
    })
}

fn find_from(data: &[u8], pattern: &[u8], from: usize) -> Option<usize> {
    if pattern.is_empty() || from >= data.len() {
        return None;
    }
    data[from..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|pos| from + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: Anchor = Anchor {
        name: "test",
        pattern: &[0xAA, 0xBB],
    };

    #[test]
    fn test_first_occurrence_runs_to_next_anchor() {
        let data = [0x01, 0xAA, 0xBB, 0x10, 0x11, 0xAA, 0xBB, 0x20];
        let found = find_anchored_region(&data, &TAG, 0, None).unwrap();

        assert_eq!(found.offset, 1);
        assert_eq!(found.region, &[0x10, 0x11]);
    }

    #[test]
    fn test_last_occurrence_runs_to_end() {
        let data = [0x01, 0xAA, 0xBB, 0x10, 0x11, 0xAA, 0xBB, 0x20, 0x21];
        let found = find_anchored_region(&data, &TAG, 1, None).unwrap();

        assert_eq!(found.offset, 5);
        assert_eq!(found.region, &[0x20, 0x21]);
    }

    #[test]
    fn test_region_capped_and_clamped() {
        let data = [0xAA, 0xBB, 0x01, 0x02, 0x03, 0x04];

        let capped = find_anchored_region(&data, &TAG, 0, Some(2)).unwrap();
        assert_eq!(capped.region, &[0x01, 0x02]);

        let clamped = find_anchored_region(&data, &TAG, 0, Some(100)).unwrap();
        assert_eq!(clamped.region, &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let anchor = Anchor {
            name: "repeat",
            pattern: &[0xAA, 0xAA],
        };
        // Three 0xAA bytes hold only one non-overlapping match
        let data = [0xAA, 0xAA, 0xAA, 0x01];

        assert!(find_anchored_region(&data, &anchor, 0, None).is_some());
        assert!(find_anchored_region(&data, &anchor, 1, None).is_none());
    }

    #[test]
    fn test_not_found() {
        let data = [0xAA, 0xBB, 0x00];

        assert!(find_anchored_region(&data, &TAG, 1, None).is_none());
        assert!(find_anchored_region(&[], &TAG, 0, None).is_none());
        assert!(find_anchored_region(&[0xAA], &TAG, 0, Some(13)).is_none());
    }

    #[test]
    fn test_anchor_at_buffer_end_yields_empty_region() {
        let data = [0x00, 0xAA, 0xBB];
        let found = find_anchored_region(&data, &TAG, 0, Some(13)).unwrap();

        assert_eq!(found.offset, 1);
        assert!(found.region.is_empty());
    }
}
