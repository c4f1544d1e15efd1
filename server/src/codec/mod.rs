//! Ids look like `TKT-1741939200000-k3j9x0a2b` and carry no registrant data.

use chrono::{DateTime, Utc};
use rand::Rng;

pub mod visual;

pub use visual::{encode_for_display, CodecError, VisualCode};

const ID_PREFIX: &str = "TKT";
const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Upper bound on anything we accept as a ticket id from a scanner.
pub const MAX_ID_LEN: usize = 64;

/// Mint a fresh ticket identifier stamped with the current time.
pub fn mint() -> String {
    mint_at(Utc::now())
}

/// Mint an identifier whose time component is `now`.
pub fn mint_at(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}-{}-{}", ID_PREFIX, now.timestamp_millis(), suffix)
}

/// Cheap syntactic filter for scanned payloads.
///
/// Rejects input that can never be a ticket id (empty, oversized, whitespace
/// or control characters) so the check-in path can answer `Unknown` without a
/// store round trip. It does not insist on the `TKT-` layout, since ids
/// minted by earlier deployments used shorter suffixes.
pub fn is_plausible(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ID_LEN && id.bytes().all(|b| b.is_ascii_graphic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_mint_layout() {
        let now = Utc.timestamp_millis_opt(1_741_939_200_000).unwrap();
        let id = mint_at(now);

        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TKT");
        assert_eq!(parts[1], "1741939200000");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_mint_same_millisecond_is_unique() {
        let now = Utc::now();
        let ids: HashSet<String> = (0..20_000).map(|_| mint_at(now)).collect();
        assert_eq!(ids.len(), 20_000);
    }

    #[test]
    fn test_minted_ids_are_plausible() {
        assert!(is_plausible(&mint()));
        // Legacy ids with a short suffix
        assert!(is_plausible("TKT-1718000000000-abc12"));
    }

    #[test]
    fn test_garbled_payloads_are_not_plausible() {
        assert!(!is_plausible(""));
        assert!(!is_plausible("TKT 123"));
        assert!(!is_plausible("TKT-1\n"));
        assert!(!is_plausible(&"x".repeat(MAX_ID_LEN + 1)));
    }
}
