//! Simulated wallet identities and bid id generation.
//!
//! Both draw from the coordinator's random source, so a seeded auction
//! hands out the same wallets and bid ids on every run.

use chronos_types::{BidId, WalletId};
use rand::Rng;

/// Characters a wallet identity is drawn from (lowercase base 36).
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Characters on each side of the `...` separator.
pub const WALLET_SEGMENT_LEN: usize = 4;

/// Synthesize a display identity of the form `xxxx...yyyy`.
pub fn generate_wallet<R: Rng>(rng: &mut R) -> WalletId {
    let head = random_segment(rng);
    let tail = random_segment(rng);
    WalletId::new(format!("{head}...{tail}"))
}

/// Draw a fresh bid id from `rng`.
pub fn generate_bid_id<R: Rng>(rng: &mut R) -> BidId {
    let mut bytes = [0_u8; 16];
    rng.fill(&mut bytes);
    BidId::from_random_bytes(bytes)
}

fn random_segment<R: Rng>(rng: &mut R) -> String {
    (0..WALLET_SEGMENT_LEN)
        .filter_map(|_| ALPHABET.get(rng.random_range(0..ALPHABET.len())))
        .map(|byte| char::from(*byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn wallet_has_display_shape() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            let wallet = generate_wallet(&mut rng);
            let (head, tail) = wallet.as_str().split_once("...").unwrap_or_default();
            assert_eq!(head.len(), WALLET_SEGMENT_LEN);
            assert_eq!(tail.len(), WALLET_SEGMENT_LEN);
            assert!(
                head.chars()
                    .chain(tail.chars())
                    .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
            );
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let mut a = SmallRng::seed_from_u64(99);
        let mut b = SmallRng::seed_from_u64(99);
        assert_eq!(generate_wallet(&mut a), generate_wallet(&mut b));
        assert_eq!(generate_bid_id(&mut a), generate_bid_id(&mut b));
    }

    #[test]
    fn bid_ids_are_distinct() {
        let mut rng = SmallRng::seed_from_u64(5);
        let ids: std::collections::BTreeSet<_> =
            (0..1_000).map(|_| generate_bid_id(&mut rng)).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn bid_ids_are_version_four() {
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(generate_bid_id(&mut rng).into_inner().get_version_num(), 4);
    }
}
