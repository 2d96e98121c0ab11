//! Deterministic PRNG seeding for combat and interception.
//!
//! Reproducibility of interception and combat is a contract: replaying a
//! tick with the same state must reproduce history. Every roll therefore
//! comes from a [`StdRng`] seeded by an FNV-1a hash of
//! (shipment id, tick, hop index) -- never from a global RNG.

use burnrate_types::ShipmentId;
use rand::SeedableRng;
use rand::rngs::StdRng;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over a byte slice.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// The seed for a specific shipment hop.
pub fn hop_seed(shipment: ShipmentId, tick: u64, hop_index: usize) -> u64 {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(shipment.into_inner().as_bytes());
    bytes.extend_from_slice(&tick.to_le_bytes());
    bytes.extend_from_slice(&(hop_index as u64).to_le_bytes());
    fnv1a64(&bytes)
}

/// A deterministic RNG for one shipment hop.
pub fn hop_rng(shipment: ShipmentId, tick: u64, hop_index: usize) -> StdRng {
    StdRng::seed_from_u64(hop_seed(shipment, tick, hop_index))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn same_inputs_same_stream() {
        let id = ShipmentId::new();
        let mut a = hop_rng(id, 4, 0);
        let mut b = hop_rng(id, 4, 0);
        let xs: Vec<f64> = (0..8).map(|_| a.random::<f64>()).collect();
        let ys: Vec<f64> = (0..8).map(|_| b.random::<f64>()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn different_hops_different_seeds() {
        let id = ShipmentId::new();
        assert_ne!(hop_seed(id, 4, 0), hop_seed(id, 4, 1));
        assert_ne!(hop_seed(id, 4, 0), hop_seed(id, 5, 0));
        assert_ne!(hop_seed(id, 4, 0), hop_seed(ShipmentId::new(), 4, 0));
    }

    #[test]
    fn fnv_matches_known_vector() {
        // FNV-1a of empty input is the offset basis.
        assert_eq!(fnv1a64(b""), FNV_OFFSET);
    }
}
