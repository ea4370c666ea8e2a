//! Order salts.
//!
//! The salt is the only order field the maker does not choose. It makes two
//! otherwise identical orders hash differently, so it has to be unpredictable
//! and must never repeat.

use {
    alloy::primitives::U256,
    rand::{RngCore, rngs::OsRng},
};

/// Returns a uniformly distributed 256-bit salt drawn from the operating
/// system's CSPRNG.
///
/// `OsRng` holds no state, so concurrent callers never share a generator and
/// cannot observe each other's output.
pub fn generate() -> U256 {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    U256::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashSet};

    #[test]
    fn salts_do_not_collide() {
        let salts = (0..10_000).map(|_| generate()).collect::<HashSet<_>>();
        assert_eq!(salts.len(), 10_000);
    }

    #[test]
    fn salt_bits_are_balanced() {
        const SAMPLES: usize = 10_000;
        let mut ones = [0usize; 256];
        for _ in 0..SAMPLES {
            let salt = generate();
            for (bit, count) in ones.iter_mut().enumerate() {
                *count += salt.bit(bit) as usize;
            }
        }

        // With p = 1/2 the standard deviation per bit is 50, a deviation of
        // 300 is six sigma.
        for (bit, count) in ones.into_iter().enumerate() {
            assert!(
                count.abs_diff(SAMPLES / 2) < 300,
                "bit {bit} set {count} times out of {SAMPLES}"
            );
        }

        // Overall mean over all 2.56M bits.
        let total: usize = ones.iter().sum();
        let expected = SAMPLES * 256 / 2;
        assert!(total.abs_diff(expected) < 5_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_generation_is_unique() {
        let tasks = (0..8)
            .map(|_| tokio::spawn(async { (0..1_000).map(|_| generate()).collect::<Vec<_>>() }))
            .collect::<Vec<_>>();
        let mut all = HashSet::new();
        for task in tasks {
            for salt in task.await.unwrap() {
                assert!(all.insert(salt));
            }
        }
        assert_eq!(all.len(), 8_000);
    }
}
