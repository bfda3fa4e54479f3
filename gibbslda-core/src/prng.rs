// PCG32: small, fast and deterministic. Every session owns exactly one.
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::PCG_STREAM;

#[derive(Clone, Debug)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    pub fn new(seed: u64, seq: u64) -> Self {
        let mut pcg = Pcg32 {
            state: 0,
            inc: (seq << 1) | 1,
        };
        pcg.next_u32();
        pcg.state = pcg.state.wrapping_add(seed);
        pcg.next_u32();
        pcg
    }

    /// Generator on the fixed session stream.
    pub fn seeded(seed: u64) -> Self {
        Pcg32::new(seed, PCG_STREAM)
    }

    /// Seed from the wall clock; used when no explicit seed is configured.
    pub fn from_time() -> (Self, u64) {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        (Pcg32::seeded(seed), seed)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let oldstate = self.state;
        self.state = oldstate
            .wrapping_mul(6364136223846793005)
            .wrapping_add(self.inc);
        let xorshifted = (((oldstate >> 18) ^ oldstate) >> 27) as u32;
        let rot = (oldstate >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform in [0, 1) with 53 bits of precision.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        let hi = (self.next_u32() >> 5) as u64;
        let lo = (self.next_u32() >> 6) as u64;
        ((hi << 26) | lo) as f64 / (1u64 << 53) as f64
    }

    #[inline]
    pub fn next_usize(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        // unbiased
        let mut x;
        let m = (u32::MAX as u64 + 1) / (n as u64);
        let t = m * (n as u64);
        loop {
            x = self.next_u32() as u64;
            if x < t {
                return (x / m) as usize;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Pcg32::seeded(7);
        let mut b = Pcg32::seeded(7);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Pcg32::seeded(1);
        let mut b = Pcg32::seeded(2);
        let xs: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn unit_interval_and_bounded_draws() {
        let mut rng = Pcg32::seeded(42);
        for _ in 0..10_000 {
            let u = rng.next_f64();
            assert!((0.0..1.0).contains(&u));
            assert!(rng.next_usize(5) < 5);
        }
        assert_eq!(rng.next_usize(0), 0);
    }

    #[test]
    fn bounded_draws_cover_every_value() {
        let mut rng = Pcg32::seeded(3);
        let mut seen = [false; 4];
        for _ in 0..1_000 {
            seen[rng.next_usize(4)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
