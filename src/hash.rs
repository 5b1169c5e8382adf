//! Hashing for integer cell coordinates.

use std::hash::{BuildHasher, Hasher};

/// Odd primes used to mix the per-axis words of a cell coordinate.
const AXIS_PRIMES: [i32; 3] = [92_837_111, 689_287_499, 283_923_481];

/// `BuildHasher` used by the cell maps in this crate.
///
/// Cell keys are two or three `i32` components, which is too little input
/// for a general-purpose string hasher to be worth its setup cost. This
/// hasher multiplies each 32-bit word by a fixed odd prime and XOR-folds
/// the products.
#[derive(Clone, Copy, Debug, Default)]
pub struct CellHash;

impl BuildHasher for CellHash {
    type Hasher = CellHasher;

    fn build_hasher(&self) -> CellHasher {
        CellHasher { hash: 0, word: 0 }
    }
}

/// Streaming state for [`CellHash`].
///
/// Input is consumed in 32-bit words; a trailing partial word is
/// zero-padded. The first word is multiplied into the state, subsequent
/// words are multiplied and XOR-folded.
#[derive(Clone, Debug)]
pub struct CellHasher {
    hash: i32,
    word: usize,
}

impl CellHasher {
    fn mix(&mut self, value: i32) {
        let mixed = value.wrapping_mul(AXIS_PRIMES[self.word % AXIS_PRIMES.len()]);
        if self.word == 0 {
            self.hash = mixed;
        } else {
            self.hash ^= mixed;
        }
        self.word += 1;
    }
}

impl Hasher for CellHasher {
    fn finish(&self) -> u64 {
        self.hash as u32 as u64
    }

    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(4) {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            self.mix(i32::from_ne_bytes(word));
        }
    }

    fn write_i32(&mut self, value: i32) {
        self.mix(value);
    }

    fn write_u32(&mut self, value: u32) {
        self.mix(value as i32);
    }
}
