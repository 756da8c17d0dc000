use bitvec::prelude::*;

use crate::{Error, HashConfig};

/// A perceptual hash of a single frame.
///
/// Fingerprints are compared by counting the bits that differ between them. Only fingerprints
/// created with the same [`HashConfig`] can be compared.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Fingerprint {
    bits: BitVec<u64, Lsb0>,
    config: HashConfig,
}

impl Fingerprint {
    pub(crate) fn from_bits(bits: BitVec<u64, Lsb0>, config: HashConfig) -> Self {
        debug_assert_eq!(bits.len(), config.hash_bits());
        Self { bits, config }
    }

    pub fn config(&self) -> HashConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn bits(&self) -> &BitSlice<u64, Lsb0> {
        &self.bits
    }

    /// The number of bits that differ between the two fingerprints.
    pub fn distance(&self, other: &Self) -> Result<u32, Error> {
        if self.config != other.config || self.bits.len() != other.bits.len() {
            return Err(Error::ConfigurationMismatch {
                left: self.config,
                right: other.config,
            });
        }

        let distance = self
            .bits
            .iter()
            .by_vals()
            .zip(other.bits.iter().by_vals())
            .filter(|(a, b)| a != b)
            .count();

        Ok(distance as u32)
    }

    /// `1 - distance / len`, in the range 0..=1. Identical fingerprints have similarity 1.
    pub fn similarity(&self, other: &Self) -> Result<f64, Error> {
        let distance = self.distance(other)?;
        if self.bits.is_empty() {
            return Ok(1.0);
        }
        Ok(1.0 - f64::from(distance) / self.bits.len() as f64)
    }
}
