use crate::Error;

/// The maximum dissimilarity two frames may have before they are no longer considered similar.
///
/// Thresholds are specified as floating point numbers in the exclusive range (0..1). A pair of
/// frames qualifies when its similarity is strictly greater than `1 - threshold`, so the smaller
/// the threshold, the stricter the match.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold {
    value: f64,
}

impl Threshold {
    pub fn new(value: f64) -> Result<Self, Error> {
        if value > 0.0 && value < 1.0 {
            Ok(Self { value })
        } else {
            Err(Error::InvalidConfig(format!(
                "threshold must be strictly between 0 and 1, got {value}"
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// The similarity a pair must exceed to qualify.
    pub fn min_similarity(&self) -> f64 {
        1.0 - self.value
    }

    pub fn admits(&self, similarity: f64) -> bool {
        similarity > self.min_similarity()
    }
}
