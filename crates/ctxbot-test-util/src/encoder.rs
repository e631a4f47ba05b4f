use ctxbot_lib::embedding::QueryEncoder;
use ctxbot_lib::error::EncodingError;

/// Encodes every text to the same vector.
pub struct FixedEncoder {
    vector: Vec<f32>,
}

impl FixedEncoder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }
}

impl QueryEncoder for FixedEncoder {
    fn dimension(&self) -> usize {
        self.vector.len()
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncodingError> {
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }
}

/// Deterministic bag-of-words encoder.
///
/// Each lowercase word is hashed (FNV-1a) into one of `dimension` buckets and
/// the counts are L2-normalized, so texts sharing words land close together.
pub struct KeywordEncoder {
    dimension: usize,
}

impl KeywordEncoder {
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "dimension must be positive");
        Self { dimension }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bucket(&self, word: &str) -> usize {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        (hash % self.dimension as u64) as usize
    }

    fn encode_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(&word.to_lowercase())] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl QueryEncoder for KeywordEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncodingError> {
        Ok(texts.iter().map(|t| self.encode_one(t)).collect())
    }
}

/// Fails every call, as a broken model would.
pub struct FailingEncoder {
    dimension: usize,
}

impl FailingEncoder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl QueryEncoder for FailingEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EncodingError> {
        Err(EncodingError::Model {
            message: "onnx session crashed".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_encoder_is_deterministic_and_normalized() {
        let encoder = KeywordEncoder::new(64);
        let a = encoder.encode("Constitutional AI training").unwrap();
        let b = encoder.encode("constitutional ai TRAINING").unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn keyword_encoder_empty_text_is_zero() {
        let v = KeywordEncoder::new(8).encode("  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn failing_encoder_fails() {
        assert!(FailingEncoder::new(4).encode("x").is_err());
    }
}
