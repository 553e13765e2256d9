//! Sentence embedding collaborators.
//!
//! Every implementation returns L2-normalized vectors of a fixed dimension so
//! cosine distance reduces to `1 - a·b`.

/// Batch text embedder. Output order matches input order.
pub trait TextEmbedder: Send + Sync {
    fn dim(&self) -> usize;

    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Deterministic bag-of-words embedder using signed feature hashing.
///
/// Offline fallback for when no ONNX model is installed. Captures lexical
/// overlap only; paraphrases with no shared words land far apart.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub const DEFAULT_DIM: usize = 384;

    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let h = fnv1a(&word.to_lowercase());
            let bucket = (h % self.dim as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        normalize(&mut v);
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIM)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn unit_norm_and_dim() {
        let e = HashingEmbedder::default();
        let v = e.embed("retain data 180 day").unwrap();
        assert_eq!(v.len(), 384);
        let norm = dot(&v, &v).sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "expected unit norm, got {norm}");
    }

    #[test]
    fn deterministic_and_case_insensitive() {
        let e = HashingEmbedder::default();
        let a = e.embed("Share data advertiser").unwrap();
        let b = e.embed("share DATA advertiser").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overlap_is_closer() {
        let e = HashingEmbedder::default();
        let vecs = e
            .embed_batch(&[
                "retain data indefinitely",
                "retain data 180 day",
                "parental consent child",
            ])
            .unwrap();
        assert!(dot(&vecs[0], &vecs[1]) > dot(&vecs[0], &vecs[2]));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let e = HashingEmbedder::new(8);
        assert_eq!(e.embed("").unwrap(), vec![0.0; 8]);
        assert!(e.embed_batch(&[]).unwrap().is_empty());
    }
}
