//! Harmonic Token Projection (HTP) Embedding
//!
//! A deterministic, training-free embedding method based on:
//! "Harmonic Token Projection: A Vocabulary-Free, Training-Free,
//!  Deterministic, and Reversible Embedding Methodology"
//! https://arxiv.org/html/2511.20665
//!
//! Every token is folded to a 64-bit integer, reduced modulo a set of
//! coprime moduli, and each residue is projected onto the unit circle.
//! Phrases are mean-pooled over their tokens and L2 normalised.

use std::f64::consts::PI;

/// Embedding dimension (2 * number of coprime moduli)
pub const EMBEDDING_DIM: usize = 384;

/// Number of coprime moduli for harmonic projection
const NUM_MODULI: usize = EMBEDDING_DIM / 2;

/// Maximum token length (Unicode code points)
const MAX_TOKEN_LENGTH: usize = 64;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// First NUM_MODULI primes, coprime by construction
static COPRIME_MODULI: &[u64] = &[
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
    73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313, 317,
    331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607,
    613, 617, 619, 631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701,
    709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811,
    821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911,
    919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997, 1009, 1013,
    1019, 1021, 1031, 1033, 1039, 1049, 1051, 1061, 1063, 1069, 1087, 1091,
    1093, 1097, 1103, 1109, 1117, 1123, 1129, 1151, 1153, 1163, 1171, 1181,
];

pub struct EmbeddingModel {
    moduli: Vec<u64>,
}

impl EmbeddingModel {
    pub fn new() -> Self {
        Self {
            moduli: COPRIME_MODULI[..NUM_MODULI].to_vec(),
        }
    }

    pub fn num_moduli(&self) -> usize {
        self.moduli.len()
    }

    /// Embed a phrase: tokenize, project each token, mean-pool, normalise.
    ///
    /// Text without any token yields the zero vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; EMBEDDING_DIM];
        }

        let mut sum_embedding = vec![0.0f64; EMBEDDING_DIM];
        for token in &tokens {
            for (acc, val) in sum_embedding.iter_mut().zip(self.project(token)) {
                *acc += val;
            }
        }

        let count = tokens.len() as f64;
        for val in &mut sum_embedding {
            *val /= count;
        }

        normalize(&sum_embedding)
    }

    /// Embed one token as-is, without tokenisation.
    pub fn embed_token(&self, token: &str) -> Vec<f32> {
        normalize(&self.project(&token.to_lowercase()))
    }

    /// E_i = [sin(2πr_i/m_i), cos(2πr_i/m_i)] with r_i = N mod m_i
    fn project(&self, token: &str) -> Vec<f64> {
        let n = token_to_integer(token);

        let mut embedding = Vec::with_capacity(EMBEDDING_DIM);
        for &m in &self.moduli {
            let r = n % m;
            let theta = 2.0 * PI * (r as f64) / (m as f64);
            embedding.push(theta.sin());
            embedding.push(theta.cos());
        }
        embedding
    }
}

impl Default for EmbeddingModel {
    fn default() -> Self {
        Self::new()
    }
}

/// FNV-1a over the token's code points, so every character influences all
/// 64 bits instead of only the trailing four.
fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_LENGTH)
        .fold(FNV_OFFSET, |n, c| (n ^ c as u64).wrapping_mul(FNV_PRIME))
}

fn normalize(values: &[f64]) -> Vec<f32> {
    let norm: f64 = values.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        values.iter().map(|x| (*x / norm) as f32).collect()
    } else {
        values.iter().map(|x| *x as f32).collect()
    }
}

/// Splits text into words, normalizes to lowercase
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_htp_basic() {
        let model = EmbeddingModel::new();

        let emb1 = model.embed("hello world");
        let emb2 = model.embed("hello world");
        let emb3 = model.embed("goodbye moon");

        assert_eq!(emb1, emb2);
        assert_ne!(emb1, emb3);
        assert_eq!(emb1.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_shared_token_scores_higher() {
        let model = EmbeddingModel::new();

        let query = model.embed_token("weather");
        let related = model.embed("The weather was bad.");
        let unrelated = model.embed("Paris is lovely.");

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_single_token_phrase_matches_token_embedding() {
        let model = EmbeddingModel::new();
        let phrase = model.embed("Weather");
        let token = model.embed_token("Weather");
        assert!((cosine_similarity(&phrase, &token) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_long_tokens_do_not_collide_on_suffix() {
        assert_ne!(
            token_to_integer("industrial"),
            token_to_integer("material")
        );
        assert_ne!(token_to_integer("weather"), token_to_integer("feather"));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let model = EmbeddingModel::new();
        let emb = model.embed("  ...  ");
        assert!(emb.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_unicode_support() {
        let model = EmbeddingModel::new();

        let emb_fr = model.embed("Château de Fère");
        let norm: f32 = emb_fr.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }
}
