// src/core/identity/biometric.rs
//! Embedding statistics used by the enrollment quality gate, the liveness
//! check and the matcher.

use rand::Rng;

/// Synthesizes a capture with components uniform in [-1, 1).
pub fn synthesize_embedding(size: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Population standard deviation; 0 for an empty vector.
pub fn spread(embedding: &[f64]) -> f64 {
    if embedding.is_empty() {
        return 0.0;
    }

    let len = embedding.len() as f64;
    let mean = embedding.iter().sum::<f64>() / len;
    let variance = embedding.iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>() / len;

    variance.sqrt()
}

/// Cosine similarity; 0 when lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let magnitude_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let magnitude_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot / (magnitude_a * magnitude_b)
}

pub fn is_finite(embedding: &[f64]) -> bool {
    embedding.iter().all(|v| v.is_finite())
}
