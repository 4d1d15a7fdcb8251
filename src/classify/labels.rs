//! Fixed candidate label sets.

use anyhow::{anyhow, Result};

use crate::clip::JointEmbedder;
use crate::similarity::{argmax, scores, Embedding};

pub const ART_STYLES: [&str; 14] = [
    "impressionism",
    "abstract",
    "realistic",
    "minimalist",
    "surreal",
    "vintage",
    "modern",
    "classical",
    "pop art",
    "cubism",
    "expressionism",
    "renaissance",
    "baroque",
    "contemporary",
];

pub const MOODS: [&str; 8] = [
    "happy",
    "sad",
    "energetic",
    "calm",
    "mysterious",
    "romantic",
    "aggressive",
    "peaceful",
];

pub const THEMES: [&str; 10] = [
    "nature",
    "urban",
    "technology",
    "art",
    "food",
    "travel",
    "fashion",
    "sports",
    "business",
    "education",
];

/// Best label for a query embedding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelMatch {
    pub label: &'static str,
    pub confidence: f32,
}

/// A label set with its text embeddings computed up front.
pub struct LabelSet {
    labels: &'static [&'static str],
    embeddings: Vec<Embedding>,
}

impl LabelSet {
    pub fn embed(embedder: &dyn JointEmbedder, labels: &'static [&'static str]) -> Result<Self> {
        if labels.is_empty() {
            return Err(anyhow!("Label set is empty"));
        }

        let embeddings = embedder.embed_texts(labels)?;
        Ok(Self { labels, embeddings })
    }

    /// Highest-scoring label; the earliest label wins a tie.
    pub fn best(&self, query: &[f32]) -> Option<LabelMatch> {
        let scored = scores(query, &self.embeddings);
        argmax(&scored).map(|(idx, confidence)| LabelMatch {
            label: self.labels[idx],
            confidence,
        })
    }
}
