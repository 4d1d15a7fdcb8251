//! CLIP (Contrastive Language-Image Pre-training) embeddings module
//!
//! Text and images are embedded into one joint space so a prompt can be
//! compared directly against a picture.

mod model;

pub use model::ClipModel;

use anyhow::Result;
use image::DynamicImage;

use crate::similarity::Embedding;

/// Embeds text and images into a shared space. Outputs are unit length.
pub trait JointEmbedder: Send + Sync {
    fn embed_text(&self, text: &str) -> Result<Embedding>;

    fn embed_image(&self, img: &DynamicImage) -> Result<Embedding>;

    /// Embed several texts, stopping at the first failure.
    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|text| self.embed_text(text)).collect()
    }
}
