//! Grouping and label classification over the joint embedding space.
//!
//! All three operations share one shape: skip blank inputs, embed each item,
//! score it against a candidate set and keep either the best candidate or
//! every candidate above a cutoff. Items are processed sequentially in input
//! order.

mod art_style;
mod grouping;
pub mod labels;
mod mood_theme;

#[cfg(test)]
pub(crate) mod testing;

pub use art_style::{ArtStyleClassification, ArtStyleResponse, UNKNOWN_STYLE};
pub use grouping::Group;
pub use labels::{LabelMatch, LabelSet, ART_STYLES, MOODS, THEMES};
pub use mood_theme::{ContentType, MoodTheme, MoodThemeOutcome};

use anyhow::Result;
use std::sync::Arc;

use crate::clip::JointEmbedder;
use crate::error::ItemError;
use crate::fetch::ImageSource;
use crate::similarity::Embedding;

/// Shared, read-only classification engine.
pub struct Classifier {
    embedder: Arc<dyn JointEmbedder>,
    images: Arc<dyn ImageSource>,
    art_styles: LabelSet,
    moods: LabelSet,
    themes: LabelSet,
    grouping_cutoff: f32,
}

impl Classifier {
    /// Embed the static label sets once and keep them for the process lifetime.
    pub fn new(
        embedder: Arc<dyn JointEmbedder>,
        images: Arc<dyn ImageSource>,
        grouping_cutoff: f32,
    ) -> Result<Self> {
        let art_styles = LabelSet::embed(embedder.as_ref(), &ART_STYLES)?;
        let moods = LabelSet::embed(embedder.as_ref(), &MOODS)?;
        let themes = LabelSet::embed(embedder.as_ref(), &THEMES)?;

        tracing::info!(
            art_styles = ART_STYLES.len(),
            moods = MOODS.len(),
            themes = THEMES.len(),
            grouping_cutoff,
            "Label embeddings ready"
        );

        Ok(Self {
            embedder,
            images,
            art_styles,
            moods,
            themes,
            grouping_cutoff,
        })
    }

    fn embed_url(&self, url: &str) -> Result<Embedding, ItemError> {
        let img = self.images.fetch(url)?;
        Ok(self.embedder.embed_image(&img)?)
    }

    fn embed_text(&self, text: &str) -> Result<Embedding, ItemError> {
        Ok(self.embedder.embed_text(text)?)
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
