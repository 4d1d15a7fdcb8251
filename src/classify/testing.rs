//! Deterministic stand-ins for the CLIP model and the image fetcher.
//!
//! A `Scene` maps URLs to captions. Fetching a URL yields a 1x1 image whose red
//! channel indexes the caption, and embedding that image embeds the caption.
//! Text embeddings are bags of known words, so "calm nature" scores 0.707
//! against both the "calm" and "nature" labels.

use anyhow::{anyhow, Result};
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;

use super::labels::{ART_STYLES, MOODS, THEMES};
use crate::clip::JointEmbedder;
use crate::error::ItemError;
use crate::fetch::ImageSource;
use crate::similarity::{normalize, Embedding};

const EXTRA_WORDS: [&str; 6] = ["red", "blue", "apple", "car", "dog", "sky"];

/// Texts containing this marker fail to embed.
pub const POISON: &str = "<poison>";

pub struct Scene {
    vocab: Vec<&'static str>,
    captions: Vec<String>,
    urls: HashMap<String, usize>,
    undecodable: Vec<String>,
}

impl Scene {
    pub fn new() -> Self {
        let mut vocab: Vec<&'static str> = Vec::new();
        for word in ART_STYLES.iter().chain(&MOODS).chain(&THEMES).chain(&EXTRA_WORDS) {
            if !vocab.contains(word) {
                vocab.push(*word);
            }
        }

        Self {
            vocab,
            captions: Vec::new(),
            urls: HashMap::new(),
            undecodable: Vec::new(),
        }
    }

    /// Serve an image at `url` that depicts `caption`.
    pub fn image(mut self, url: &str, caption: &str) -> Self {
        self.urls.insert(url.to_string(), self.captions.len());
        self.captions.push(caption.to_string());
        self
    }

    /// Serve bytes at `url` that are not an image.
    pub fn broken(mut self, url: &str) -> Self {
        self.undecodable.push(url.to_string());
        self
    }
}

impl ImageSource for Scene {
    fn fetch(&self, url: &str) -> Result<DynamicImage, ItemError> {
        if self.undecodable.iter().any(|u| u == url) {
            return Err(ItemError::Decode("unsupported image format".to_string()));
        }

        let idx = self.urls.get(url).ok_or_else(|| ItemError::Fetch {
            url: url.to_string(),
            cause: "404 Not Found".to_string(),
        })?;

        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            1,
            1,
            Rgb([*idx as u8, 0, 0]),
        )))
    }
}

impl JointEmbedder for Scene {
    fn embed_text(&self, text: &str) -> Result<Embedding> {
        if text.contains(POISON) {
            return Err(anyhow!("tokenizer rejected input"));
        }

        let padded = format!(" {} ", text.to_lowercase());
        let mut v: Embedding = self
            .vocab
            .iter()
            .map(|word| {
                if padded.contains(&format!(" {} ", word)) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        normalize(&mut v);
        Ok(v)
    }

    fn embed_image(&self, img: &DynamicImage) -> Result<Embedding> {
        let idx = img.to_rgb8().get_pixel(0, 0)[0] as usize;
        let caption = self
            .captions
            .get(idx)
            .ok_or_else(|| anyhow!("unknown image"))?;
        self.embed_text(caption)
    }
}
