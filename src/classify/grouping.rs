use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{is_blank, Classifier};
use crate::similarity::{above, scores, Embedding};

/// One prompt and the images that matched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub text: String,
    pub matches: Vec<String>,
}

impl Classifier {
    /// Group images under every prompt they are similar enough to.
    ///
    /// An image joins a prompt's group when `similarity > 1 - threshold`.
    /// Images that cannot be fetched or embedded are left out of every group.
    pub fn group_by_threshold(&self, texts: &[String], images: &[String]) -> Result<Vec<Group>> {
        let texts: Vec<&String> = texts.iter().filter(|t| !is_blank(t)).collect();
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let text_embeddings = texts
            .iter()
            .map(|text| {
                self.embed_text(text)
                    .with_context(|| format!("could not embed text {:?}", text))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut image_urls: Vec<&String> = Vec::new();
        let mut image_embeddings: Vec<Embedding> = Vec::new();
        for url in images.iter().filter(|u| !is_blank(u)) {
            match self.embed_url(url) {
                Ok(embedding) => {
                    image_urls.push(url);
                    image_embeddings.push(embedding);
                }
                Err(e) => {
                    tracing::warn!(url = %url, kind = ?e.kind(), error = %e, "Skipping image");
                }
            }
        }

        let groups = texts
            .into_iter()
            .zip(text_embeddings)
            .map(|(text, embedding)| {
                let similar = scores(&embedding, &image_embeddings);
                Group {
                    text: text.clone(),
                    matches: above(&similar, self.grouping_cutoff)
                        .into_iter()
                        .map(|idx| image_urls[idx].clone())
                        .collect(),
                }
            })
            .collect();

        Ok(groups)
    }
}
