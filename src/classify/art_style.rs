use serde::{Deserialize, Serialize};

use super::{is_blank, Classifier};
use crate::error::{ErrorKind, ItemError};

/// Style reported for images that could not be classified.
pub const UNKNOWN_STYLE: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtStyleClassification {
    pub image: String,
    pub style: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtStyleResponse {
    pub classifications: Vec<ArtStyleClassification>,
}

impl ArtStyleClassification {
    fn failed(image: &str, err: &ItemError) -> Self {
        Self {
            image: image.to_string(),
            style: UNKNOWN_STYLE.to_string(),
            confidence: 0.0,
            error: Some(err.describe("image")),
            error_kind: Some(err.kind()),
        }
    }
}

impl Classifier {
    /// Pick the closest art style for every non-blank image URL.
    pub fn classify_art_style(&self, images: &[String]) -> ArtStyleResponse {
        let classifications = images
            .iter()
            .filter(|url| !is_blank(url))
            .map(|url| match self.best_art_style(url) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(url = %url, kind = ?e.kind(), error = %e, "Art style classification failed");
                    ArtStyleClassification::failed(url, &e)
                }
            })
            .collect();

        ArtStyleResponse { classifications }
    }

    fn best_art_style(&self, url: &str) -> Result<ArtStyleClassification, ItemError> {
        let embedding = self.embed_url(url)?;
        let best = self
            .art_styles
            .best(&embedding)
            .ok_or_else(|| ItemError::Inference("no art style labels".to_string()))?;

        Ok(ArtStyleClassification {
            image: url.to_string(),
            style: best.label.to_string(),
            confidence: best.confidence,
            error: None,
            error_kind: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::testing::Scene;
    use crate::classify::ART_STYLES;
    use std::sync::Arc;

    fn classifier(scene: Scene) -> Classifier {
        let scene = Arc::new(scene);
        Classifier::new(scene.clone(), scene, 0.7).unwrap()
    }

    #[test]
    fn test_picks_style_per_image() {
        let c = classifier(
            Scene::new()
                .image("a.jpg", "baroque ceiling")
                .image("b.jpg", "cubism red guitar"),
        );

        let response = c.classify_art_style(&["a.jpg".to_string(), "b.jpg".to_string()]);
        let styles: Vec<&str> = response
            .classifications
            .iter()
            .map(|c| c.style.as_str())
            .collect();
        assert_eq!(styles, vec!["baroque", "cubism"]);

        let first = &response.classifications[0];
        assert_eq!(first.image, "a.jpg");
        assert!((first.confidence - 1.0).abs() < 1e-5);
        assert!(first.error.is_none());
    }

    #[test]
    fn test_unreachable_image_reports_unknown() {
        let c = classifier(Scene::new());
        let response = c.classify_art_style(&["<invalid-url>".to_string()]);

        assert_eq!(response.classifications.len(), 1);
        let item = &response.classifications[0];
        assert_eq!(item.style, UNKNOWN_STYLE);
        assert_eq!(item.confidence, 0.0);
        assert!(item.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert_eq!(item.error_kind, Some(ErrorKind::Fetch));
    }

    #[test]
    fn test_unknown_iff_error() {
        let c = classifier(
            Scene::new()
                .image("ok.jpg", "surreal dog")
                .image("blank.jpg", "dog")
                .broken("bad.jpg"),
        );

        let images: Vec<String> = ["ok.jpg", "", "bad.jpg", "blank.jpg", "gone.jpg"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let response = c.classify_art_style(&images);

        // blank URL is skipped
        assert_eq!(response.classifications.len(), 4);
        for item in &response.classifications {
            if item.error.is_some() {
                assert_eq!(item.style, UNKNOWN_STYLE);
            } else {
                assert!(ART_STYLES.contains(&item.style.as_str()));
            }
        }
        assert_eq!(response.classifications[1].error_kind, Some(ErrorKind::Decode));
    }

    #[test]
    fn test_error_fields_omitted_on_success() {
        let c = classifier(Scene::new().image("a.jpg", "minimalist"));
        let response = c.classify_art_style(&["a.jpg".to_string()]);
        let json = serde_json::to_value(&response).unwrap();

        let item = &json["classifications"][0];
        assert_eq!(item["style"], "minimalist");
        assert!(item.get("error").is_none());
        assert!(item.get("error_kind").is_none());
    }
}
