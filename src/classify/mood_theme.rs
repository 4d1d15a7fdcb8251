use serde::{Deserialize, Serialize};

use super::{is_blank, Classifier};
use crate::error::{ErrorKind, ItemError};
use crate::similarity::Embedding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
}

/// Mood and theme for one text or image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodTheme {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub content: String,
    #[serde(flatten)]
    pub outcome: MoodThemeOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoodThemeOutcome {
    Classified {
        mood: String,
        theme: String,
        mood_confidence: f32,
        theme_confidence: f32,
    },
    Failed {
        error: String,
        error_kind: ErrorKind,
    },
}

impl Classifier {
    /// Classify mood and theme for every non-blank text, then every non-blank
    /// image URL. Mood and theme are chosen independently.
    pub fn classify_mood_theme(&self, texts: &[String], images: &[String]) -> Vec<MoodTheme> {
        let text_items = texts
            .iter()
            .filter(|t| !is_blank(t))
            .map(|text| (ContentType::Text, text, self.embed_text(text)));

        let image_items = images
            .iter()
            .filter(|u| !is_blank(u))
            .map(|url| (ContentType::Image, url, self.embed_url(url)));

        text_items
            .chain(image_items)
            .map(|(content_type, content, embedding)| MoodTheme {
                content_type,
                content: content.clone(),
                outcome: match embedding.and_then(|e| self.mood_and_theme(&e)) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::warn!(
                            content = %content,
                            kind = ?e.kind(),
                            error = %e,
                            "Mood/theme classification failed"
                        );
                        let subject = match content_type {
                            ContentType::Text => "text",
                            ContentType::Image => "image",
                        };
                        MoodThemeOutcome::Failed {
                            error: e.describe(subject),
                            error_kind: e.kind(),
                        }
                    }
                },
            })
            .collect()
    }

    fn mood_and_theme(&self, embedding: &Embedding) -> Result<MoodThemeOutcome, ItemError> {
        let no_labels = || ItemError::Inference("no mood or theme labels".to_string());
        let mood = self.moods.best(embedding).ok_or_else(no_labels)?;
        let theme = self.themes.best(embedding).ok_or_else(no_labels)?;

        Ok(MoodThemeOutcome::Classified {
            mood: mood.label.to_string(),
            theme: theme.label.to_string(),
            mood_confidence: mood.confidence,
            theme_confidence: theme.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::testing::{Scene, POISON};
    use crate::classify::{MOODS, THEMES};
    use std::sync::Arc;

    fn classifier(scene: Scene) -> Classifier {
        let scene = Arc::new(scene);
        Classifier::new(scene.clone(), scene, 0.7).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_inputs() {
        let c = classifier(Scene::new());
        assert!(c.classify_mood_theme(&[], &[]).is_empty());
        assert!(c
            .classify_mood_theme(&strings(&[" "]), &strings(&[""]))
            .is_empty());
    }

    #[test]
    fn test_text_mood_and_theme_are_independent() {
        let c = classifier(Scene::new());
        let results = c.classify_mood_theme(&strings(&["calm nature walk"]), &[]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content_type, ContentType::Text);
        assert_eq!(results[0].content, "calm nature walk");
        match &results[0].outcome {
            MoodThemeOutcome::Classified {
                mood,
                theme,
                mood_confidence,
                theme_confidence,
            } => {
                assert_eq!(mood, "calm");
                assert_eq!(theme, "nature");
                assert!((mood_confidence - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
                assert!((theme_confidence - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_texts_before_images_in_input_order() {
        let c = classifier(
            Scene::new()
                .image("city.jpg", "aggressive urban")
                .image("meal.jpg", "happy food"),
        );

        let results = c.classify_mood_theme(
            &strings(&["sad travel", "", "energetic sports"]),
            &strings(&["meal.jpg", "city.jpg"]),
        );

        let summary: Vec<(ContentType, &str)> = results
            .iter()
            .map(|r| (r.content_type, r.content.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ContentType::Text, "sad travel"),
                (ContentType::Text, "energetic sports"),
                (ContentType::Image, "meal.jpg"),
                (ContentType::Image, "city.jpg"),
            ]
        );

        match &results[3].outcome {
            MoodThemeOutcome::Classified { mood, theme, .. } => {
                assert_eq!(mood, "aggressive");
                assert_eq!(theme, "urban");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_failures_become_error_records() {
        let c = classifier(Scene::new().broken("bad.png"));
        let poisoned = format!("happy {}", POISON);

        let results =
            c.classify_mood_theme(&[poisoned.clone()], &strings(&["bad.png", "gone.png"]));

        assert_eq!(results.len(), 3);
        let kinds: Vec<Option<ErrorKind>> = results
            .iter()
            .map(|r| match &r.outcome {
                MoodThemeOutcome::Failed { error_kind, .. } => Some(*error_kind),
                MoodThemeOutcome::Classified { .. } => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                Some(ErrorKind::Inference),
                Some(ErrorKind::Decode),
                Some(ErrorKind::Fetch),
            ]
        );
        assert_eq!(results[0].content, poisoned);
    }

    #[test]
    fn test_labels_stay_in_their_sets() {
        let c = classifier(Scene::new().image("x.jpg", "romantic fashion dog"));
        let results = c.classify_mood_theme(
            &strings(&["mysterious technology", "zzz", "peaceful education"]),
            &strings(&["x.jpg"]),
        );

        for r in &results {
            match &r.outcome {
                MoodThemeOutcome::Classified {
                    mood,
                    theme,
                    mood_confidence,
                    theme_confidence,
                } => {
                    assert!(MOODS.contains(&mood.as_str()));
                    assert!(THEMES.contains(&theme.as_str()));
                    assert!((-1.0..=1.0).contains(mood_confidence));
                    assert!((-1.0..=1.0).contains(theme_confidence));
                }
                other => panic!("unexpected outcome {:?}", other),
            }
        }
    }

    #[test]
    fn test_serialized_shapes() {
        let c = classifier(Scene::new());
        let results = c.classify_mood_theme(&strings(&["happy art"]), &strings(&["nope.jpg"]));
        let json = serde_json::to_value(&results).unwrap();

        assert_eq!(json[0]["type"], "text");
        assert_eq!(json[0]["mood"], "happy");
        assert_eq!(json[0]["theme"], "art");
        assert!(json[0].get("error").is_none());

        assert_eq!(json[1]["type"], "image");
        assert_eq!(json[1]["content"], "nope.jpg");
        assert_eq!(json[1]["error_kind"], "fetch");
        assert!(json[1].get("mood").is_none());
        assert!(json[1].get("mood_confidence").is_none());
    }
}
