//! CLIP model implementation using ONNX Runtime

use anyhow::{anyhow, Result};
use image::DynamicImage;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::JointEmbedder;
use crate::config::ModelConfig;
use crate::models::{ensure_file, load_session, load_tokenizer, lock_session};
use crate::similarity::{normalize, Embedding};

/// CLIP's fixed text context length
const CONTEXT_LENGTH: usize = 77;

/// `<|endoftext|>` doubles as the padding token
const PAD_TOKEN_ID: u32 = 49407;

const INPUT_SIZE: u32 = 224;

// CLIP normalization constants
const MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];
const STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

/// CLIP ViT-B/32 with both encoders loaded.
pub struct ClipModel {
    visual: Mutex<Session>,
    text: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl ClipModel {
    /// Load both encoders and the tokenizer, downloading anything missing.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let visual_path = ensure_file(&config.dir, "clip-vit-b32-vision.onnx", &config.clip_vision_url)?;
        let text_path = ensure_file(&config.dir, "clip-vit-b32-text.onnx", &config.clip_text_url)?;
        let tokenizer_path = ensure_file(
            &config.dir,
            "clip-vit-b32-tokenizer.json",
            &config.clip_tokenizer_url,
        )?;

        let visual = load_session(&visual_path, config.intra_threads)?;
        let text = load_session(&text_path, config.intra_threads)?;

        let mut tokenizer = load_tokenizer(&tokenizer_path)?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(CONTEXT_LENGTH),
            pad_id: PAD_TOKEN_ID,
            pad_token: "<|endoftext|>".to_string(),
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: CONTEXT_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure tokenizer truncation: {}", e))?;

        tracing::info!("CLIP vision and text encoders loaded");

        Ok(Self {
            visual: Mutex::new(visual),
            text: Mutex::new(text),
            tokenizer,
        })
    }

    /// Run the visual encoder on an image
    pub fn embed_image(&self, img: &DynamicImage) -> Result<Embedding> {
        let input_data = pixel_values(img);

        let input_tensor = Tensor::from_array((
            [1usize, 3, INPUT_SIZE as usize, INPUT_SIZE as usize],
            input_data.into_boxed_slice(),
        ))?;

        let mut model = lock_session(&self.visual);

        let outputs = model.run(ort::inputs!["pixel_values" => input_tensor])?;

        let embedding_output = outputs
            .iter()
            .next()
            .ok_or_else(|| anyhow!("No embedding output"))?;

        let (_shape, embedding_data) = embedding_output.1.try_extract_tensor::<f32>()?;

        let mut embedding = embedding_data.to_vec();
        normalize(&mut embedding);
        Ok(embedding)
    }

    /// Run the text encoder on a string
    pub fn embed_text(&self, text: &str) -> Result<Embedding> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = input_ids.len();

        let ids_tensor = Tensor::from_array(([1usize, seq_len], input_ids.into_boxed_slice()))?;
        let mask_tensor =
            Tensor::from_array(([1usize, seq_len], attention_mask.into_boxed_slice()))?;

        let mut model = lock_session(&self.text);

        let outputs = model.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor
        ])?;

        let embedding_output = outputs
            .iter()
            .next()
            .ok_or_else(|| anyhow!("No embedding output"))?;

        let (_shape, embedding_data) = embedding_output.1.try_extract_tensor::<f32>()?;

        let mut embedding = embedding_data.to_vec();
        normalize(&mut embedding);
        Ok(embedding)
    }
}

impl JointEmbedder for ClipModel {
    fn embed_text(&self, text: &str) -> Result<Embedding> {
        ClipModel::embed_text(self, text)
    }

    fn embed_image(&self, img: &DynamicImage) -> Result<Embedding> {
        ClipModel::embed_image(self, img)
    }
}

/// Convert an image to a normalized NCHW tensor buffer
fn pixel_values(img: &DynamicImage) -> Vec<f32> {
    let side = INPUT_SIZE as usize;
    let plane = side * side;

    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let mut input_data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let idx = y as usize * side + x as usize;
        for channel in 0..3 {
            // (pixel/255 - mean) / std
            input_data[channel * plane + idx] =
                ((pixel[channel] as f32 / 255.0) - MEAN[channel]) / STD[channel];
        }
    }

    input_data
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_pixel_values_layout() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 16, Rgb([255, 0, 128])));
        let data = pixel_values(&img);

        let plane = (INPUT_SIZE * INPUT_SIZE) as usize;
        assert_eq!(data.len(), 3 * plane);

        let red = (1.0 - MEAN[0]) / STD[0];
        let green = (0.0 - MEAN[1]) / STD[1];
        assert!((data[0] - red).abs() < 1e-4);
        assert!((data[plane - 1] - red).abs() < 1e-4);
        assert!((data[plane] - green).abs() < 1e-4);
    }
}
