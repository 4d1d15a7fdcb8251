//! Sentence embedding model (all-MiniLM-L6-v2).
//!
//! Loaded on request through `models.sentence_enabled`. Produces 384-dim
//! mean-pooled, L2-normalized vectors. It lives in its own space and is never
//! compared against CLIP embeddings.

use anyhow::{anyhow, Result};
use ndarray::ArrayView2;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tokenizers::{Tokenizer, TruncationParams};

use crate::config::ModelConfig;
use crate::models::{ensure_file, load_session, load_tokenizer, lock_session};
use crate::similarity::{normalize, Embedding};

const MAX_SEQUENCE_LENGTH: usize = 256;

pub struct SentenceModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl SentenceModel {
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let model_path = ensure_file(&config.dir, "all-minilm-l6-v2.onnx", &config.sentence_url)?;
        let tokenizer_path = ensure_file(
            &config.dir,
            "all-minilm-l6-v2-tokenizer.json",
            &config.sentence_tokenizer_url,
        )?;

        let session = load_session(&model_path, config.intra_threads)?;

        let mut tokenizer = load_tokenizer(&tokenizer_path)?;
        configure_tokenizer(&mut tokenizer)?;

        tracing::info!("Sentence encoder loaded");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Embed one text into the sentence space.
    pub fn embed(&self, text: &str) -> Result<Embedding> {
        let inputs = TokenInputs::encode(&self.tokenizer, text)?;
        let seq_len = inputs.len();

        let ids_tensor = Tensor::from_array(([1usize, seq_len], inputs.ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((
            [1usize, seq_len],
            inputs.attention_mask.clone().into_boxed_slice(),
        ))?;
        let type_tensor =
            Tensor::from_array(([1usize, seq_len], inputs.type_ids.into_boxed_slice()))?;

        let mut session = lock_session(&self.session);

        let outputs = session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor
        ])?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| anyhow!("No hidden state output"))?;

        let (shape, data) = output.try_extract_tensor::<f32>()?;
        sentence_embedding(shape, data, &inputs.attention_mask)
    }
}

fn configure_tokenizer(tokenizer: &mut Tokenizer) -> Result<()> {
    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: MAX_SEQUENCE_LENGTH,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Failed to configure tokenizer truncation: {}", e))?;
    Ok(())
}

/// Encoder inputs for a single text, widened to the `i64` the model takes.
struct TokenInputs {
    ids: Vec<i64>,
    attention_mask: Vec<i64>,
    type_ids: Vec<i64>,
}

impl TokenInputs {
    fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Self> {
        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let to_i64 = |v: &[u32]| v.iter().map(|&x| x as i64).collect::<Vec<i64>>();
        Ok(Self {
            ids: to_i64(encoding.get_ids()),
            attention_mask: to_i64(encoding.get_attention_mask()),
            type_ids: to_i64(encoding.get_type_ids()),
        })
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Pool a `[1, seq_len, dims]` hidden state into a unit-length embedding.
fn sentence_embedding(shape: &[i64], hidden: &[f32], mask: &[i64]) -> Result<Embedding> {
    if shape.len() != 3 {
        return Err(anyhow!("Unexpected output shape: {:?}", shape));
    }

    let seq_len = shape[1] as usize;
    let dims = shape[2] as usize;
    let mut embedding = mean_pool(hidden, seq_len, dims, mask)?;
    normalize(&mut embedding);
    Ok(embedding)
}

/// Average the token vectors of a `[seq_len, dims]` hidden state, counting
/// only positions whose attention mask is set.
fn mean_pool(hidden: &[f32], seq_len: usize, dims: usize, mask: &[i64]) -> Result<Vec<f32>> {
    let needed = seq_len * dims;
    if hidden.len() < needed {
        return Err(anyhow!(
            "Hidden state has {} values, expected {}",
            hidden.len(),
            needed
        ));
    }

    let hidden = ArrayView2::from_shape((seq_len, dims), &hidden[..needed])
        .map_err(|e| anyhow!("Hidden state shape mismatch: {}", e))?;

    let mut pooled = vec![0.0f32; dims];
    let mut count = 0.0f32;

    for (row, &m) in hidden.rows().into_iter().zip(mask.iter()) {
        if m == 0 {
            continue;
        }
        for (acc, v) in pooled.iter_mut().zip(row.iter()) {
            *acc += v;
        }
        count += 1.0;
    }

    if count > 0.0 {
        for v in &mut pooled {
            *v /= count;
        }
    }

    Ok(pooled)
}
