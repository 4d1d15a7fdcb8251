//! Model file cache and ONNX session construction shared by the encoders.

use anyhow::{anyhow, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Download a model file into `dir` if it doesn't exist
pub fn ensure_file(dir: &Path, filename: &str, url: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);

    if !path.exists() {
        tracing::info!(model = %filename, "Downloading model file...");
        let response = ureq::get(url)
            .call()
            .map_err(|e| anyhow!("Failed to download {}: {}", filename, e))?;

        // Partial downloads stay in a .part file until complete
        let partial = dir.join(format!("{}.part", filename));
        let mut file = std::fs::File::create(&partial)?;
        std::io::copy(&mut response.into_reader(), &mut file)?;
        std::fs::rename(&partial, &path)?;
        tracing::info!(model = %filename, path = ?path, "Model file downloaded");
    }

    Ok(path)
}

pub fn load_session(path: &Path, intra_threads: usize) -> Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)?;

    tracing::debug!(path = ?path, "ONNX session ready");
    Ok(session)
}

/// Lock an encoder session, taking over the lock if an earlier run panicked.
pub fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn load_tokenizer(path: &Path) -> Result<tokenizers::Tokenizer> {
    tokenizers::Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Failed to load tokenizer {:?}: {}", path, e))
}
