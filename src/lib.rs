//! clipsort groups prompts with images and tags both with art style, mood
//! and theme labels, using CLIP embeddings served over HTTP.

pub mod classify;
pub mod clip;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod sentence;
pub mod server;
pub mod similarity;
