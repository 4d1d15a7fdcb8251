use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub models: ModelConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub grouping: GroupingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// The single origin allowed to make credentialed cross-origin requests.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origin() -> String {
    "http://localhost:5174".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Where ONNX files and tokenizers are cached
    #[serde(default = "default_models_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_clip_vision_url")]
    pub clip_vision_url: String,

    #[serde(default = "default_clip_text_url")]
    pub clip_text_url: String,

    #[serde(default = "default_clip_tokenizer_url")]
    pub clip_tokenizer_url: String,

    /// Load the sentence encoder at startup. No endpoint uses it yet.
    #[serde(default)]
    pub sentence_enabled: bool,

    #[serde(default = "default_sentence_url")]
    pub sentence_url: String,

    #[serde(default = "default_sentence_tokenizer_url")]
    pub sentence_tokenizer_url: String,

    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

fn default_models_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("clipsort/models")
}

// Qdrant's ONNX exports of CLIP ViT-B/32
fn default_clip_vision_url() -> String {
    "https://huggingface.co/Qdrant/clip-ViT-B-32-vision/resolve/main/model.onnx".to_string()
}

fn default_clip_text_url() -> String {
    "https://huggingface.co/Qdrant/clip-ViT-B-32-text/resolve/main/model.onnx".to_string()
}

fn default_clip_tokenizer_url() -> String {
    "https://huggingface.co/Qdrant/clip-ViT-B-32-text/resolve/main/tokenizer.json".to_string()
}

fn default_sentence_url() -> String {
    "https://huggingface.co/Qdrant/all-MiniLM-L6-v2-onnx/resolve/main/model.onnx".to_string()
}

fn default_sentence_tokenizer_url() -> String {
    "https://huggingface.co/Qdrant/all-MiniLM-L6-v2-onnx/resolve/main/tokenizer.json".to_string()
}

fn default_intra_threads() -> usize {
    4
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
            clip_vision_url: default_clip_vision_url(),
            clip_text_url: default_clip_text_url(),
            clip_tokenizer_url: default_clip_tokenizer_url(),
            sentence_enabled: false,
            sentence_url: default_sentence_url(),
            sentence_tokenizer_url: default_sentence_tokenizer_url(),
            intra_threads: default_intra_threads(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Side length images are resized to before embedding
    #[serde(default = "default_image_size")]
    pub image_size: u32,

    /// Per-request timeout. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

fn default_image_size() -> u32 {
    224
}

fn default_max_bytes() -> u64 {
    32 * 1024 * 1024 // 32MB
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            image_size: default_image_size(),
            timeout_secs: None,
            max_bytes: default_max_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Cosine distance threshold; an image matches a text when
    /// similarity > 1 - threshold. Lower is stricter.
    #[serde(default = "default_grouping_threshold")]
    pub threshold: f32,
}

fn default_grouping_threshold() -> f32 {
    0.3
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            threshold: default_grouping_threshold(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            models: ModelConfig::default(),
            fetch: FetchConfig::default(),
            grouping: GroupingConfig::default(),
        }
    }
}

impl Config {
    /// Load from `CLIPSORT_CONFIG` or the default location, writing a default
    /// file on first run.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os("CLIPSORT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clipsort")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Similarity an image must exceed to join a text's group.
    pub fn grouping_cutoff(&self) -> f32 {
        1.0 - self.grouping.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.allowed_origin, "http://localhost:5174");
        assert_eq!(config.fetch.image_size, 224);
        assert!(config.fetch.timeout_secs.is_none());
        assert!(!config.models.sentence_enabled);
        assert!((config.grouping_cutoff() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9100

            [grouping]
            threshold = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!((config.grouping_cutoff() - 0.75).abs() < 1e-6);
        assert_eq!(config.models.intra_threads, 4);
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.fetch.timeout_secs = Some(15);
        config.server.allowed_origin = "https://gallery.example".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.fetch.timeout_secs, Some(15));
        assert_eq!(loaded.server.allowed_origin, "https://gallery.example");
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
