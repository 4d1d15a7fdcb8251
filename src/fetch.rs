//! Remote image retrieval.
//!
//! Images are downloaded with a shared blocking agent, decoded from memory,
//! converted to RGB and resized to the square resolution the vision encoder
//! expects.

use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Read;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::ItemError;

/// Something that turns an image reference into pixels.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<DynamicImage, ItemError>;
}

/// Fetches images over HTTP(S).
pub struct HttpImageSource {
    agent: ureq::Agent,
    image_size: u32,
    max_bytes: u64,
}

impl HttpImageSource {
    pub fn new(config: &FetchConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Self {
            agent: builder.build(),
            image_size: config.image_size,
            max_bytes: config.max_bytes,
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, ItemError> {
        let fetch_err = |cause: String| ItemError::Fetch {
            url: url.to_string(),
            cause,
        };

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| fetch_err(e.to_string()))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| fetch_err(e.to_string()))?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(fetch_err(format!(
                "body exceeds {} bytes",
                self.max_bytes
            )));
        }

        Ok(bytes)
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, url: &str) -> Result<DynamicImage, ItemError> {
        let bytes = self.download(url)?;
        let img = decode_image(&bytes, self.image_size)?;
        tracing::debug!(url = %url, bytes = bytes.len(), "Fetched image");
        Ok(img)
    }
}

/// Decode raw bytes into an RGB image of `size`x`size` pixels.
pub fn decode_image(bytes: &[u8], size: u32) -> Result<DynamicImage, ItemError> {
    let img = image::load_from_memory(bytes).map_err(|e| ItemError::Decode(e.to_string()))?;
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    Ok(rgb.resize_exact(size, size, FilterType::CatmullRom))
}
