//! Visual feature extraction and the bounded feature cache.
//!
//! Extraction is expensive, so the measurement modes only call into a
//! [`FeatureExtractor`] while some cache key the sample feeds still has room.
//!
//! ```rust,ignore
//! use geobias_core::features::{BackboneEngine, FeatureExtractor};
//! use geobias_core::Config;
//!
//! let config = Config::default();
//! let engine = BackboneEngine::load(&config.features, &config.model_dir())?;
//! let feature = engine.extract(&image, "img_0001")?;
//! ```

pub mod backbone;
pub mod cache;
pub(crate) mod preprocess;

pub use cache::FeatureCache;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::FeaturesConfig;
use crate::error::PipelineError;

use self::backbone::BackboneSession;
use self::preprocess::preprocess;

/// The backbone ONNX model filename.
const BACKBONE_MODEL_FILENAME: &str = "backbone.onnx";

/// Turns an image into a fixed-length feature vector.
pub trait FeatureExtractor {
    /// Extract the feature vector for one sample's image.
    fn extract(&self, image: &DynamicImage, sample_id: &str) -> Result<Vec<f32>, PipelineError>;
}

/// Feature extractor backed by a frozen ImageNet backbone in ONNX format.
pub struct BackboneEngine {
    session: BackboneSession,
    image_size: u32,
}

impl BackboneEngine {
    /// Load the backbone from `{model_dir}/{model}/backbone.onnx`.
    pub fn load(config: &FeaturesConfig, model_dir: &Path) -> Result<Self, PipelineError> {
        let model_path = Self::model_path(config, model_dir);

        if !model_path.exists() {
            return Err(PipelineError::Model {
                path: model_path,
                message: "Backbone model not found. Export it to ONNX first.".to_string(),
            });
        }

        tracing::info!("Loading backbone from {:?}", model_path);
        let session = BackboneSession::load(&model_path)?;
        tracing::info!("Backbone loaded");

        Ok(Self {
            session,
            image_size: config.image_size,
        })
    }

    /// Square input size fed to the model.
    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Expected model file path.
    pub fn model_path(config: &FeaturesConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model).join(BACKBONE_MODEL_FILENAME)
    }
}

impl FeatureExtractor for BackboneEngine {
    fn extract(&self, image: &DynamicImage, sample_id: &str) -> Result<Vec<f32>, PipelineError> {
        let tensor = preprocess(image, self.image_size);
        self.session.run(&tensor, sample_id)
    }
}
