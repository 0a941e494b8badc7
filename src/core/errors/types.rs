use crate::domain::RegionId;
use thiserror::Error;

/// Stage of image processing an [`OCRError::Processing`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Pixel normalization.
    Normalization,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Normalization => write!(f, "normalization"),
        }
    }
}

/// Coarse classification of [`OCRError`] values.
///
/// This is the taxonomy callers are expected to branch on; the variants of
/// [`OCRError`] itself carry the detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input file could not be read.
    Io,
    /// The input bytes are not a supported image.
    Decode,
    /// A model file is missing, unreadable or invalid.
    ModelLoad,
    /// A model could not be invoked, timed out, or produced an unexpected output.
    Inference,
    /// A region polygon is degenerate.
    Geometry,
    /// Some regions failed while others succeeded.
    PartialFailure,
    /// Configuration values are out of range.
    Config,
    /// A caller supplied an invalid argument.
    InvalidInput,
    /// An internal image or tensor transformation failed.
    Processing,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Io => "io",
            ErrorKind::Decode => "decode",
            ErrorKind::ModelLoad => "model load",
            ErrorKind::Inference => "inference",
            ErrorKind::Geometry => "geometry",
            ErrorKind::PartialFailure => "partial failure",
            ErrorKind::Config => "config",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Processing => "processing",
        };
        f.write_str(name)
    }
}

/// Errors produced by the OCR pipeline.
#[derive(Error, Debug)]
pub enum OCRError {
    /// The image could not be decoded.
    #[error("image decode: {context}")]
    ImageDecode {
        /// What was being decoded.
        context: String,
        /// Decoder error, if the decoder produced one.
        #[source]
        source: Option<image::ImageError>,
    },

    /// An image or tensor transformation failed.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage that failed.
        kind: ProcessingStage,
        /// Additional context.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A model could not be invoked or produced an unusable output.
    #[error("inference failed for model '{model_name}': {context}")]
    Inference {
        /// Name of the model.
        model_name: String,
        /// Additional context.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A model file could not be loaded.
    #[error("failed to load model from '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path of the model file.
        model_path: String,
        /// Short reason.
        reason: String,
        /// Optional hint, already prefixed.
        suggestion: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A polygon cannot be rectified.
    #[error("geometry: {message}")]
    Geometry {
        /// Description of the degenerate shape.
        message: String,
    },

    /// A caller supplied an invalid argument.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    /// A configuration value is out of range.
    #[error("configuration: {message}")]
    ConfigError {
        /// Description of the problem.
        message: String,
    },

    /// A single region failed; raised in strict mode.
    #[error("region {region_id} failed")]
    RegionFailed {
        /// The region that failed.
        region_id: RegionId,
        /// Why it failed.
        #[source]
        source: Box<OCRError>,
    },

    /// Some regions failed while the rest were recognized.
    #[error("{} of {total} regions failed", failed.len())]
    PartialFailure {
        /// Ids of the failed regions in reading order.
        failed: Vec<RegionId>,
        /// Number of regions that were dispatched.
        total: usize,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor reshaping.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl OCRError {
    /// Classifies this error.
    ///
    /// [`OCRError::RegionFailed`] reports the kind of the error it wraps.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OCRError::ImageDecode { .. } => ErrorKind::Decode,
            OCRError::Processing { .. } | OCRError::Tensor(_) => ErrorKind::Processing,
            OCRError::Inference { .. } | OCRError::Session(_) => ErrorKind::Inference,
            OCRError::ModelLoad { .. } => ErrorKind::ModelLoad,
            OCRError::Geometry { .. } => ErrorKind::Geometry,
            OCRError::InvalidInput { .. } => ErrorKind::InvalidInput,
            OCRError::ConfigError { .. } => ErrorKind::Config,
            OCRError::RegionFailed { source, .. } => source.kind(),
            OCRError::PartialFailure { .. } => ErrorKind::PartialFailure,
            OCRError::Io(_) => ErrorKind::Io,
        }
    }
}

/// A plain message error used as the `source` of wrapped variants.
#[derive(Debug, Clone)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}
