use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlateEvalError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error while {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("image error while {context}: {source}")]
    Image {
        context: String,
        #[source]
        source: image::ImageError,
    },
    #[error("malformed input in {record}: {message}")]
    MalformedInput { record: String, message: String },
    #[error("class index {index} is out of range for a class table of {len} labels")]
    ClassIndexOutOfRange { index: usize, len: usize },
    #[error("degenerate bounding box ({left}, {top}, {right}, {bottom}) has zero area")]
    DegenerateGeometry {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },
    #[error("detector error: {message}")]
    Detector { message: String },
    #[error("dataset generation failed: {message}")]
    Synthesis { message: String },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl PlateEvalError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn image(context: impl Into<String>, source: image::ImageError) -> Self {
        Self::Image {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn malformed(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            record: record.into(),
            message: message.into(),
        }
    }

    pub fn detector(err: impl std::fmt::Display) -> Self {
        Self::Detector {
            message: err.to_string(),
        }
    }

    pub fn synthesis(err: impl std::fmt::Display) -> Self {
        Self::Synthesis {
            message: err.to_string(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
