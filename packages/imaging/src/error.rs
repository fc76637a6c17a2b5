use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    /// The input is not an image this build can decode.
    #[error("image could not be decoded: {0}")]
    Decode(String),

    /// A transform step or the encoder failed.
    #[error("transform failed: {0}")]
    Transform(String),
}

impl ImageError {
    pub(crate) fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }
}
