//! Central error type for renderer operations.

/// Everything that can fail between startup and frame submission. All variants are
/// fatal for the host: nothing is retried.
#[derive(thiserror::Error, Debug)]
pub enum RsmError {
    #[error("device error: {0}")]
    Device(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid mesh: {0}")]
    Mesh(String),

    #[error("frame schedule error: {0}")]
    Schedule(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error(transparent)]
    Asset(#[from] render_api::AssetError),
}

impl RsmError {
    pub fn device<T: ToString>(msg: T) -> Self {
        RsmError::Device(msg.to_string())
    }

    pub fn resource<T: ToString>(msg: T) -> Self {
        RsmError::Resource(msg.to_string())
    }

    pub fn surface<T: ToString>(msg: T) -> Self {
        RsmError::Surface(msg.to_string())
    }
}

pub type RsmResult<T> = Result<T, RsmError>;
