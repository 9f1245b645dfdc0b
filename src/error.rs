// ============================================================================
// ERRORS — one taxonomy for startup, lifecycle and GPU failures
// ============================================================================

pub type TileResult<T> = Result<T, TileError>;

#[derive(thiserror::Error, Debug)]
pub enum TileError {
    #[error("source image is not set")]
    MissingSource,

    #[error("source image has zero size ({width}x{height})")]
    EmptySource { width: u32, height: u32 },

    #[error("kernel entry point `{0}` not found in compute program")]
    KernelNotFound(String),

    #[error("binding `{0}` is not declared by the compute program")]
    BindingNotFound(String),

    #[error("lifecycle precondition violated: {0}")]
    Precondition(String),

    #[error("no gpu adapter available")]
    NoAdapter,

    #[error("gpu adapter unsupported: {0}")]
    UnsupportedAdapter(String),

    #[error("gpu error: {0}")]
    Gpu(String),

    #[error("kernel pipeline error: {0}")]
    Kernel(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TileError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }

    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::Kernel(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
