#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio upload is empty")]
    Empty,

    #[error("unsupported wav: {0}")]
    UnsupportedWav(String),

    #[error("failed to resample: {0}")]
    Resample(String),

    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to launch ffmpeg ({binary}): {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg failed with {status}: {stderr}")]
    Ffmpeg { status: String, stderr: String },

    #[error("ffmpeg timed out after {0}s")]
    Timeout(u64),
}
