use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path} not found — run `spectrum init` in the project root first")]
    NotInitialized { path: PathBuf },

    #[error("failed to read config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write config to {path}")]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "spectrum.config.json is incomplete; missing: {}",
        missing.join(", ")
    )]
    IncompleteConfig { missing: Vec<&'static str> },

    // ── Rendered artifacts ──
    #[error("failed to create scratch directory {path}")]
    ScratchDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write artifact {path}")]
    ArtifactWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to render artifact {name}")]
    ArtifactRender {
        name: &'static str,
        source: serde_json::Error,
    },

    #[error("artifact path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
}
