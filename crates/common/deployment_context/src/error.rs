use std::path::PathBuf;

/// A required environment value could not be determined.
///
/// These errors are fatal for the calling automation: there is no point
/// carrying on with a deployment whose own location is unknown.
#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    #[error("Unable to determine the asset directory: {reason}")]
    AssetDirUndetermined { reason: &'static str },

    #[error("No deployment directory found under {runtime_dir:?}")]
    DeploymentHomeNotFound { runtime_dir: PathBuf },

    #[error("Several deployment directories found under {runtime_dir:?}: {candidates:?}")]
    AmbiguousDeploymentHome {
        runtime_dir: PathBuf,
        candidates: Vec<PathBuf>,
    },

    #[error("Deployment properties file {path:?} not found")]
    PropertiesNotFound { path: PathBuf },

    #[error("Malformed property at {path:?}:{line}: expected 'key=value'")]
    MalformedProperty { path: PathBuf, line: usize },

    #[error(transparent)]
    FromIo(#[from] std::io::Error),
}
