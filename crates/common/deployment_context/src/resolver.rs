use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error::ResolutionError;

pub const ENV_ASSET_DIR: &str = "ASSET_DIR";
pub const ENV_DEPLOYMENT_HOME: &str = "DEPLOYMENT_HOME";
pub const PROPERTIES_FILE_NAME: &str = "deployment.properties";

/// Well-known directory scanned for deployment homes when no override is set.
const DEFAULT_RUNTIME_DIR: &str = "/var/opt";

/// Directory names containing this substring are deployment home candidates.
const DEPLOYMENT_DIR_MARKER: &str = "Deployment";

/// Inputs of the resolution, gathered explicitly instead of being read from
/// ambient process state at the point of use.
///
/// Tests build settings by hand; production callers use
/// [`ContextSettings::from_env`].
#[derive(Debug, Clone)]
pub struct ContextSettings {
    pub asset_dir_override: Option<PathBuf>,
    pub deployment_home_override: Option<PathBuf>,
    pub runtime_dir: PathBuf,
    pub executable_path: Option<PathBuf>,
}

impl ContextSettings {
    /// Capture the overrides and process state the resolution depends on.
    ///
    /// An environment variable set to an empty string counts as unset.
    pub fn from_env() -> Self {
        Self {
            asset_dir_override: env_path(ENV_ASSET_DIR),
            deployment_home_override: env_path(ENV_DEPLOYMENT_HOME),
            runtime_dir: PathBuf::from(DEFAULT_RUNTIME_DIR),
            executable_path: std::env::current_exe().ok(),
        }
    }

    pub fn with_runtime_dir(self, runtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
            ..self
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

/// The resolved deployment environment, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentContext {
    pub asset_dir: PathBuf,
    pub deployment_home: PathBuf,
    pub deployment_properties: PathBuf,
}

impl DeploymentContext {
    /// Resolve all three context values, or fail on the first one that
    /// cannot be determined.
    ///
    /// The failure is logged at ERROR right before being returned, so the
    /// automation log states which precondition broke even when the caller
    /// aborts without further diagnostics.
    pub fn resolve(settings: &ContextSettings) -> Result<Self, ResolutionError> {
        Self::try_resolve(settings).inspect_err(|err| error!("{err}"))
    }

    fn try_resolve(settings: &ContextSettings) -> Result<Self, ResolutionError> {
        let asset_dir = resolve_asset_dir(settings)?;
        let deployment_home = resolve_deployment_home(settings)?;
        let deployment_properties = resolve_deployment_properties(&deployment_home)?;
        Ok(DeploymentContext {
            asset_dir,
            deployment_home,
            deployment_properties,
        })
    }
}

/// Determine the asset directory of the running automation unit.
///
/// The override is used verbatim. The fallback takes the directory holding
/// the invoking executable and uses that directory's parent.
pub fn resolve_asset_dir(settings: &ContextSettings) -> Result<PathBuf, ResolutionError> {
    if let Some(asset_dir) = &settings.asset_dir_override {
        info!("Using asset directory from {ENV_ASSET_DIR}: {asset_dir:?}");
        return Ok(asset_dir.clone());
    }

    warn!("{ENV_ASSET_DIR} is not set, deriving the asset directory from the executable location");

    let executable = settings.executable_path.as_deref().ok_or(
        ResolutionError::AssetDirUndetermined {
            reason: "the executable location is unknown",
        },
    )?;
    let asset_dir = executable
        .parent()
        .and_then(Path::parent)
        .ok_or(ResolutionError::AssetDirUndetermined {
            reason: "the executable location has no parent directory",
        })?;

    info!("Derived asset directory {asset_dir:?} from {executable:?}");
    Ok(asset_dir.to_path_buf())
}

/// Outcome of scanning the runtime directory for deployment homes.
///
/// The three cases are kept apart so callers choose an explicit policy
/// instead of silently assuming a unique match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentHomeScan {
    NotFound,
    Unique(PathBuf),
    Multiple(Vec<PathBuf>),
}

/// List the child directories of `runtime_dir` whose name contains
/// [`DEPLOYMENT_DIR_MARKER`].
///
/// Non-directory entries are ignored. A missing runtime directory counts as
/// no match rather than an error.
pub fn scan_for_deployment_home(runtime_dir: &Path) -> Result<DeploymentHomeScan, ResolutionError> {
    let entries = match std::fs::read_dir(runtime_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(DeploymentHomeScan::NotFound)
        }
        Err(err) => return Err(err.into()),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let is_candidate = name.to_str().is_some_and(|name| name.contains(DEPLOYMENT_DIR_MARKER));
        if is_candidate && entry.file_type()?.is_dir() {
            candidates.push(entry.path());
        }
    }
    candidates.sort();

    match candidates.len() {
        0 => Ok(DeploymentHomeScan::NotFound),
        1 => Ok(DeploymentHomeScan::Unique(candidates.remove(0))),
        _ => Ok(DeploymentHomeScan::Multiple(candidates)),
    }
}

/// Determine the deployment home.
///
/// The override is used verbatim. The fallback scans the runtime directory
/// and requires exactly one matching child directory; zero or several
/// matches are distinct errors.
pub fn resolve_deployment_home(settings: &ContextSettings) -> Result<PathBuf, ResolutionError> {
    if let Some(deployment_home) = &settings.deployment_home_override {
        info!("Using deployment home from {ENV_DEPLOYMENT_HOME}: {deployment_home:?}");
        return Ok(deployment_home.clone());
    }

    warn!(
        "{ENV_DEPLOYMENT_HOME} is not set, scanning {:?} for a deployment directory",
        settings.runtime_dir
    );

    match scan_for_deployment_home(&settings.runtime_dir)? {
        DeploymentHomeScan::Unique(deployment_home) => {
            info!("Found deployment home {deployment_home:?}");
            Ok(deployment_home)
        }
        DeploymentHomeScan::NotFound => Err(ResolutionError::DeploymentHomeNotFound {
            runtime_dir: settings.runtime_dir.clone(),
        }),
        DeploymentHomeScan::Multiple(candidates) => Err(ResolutionError::AmbiguousDeploymentHome {
            runtime_dir: settings.runtime_dir.clone(),
            candidates,
        }),
    }
}

/// Locate the deployment properties file inside an already resolved
/// deployment home.
pub fn resolve_deployment_properties(deployment_home: &Path) -> Result<PathBuf, ResolutionError> {
    let path = deployment_home.join(PROPERTIES_FILE_NAME);
    if !path.is_file() {
        return Err(ResolutionError::PropertiesNotFound { path });
    }
    info!("Using deployment properties {path:?}");
    Ok(path)
}
