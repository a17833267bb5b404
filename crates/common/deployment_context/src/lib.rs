//! Resolution of the deployment environment.
//!
//! Deployment automation scripts need three paths before they can do
//! anything useful: the asset directory of the automation unit being
//! deployed, the deployment home holding the deployment's runtime state, and
//! the deployment properties file inside that home. Each value is taken from
//! an environment variable when one is set, and derived from the filesystem
//! or process state otherwise.
//!
//! All three values are gathered into a [`DeploymentContext`] which is built
//! once at startup and passed by reference to whatever needs it:
//!
//! ```no_run
//! use deployment_context::ContextSettings;
//! use deployment_context::DeploymentContext;
//!
//! # fn main() -> Result<(), deployment_context::ResolutionError> {
//! let settings = ContextSettings::from_env();
//! let context = DeploymentContext::resolve(&settings)?;
//! let properties = deployment_context::load_properties(&context.deployment_properties)?;
//! # Ok(())
//! # }
//! ```
//!
//! Each value can also be resolved on its own when an automation only needs
//! one of them:
//!
//! ```no_run
//! use deployment_context::resolve_asset_dir;
//! use deployment_context::resolve_deployment_home;
//! use deployment_context::resolve_deployment_properties;
//! use deployment_context::ContextSettings;
//!
//! # fn main() -> Result<(), deployment_context::ResolutionError> {
//! let settings = ContextSettings::from_env();
//! let asset_dir = resolve_asset_dir(&settings)?;
//! let deployment_home = resolve_deployment_home(&settings)?;
//! let properties_path = resolve_deployment_properties(&deployment_home)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod properties;
mod resolver;

pub use crate::error::ResolutionError;
pub use crate::properties::load_properties;
pub use crate::resolver::resolve_asset_dir;
pub use crate::resolver::resolve_deployment_home;
pub use crate::resolver::resolve_deployment_properties;
pub use crate::resolver::scan_for_deployment_home;
pub use crate::resolver::ContextSettings;
pub use crate::resolver::DeploymentContext;
pub use crate::resolver::DeploymentHomeScan;
pub use crate::resolver::ENV_ASSET_DIR;
pub use crate::resolver::ENV_DEPLOYMENT_HOME;
pub use crate::resolver::PROPERTIES_FILE_NAME;
