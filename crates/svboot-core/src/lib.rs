// ABOUTME: Shared types for the svboot supervisor bootstrap launcher.
// ABOUTME: Contains env-backed config, modes, workspace reset, rendering and errors.

pub mod config;
pub mod error;
pub mod mode;
pub mod render;
pub mod workspace;

pub use config::{EnvProvider, LauncherConfig, LogMode, MapEnv, ModeSource, ProcessEnv};
pub use error::{
    BootstrapError, ConfigError, FilesystemError, FsOp, LaunchError, RenderError, Result,
};
pub use mode::{Mode, Role};
pub use render::{render_config, RenderContext, RenderedConfig};
pub use workspace::reset_directory;
