// ABOUTME: svboot library: the prepare, render, launch bootstrap pipeline.
// ABOUTME: Each stage is a typestate so the supervisor cannot start out of order.

pub mod supervisor;

pub use supervisor::SupervisorCommand;
pub use svboot_core::{
    BootstrapError, EnvProvider, LauncherConfig, MapEnv, Mode, ProcessEnv, RenderedConfig,
};

use std::convert::Infallible;
use svboot_core::{reset_directory, LaunchError, RenderContext, Result};

/// Entry stage: configuration resolved, nothing touched on disk yet.
#[derive(Debug)]
pub struct Launcher {
    config: LauncherConfig,
}

/// The metrics workspace exists and is empty.
#[derive(Debug)]
pub struct Prepared {
    config: LauncherConfig,
}

/// The supervisor config is fully written; ready for hand-off.
#[derive(Debug)]
pub struct Rendered {
    config: LauncherConfig,
    rendered: RenderedConfig,
}

impl Launcher {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    /// Resolve configuration from an injected environment.
    pub fn from_env(env: &dyn EnvProvider) -> Result<Self> {
        Ok(Self::new(LauncherConfig::from_env(env)?))
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Recreate the metrics workspace empty, discarding any previous run's state.
    pub fn prepare_workspace(self) -> Result<Prepared> {
        reset_directory(&self.config.metrics_dir)?;
        tracing::info!(path = %self.config.metrics_dir.display(), "Workspace prepared");
        Ok(Prepared {
            config: self.config,
        })
    }
}

impl Prepared {
    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Render the supervisor config for the configured mode.
    pub fn render_config(self) -> Result<Rendered> {
        let rendered = render(&self.config)?;
        Ok(Rendered {
            config: self.config,
            rendered,
        })
    }
}

impl Rendered {
    pub fn rendered(&self) -> &RenderedConfig {
        &self.rendered
    }

    /// The invocation that `launch_supervisor` will exec.
    pub fn command(&self) -> SupervisorCommand {
        SupervisorCommand {
            binary: self.config.supervisor_bin.clone(),
            config_path: self.rendered.path.clone(),
            data_dir: self.config.supervisor_dir(),
            log_path: self.config.log_path.clone(),
            log_mode: self.config.log_mode,
        }
    }

    /// Replace this process with the supervisor. Only returns on failure.
    pub fn launch_supervisor(self) -> std::result::Result<Infallible, LaunchError> {
        self.command().exec()
    }
}

fn render(config: &LauncherConfig) -> Result<RenderedConfig> {
    let rendered = svboot_core::render_config(
        config.mode.raw(),
        &RenderContext::from(config),
        &config.config_path(),
    )?;
    tracing::info!(
        mode = %rendered.mode,
        path = %rendered.path.display(),
        "Supervisor config rendered"
    );
    Ok(rendered)
}

/// Run the whole bootstrap. Returns only if a stage failed.
pub fn bootstrap(env: &dyn EnvProvider) -> Result<Infallible> {
    let rendered = Launcher::from_env(env)?
        .prepare_workspace()?
        .render_config()?;
    rendered.launch_supervisor().map_err(Into::into)
}

/// Render the config without touching the workspace or launching anything.
pub fn render_only(env: &dyn EnvProvider) -> Result<RenderedConfig> {
    let config = LauncherConfig::from_env(env)?;
    render(&config)
}
