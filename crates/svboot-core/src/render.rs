// ABOUTME: Renders the supervisord configuration for an operational mode.
// ABOUTME: Output is deterministic and published atomically via a temp file rename.

use crate::config::LauncherConfig;
use crate::error::RenderError;
use crate::mode::{Mode, Role};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Block a program is emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Role(Role),
    /// Runs whenever any role is active.
    Shared,
}

impl Group {
    pub fn marker(&self) -> &'static str {
        match self {
            Group::Role(role) => role.as_str(),
            Group::Shared => "shared",
        }
    }
}

/// One `[program:x]` entry in the rendered config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramSpec {
    pub name: &'static str,
    pub group: Group,
    /// Executable, relative to the installation root.
    pub command: &'static str,
}

const fn program(name: &'static str, group: Group, command: &'static str) -> ProgramSpec {
    ProgramSpec {
        name,
        group,
        command,
    }
}

/// Every program the supervisor can run, in emission order within a group.
pub const CATALOG: &[ProgramSpec] = &[
    program("regiond", Group::Role(Role::Region), "bin/regiond"),
    program("bind9", Group::Role(Role::Region), "bin/run-bind9"),
    program("proxy", Group::Role(Role::Region), "bin/run-proxy"),
    program("rackd", Group::Role(Role::Rack), "bin/rackd"),
    program("dhcpd", Group::Role(Role::Rack), "bin/run-dhcpd"),
    program("dhcpd6", Group::Role(Role::Rack), "bin/run-dhcpd6"),
    program("http", Group::Shared, "bin/run-http"),
    program("ntp", Group::Shared, "bin/run-ntp"),
    program("syslog", Group::Shared, "bin/run-syslog"),
];

/// Groups emitted for a mode, in file order.
pub fn groups_for(mode: Mode) -> Vec<Group> {
    let mut groups: Vec<Group> = mode.roles().iter().copied().map(Group::Role).collect();
    if !groups.is_empty() {
        groups.push(Group::Shared);
    }
    groups
}

/// Programs the supervisor will run in `mode`.
#[cfg(test)]
pub fn programs_for(mode: Mode) -> Vec<&'static ProgramSpec> {
    groups_for(mode)
        .into_iter()
        .flat_map(|group| CATALOG.iter().filter(move |p| p.group == group))
        .collect()
}

/// Paths the rendered file refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub root: PathBuf,
    pub data: PathBuf,
    pub metrics_dir: PathBuf,
    pub supervisor_dir: PathBuf,
}

impl From<&LauncherConfig> for RenderContext {
    fn from(config: &LauncherConfig) -> Self {
        Self {
            root: config.root.clone(),
            data: config.data.clone(),
            metrics_dir: config.metrics_dir.clone(),
            supervisor_dir: config.supervisor_dir(),
        }
    }
}

/// A config file that has been fully written to disk.
#[derive(Debug, Clone)]
pub struct RenderedConfig {
    pub path: PathBuf,
    pub mode: Mode,
    pub contents: String,
}

// supervisord interpolates %(name)s, so literal percent signs are doubled.
fn ini_path(path: &Path) -> String {
    path.display().to_string().replace('%', "%%")
}

// Double-quoted for supervisord's shell-style splitting of command and environment values.
fn quoted(path: &Path) -> String {
    let escaped = ini_path(path).replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Render the config text for `mode`. Pure: no filesystem access.
pub fn render(mode: Mode, ctx: &RenderContext) -> String {
    let sock = ctx.supervisor_dir.join("supervisord.sock");
    let mut out = String::new();

    out.push_str(&format!(
        "; supervisord configuration for mode \"{mode}\"\n; generated by svboot, changes are overwritten on every launch\n\n"
    ));

    out.push_str("[unix_http_server]\n");
    out.push_str(&format!("file={}\n\n", ini_path(&sock)));

    out.push_str("[supervisord]\n");
    out.push_str(&format!(
        "logfile={}\n",
        ini_path(&ctx.supervisor_dir.join("supervisord.log"))
    ));
    out.push_str(&format!(
        "pidfile={}\n",
        ini_path(&ctx.supervisor_dir.join("supervisord.pid"))
    ));
    out.push_str(&format!("directory={}\n", ini_path(&ctx.data)));
    out.push_str("nodaemon=true\n");
    out.push_str(&format!(
        "environment=SVBOOT_ROOT={},SVBOOT_DATA={},PROMETHEUS_MULTIPROC_DIR={}\n\n",
        quoted(&ctx.root),
        quoted(&ctx.data),
        quoted(&ctx.metrics_dir)
    ));

    out.push_str("[rpcinterface:supervisor]\n");
    out.push_str("supervisor.rpcinterface_factory=supervisor.rpcinterface:make_main_rpcinterface\n\n");

    out.push_str("[supervisorctl]\n");
    out.push_str(&format!("serverurl=unix://{}\n", ini_path(&sock)));

    let log_dir = ctx.data.join("log");
    for group in groups_for(mode) {
        out.push_str(&format!("\n; BEGIN {}\n", group.marker()));
        for program in CATALOG.iter().filter(|p| p.group == group) {
            out.push_str(&format!("[program:{}]\n", program.name));
            out.push_str(&format!(
                "command={}\n",
                quoted(&ctx.root.join(program.command))
            ));
            out.push_str("autostart=true\n");
            out.push_str("autorestart=true\n");
            out.push_str("stopasgroup=true\n");
            out.push_str("killasgroup=true\n");
            out.push_str("redirect_stderr=true\n");
            out.push_str(&format!(
                "stdout_logfile={}\n",
                ini_path(&log_dir.join(format!("{}.log", program.name)))
            ));
        }
        out.push_str(&format!("; END {}\n", group.marker()));
    }

    out
}

/// Validate `raw_mode`, render, and atomically replace the file at `target`.
///
/// The mode is parsed before anything touches the filesystem, so an invalid
/// mode leaves any existing file untouched.
pub fn render_config(
    raw_mode: &str,
    ctx: &RenderContext,
    target: &Path,
) -> Result<RenderedConfig, RenderError> {
    let mode: Mode = raw_mode.parse()?;
    let contents = render(mode, ctx);

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| RenderError::CreateDirectory {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let write_err = |source: std::io::Error| RenderError::Write {
        path: target.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".supervisord.conf.")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }
    tmp.persist(target).map_err(|e| write_err(e.error))?;

    tracing::debug!(path = %target.display(), %mode, bytes = contents.len(), "Wrote supervisor config");

    Ok(RenderedConfig {
        path: target.to_path_buf(),
        mode,
        contents,
    })
}
