//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use ofs_volume::DriverConfig;
use ofs_volume::config::{DEFAULT_MOUNT_PROGRAM, DEFAULT_UNMOUNT_PROGRAM};

/// ObjectiveFS volume plugin daemon
#[derive(Parser, Debug)]
#[command(name = "ofs-plugin")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Root directory mountpoints are created under
    #[arg(long, env = "OFS_ROOT", default_value = "/var/lib/docker-volumes")]
    pub root: PathBuf,

    /// Directory the plugin socket is created in
    #[arg(long, env = "OFS_PLUGIN_DIR", default_value = "/run/docker/plugins")]
    pub plugin_dir: PathBuf,

    /// Mount helper invoked to mount a volume
    #[arg(long, env = "OFS_MOUNT_PROGRAM", default_value = DEFAULT_MOUNT_PROGRAM)]
    pub mount_program: PathBuf,

    /// Program invoked to unmount a volume
    #[arg(long, env = "OFS_UNMOUNT_PROGRAM", default_value = DEFAULT_UNMOUNT_PROGRAM)]
    pub unmount_program: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Driver configuration described by these arguments.
    #[must_use]
    pub fn config(&self) -> DriverConfig {
        DriverConfig::default()
            .with_root(&self.root)
            .with_plugin_dir(&self.plugin_dir)
            .with_mount_program(&self.mount_program)
            .with_unmount_program(&self.unmount_program)
    }

    /// Default log filter directive.
    #[must_use]
    pub const fn log_directive(&self) -> &'static str {
        if self.debug {
            "ofs=debug,tower_http=debug"
        } else {
            "ofs=info"
        }
    }
}
