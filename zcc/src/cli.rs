//! Command-line surface of `zcc`.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Convert and edit Zowe configuration.
#[derive(Debug, Parser)]
#[command(name = "zcc", version, about = "Zowe configuration converter")]
pub struct Cli {
    /// Display more processing details.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level command groups.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process legacy `instance.env` files.
    #[command(name = "instance-env", subcommand)]
    InstanceEnv(InstanceEnvCommand),
    /// Process Zowe YAML configuration.
    #[command(subcommand)]
    Yaml(YamlCommand),
}

/// Commands reading a legacy `instance.env` file.
#[derive(Debug, Subcommand)]
pub enum InstanceEnvCommand {
    /// Print an `instance.env` file as YAML configuration.
    #[command(name = "to-yaml", visible_alias = "yml")]
    ToYaml {
        /// Path to the `instance.env` file.
        env_file: Utf8PathBuf,
    },
}

/// Commands reading or editing a YAML configuration.
#[derive(Debug, Subcommand)]
pub enum YamlCommand {
    /// Print the composed configuration as JSON.
    Read {
        /// Path to the YAML configuration.
        file: Utf8PathBuf,
    },
    /// Write the composed, per-instance and per-component files into a
    /// workspace.
    Convert(ConvertArgs),
    /// Write `.instance-<id>.env` files next to the configuration.
    #[command(name = "to-env", visible_alias = "env")]
    ToEnv(ToEnvArgs),
    /// Set one value in a YAML file, keeping its comments and layout.
    Update {
        /// Path to the YAML file.
        file: Utf8PathBuf,
        /// Dotted path of the value, for example `zowe.externalPort`.
        path: String,
        /// New value.
        value: String,
    },
    /// Remove one value from a YAML file.
    Delete {
        /// Path to the YAML file.
        file: Utf8PathBuf,
        /// Dotted path of the value.
        path: String,
    },
    /// Apply every setting of an `instance.env` file to a YAML file.
    #[command(name = "update-all")]
    UpdateAll {
        /// Path to the `instance.env` file.
        env_file: Utf8PathBuf,
        /// Path to the YAML file to update.
        yaml_file: Utf8PathBuf,
    },
}

/// Arguments of `yaml convert`.
#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Path to the YAML configuration.
    pub file: Utf8PathBuf,
    /// Workspace directory; defaults to `WORKSPACE_DIR`.
    #[arg(long, visible_alias = "wd")]
    pub workspace_dir: Option<Utf8PathBuf>,
    /// Instance to convert; defaults to `HA_INSTANCE_ID`, then the hostname.
    #[arg(long, conflicts_with = "all_instances")]
    pub ha_instance_id: Option<String>,
    /// Convert `default` and every declared instance.
    #[arg(long)]
    pub all_instances: bool,
}

/// Arguments of `yaml to-env`.
#[derive(Debug, Clone, Args)]
pub struct ToEnvArgs {
    /// Path to the YAML configuration.
    pub file: Utf8PathBuf,
    /// Only render this instance; defaults to `HA_INSTANCE_ID`, otherwise
    /// every instance is rendered.
    #[arg(long)]
    pub ha_instance_id: Option<String>,
    /// Write a single instance to this file instead.
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,
}
