//! Command handlers.
//!
//! Each handler writes its primary output to the supplied writer and reports
//! progress through the [`Context`], so the binary and the tests share one
//! code path.

pub mod instance_env;
pub mod yaml;

use std::io::Write;

use zcc_core::Context;

use crate::cli::{Command, InstanceEnvCommand, YamlCommand};
use crate::error::Result;

/// Banner printed before converted YAML in verbose mode.
pub const STDOUT_YAML_SEPARATOR: &str = "========== Converted YAML configuration ==========";

/// Run `command`, writing any document it prints to `out`.
///
/// # Errors
///
/// Propagates the failure of the selected handler.
pub fn dispatch<W: Write>(command: &Command, ctx: &Context, out: &mut W) -> Result<()> {
    match command {
        Command::InstanceEnv(InstanceEnvCommand::ToYaml { env_file }) => {
            instance_env::to_yaml(env_file, ctx, out)
        }
        Command::Yaml(yaml_command) => match yaml_command {
            YamlCommand::Read { file } => yaml::read(file, out),
            YamlCommand::Convert(args) => yaml::convert(args, ctx),
            YamlCommand::ToEnv(args) => yaml::to_env(args, ctx),
            YamlCommand::Update { file, path, value } => yaml::update(file, path, value, ctx),
            YamlCommand::Delete { file, path } => yaml::delete(file, path, ctx),
            YamlCommand::UpdateAll {
                env_file,
                yaml_file,
            } => yaml::update_all(env_file, yaml_file, ctx),
        },
    }
}
