//! Settings layered from the command line over the process environment.
//!
//! Command-line values win; `WORKSPACE_DIR` and `HA_INSTANCE_ID` fill the
//! gaps. Without an instance id `convert` falls back to the hostname.

use camino::Utf8PathBuf;
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use zcc_core::workspace::WORKSPACE_ENV;

use crate::error::Result;

/// Environment variable naming the instance being processed.
pub const INSTANCE_ENV: &str = "HA_INSTANCE_ID";

/// Environment variable that switches on verbose output.
pub const VERBOSE_ENV: &str = "ZOWE_CONFIG_CONVERTER_VERBOSE";

/// Workspace and instance selection shared by the workspace commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Directory receiving converted files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_dir: Option<Utf8PathBuf>,
    /// Instance to process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ha_instance_id: Option<String>,
}

impl WorkspaceSettings {
    /// Layer `cli` over the environment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CliError::Settings`] when a value cannot be
    /// extracted.
    pub fn load(cli: &Self) -> Result<Self> {
        let settings = Figment::from(Env::raw().only(&[WORKSPACE_ENV, INSTANCE_ENV]))
            .merge(Serialized::defaults(cli))
            .extract()?;
        Ok(settings)
    }

    /// Configured instance id, ignoring an empty value.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.ha_instance_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Configured instance id, else the hostname of this system. Empty when
    /// neither is known.
    #[must_use]
    pub fn instance_id_or_hostname(&self) -> String {
        self.instance_id().map_or_else(system_hostname, str::to_owned)
    }
}

/// Whether [`VERBOSE_ENV`] asks for verbose output.
#[must_use]
pub fn verbose_from_env() -> bool {
    std::env::var_os(VERBOSE_ENV).is_some_and(|value| !value.is_empty())
}

#[cfg(unix)]
fn system_hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_default()
}

#[cfg(not(unix))]
fn system_hostname() -> String {
    std::env::var("COMPUTERNAME").unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use camino::Utf8Path;
    use rstest::rstest;
    use test_helpers::figment::{figment_error, with_jail};

    #[rstest]
    fn environment_fills_missing_values() -> Result<()> {
        let settings = with_jail(|jail| {
            jail.clear_env();
            jail.set_env("WORKSPACE_DIR", "/var/zowe/workspace");
            jail.set_env("HA_INSTANCE_ID", "lpar1");
            WorkspaceSettings::load(&WorkspaceSettings::default()).map_err(figment_error)
        })?;
        ensure!(settings.workspace_dir.as_deref() == Some(Utf8Path::new("/var/zowe/workspace")));
        ensure!(settings.instance_id() == Some("lpar1"));
        Ok(())
    }

    #[rstest]
    fn command_line_wins_over_environment() -> Result<()> {
        let settings = with_jail(|jail| {
            jail.clear_env();
            jail.set_env("WORKSPACE_DIR", "/from/env");
            let cli = WorkspaceSettings {
                workspace_dir: Some(Utf8PathBuf::from("/from/cli")),
                ha_instance_id: None,
            };
            WorkspaceSettings::load(&cli).map_err(figment_error)
        })?;
        ensure!(settings.workspace_dir == Some(Utf8PathBuf::from("/from/cli")));
        Ok(())
    }

    #[rstest]
    fn unrelated_variables_are_ignored() -> Result<()> {
        let settings = with_jail(|jail| {
            jail.clear_env();
            jail.set_env("ZOWE_PREFIX", "ZWE1");
            WorkspaceSettings::load(&WorkspaceSettings::default()).map_err(figment_error)
        })?;
        ensure!(settings.workspace_dir.is_none());
        Ok(())
    }

    #[rstest]
    fn explicit_instance_id_skips_hostname() {
        let settings = WorkspaceSettings {
            workspace_dir: None,
            ha_instance_id: Some(String::from("lpar2")),
        };
        assert_eq!(settings.instance_id_or_hostname(), "lpar2");
    }

    #[rstest]
    fn empty_instance_id_is_ignored() {
        let settings = WorkspaceSettings {
            workspace_dir: None,
            ha_instance_id: Some(String::new()),
        };
        assert_eq!(settings.instance_id(), None);
    }

    #[rstest]
    fn verbose_needs_a_non_empty_value() -> Result<()> {
        let flags = with_jail(|jail| {
            jail.clear_env();
            jail.set_env(VERBOSE_ENV, "");
            let empty = verbose_from_env();
            jail.set_env(VERBOSE_ENV, "1");
            Ok((empty, verbose_from_env()))
        })?;
        ensure!(flags == (false, true), "got {flags:?}");
        Ok(())
    }
}
