//! `zcc instance-env` handlers.

use std::io::Write;

use camino::Utf8Path;
use zcc_core::env_file::read_with_certificates;
use zcc_core::file::{self, Format};
use zcc_core::{Context, mapping};

use super::STDOUT_YAML_SEPARATOR;
use crate::error::Result;

/// Print the YAML equivalent of a legacy `instance.env` file, including the
/// certificate settings of its keystore directory.
///
/// # Errors
///
/// Propagates read, mapping and output failures.
pub fn to_yaml<W: Write>(env_file: &Utf8Path, ctx: &Context, out: &mut W) -> Result<()> {
    let flat = read_with_certificates(env_file)?;
    let tree = mapping::to_tree(&flat, ctx)?;
    let rendered = file::render(&tree, Format::Yaml)?;
    if ctx.is_verbose() {
        writeln!(out, "\n{STDOUT_YAML_SEPARATOR}")?;
    }
    out.write_all(rendered.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use rstest::rstest;
    use test_helpers::workspace::TempWorkspace;

    #[rstest]
    #[case(false, false)]
    #[case(true, true)]
    fn prints_yaml_with_optional_banner(
        #[case] verbose: bool,
        #[case] banner: bool,
    ) -> Result<()> {
        let ws = TempWorkspace::new()?;
        let env = ws.write("instance.env", "ZOWE_PREFIX=ZWE1\nGATEWAY_PORT=7554\n")?;
        let mut out = Vec::new();
        to_yaml(&env, &Context::new(verbose), &mut out)?;
        let text = String::from_utf8(out)?;
        ensure!(text.contains(STDOUT_YAML_SEPARATOR) == banner, "got:\n{text}");
        ensure!(text.contains("jobPrefix: ZWE1"), "got:\n{text}");
        Ok(())
    }

    #[rstest]
    fn merges_certificate_settings() -> Result<()> {
        let ws = TempWorkspace::new()?;
        let keystore = ws.mkdir("keystore")?;
        ws.write(
            "keystore/zowe-certificates.env",
            "KEYSTORE_PASSWORD=password\n",
        )?;
        let env = ws.write(
            "instance.env",
            &format!("ZOWE_PREFIX=ZWE1\nKEYSTORE_DIRECTORY={keystore}\n"),
        )?;
        let mut out = Vec::new();
        to_yaml(&env, &Context::default(), &mut out)?;
        let text = String::from_utf8(out)?;
        ensure!(text.contains("password"), "got:\n{text}");
        Ok(())
    }
}
