//! Runs the compiled `zcc` binary against throwaway workspaces.

use anyhow::{Result, ensure};
use assert_cmd::Command;
use rstest::rstest;
use test_helpers::workspace::TempWorkspace;

const ZOWE_YAML: &str = "\
zowe:
  externalDomains:
    - zos.example.com
  externalPort: 7554 # external port
  jobPrefix: ZWE
components:
  gateway:
    enabled: true
    port: 7554
haInstances:
  lpar1:
    hostname: lpar1.example.com
";

struct Run {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

fn zcc(ws: &TempWorkspace, args: &[&str], env: &[(&str, &str)]) -> Result<Run> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_zcc"));
    cmd.current_dir(ws.root())
        .env_remove("WORKSPACE_DIR")
        .env_remove("HA_INSTANCE_ID")
        .env_remove("ZOWE_CONFIG_CONVERTER_VERBOSE")
        .env_remove("RUST_LOG")
        .envs(env.iter().copied())
        .args(args);
    let output = cmd.output()?;
    Ok(Run {
        code: output.status.code(),
        stdout: String::from_utf8(output.stdout)?,
        stderr: String::from_utf8(output.stderr)?,
    })
}

#[rstest]
fn read_prints_json() -> Result<()> {
    let ws = TempWorkspace::new()?;
    ws.write("zowe.yaml", ZOWE_YAML)?;
    let run = zcc(&ws, &["yaml", "read", "zowe.yaml"], &[])?;
    ensure!(run.code == Some(0), "stderr: {}", run.stderr);
    let tree: serde_json::Value = serde_json::from_str(&run.stdout)?;
    ensure!(tree.pointer("/zowe/externalPort") == Some(&serde_json::json!(7554)));
    Ok(())
}

#[rstest]
fn convert_without_workspace_fails() -> Result<()> {
    let ws = TempWorkspace::new()?;
    ws.write("zowe.yaml", ZOWE_YAML)?;
    let run = zcc(&ws, &["yaml", "convert", "zowe.yaml"], &[])?;
    ensure!(run.code == Some(1));
    ensure!(
        run.stderr.contains("Error: Environment WORKSPACE_DIR is required"),
        "stderr: {}",
        run.stderr
    );
    Ok(())
}

#[rstest]
#[case(&["yaml", "convert", "zowe.yaml", "--wd", "workspace", "--ha-instance-id", "lpar1"], &[])]
#[case(&["yaml", "convert", "zowe.yaml"], &[("WORKSPACE_DIR", "workspace"), ("HA_INSTANCE_ID", "lpar1")])]
fn convert_takes_settings_from_flags_or_environment(
    #[case] args: &[&str],
    #[case] env: &[(&str, &str)],
) -> Result<()> {
    let ws = TempWorkspace::new()?;
    ws.write("zowe.yaml", ZOWE_YAML)?;
    let run = zcc(&ws, args, env)?;
    ensure!(run.code == Some(0), "stderr: {}", run.stderr);
    ensure!(ws.exists("workspace/.zowe.yaml"));
    ensure!(ws.exists("workspace/.zowe-lpar1.yaml"));
    ensure!(ws.exists("workspace/.instance-lpar1.env"));
    ensure!(!ws.exists("workspace/.zowe-default.yaml"));
    Ok(())
}

#[rstest]
fn verbose_convert_reports_progress() -> Result<()> {
    let ws = TempWorkspace::new()?;
    ws.write("zowe.yaml", ZOWE_YAML)?;
    let run = zcc(
        &ws,
        &["-v", "yaml", "convert", "zowe.yaml", "--wd", "workspace", "--all-instances"],
        &[],
    )?;
    ensure!(run.code == Some(0), "stderr: {}", run.stderr);
    ensure!(run.stdout.contains("Converting zowe.yaml ..."), "stdout: {}", run.stdout);
    ensure!(ws.exists("workspace/.zowe-default.yaml"));
    ensure!(ws.exists("workspace/.zowe-lpar1.yaml"));
    Ok(())
}

#[rstest]
fn to_env_writes_every_instance() -> Result<()> {
    let ws = TempWorkspace::new()?;
    ws.write("zowe.yaml", ZOWE_YAML)?;
    let run = zcc(&ws, &["yaml", "env", "zowe.yaml"], &[])?;
    ensure!(run.code == Some(0), "stderr: {}", run.stderr);
    ensure!(ws.read(".instance-default.env")?.contains("ZOWE_PREFIX=ZWE\n"));
    ensure!(ws.exists(".instance-lpar1.env"));
    Ok(())
}

#[rstest]
fn update_and_delete_edit_in_place() -> Result<()> {
    let ws = TempWorkspace::new()?;
    ws.write("zowe.yaml", ZOWE_YAML)?;
    let updated = zcc(&ws, &["yaml", "update", "zowe.yaml", "zowe.jobPrefix", "ZWE2"], &[])?;
    ensure!(updated.code == Some(0), "stderr: {}", updated.stderr);
    let deleted = zcc(&ws, &["yaml", "delete", "zowe.yaml", "haInstances"], &[])?;
    ensure!(deleted.code == Some(0), "stderr: {}", deleted.stderr);
    let text = ws.read("zowe.yaml")?;
    ensure!(text.contains("  jobPrefix: ZWE2\n"), "got:\n{text}");
    ensure!(text.contains("  externalPort: 7554 # external port\n"), "got:\n{text}");
    ensure!(!text.contains("haInstances"), "got:\n{text}");
    Ok(())
}

#[rstest]
fn update_reports_invalid_paths() -> Result<()> {
    let ws = TempWorkspace::new()?;
    ws.write("zowe.yaml", ZOWE_YAML)?;
    let run = zcc(
        &ws,
        &["yaml", "update", "zowe.yaml", "zowe.externalDomains[5]", "x"],
        &[],
    )?;
    ensure!(run.code == Some(1));
    ensure!(run.stderr.starts_with("Error: "), "stderr: {}", run.stderr);
    ensure!(ws.read("zowe.yaml")? == ZOWE_YAML);
    Ok(())
}

#[rstest]
fn instance_env_prints_yaml() -> Result<()> {
    let ws = TempWorkspace::new()?;
    ws.write("instance.env", "ZOWE_PREFIX=ZWE1\nGATEWAY_PORT=7554\n")?;
    let run = zcc(&ws, &["--verbose", "instance-env", "to-yaml", "instance.env"], &[])?;
    ensure!(run.code == Some(0), "stderr: {}", run.stderr);
    ensure!(
        run.stdout.contains("========== Converted YAML configuration =========="),
        "stdout: {}",
        run.stdout
    );
    ensure!(run.stdout.contains("jobPrefix: ZWE1"), "stdout: {}", run.stdout);
    Ok(())
}

#[rstest]
#[case(&["yaml", "env", "zowe.yaml"])]
#[case(&["yaml", "convert", "zowe.yaml", "--wd", "workspace", "--all-instances"])]
fn consistency_warnings_do_not_fail_the_run(#[case] args: &[&str]) -> Result<()> {
    let ws = TempWorkspace::new()?;
    ws.write("zowe.yaml", &ZOWE_YAML.replace("    port: 7554\n", "    port: 7000\n"))?;
    let run = zcc(&ws, args, &[])?;
    ensure!(run.code == Some(0), "stderr: {}", run.stderr);
    ensure!(
        run.stderr.contains("Values for GATEWAY_PORT differ"),
        "stderr: {}",
        run.stderr
    );
    ensure!(!run.stderr.contains("Error: "), "stderr: {}", run.stderr);
    Ok(())
}
