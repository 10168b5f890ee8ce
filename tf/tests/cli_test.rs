//! CLI tests for the tf binary
//!
//! Each test runs in its own temp directory with HOME and XDG paths pointed
//! inside it, so logs, config and preferences never touch the real user.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PROJECT: &str = concat!(
    "<Project>\n",
    "  <ItemGroup>\n",
    "    <None Include=\"Assets\\Gen\\Foo.tt\" />\n",
    "    <Compile Include=\"Assets\\Gen\\Foo.cs\" />\n",
    "  </ItemGroup>\n",
    "  <Import Project=\"$(MSBuildToolsPath)\\Microsoft.CSharp.targets\" />\n",
    "</Project>\n",
);

fn tf(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tf").unwrap();
    cmd.current_dir(temp.path())
        .env("HOME", temp.path())
        .env("XDG_DATA_HOME", temp.path().join("data"))
        .env("XDG_CONFIG_HOME", temp.path().join("config"))
        .env_remove("RUST_LOG");
    cmd
}

/// Config forcing the Windows strategy with a fake Visual Studio tree
fn windows_setup(temp: &TempDir) {
    let vs = temp.path().join("vs").join("Microsoft Visual Studio").join("2019");
    fs::create_dir_all(vs.join("MSBuild/Current/Bin")).unwrap();
    fs::create_dir_all(vs.join("Common7/IDE")).unwrap();
    fs::write(vs.join("MSBuild/Current/Bin/MSBuild.exe"), "").unwrap();
    fs::write(vs.join("Common7/IDE/TextTransform.exe"), "").unwrap();

    fs::write(
        temp.path().join(".templatefix.yml"),
        format!(
            "tools:\n  platform: windows\n  install-root-env: TF_TEST_VS_ROOT\nprefs:\n  path: {}\n",
            temp.path().join("prefs.yml").display()
        ),
    )
    .unwrap();
}

fn project(temp: &TempDir, name: &str) -> std::path::PathBuf {
    let path = temp.path().join(name);
    fs::write(&path, PROJECT).unwrap();
    path
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_patch_check_reports_pending_change() {
    let temp = TempDir::new().unwrap();
    let path = project(&temp, "Assembly-CSharp.csproj");

    tf(&temp)
        .args(["patch", "Assembly-CSharp.csproj", "--check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("would change"));

    assert_eq!(read(&path), PROJECT);
}

#[test]
fn test_patch_writes_file() {
    let temp = TempDir::new().unwrap();
    let path = project(&temp, "Assembly-CSharp.csproj");

    tf(&temp)
        .args(["patch", "Assembly-CSharp.csproj"])
        .assert()
        .success()
        .stdout(predicate::str::contains("patched"));

    let patched = read(&path);
    assert!(patched.contains("<DependentUpon>Foo.tt</DependentUpon>"));
    assert!(patched.contains("<LastGenOutput>Foo.cs</LastGenOutput>"));
}

#[test]
fn test_fix_without_tool_leaves_files() {
    let temp = TempDir::new().unwrap();
    let path = project(&temp, "Assembly-CSharp.csproj");
    fs::write(
        temp.path().join(".templatefix.yml"),
        "tools:\n  platform: unix\n  text-templating-addin: /definitely/not/here\n",
    )
    .unwrap();

    tf(&temp)
        .arg("fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("You do not have T4 executable installed"));

    assert_eq!(read(&path), PROJECT);
}

#[test]
fn test_fix_with_fake_visual_studio() {
    let temp = TempDir::new().unwrap();
    windows_setup(&temp);
    let primary = project(&temp, "Assembly-CSharp.csproj");
    let other = project(&temp, "Unity.TextMeshPro.csproj");

    tf(&temp)
        .env("TF_TEST_VS_ROOT", temp.path().join("vs"))
        .arg("fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("fix: 1 project(s), 1 template(s), 0 transformed"));

    let patched = read(&primary);
    assert!(patched.contains("<TransformOnBuild>true</TransformOnBuild>"));
    assert!(patched.contains("<DependentUpon>Foo.tt</DependentUpon>"));
    assert_eq!(read(&other), PROJECT);

    let prefs = read(&temp.path().join("prefs.yml"));
    assert!(prefs.contains("MSBuild.exe"));
    assert!(prefs.contains("ProjectGenerationUserExtensions"));
}

#[test]
fn test_changed_survives_broken_tool() {
    let temp = TempDir::new().unwrap();
    windows_setup(&temp);
    let primary = project(&temp, "Assembly-CSharp.csproj");

    // The fake MSBuild.exe cannot be launched; the pass still completes
    tf(&temp)
        .env("TF_TEST_VS_ROOT", temp.path().join("vs"))
        .args(["changed", "Assets/Gen/Foo.tt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fix: 1 project(s)"));

    assert!(read(&primary).contains("<AutoGen>True</AutoGen>"));
}

#[test]
fn test_fix_all_includes_every_project() {
    let temp = TempDir::new().unwrap();
    windows_setup(&temp);
    project(&temp, "Assembly-CSharp.csproj");
    let other = project(&temp, "Unity.TextMeshPro.csproj");

    tf(&temp)
        .env("TF_TEST_VS_ROOT", temp.path().join("vs"))
        .args(["fix", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fix: 2 project(s)"));

    assert!(read(&other).contains("<Content Include=\"Assets\\Gen\\Foo.tt\">"));
}

#[test]
fn test_auto_transform_toggle_persists() {
    let temp = TempDir::new().unwrap();
    windows_setup(&temp);

    tf(&temp)
        .args(["auto-transform", "disable"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));

    tf(&temp)
        .args(["auto-transform", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));

    tf(&temp)
        .args(["auto-transform", "enable"])
        .assert()
        .success()
        .stdout(predicate::str::contains("enabled"));
}

#[test]
fn test_new_creates_template_once() {
    let temp = TempDir::new().unwrap();

    tf(&temp)
        .args(["new", "--dir", "Assets/Templates", "--name", "Enums"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enums.tt"));

    assert!(temp.path().join("Assets/Templates/Enums.tt").exists());

    tf(&temp)
        .args(["new", "--dir", "Assets/Templates", "--name", "Enums"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_transform_unsupported_on_unix_strategy() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".templatefix.yml"), "tools:\n  platform: unix\n").unwrap();

    tf(&temp)
        .arg("transform")
        .assert()
        .success()
        .stdout(predicate::str::contains("not supported"));
}
