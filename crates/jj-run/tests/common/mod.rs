use anyhow::{Context, Result, ensure};
use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};
use tempfile::TempDir;

/// Return the path to the compiled `jj-run` binary for integration-style tests.
pub fn jj_run_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_jj-run"))
}

/// Environment variable that turns a missing `jj` into a test failure.
pub const REQUIRE_JJ: &str = "JJ_RUN_REQUIRE_JJ";

/// Whether a usable `jj` is on `PATH`. Tests that need one return early
/// otherwise, unless [`REQUIRE_JJ`] is set, in which case they fail.
pub fn jj_available() -> bool {
    let found = Command::new("jj")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());
    if !found {
        assert!(
            env::var_os(REQUIRE_JJ).is_none(),
            "jj not found on PATH but {REQUIRE_JJ} is set"
        );
        eprintln!("skipping: jj not found on PATH (set {REQUIRE_JJ} to fail instead)");
    }
    found
}

/// Apply a deterministic, user-independent jj environment to `cmd`.
fn isolate(cmd: &mut Command, repo_path: &Path) {
    let config = repo_path
        .parent()
        .unwrap_or(repo_path)
        .join("jj-config.toml");
    cmd.env("JJ_CONFIG", config)
        .env("JJ_USER", "Test User")
        .env("JJ_EMAIL", "test@example.com")
        .env("PAGER", "cat")
        .env_remove("JJ_RUN_REPO_DIR")
        .env_remove("JJ_RUN_JJ")
        .env_remove("JJ_RUN_SHELL")
        .env_remove("JJ_RUN_TMPDIR");
}

/// Run a jj command inside `repo_path`, ensuring it succeeds.
pub fn jj(repo_path: &Path, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new("jj");
    cmd.current_dir(repo_path).args(args);
    isolate(&mut cmd, repo_path);
    let output = cmd
        .output()
        .with_context(|| format!("failed to run jj {}", args.join(" ")))?;

    ensure!(
        output.status.success(),
        "jj command failed: jj {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(output)
}

/// Run a jj command and return its stdout as a string.
pub fn jj_stdout(repo_path: &Path, args: &[&str]) -> Result<String> {
    Ok(String::from_utf8_lossy(&jj(repo_path, args)?.stdout).into_owned())
}

/// Commit a change adding the listed `(file, content)` pairs.
pub fn commit(repo_path: &Path, message: &str, files: &[(&str, &str)]) -> Result<()> {
    let mut args = vec!["commit", "-m", message];
    for (name, content) in files {
        fs::write(repo_path.join(name), content)?;
        args.push(*name);
    }
    jj(repo_path, &args)?;
    Ok(())
}

/// Create a temporary jj repository with the provided name relative to the temp dir.
pub fn create_repo(repo_name: &str) -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let repo_path = temp_dir.path().join(repo_name);
    fs::create_dir_all(&repo_path)?;
    fs::write(temp_dir.path().join("jj-config.toml"), "")?;
    jj(&repo_path, &["git", "init"])?;
    Ok((temp_dir, repo_path))
}

/// Run `jj-run` from `repo_path`, placing scratch workspaces under `scratch`.
pub fn run_jj_run(repo_path: &Path, scratch: &Path, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(jj_run_binary());
    cmd.current_dir(repo_path)
        .arg("--no-color")
        .arg("--tmp-dir")
        .arg(scratch)
        .args(args);
    isolate(&mut cmd, repo_path);
    cmd.output()
        .with_context(|| format!("failed to run jj-run {}", args.join(" ")))
}

/// Names of the workspaces registered in the repository.
pub fn workspace_names(repo_path: &Path) -> Result<Vec<String>> {
    Ok(jj_stdout(repo_path, &["workspace", "list"])?
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(name, _)| name.trim().to_string())
        .collect())
}

/// Print captured process output, for diagnosing a failed assertion.
pub fn dump(output: &Output) {
    eprintln!("status: {}", output.status);
    eprintln!("stdout: {}", String::from_utf8_lossy(&output.stdout));
    eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
}
