use std::{
    env,
    path::{Path, PathBuf},
};

use libjjrun::{JjRunError, find_root};

use crate::{args::Cli, utils::expand_tilde};

/// Environment variable overriding the repository directory.
pub const ENV_REPO_DIR: &str = "JJ_RUN_REPO_DIR";
/// Environment variable overriding the jj binary.
pub const ENV_JJ: &str = "JJ_RUN_JJ";
/// Environment variable overriding the shell used for the user command.
pub const ENV_SHELL: &str = "JJ_RUN_SHELL";
/// Environment variable overriding where scratch workspaces are created.
pub const ENV_TMPDIR: &str = "JJ_RUN_TMPDIR";

/// Default jj binary, looked up on `PATH`.
const DEFAULT_JJ: &str = "jj";
/// Default shell for the user command.
const DEFAULT_SHELL: &str = "sh";

/// Settings for one invocation after flags, environment and defaults are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root of the repository to rewrite.
    pub repo_dir: PathBuf,
    /// jj executable.
    pub jj: String,
    /// Shell interpreting the user command.
    pub shell: String,
    /// Parent directory for the scratch workspace.
    pub tmp_dir: PathBuf,
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env(cli: &Cli) -> Result<Self, JjRunError> {
        let cwd = env::current_dir()?;
        Self::resolve(cli, &cwd, |key| env::var(key).ok())
    }

    /// Resolve settings with priority CLI flag > environment variable > default.
    ///
    /// The repository defaults to the nearest ancestor of `cwd` holding a
    /// `.jj` directory; an explicit directory must itself be a repository root.
    pub fn resolve(
        cli: &Cli,
        cwd: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, JjRunError> {
        let pick = |flag: &Option<String>, key: &str| flag.clone().or_else(|| lookup(key));

        let repo_dir = match pick(&cli.repo_dir, ENV_REPO_DIR) {
            Some(dir) => {
                let dir = expand_tilde(&dir);
                let dir = if dir.is_absolute() { dir } else { cwd.join(dir) };
                if !dir.join(".jj").is_dir() {
                    return Err(JjRunError::Context(format!(
                        "{} is not a jj repository",
                        dir.display()
                    )));
                }
                dir
            }
            None => find_root(cwd).ok_or_else(|| {
                JjRunError::Context("Not in a jj repository (no .jj directory found)".to_string())
            })?,
        };

        let tmp_dir = pick(&cli.tmp_dir, ENV_TMPDIR)
            .map(|dir| expand_tilde(&dir))
            .unwrap_or_else(env::temp_dir);
        if !tmp_dir.is_dir() {
            return Err(JjRunError::Context(format!(
                "Scratch directory {} does not exist",
                tmp_dir.display()
            )));
        }

        Ok(Self {
            repo_dir,
            jj: pick(&cli.jj, ENV_JJ).unwrap_or_else(|| DEFAULT_JJ.to_string()),
            shell: pick(&cli.shell, ENV_SHELL).unwrap_or_else(|| DEFAULT_SHELL.to_string()),
            tmp_dir,
        })
    }
}
