//! In-memory [`Vcs`] used to exercise the run pipeline without a jj binary.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use crate::{
    change::Change,
    error::{JjRunError, Result},
    exec::CommandOutput,
    jj::Vcs,
};

/// Behaviour of the scripted user command for one target change.
#[derive(Debug, Clone, Copy)]
pub struct Scripted {
    /// Exit code the command reports.
    pub code: i32,
    /// Whether the command leaves modified content behind.
    pub modifies: bool,
}

impl Scripted {
    /// A command that succeeds and edits files.
    pub const EDIT: Self = Self {
        code: 0,
        modifies: true,
    };
    /// A command that succeeds without touching anything.
    pub const NOOP: Self = Self {
        code: 0,
        modifies: false,
    };

    /// A command that exits with `code` after editing files.
    pub const fn fail(code: i32) -> Self {
        Self {
            code,
            modifies: true,
        }
    }
}

/// Mutable state behind the fake.
#[derive(Default)]
struct State {
    /// Every live change, keyed by change id.
    changes: BTreeMap<String, Change>,
    /// Changes selected by a narrowed target revset, in order.
    targets: Vec<String>,
    /// New changes whose content differs from their parent.
    modified: BTreeSet<String>,
    /// Registered workspace names, including `default`.
    workspaces: Vec<String>,
    /// Workspace name registered at each scratch path.
    workspace_paths: HashMap<PathBuf, String>,
    /// Bootstrap change of each registered workspace.
    bootstraps: HashMap<String, String>,
    /// Working-copy change of the scratch workspace.
    working_copy: Option<String>,
    /// Target the scratch working copy was created on.
    checked_out: Option<String>,
    /// Counter for generated change ids.
    next_id: usize,
    /// Log of every call, in order.
    calls: Vec<String>,
}

/// Scripted stand-in for jj.
pub struct FakeVcs {
    /// Repository root reported to callers.
    repo_dir: PathBuf,
    /// Simulated repository state.
    state: RefCell<State>,
    /// Per-target behaviour of the user command.
    script: Box<dyn Fn(&Change) -> Scripted>,
    /// Call prefix that should fail as a tool fault.
    fail_on: RefCell<Option<String>>,
    /// Counter used to fabricate operation ids.
    operations: Cell<usize>,
}

impl FakeVcs {
    /// Build a fake with `count` linear target changes (`c1`, `c2`, ...).
    pub fn linear(
        repo_dir: &Path,
        count: usize,
        script: impl Fn(&Change) -> Scripted + 'static,
    ) -> Self {
        let mut state = State {
            workspaces: vec!["default".to_string()],
            ..State::default()
        };
        let mut parent = "root".to_string();
        for n in 1..=count {
            let change = Change {
                change_id: format!("c{n}"),
                commit_id: format!("commit-c{n}"),
                description: format!("change {n}\n"),
                parents: vec![parent.clone()],
            };
            parent = change.commit_id.clone();
            state.targets.push(change.change_id.clone());
            state.changes.insert(change.change_id.clone(), change);
        }
        Self {
            repo_dir: repo_dir.to_path_buf(),
            state: RefCell::new(state),
            script: Box::new(script),
            fail_on: RefCell::new(None),
            operations: Cell::new(0),
        }
    }

    /// Make every call whose log entry starts with `prefix` fail.
    pub fn fail_on(&self, prefix: &str) {
        *self.fail_on.borrow_mut() = Some(prefix.to_string());
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Calls starting with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    /// Currently registered workspace names.
    pub fn workspaces(&self) -> Vec<String> {
        self.state.borrow().workspaces.clone()
    }

    /// Whether a change with `change_id` still exists.
    pub fn exists(&self, change_id: &str) -> bool {
        self.state.borrow().changes.contains_key(change_id)
    }

    /// Record `call` and fail if it matches the configured failure prefix.
    fn record(&self, call: String) -> Result<()> {
        let fail = self
            .fail_on
            .borrow()
            .as_ref()
            .is_some_and(|prefix| call.starts_with(prefix.as_str()));
        self.state.borrow_mut().calls.push(call.clone());
        if fail {
            return Err(JjRunError::Tool(format!("scripted failure: {call}")));
        }
        Ok(())
    }

    /// Serialize changes the way `json(self)` output arrives: concatenated records.
    fn stream(changes: &[Change]) -> String {
        changes
            .iter()
            .map(|change| serde_json::to_string(change).unwrap_or_default())
            .collect()
    }

    /// Strip a `present(...)` wrapper from a revset.
    fn unwrap_present(revset: &str) -> Option<&str> {
        revset.strip_prefix("present(")?.strip_suffix(')')
    }
}

impl Vcs for FakeVcs {
    fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn current_operation(&self) -> Result<String> {
        self.record("op".to_string())?;
        let next = self.operations.get() + 1;
        self.operations.set(next);
        Ok(format!("op{next}"))
    }

    fn add_workspace(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.record(format!("workspace add {name}"))?;

        let mut state = self.state.borrow_mut();
        let bootstrap = Change {
            change_id: format!("boot-{name}"),
            commit_id: format!("commit-boot-{name}"),
            description: String::new(),
            parents: vec!["root".to_string()],
        };
        state.workspaces.push(name.clone());
        state.workspace_paths.insert(path.to_path_buf(), name.clone());
        state
            .bootstraps
            .insert(name, bootstrap.change_id.clone());
        state.working_copy = Some(bootstrap.change_id.clone());
        state.changes.insert(bootstrap.change_id.clone(), bootstrap);
        Ok(())
    }

    fn list_workspaces(&self) -> Result<Vec<String>> {
        self.record("workspace list".to_string())?;
        Ok(self.workspaces())
    }

    fn forget_workspace(&self, name: &str) -> Result<()> {
        self.record(format!("workspace forget {name}"))?;
        let mut state = self.state.borrow_mut();
        let before = state.workspaces.len();
        state.workspaces.retain(|w| w != name);
        if state.workspaces.len() == before {
            return Err(JjRunError::Tool(format!("No such workspace: {name}")));
        }
        Ok(())
    }

    fn log_json(&self, revset: &str, _cwd: &Path) -> Result<String> {
        self.record(format!("log {revset}"))?;
        let state = self.state.borrow();
        let lookup = |id: &str| state.changes.get(id).cloned();

        let selected: Vec<Change> = if revset == "@" {
            state.working_copy.as_deref().and_then(lookup).into_iter().collect()
        } else if let Some(id) = Self::unwrap_present(revset) {
            lookup(id).into_iter().collect()
        } else if let Some(name) = revset.strip_suffix('@') {
            state
                .bootstraps
                .get(name)
                .and_then(|id| lookup(id))
                .into_iter()
                .collect()
        } else if revset.contains(" ~ ") {
            state.targets.iter().filter_map(|id| lookup(id)).collect()
        } else {
            return Err(JjRunError::Tool(format!("unsupported revset: {revset}")));
        };

        Ok(Self::stream(&selected))
    }

    fn new_change(&self, change_id: &str, _cwd: &Path) -> Result<()> {
        self.record(format!("new {change_id}"))?;
        let mut state = self.state.borrow_mut();
        let target = state
            .changes
            .get(change_id)
            .cloned()
            .ok_or_else(|| JjRunError::Tool(format!("Revision {change_id} doesn't exist")))?;

        // jj drops an empty, undescribed working copy when it moves away from it.
        if let Some(previous) = state.working_copy.clone()
            && previous.starts_with("new")
            && !state.modified.contains(&previous)
        {
            state.changes.remove(&previous);
        }

        state.next_id += 1;
        let change = Change {
            change_id: format!("new{}", state.next_id),
            commit_id: format!("commit-new{}", state.next_id),
            description: String::new(),
            parents: vec![target.commit_id.clone()],
        };
        state.working_copy = Some(change.change_id.clone());
        state.checked_out = Some(target.change_id);
        state.changes.insert(change.change_id.clone(), change);
        Ok(())
    }

    fn run_user_command(&self, command: &str, _cwd: &Path) -> Result<CommandOutput> {
        let target = {
            let state = self.state.borrow();
            state
                .checked_out
                .as_ref()
                .and_then(|id| state.changes.get(id).cloned())
                .ok_or_else(|| JjRunError::Tool("nothing checked out".to_string()))?
        };
        self.record(format!("run {}", target.change_id))?;

        let scripted = (self.script)(&target);
        let mut state = self.state.borrow_mut();
        if scripted.modifies
            && let Some(wc) = state.working_copy.clone()
        {
            state.modified.insert(wc);
        }
        Ok(CommandOutput {
            stdout: format!("{command} on {}\n", target.change_id),
            stderr: if scripted.code == 0 {
                String::new()
            } else {
                format!("failed on {}\n", target.change_id)
            },
            code: scripted.code,
        })
    }

    fn is_empty(&self, change_id: &str, _cwd: &Path) -> Result<Option<bool>> {
        self.record(format!("empty {change_id}"))?;
        let state = self.state.borrow();
        if !state.changes.contains_key(change_id) {
            return Ok(None);
        }
        Ok(Some(!state.modified.contains(change_id)))
    }

    fn edit(&self, revision: &str, _cwd: &Path) -> Result<()> {
        self.record(format!("edit {revision}"))?;
        let state = self.state.borrow();
        if !state.changes.values().any(|c| c.commit_id == revision) {
            return Err(JjRunError::Tool(format!("Revision {revision} doesn't exist")));
        }
        Ok(())
    }

    fn restore_descendants_from(&self, change_id: &str, _cwd: &Path) -> Result<()> {
        self.record(format!("restore {change_id}"))
    }

    fn abandon(&self, change_id: &str) -> Result<()> {
        self.record(format!("abandon {change_id}"))?;
        let mut state = self.state.borrow_mut();
        state.changes.remove(change_id);
        state.targets.retain(|id| id != change_id);
        Ok(())
    }

    fn update_stale(&self, cwd: &Path) -> Result<()> {
        let state = self.state.borrow();
        let call = if cwd == self.repo_dir {
            "update-stale repo".to_string()
        } else {
            let name = state.workspace_paths.get(cwd).cloned().unwrap_or_default();
            if !state.workspaces.contains(&name) {
                drop(state);
                self.record("update-stale scratch".to_string())?;
                return Err(JjRunError::Tool("no such workspace".to_string()));
            }
            "update-stale scratch".to_string()
        };
        drop(state);
        self.record(call)
    }
}
