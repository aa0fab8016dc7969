use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use libjjrun::ErrorStrategy;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("color_mode")
        .args(["color", "no_color"])
))]
#[command(group(
    ArgGroup::new("user_command")
        .args(["command", "args"])
        .required(true)
))]
/// Run a shell command on every change in a revset and fold the results back into history.
pub struct Cli {
    /// Revset selecting the changes to process
    #[arg(short = 'r', long, value_name = "REVSET")]
    pub revset: String,

    /// What to do when the command fails for a change
    #[arg(
        short = 'e',
        long = "err-strategy",
        value_enum,
        default_value_t = StrategyArg::Continue
    )]
    pub err_strategy: StrategyArg,

    /// Command to execute on each change
    #[arg(short = 'c', long, value_name = "CMD")]
    pub command: Option<String>,

    /// Command to execute, given as trailing words
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub args: Vec<String>,

    /// Override the repository directory (defaults to the enclosing jj repo)
    #[arg(long, value_name = "DIR")]
    pub repo_dir: Option<String>,

    /// Path to the jj binary
    #[arg(long, value_name = "PATH")]
    pub jj: Option<String>,

    /// Shell used to run the command
    #[arg(long, value_name = "PATH")]
    pub shell: Option<String>,

    /// Directory in which the scratch workspace is created
    #[arg(long, value_name = "DIR")]
    pub tmp_dir: Option<String>,

    /// Enable colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Suppress all output
    #[arg(long)]
    pub quiet: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The user command, from `-c` or the trailing words joined by spaces.
    pub fn user_command(&self) -> String {
        match &self.command {
            Some(command) => command.clone(),
            None => self.args.join(" "),
        }
    }
}

/// Command-line spelling of [`ErrorStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Record the failure and carry on with the next change
    Continue,
    /// Stop after the failing change, keeping the work done so far
    Stop,
    /// Abort at the failing change and exit with the command's status
    Fatal,
}

impl From<StrategyArg> for ErrorStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Continue => Self::Continue,
            StrategyArg::Stop => Self::Stop,
            StrategyArg::Fatal => Self::Fatal,
        }
    }
}
