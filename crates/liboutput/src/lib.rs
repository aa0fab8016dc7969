#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Terminal output abstractions for jj-run's user-facing progress reporting.
//!
//! This crate provides an [`Output`] trait that abstracts over how progress
//! messages are rendered while a batch runs. Implementations include:
//!
//! - [`Terminal`]: A color-capable terminal renderer for production use
//! - [`Quiet`]: A silent implementation that suppresses output (useful for tests)
//!
//! Long-running steps (the user command for each change) can be wrapped in a
//! [`Spinner`], which animates on a TTY and degrades to a single closing
//! message everywhere else.

use std::{
    io::{self, Write},
    result::Result as StdResult,
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

/// Indentation level (in spaces) used for nested output sections.
const INDENT: usize = 4;

/// Interval between spinner animation frames.
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Errors produced by [`Output`] implementations when writing to the terminal.
#[derive(Debug, Error)]
pub enum OutputError {
    /// A terminal/TTY related failure occurred.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Underlying I/O error while writing to the terminal.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias for output-related fallible operations.
pub type Result<T> = StdResult<T, OutputError>;

/// Abstraction over how user-facing messages are produced.
///
/// Implementations can render to a terminal, suppress output, or emit to other
/// formats (e.g. files or JSON) in the future.
pub trait Output: Send + Sync {
    /// Print an informational message.
    fn message(&self, msg: &str) -> Result<()>;
    /// Print a success message.
    fn success(&self, msg: &str) -> Result<()>;
    /// Print a warning message.
    fn warn(&self, msg: &str) -> Result<()>;
    /// Print an error/failure message.
    fn fail(&self, msg: &str) -> Result<()>;
    /// Print preformatted text verbatim (no color), honoring indentation.
    fn verbatim(&self, text: &str) -> Result<()>;
    /// Flush any buffered output.
    fn finish(&self) -> Result<()>;
    /// Print `header`, then return an output that indents everything below it.
    fn section(&self, header: &str) -> Result<Box<dyn Output>>;
    /// Start a spinner labelled with `msg` for a long-running step.
    fn spinner(&self, msg: &str) -> Spinner;
}

/// Output implementation that suppresses all messages. Useful for
/// non-interactive or test environments.
pub struct Quiet;

impl Output for Quiet {
    fn message(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn success(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn warn(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn fail(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn verbatim(&self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        Ok(())
    }

    fn section(&self, _header: &str) -> Result<Box<dyn Output>> {
        Ok(Box::new(Self))
    }

    fn spinner(&self, _msg: &str) -> Spinner {
        Spinner::silent()
    }
}

/// Color-capable terminal renderer for user messages.
#[derive(Clone)]
pub struct Terminal {
    /// Whether to emit ANSI color sequences when writing to stdout.
    color_choice: ColorChoice,
    /// Current indentation depth in spaces.
    indent: usize,
}

impl Terminal {
    /// Create a new terminal output.
    ///
    /// - `color`: when `true`, always render colored output; when `false`,
    ///   disable ANSI colors.
    pub fn new(color: bool) -> Self {
        let color_choice = if color {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };
        Self {
            color_choice,
            indent: 0,
        }
    }

    /// Write `msg` using `color` while honoring the current indentation level.
    fn write_colored(&self, msg: &str, color: Option<Color>) -> Result<()> {
        let mut stdout = StandardStream::stdout(self.color_choice);
        stdout.set_color(ColorSpec::new().set_fg(color))?;
        for line in msg.lines() {
            writeln!(stdout, "{}{line}", " ".repeat(self.indent))?;
        }
        if msg.is_empty() {
            writeln!(stdout)?;
        }
        stdout.reset()?;
        stdout.flush()?;
        Ok(())
    }
}

impl Output for Terminal {
    fn message(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Some(Color::Cyan))
    }

    fn success(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Some(Color::Green))
    }

    fn warn(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Some(Color::Rgb(255, 165, 0))) // Orange
    }

    fn fail(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Some(Color::Red))
    }

    fn verbatim(&self, text: &str) -> Result<()> {
        self.write_colored(text, None)
    }

    fn finish(&self) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    fn section(&self, header: &str) -> Result<Box<dyn Output>> {
        self.message(header)?;
        Ok(Box::new(Self {
            color_choice: self.color_choice,
            indent: self.indent + INDENT,
        }))
    }

    fn spinner(&self, msg: &str) -> Spinner {
        Spinner::start(self.clone(), msg)
    }
}

/// Progress indicator for a single long-running step.
///
/// On a TTY the spinner animates on stderr; elsewhere indicatif hides it. In
/// both cases the closing message is written through the owning terminal so it
/// ends up in the regular output stream.
pub struct Spinner {
    /// Animated progress bar, if one is being drawn.
    bar: Option<ProgressBar>,
    /// Renderer for the closing message; `None` for quiet spinners.
    sink: Option<Terminal>,
}

impl Spinner {
    /// Start an animated spinner that reports its outcome through `sink`.
    fn start(sink: Terminal, msg: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(format!("{}{msg}", " ".repeat(sink.indent)));
        bar.enable_steady_tick(SPINNER_TICK);
        Self {
            bar: Some(bar),
            sink: Some(sink),
        }
    }

    /// A spinner that draws nothing and swallows its closing message.
    pub fn silent() -> Self {
        Self {
            bar: None,
            sink: None,
        }
    }

    /// Stop the spinner and print `msg` as a success.
    pub fn finish_success(self, msg: &str) -> Result<()> {
        self.finish_with(msg, Color::Green)
    }

    /// Stop the spinner and print `msg` as a failure.
    pub fn finish_fail(self, msg: &str) -> Result<()> {
        self.finish_with(msg, Color::Red)
    }

    /// Clear the spinner line and write the closing message in `color`.
    fn finish_with(mut self, msg: &str, color: Color) -> Result<()> {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        match self.sink.take() {
            Some(sink) => sink.write_colored(msg, Some(color)),
            None => Ok(()),
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
