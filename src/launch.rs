use std::env;
use std::process::Command;

use tracing::debug;

use crate::{DesktopEntry, DesktopEntryError, Result};

/// Terminal wrapper used when `$TERMINAL` is not set.
pub const DEFAULT_TERMINAL: &str = "xterm -e";

/// Settings for turning an entry into a runnable command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    terminal: Vec<String>,
}

impl LaunchConfig {
    /// A config using [`DEFAULT_TERMINAL`].
    pub fn new() -> Self {
        Self::with_terminal(DEFAULT_TERMINAL)
    }

    /// A config whose terminal wrapper is `$TERMINAL`, or [`DEFAULT_TERMINAL`]
    /// when that is unset or blank.
    pub fn from_env() -> Self {
        Self::from_terminal_var(env::var("TERMINAL").ok().as_deref())
    }

    /// A config with an explicit terminal wrapper, split on whitespace.
    pub fn with_terminal(terminal: &str) -> Self {
        Self {
            terminal: terminal.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// The words prefixed to commands of entries with `Terminal=true`.
    pub fn terminal(&self) -> &[String] {
        &self.terminal
    }

    fn from_terminal_var(value: Option<&str>) -> Self {
        match value {
            Some(terminal) if !terminal.trim().is_empty() => Self::with_terminal(terminal),
            _ => Self::new(),
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopEntry {
    /// Expands the Exec template and splits it into an argument vector.
    ///
    /// Entries with `Terminal=true` get the configured terminal wrapper in
    /// front.
    pub fn exec_argv<S: AsRef<str>>(
        &mut self,
        args: &[S],
        config: &LaunchConfig,
    ) -> Result<Vec<String>> {
        let command = self.parse_exec(args)?;
        let mut argv = shell_words::split(&command)
            .map_err(|err| DesktopEntryError::BadCommandLine(err.to_string()))?;
        if argv.is_empty() {
            return Err(DesktopEntryError::BadCommandLine("empty command".to_string()));
        }

        if self.terminal()? {
            let mut wrapped = config.terminal().to_vec();
            wrapped.append(&mut argv);
            argv = wrapped;
        }
        Ok(argv)
    }

    /// Builds a [`Command`] for this entry without spawning it.
    ///
    /// The working directory comes from the `Path` key when it is set.
    pub fn command<S: AsRef<str>>(&mut self, args: &[S], config: &LaunchConfig) -> Result<Command> {
        let argv = self.exec_argv(args, config)?;
        let Some((program, rest)) = argv.split_first() else {
            return Err(DesktopEntryError::BadCommandLine("empty command".to_string()));
        };

        let mut command = Command::new(program);
        command.args(rest);
        if let Some(dir) = self.working_dir()?
            && !dir.is_empty()
        {
            command.current_dir(dir);
        }

        debug!(?argv, "built launch command");
        Ok(command)
    }
}
