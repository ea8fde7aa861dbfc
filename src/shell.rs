//! # Shell helpers.
//!
//! Thin wrappers over one-shot external commands:
//! - [`shell_command`] builds the platform shell invocation used for dev processes;
//! - [`run`] executes a program to completion and captures its output;
//! - [`which`] resolves an executable on `PATH`;
//! - [`unresolved_program`] spots a command line whose program does not exist;
//! - [`open_editor`] / [`open_terminal`] launch GUI tools detached from the host.
//!
//! Launched tools are never supervised: no log, no exit event.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::PlaygroundError;

/// Captured output of a successful [`run`].
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Builds `sh -c <line>` (`cmd /C <line>` on Windows).
pub(crate) fn shell_command(line: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

/// Runs `program args…` to completion.
///
/// A non-zero exit becomes [`PlaygroundError::CommandFailed`] carrying the
/// trimmed stderr; a launch failure is returned as [`PlaygroundError::Io`].
pub async fn run<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<CommandOutput, PlaygroundError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    let line = render(program, &args);

    let mut cmd = Command::new(program);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    debug!(command = %line, "running");
    let out = cmd.output().await?;
    let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&out.stderr).into_owned();

    if !out.status.success() {
        let stderr = match stderr.trim() {
            "" => format!("exited with {}", out.status),
            s => s.to_string(),
        };
        return Err(PlaygroundError::CommandFailed { command: line, stderr });
    }
    Ok(CommandOutput { stdout, stderr })
}

/// Resolves `bin` on `PATH`.
pub fn which(bin: &str) -> Option<PathBuf> {
    which::which(bin).ok()
}

/// Shell words that never name an executable on `PATH`.
const SHELL_WORDS: &[&str] = &[
    "!", ".", ":", "[", "[[", "{", "alias", "bg", "break", "builtin", "case", "cd", "command",
    "continue", "declare", "do", "done", "echo", "elif", "else", "esac", "eval", "exec", "exit",
    "export", "false", "fg", "fi", "for", "function", "hash", "if", "jobs", "kill", "local",
    "printf", "pwd", "read", "readonly", "return", "select", "set", "shift", "source", "test",
    "then", "time", "trap", "true", "type", "ulimit", "umask", "unalias", "unset", "until",
    "wait", "while",
];

/// Returns the program of `line` when it is a plain name that does not
/// resolve on `PATH` (relative entries are taken from `cwd`).
///
/// Only the leading word is inspected, and only when it is a bare name:
/// keywords, builtins, `VAR=value` prefixes, paths, quoting and expansions are
/// left for the shell to judge.
pub fn unresolved_program<'a>(line: &'a str, cwd: &Path) -> Option<&'a str> {
    let word = line.split_whitespace().next()?;
    let bare = !word.starts_with('-')
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'));
    if !bare || SHELL_WORDS.contains(&word) {
        return None;
    }
    match which::which_in(word, std::env::var_os("PATH"), cwd) {
        Ok(_) => None,
        Err(_) => Some(word),
    }
}

/// Opens `dir` in `editor` (a program optionally followed by arguments).
pub fn open_editor(editor: &str, dir: &Path) -> Result<(), PlaygroundError> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(PlaygroundError::CommandFailed {
            command: editor.to_string(),
            stderr: "no editor configured".to_string(),
        });
    };
    let mut cmd = Command::new(program);
    cmd.args(parts).arg(dir);
    launch_detached(cmd, editor)
}

/// Opens a terminal window whose working directory is `dir`.
///
/// `terminal` overrides the platform default launcher; it is started with
/// `dir` as its working directory.
pub fn open_terminal(terminal: Option<&str>, dir: &Path) -> Result<(), PlaygroundError> {
    let (program, mut args): (String, Vec<String>) = match terminal.map(str::split_whitespace) {
        Some(mut parts) => match parts.next() {
            Some(p) => (p.to_string(), parts.map(str::to_string).collect()),
            None => default_terminal()?,
        },
        None => default_terminal()?,
    };

    if cfg!(target_os = "macos") && program == "open" {
        args.push(dir.display().to_string());
    }

    let mut cmd = Command::new(&program);
    cmd.args(&args).current_dir(dir);
    launch_detached(cmd, &program)
}

fn default_terminal() -> Result<(String, Vec<String>), PlaygroundError> {
    if cfg!(target_os = "macos") {
        return Ok(("open".into(), vec!["-a".into(), "Terminal".into()]));
    }
    if cfg!(windows) {
        return Ok((
            "cmd".into(),
            vec!["/C".into(), "start".into(), "cmd".into()],
        ));
    }
    ["x-terminal-emulator", "gnome-terminal", "konsole", "xterm"]
        .into_iter()
        .find(|t| which(t).is_some())
        .map(|t| (t.to_string(), Vec::new()))
        .ok_or_else(|| PlaygroundError::CommandFailed {
            command: "open terminal".into(),
            stderr: "no terminal emulator found on PATH".into(),
        })
}

fn launch_detached(mut cmd: Command, label: &str) -> Result<(), PlaygroundError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    // Dropping the handle leaves the process running; tokio reaps it.
    let child = cmd.spawn()?;
    info!(command = label, pid = child.id(), "launched");
    Ok(())
}

fn render(program: &str, args: &[std::ffi::OsString]) -> String {
    let mut line = program.to_string();
    for a in args {
        line.push(' ');
        line.push_str(&a.to_string_lossy());
    }
    line
}
