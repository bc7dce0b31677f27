use crate::config::BehaviorConfig;
use crate::error::ExecutionError;
use crate::types::{CommandProposal, ExecutionResult, RiskLevel, ToolProfile};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Exit code reported when the subprocess could not be spawned.
pub const EXIT_SPAWN_FAILURE: i32 = 127;
/// Exit code reported when the subprocess was killed on timeout.
pub const EXIT_TIMEOUT: i32 = 124;

#[derive(Debug)]
pub enum GateOutcome {
    Executed(ExecutionResult),
    Skipped,
}

/// Safe proposals run directly; everything else must be confirmed first.
pub fn requires_confirmation(risk: RiskLevel) -> bool {
    risk != RiskLevel::Safe
}

/// Non-shell tools get their name prefixed so the model may emit either
/// `get pods` or `kubectl get pods`.
pub fn prepare_command(profile: &ToolProfile, command: &str) -> String {
    let command = command.trim();
    if profile.is_shell() {
        return command.to_string();
    }
    let prefix = format!("{} ", profile.name);
    if command == profile.name || command.starts_with(&prefix) {
        command.to_string()
    } else {
        format!("{}{}", prefix, command)
    }
}

/// Runs one proposal through the gate. `confirm` is only invoked for
/// caution/dangerous proposals; exactly one subprocess is spawned per
/// executed cycle and none for a skipped one.
pub fn run<F>(
    proposal: &CommandProposal,
    profile: &ToolProfile,
    behavior: &BehaviorConfig,
    mut confirm: F,
) -> GateOutcome
where
    F: FnMut() -> bool,
{
    if requires_confirmation(proposal.risk) {
        log::debug!("gate: {} proposal needs confirmation", proposal.risk.as_str());
        if !confirm() {
            log::debug!("gate: confirmation declined, skipping");
            return GateOutcome::Skipped;
        }
    }

    let command = prepare_command(profile, &proposal.command);
    log::debug!("gate: executing '{}'", command);
    let result = execute(&command, behavior.command_timeout_secs)
        .unwrap_or_else(spawn_failure);
    GateOutcome::Executed(result)
}

pub fn execute(command: &str, timeout_secs: u64) -> Result<ExecutionResult, ExecutionError> {
    if timeout_secs == 0 {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;
        return Ok(ExecutionResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        match child.try_wait()? {
            Some(_) => {
                let output = child.wait_with_output()?;
                return Ok(ExecutionResult {
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                });
            }
            None if Instant::now() >= deadline => {
                log::warn!("command timed out after {}s, killing", timeout_secs);
                child.kill().ok();
                let output = child.wait_with_output()?;
                return Ok(ExecutionResult {
                    exit_code: EXIT_TIMEOUT,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: format!("command timed out after {}s", timeout_secs),
                });
            }
            None => std::thread::sleep(Duration::from_millis(50)),
        }
    }
}

fn spawn_failure(err: ExecutionError) -> ExecutionResult {
    ExecutionResult {
        exit_code: EXIT_SPAWN_FAILURE,
        stdout: String::new(),
        stderr: err.to_string(),
    }
}

/// Keeps the head and tail of very long output so a huge listing cannot
/// swamp the context window.
pub fn truncate_output(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines || max_lines < 2 {
        return text.to_string();
    }
    let keep = max_lines / 2;
    let mut truncated: Vec<String> = lines[..keep].iter().map(|s| s.to_string()).collect();
    truncated.push(format!("... [{} lines truncated] ...", lines.len() - max_lines));
    truncated.extend(lines[lines.len() - keep..].iter().map(|s| s.to_string()));
    truncated.join("\n")
}
