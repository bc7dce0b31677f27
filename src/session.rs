use crate::config::Config;
use crate::context::ContextStore;
use crate::db;
use crate::error::{ConfigError, ProposalError};
use crate::gate::{self, GateOutcome};
use crate::llm::LlmClient;
use crate::proposer::propose;
use crate::types::{ExecutionResult, ModelReply, ToolProfile};
use crate::ui;
use rusqlite::Connection;
use std::io::Write;

/// One conversational session against a single tool. Owns the context
/// store for its whole lifetime.
pub struct Session {
    config: Config,
    profile: ToolProfile,
    client: LlmClient,
    context: ContextStore,
    conn: Option<Connection>,
}

impl Session {
    pub fn new(config: Config, tool: &str) -> Result<Self, ConfigError> {
        config.validate()?;
        let profile = config.tool_profile(tool)?;
        let client = LlmClient::from_config(&config);
        let context = ContextStore::new(config.context.max_messages);
        let conn = match db::open_db() {
            Ok(conn) => Some(conn),
            Err(e) => {
                log::warn!("session log unavailable: {}", e);
                None
            }
        };
        Ok(Self {
            config,
            profile,
            client,
            context,
            conn,
        })
    }

    pub fn run_interactive(&mut self) {
        println!(
            "interactive {} session. type 'exit' or 'quit' to end, 'clear' to reset context.",
            self.profile.name
        );
        log::info!("session started for tool '{}'", self.profile.name);

        loop {
            let query = match ui::read_query(&self.profile.name) {
                Some(q) => q,
                None => break,
            };
            let query = query.trim();

            if query.is_empty() {
                continue;
            }
            if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
                break;
            }
            if query.eq_ignore_ascii_case("clear") {
                self.context.clear();
                println!("context cleared.");
                continue;
            }

            if let Err(e) = self.cycle(query) {
                eprintln!("cmdllm: {}", e);
            }
        }

        self.finish();
        println!("bye.");
    }

    /// Exactly one cycle against a fresh context. Returns the process
    /// exit code: the command's own for executed cycles, 0 otherwise.
    pub fn run_once(&mut self, query: &str) -> i32 {
        let code = match self.cycle(query) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("cmdllm: {}", e);
                1
            }
        };
        self.finish();
        code
    }

    /// Read history -> propose -> classify -> gate -> fold the outcome
    /// back into context. A proposal failure aborts before any context
    /// mutation.
    fn cycle(&mut self, query: &str) -> Result<i32, ProposalError> {
        eprint!("thinking...");
        std::io::stderr().flush().ok();
        let reply = propose(&self.client, &self.profile, &self.context, query);
        eprint!("\r           \r");
        std::io::stderr().flush().ok();

        match reply? {
            ModelReply::Answer(answer) => {
                ui::print_answer(&answer);
                self.context.record_cycle(query, &answer);
                self.log_cycle(query, "", false, true, "");
                Ok(0)
            }
            ModelReply::Command(proposal) => {
                ui::print_proposal(&proposal);
                let outcome = gate::run(
                    &proposal,
                    &self.profile,
                    &self.config.behavior,
                    ui::confirm_execution,
                );
                match outcome {
                    GateOutcome::Executed(result) => {
                        ui::print_result(&result);
                        let summary = summarize_execution(
                            &proposal.command,
                            &result,
                            self.config.behavior.max_output_lines,
                        );
                        self.context.record_cycle(query, &summary);
                        let sample =
                            gate::truncate_output(&result.stdout, self.config.behavior.max_output_lines);
                        self.log_cycle(query, &proposal.command, true, result.succeeded(), &sample);
                        Ok(result.exit_code)
                    }
                    GateOutcome::Skipped => {
                        ui::print_skipped();
                        let summary = summarize_skip(&proposal.command);
                        self.context.record_cycle(query, &summary);
                        self.log_cycle(query, &proposal.command, false, false, "");
                        Ok(0)
                    }
                }
            }
        }
    }

    fn log_cycle(&self, query: &str, command: &str, executed: bool, succeeded: bool, sample: &str) {
        if let Some(conn) = &self.conn {
            if let Err(e) = db::save_cycle(conn, query, command, executed, succeeded, sample) {
                log::warn!("could not record cycle: {}", e);
            }
        }
    }

    fn finish(&mut self) {
        if let Some(conn) = &self.conn {
            if !self.context.is_empty() {
                if let Err(e) = db::flush_turns(conn, self.context.window()) {
                    log::warn!("could not flush context log: {}", e);
                }
            }
        }
        self.context.clear();
        log::info!("session ended");
    }
}

fn summarize_execution(command: &str, result: &ExecutionResult, max_lines: usize) -> String {
    let mut output = String::new();
    if !result.stdout.is_empty() {
        output.push_str(result.stdout.trim_end());
    }
    if !result.stderr.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(result.stderr.trim_end());
    }
    let output = gate::truncate_output(&output, max_lines);

    let mut summary = format!("$ {}", command);
    if !output.is_empty() {
        summary.push('\n');
        summary.push_str(&output);
    }
    summary.push_str(&format!("\n(exit {})", result.exit_code));
    summary
}

fn summarize_skip(command: &str) -> String {
    format!("$ {}\n[skipped: not confirmed]", command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_summary_carries_command_output_and_exit() {
        let result = ExecutionResult {
            exit_code: 0,
            stdout: "file.txt\n".to_string(),
            stderr: String::new(),
        };
        let summary = summarize_execution("ls", &result, 100);
        assert_eq!(summary, "$ ls\nfile.txt\n(exit 0)");
    }

    #[test]
    fn execution_summary_truncates_long_output() {
        let stdout = (0..300).map(|i| format!("line {i}\n")).collect::<String>();
        let result = ExecutionResult {
            exit_code: 0,
            stdout,
            stderr: String::new(),
        };
        let summary = summarize_execution("seq 300", &result, 10);
        assert!(summary.contains("lines truncated"));
        assert!(summary.lines().count() < 20);
    }

    #[test]
    fn skip_summary_names_the_command() {
        let summary = summarize_skip("kubectl delete pods --all");
        assert!(summary.contains("kubectl delete pods --all"));
        assert!(summary.contains("skipped"));
    }
}
