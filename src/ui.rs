use crate::types::{CommandProposal, ExecutionResult, RiskLevel};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal,
};
use std::io::{self, BufRead, Write};
use std::time::Duration;

pub fn print_proposal(proposal: &CommandProposal) {
    println!();
    println!("  {}", proposal.command);
    match proposal.risk {
        RiskLevel::Safe => {}
        RiskLevel::Caution => println!("  caution: this command modifies state"),
        RiskLevel::Dangerous => println!("  warning: this command may be destructive"),
    }
    if let Some(rationale) = &proposal.rationale {
        println!("  ({})", rationale);
    }
}

pub fn print_answer(answer: &str) {
    println!();
    println!("{}", answer);
}

pub fn print_result(result: &ExecutionResult) {
    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
        if !result.stdout.ends_with('\n') {
            println!();
        }
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
        if !result.stderr.ends_with('\n') {
            eprintln!();
        }
    }
    if !result.succeeded() {
        println!("(exit {})", result.exit_code);
    }
}

pub fn print_skipped() {
    println!("skipped.");
}

/// Single-key confirmation. Only 'y' proceeds; any other key, Esc, or
/// ctrl-c declines. Falls back to a line read when raw mode is
/// unavailable (piped input).
pub fn confirm_execution() -> bool {
    eprint!("run this command? [y/N] ");
    io::stderr().flush().ok();

    if terminal::enable_raw_mode().is_err() {
        return read_line_stdin()
            .map(|line| line.trim().eq_ignore_ascii_case("y"))
            .unwrap_or(false);
    }

    let answer = loop {
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => {
                if let Ok(Event::Key(k)) = event::read() {
                    match k.code {
                        KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                            break false
                        }
                        KeyCode::Char('y') | KeyCode::Char('Y') => break true,
                        KeyCode::Char(_) | KeyCode::Enter | KeyCode::Esc => break false,
                        _ => {}
                    }
                }
            }
            Ok(false) => {}
            Err(_) => break false,
        }
    };

    terminal::disable_raw_mode().ok();
    eprintln!("{}", if answer { "y" } else { "n" });
    answer
}

/// Interactive prompt. Returns None on EOF.
pub fn read_query(tool: &str) -> Option<String> {
    print!("{}> ", tool);
    io::stdout().flush().ok();
    read_line_stdin()
}

fn read_line_stdin() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        Err(_) => None,
    }
}
