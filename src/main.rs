mod commands;
mod config;
mod context;
mod db;
mod error;
mod gate;
mod llm;
mod proposer;
mod risk;
mod session;
mod types;
mod ui;

use std::env;
use std::process;

const DEFAULT_TOOL: &str = "bash";

fn print_usage() {
    eprintln!("usage: cmdllm chat [-t <tool>]");
    eprintln!("       cmdllm run [-t <tool>] <query>");
    eprintln!("       cmdllm tools [list|add <name>|del <name>]");
    eprintln!("       cmdllm history | clear | config | doctor");
}

/// Pulls `-t <tool>` out of the argument list; everything left over is
/// the query.
fn parse_tool(args: &[String]) -> (String, Vec<String>) {
    let mut tool = DEFAULT_TOOL.to_string();
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-t" | "--tool" => {
                if let Some(name) = iter.next() {
                    tool = name.clone();
                }
            }
            _ => rest.push(arg.clone()),
        }
    }
    (tool, rest)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "chat" => {
            let (tool, rest) = parse_tool(&args[2..]);
            if !rest.is_empty() {
                eprintln!("unexpected arguments: {}", rest.join(" "));
                print_usage();
                Ok(1)
            } else {
                commands::cmd_chat(&tool)
            }
        }
        "run" => {
            let (tool, rest) = parse_tool(&args[2..]);
            let query = rest.join(" ");
            if query.is_empty() {
                print_usage();
                Ok(1)
            } else {
                commands::cmd_run(&tool, &query)
            }
        }
        "history" => commands::cmd_history(),
        "clear" => commands::cmd_clear(),
        "tools" => commands::cmd_tools(&args[2..]),
        "config" => commands::cmd_config(),
        "doctor" => commands::cmd_doctor(),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(0)
        }
        other => {
            eprintln!("unknown command: {}", other);
            print_usage();
            Ok(1)
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("cmdllm: {}", e);
            process::exit(1);
        }
    }
}
