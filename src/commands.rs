use crate::config::{get_config_path, load_config, save_config, Config};
use crate::db::{self, get_db_path};
use crate::llm::{ChatMessage, LlmClient};
use crate::session::Session;
use std::{env, io::Write, process::Command};

pub fn cmd_chat(tool: &str) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config()?;
    let mut session = Session::new(config, tool)?;
    session.run_interactive();
    Ok(0)
}

pub fn cmd_run(tool: &str, query: &str) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config()?;
    let mut session = Session::new(config, tool)?;
    Ok(session.run_once(query))
}

pub fn cmd_history() -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config()?;

    if !get_db_path().exists() {
        println!("no history yet.");
        return Ok(0);
    }

    let conn = db::open_db()?;
    let entries = db::recent_history(&conn, config.behavior.history_window)?;

    if entries.is_empty() {
        println!("no history yet.");
        return Ok(0);
    }

    println!("recent cycles:");
    println!();

    for entry in entries {
        let status = if entry.executed {
            if entry.succeeded {
                "+"
            } else {
                "x"
            }
        } else {
            "-"
        };

        println!("{} {}", status, entry.query);
        if !entry.command.is_empty() {
            println!("    {}", entry.command);
        }
        println!();
    }

    Ok(0)
}

pub fn cmd_clear() -> Result<i32, Box<dyn std::error::Error>> {
    if !get_db_path().exists() {
        println!("nothing to clear.");
        return Ok(0);
    }
    let conn = db::open_db()?;
    db::clear_log(&conn)?;
    println!("context log cleared.");
    Ok(0)
}

pub fn cmd_tools(args: &[String]) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = load_config()?;

    match args.first().map(|s| s.as_str()) {
        None | Some("list") => {
            println!("registered tools:");
            for tool in &config.tools {
                println!("  - {}", tool);
            }
            Ok(0)
        }
        Some("add") => match args.get(1) {
            Some(name) => {
                if config.add_tool(name) {
                    save_config(&config)?;
                    println!("tool '{}' added.", name);
                } else {
                    println!("tool '{}' is already registered.", name);
                }
                Ok(0)
            }
            None => {
                eprintln!("usage: cmdllm tools add <name>");
                Ok(1)
            }
        },
        Some("del") => match args.get(1) {
            Some(name) => {
                if config.remove_tool(name) {
                    save_config(&config)?;
                    println!("tool '{}' removed.", name);
                } else {
                    println!("tool '{}' is not registered.", name);
                }
                Ok(0)
            }
            None => {
                eprintln!("usage: cmdllm tools del <name>");
                Ok(1)
            }
        },
        Some(other) => {
            eprintln!("unknown tools command: {}", other);
            eprintln!("usage: cmdllm tools [list|add <name>|del <name>]");
            Ok(1)
        }
    }
}

pub fn cmd_config() -> Result<i32, Box<dyn std::error::Error>> {
    let config_path = get_config_path();

    if !config_path.exists() {
        save_config(&Config::default())?;
    }

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    Command::new(&editor).arg(&config_path).status()?;

    Ok(0)
}

pub fn cmd_doctor() -> Result<i32, Box<dyn std::error::Error>> {
    println!("diagnostics:");
    println!();

    print!("  config ... ");
    std::io::stdout().flush().ok();
    let config = match load_config() {
        Ok(config) => match config.validate() {
            Ok(()) => {
                println!("ok");
                Some(config)
            }
            Err(e) => {
                println!("invalid");
                println!("    {}", e);
                None
            }
        },
        Err(e) => {
            println!("failed");
            println!("    {}", e);
            None
        }
    };

    if let Some(config) = &config {
        print!("  backend ... ");
        std::io::stdout().flush().ok();
        let client = LlmClient::from_config(config);
        let probe = vec![ChatMessage::new("user", "Reply with the word ok.")];
        match client.chat(&probe) {
            Ok(_) => println!("ok"),
            Err(e) => {
                println!("failed");
                println!("    {}", e);
            }
        }
    }

    print!("  session log ... ");
    std::io::stdout().flush().ok();
    match db::open_db() {
        Ok(_) => println!("ok ({:?})", get_db_path()),
        Err(e) => {
            println!("failed");
            println!("    {}", e);
        }
    }

    println!();
    Ok(0)
}
