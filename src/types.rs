use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self {
            role,
            content: content.into(),
            timestamp: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolProfile {
    pub name: String,
}

impl ToolProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_shell(&self) -> bool {
        matches!(self.name.as_str(), "bash" | "sh" | "zsh")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Safe,
    Caution,
    Dangerous,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Caution => "caution",
            RiskLevel::Dangerous => "dangerous",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandProposal {
    pub command: String,
    pub risk: RiskLevel,
    pub rationale: Option<String>,
}

/// Decoded model output: either a runnable proposal or a plain answer to a
/// question about the tool.
#[derive(Debug, Clone)]
pub enum ModelReply {
    Command(CommandProposal),
    Answer(String),
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}
