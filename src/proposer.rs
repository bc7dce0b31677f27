use crate::context::ContextStore;
use crate::error::ProposalError;
use crate::llm::{ChatMessage, LlmClient};
use crate::risk::classify;
use crate::types::{CommandProposal, ModelReply, ToolProfile};
use serde::Deserialize;

fn system_prompt(profile: &ToolProfile) -> String {
    let tool = &profile.name;
    format!(
        r#"You are a {tool} expert. Turn the user's request into a single {tool} command, or answer their question about {tool}.

Reply with exactly ONE JSON object and nothing else. No markdown, no commentary.

For a runnable request:
{{"command": "<the {tool} command>", "risk": "<safe|caution|dangerous>", "rationale": "<one short sentence>"}}

Risk rules:
- "safe": read-only operations that cannot change state.
- "caution": operations that modify state in a recoverable way.
- "dangerous": destructive operations - deleting data or resources, force-pushes, cluster-wide mutations, overwriting files.

For a general question about {tool}:
{{"answer": "<your concise answer>"}}"#
    )
}

pub fn build_messages(
    profile: &ToolProfile,
    context: &ContextStore,
    query: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(context.len() + 2);
    messages.push(ChatMessage::new("system", system_prompt(profile)));
    for turn in context.window() {
        messages.push(ChatMessage::new(turn.role.as_str(), turn.content.clone()));
    }
    messages.push(ChatMessage::new("user", query));
    messages
}

// Unknown fields are rejected rather than ignored: an unexpected shape
// means the model did not follow the contract.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReply {
    command: Option<String>,
    risk: Option<String>,
    rationale: Option<String>,
    answer: Option<String>,
}

pub fn decode_reply(response: &str) -> Result<ModelReply, ProposalError> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');
    let json_str = match (start, end) {
        (Some(s), Some(e)) if e > s => &response[s..=e],
        _ => {
            return Err(ProposalError::Malformed(
                "no JSON object in response".to_string(),
            ))
        }
    };

    let raw: RawReply = serde_json::from_str(json_str)
        .map_err(|e| ProposalError::Malformed(e.to_string()))?;

    match (raw.command, raw.answer) {
        (Some(command), None) => {
            let command = command.trim().to_string();
            if command.is_empty() {
                return Err(ProposalError::EmptyCommand);
            }
            Ok(ModelReply::Command(CommandProposal {
                command,
                risk: classify(raw.risk.as_deref()),
                rationale: raw.rationale.filter(|r| !r.trim().is_empty()),
            }))
        }
        (None, Some(answer)) => {
            let answer = answer.trim().to_string();
            if answer.is_empty() {
                return Err(ProposalError::Malformed("empty answer".to_string()));
            }
            Ok(ModelReply::Answer(answer))
        }
        (Some(_), Some(_)) => Err(ProposalError::Malformed(
            "response contains both a command and an answer".to_string(),
        )),
        (None, None) => Err(ProposalError::Malformed(
            "response contains neither a command nor an answer".to_string(),
        )),
    }
}

pub fn propose(
    client: &LlmClient,
    profile: &ToolProfile,
    context: &ContextStore,
    query: &str,
) -> Result<ModelReply, ProposalError> {
    let messages = build_messages(profile, context, query);
    let response = client.chat(&messages)?;
    decode_reply(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;

    #[test]
    fn decodes_command_with_risk() {
        let reply =
            decode_reply(r#"{"command": "ls -la", "risk": "safe", "rationale": "lists files"}"#)
                .unwrap();
        match reply {
            ModelReply::Command(p) => {
                assert_eq!(p.command, "ls -la");
                assert_eq!(p.risk, RiskLevel::Safe);
                assert_eq!(p.rationale.as_deref(), Some("lists files"));
            }
            ModelReply::Answer(_) => panic!("expected command"),
        }
    }

    #[test]
    fn decodes_answer() {
        let reply = decode_reply(r#"{"answer": "use kubectl get pods"}"#).unwrap();
        assert!(matches!(reply, ModelReply::Answer(a) if a == "use kubectl get pods"));
    }

    #[test]
    fn strips_markdown_fences_around_json() {
        let reply = decode_reply(
            "```json\n{\"command\": \"kubectl get pods\", \"risk\": \"safe\"}\n```",
        )
        .unwrap();
        assert!(matches!(reply, ModelReply::Command(p) if p.command == "kubectl get pods"));
    }

    #[test]
    fn missing_risk_defaults_to_caution() {
        let reply = decode_reply(r#"{"command": "git status"}"#).unwrap();
        match reply {
            ModelReply::Command(p) => assert_eq!(p.risk, RiskLevel::Caution),
            ModelReply::Answer(_) => panic!("expected command"),
        }
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            decode_reply(r#"{"command": "   "}"#),
            Err(ProposalError::EmptyCommand)
        ));
    }

    #[test]
    fn prose_without_json_is_rejected() {
        assert!(matches!(
            decode_reply("Sure! Run ls -la to list files."),
            Err(ProposalError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            decode_reply(r#"{"command": "ls", "confidence": 0.9}"#),
            Err(ProposalError::Malformed(_))
        ));
    }

    #[test]
    fn command_and_answer_together_are_rejected() {
        assert!(decode_reply(r#"{"command": "ls", "answer": "lists files"}"#).is_err());
    }

    #[test]
    fn neither_command_nor_answer_is_rejected() {
        assert!(decode_reply(r#"{"risk": "safe"}"#).is_err());
    }

    #[test]
    fn messages_carry_history_between_system_and_query() {
        let profile = ToolProfile::new("kubectl");
        let mut context = ContextStore::new(10);
        context.record_cycle("list pods", "$ kubectl get pods\n(exit 0)");

        let messages = build_messages(&profile, &context, "now in all namespaces");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("kubectl expert"));
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].content, "now in all namespaces");
    }
}
