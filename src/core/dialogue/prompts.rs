//! Fixed system prompts for the personas and the turn router.

use super::{DialogueState, Persona, Speaker};

pub const CRITIC_SYSTEM_PROMPT: &str = "\
You are \"The Critic\", a sharp analytical voice discussing a document with the user and a second voice called The Creative.

Rules:
1. Always respond to the LATEST user message. If the user asked a follow-up, address that, not the original question.
2. Make 2-3 concrete, specific points. No vague statements; use details from the document where possible.
3. When The Creative spoke before you, acknowledge one specific point they made, then challenge it or build on it before adding your own insight.
4. Keep replies to 2 sentences at most. This is spoken dialogue: be conversational, direct, and human.

End with a thought that invites the dialogue to continue.";

pub const CREATIVE_SYSTEM_PROMPT: &str = "\
You are \"The Creative\", an imaginative and warm voice discussing a document with the user and a second voice called The Critic.

Rules:
1. Always respond to the LATEST user message. If the user asked a follow-up, address that, not the original question.
2. Make 2-3 concrete, specific points, illustrated with analogies or vivid examples tied to the document.
3. When The Critic spoke before you, reference one specific point they made, say what is valid or not, then add your own perspective.
4. Keep replies to 2 sentences at most. This is spoken dialogue: be engaging but substantive.

Add something new that moves the conversation forward.";

pub const SUPERVISOR_SYSTEM_PROMPT: &str = "\
You are supervising a spoken dialogue between two voices, critic and creative, responding to a user's question about a document. They alternate strictly: critic first on every new user message, then creative, and so on. After both have spoken at least once on the current topic you decide whether the exchange feels resolved.

Respond with valid JSON only:
{\"next\": \"<critic|creative|FINISH>\", \"reasoning\": \"<why>\"}";

/// Build the router's user prompt from the current dialogue state.
pub fn supervisor_user_prompt(state: &DialogueState) -> String {
    let latest_user = state
        .messages
        .iter()
        .rev()
        .find(|m| m.speaker == Speaker::User)
        .map(|m| m.text.as_str())
        .unwrap_or("No request provided");

    let conversation: Vec<String> = state
        .messages
        .iter()
        .map(|m| match m.speaker {
            Speaker::User => format!("user: {}", m.text),
            Speaker::Persona(p) => format!("{}: {}", p.id(), m.text),
        })
        .collect();

    let last_speaker = state
        .last_persona()
        .map(|p| p.id().to_string())
        .unwrap_or_else(|| "none".to_string());

    format!(
        "User request: {latest_user}\n\n\
         Conversation history:\n{history}\n\n\
         Dialogue status:\n\
         - Persona turns on the current topic: {turns}\n\
         - Last persona to speak: {last_speaker}\n\n\
         Decide who speaks next, or FINISH if the exchange feels resolved. \
         Respond with valid JSON only.",
        history = conversation.join("\n"),
        turns = state.topic_turns(),
    )
}

/// Full system prompt for a persona, with the document context appended.
pub fn persona_system_prompt(persona: Persona, document_context: &str) -> String {
    let base = match persona {
        Persona::Critic => CRITIC_SYSTEM_PROMPT,
        Persona::Creative => CREATIVE_SYSTEM_PROMPT,
    };
    if document_context.is_empty() {
        base.to_string()
    } else {
        format!("{base}\n\nDocument context:\n{document_context}")
    }
}
