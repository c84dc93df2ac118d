//! Turn router: decides which persona speaks next, or FINISH.
//!
//! The policy is fixed, not learned:
//! - a fresh user message always routes to the critic and resets the topic;
//! - personas alternate strictly, never the same speaker twice in a row;
//! - each persona speaks at least once per topic before FINISH is allowed;
//! - after [`MAX_TOPIC_TURNS`] persona turns the topic is force-finished;
//! - between floor and ceiling, whether the exchange "feels resolved" is
//!   delegated to the dialogue model. Any failure to get a valid decision
//!   falls back deterministically to FINISH; the router never fails open
//!   into a loop.

use serde::Deserialize;
use tracing::{debug, warn};

use super::prompts::{SUPERVISOR_SYSTEM_PROMPT, supervisor_user_prompt};
use super::{DialogueState, Persona, Route};
use crate::services::DialogueModel;

/// Floor: one exchange from each persona before FINISH is allowed.
pub const MIN_TOPIC_TURNS: usize = 2;
/// Ceiling: forced FINISH after this many persona turns on one topic.
pub const MAX_TOPIC_TURNS: usize = 4;

/// Router output. The reasoning is diagnostic only, never consumed by logic.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub next: Route,
    pub reasoning: String,
}

impl RoutingDecision {
    fn finish(reasoning: impl Into<String>) -> Self {
        Self { next: Route::Finish, reasoning: reasoning.into() }
    }

    fn persona(persona: Persona, reasoning: impl Into<String>) -> Self {
        Self { next: Route::Persona(persona), reasoning: reasoning.into() }
    }
}

#[derive(Debug, Deserialize)]
struct ModelDecision {
    next: String,
    #[serde(default)]
    reasoning: String,
}

/// Decide the next step for the current dialogue state.
pub async fn route(state: &DialogueState, model: &dyn DialogueModel) -> RoutingDecision {
    let turns = state.topic_turns();

    if state.fresh_user_message() || turns == 0 {
        return RoutingDecision::persona(Persona::Critic, "critic opens every new topic");
    }

    if turns >= MAX_TOPIC_TURNS {
        return RoutingDecision::finish("turn ceiling reached");
    }

    // Strict alternation fixes the only persona that may speak next.
    let candidate = state.last_persona().map(|p| p.other()).unwrap_or(Persona::Critic);

    if turns < MIN_TOPIC_TURNS {
        return RoutingDecision::persona(
            candidate,
            format!("{} has not spoken on this topic yet", candidate.id()),
        );
    }

    // Between floor and ceiling: content-dependent judgment call.
    let raw = match model
        .decide(SUPERVISOR_SYSTEM_PROMPT, &supervisor_user_prompt(state))
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!("router model call failed ({e}), finishing");
            return RoutingDecision::finish("router model call failed");
        }
    };

    match serde_json::from_str::<ModelDecision>(extract_json(&raw)) {
        Ok(decision) if decision.next == "FINISH" => {
            debug!(reasoning = %decision.reasoning, "model chose FINISH");
            RoutingDecision::finish(decision.reasoning)
        }
        Ok(decision) if Persona::from_id(&decision.next) == Some(candidate) => {
            RoutingDecision::persona(candidate, decision.reasoning)
        }
        Ok(decision) => {
            // Out-of-domain value or an attempt to repeat the last speaker.
            warn!(next = %decision.next, "invalid routing decision, finishing");
            RoutingDecision::finish("invalid routing decision")
        }
        Err(e) => {
            warn!("unparsable routing decision ({e}), finishing");
            RoutingDecision::finish("unparsable routing decision")
        }
    }
}

/// Models sometimes wrap JSON in prose or code fences; take the outermost
/// braces if present.
fn extract_json(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialogue::{AgentMessage, InterruptSignal};
    use crate::services::ServiceError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Model stub returning a fixed response (or an error).
    struct FakeModel {
        response: Result<String, ()>,
        calls: Mutex<usize>,
    }

    impl FakeModel {
        fn replying(response: &str) -> Self {
            Self { response: Ok(response.to_string()), calls: Mutex::new(0) }
        }

        fn failing() -> Self {
            Self { response: Err(()), calls: Mutex::new(0) }
        }
    }

    #[async_trait]
    impl DialogueModel for FakeModel {
        async fn decide(&self, _system: &str, _user: &str) -> Result<String, ServiceError> {
            *self.calls.lock() += 1;
            self.response
                .clone()
                .map_err(|_| ServiceError::Provider("model down".into()))
        }
    }

    fn state_after(persona_texts: &[(Persona, &str)]) -> DialogueState {
        let mut messages = vec![AgentMessage::user("what about pricing?")];
        for (persona, text) in persona_texts {
            messages.push(AgentMessage::persona(*persona, *text));
        }
        DialogueState {
            messages,
            next: Route::Persona(Persona::Critic),
            document_context: String::new(),
            interrupt: Arc::new(InterruptSignal::new()),
            audio_outputs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_fresh_user_message_routes_to_critic() {
        let model = FakeModel::replying(r#"{"next": "creative"}"#);
        let decision = route(&state_after(&[]), &model).await;
        assert_eq!(decision.next, Route::Persona(Persona::Critic));
        // Below the floor the model is never consulted.
        assert_eq!(*model.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_follow_up_after_personas_routes_to_critic() {
        let mut state = state_after(&[(Persona::Critic, "a"), (Persona::Creative, "b")]);
        state.push(AgentMessage::user("but what about discounts?"));
        let model = FakeModel::failing();
        let decision = route(&state, &model).await;
        assert_eq!(decision.next, Route::Persona(Persona::Critic));
    }

    #[tokio::test]
    async fn test_strict_alternation_below_floor() {
        let model = FakeModel::failing();
        let decision = route(&state_after(&[(Persona::Critic, "a")]), &model).await;
        assert_eq!(decision.next, Route::Persona(Persona::Creative));
        assert_eq!(*model.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_model_judgment_between_floor_and_ceiling() {
        let state = state_after(&[(Persona::Critic, "a"), (Persona::Creative, "b")]);

        let keep_going = FakeModel::replying(r#"{"next": "critic", "reasoning": "unresolved"}"#);
        let decision = route(&state, &keep_going).await;
        assert_eq!(decision.next, Route::Persona(Persona::Critic));

        let resolved = FakeModel::replying(r#"{"next": "FINISH", "reasoning": "resolved"}"#);
        let decision = route(&state, &resolved).await;
        assert_eq!(decision.next, Route::Finish);
    }

    #[tokio::test]
    async fn test_ceiling_forces_finish_without_model() {
        let state = state_after(&[
            (Persona::Critic, "a"),
            (Persona::Creative, "b"),
            (Persona::Critic, "c"),
            (Persona::Creative, "d"),
        ]);
        let model = FakeModel::replying(r#"{"next": "critic"}"#);
        let decision = route(&state, &model).await;
        assert_eq!(decision.next, Route::Finish);
        assert_eq!(*model.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_finish() {
        let state = state_after(&[(Persona::Critic, "a"), (Persona::Creative, "b")]);
        let decision = route(&state, &FakeModel::failing()).await;
        assert_eq!(decision.next, Route::Finish);
    }

    #[tokio::test]
    async fn test_unparsable_decision_falls_back_to_finish() {
        let state = state_after(&[(Persona::Critic, "a"), (Persona::Creative, "b")]);
        let decision = route(&state, &FakeModel::replying("I think the critic should go")).await;
        assert_eq!(decision.next, Route::Finish);
    }

    #[tokio::test]
    async fn test_out_of_domain_value_falls_back_to_finish() {
        let state = state_after(&[(Persona::Critic, "a"), (Persona::Creative, "b")]);
        let decision = route(&state, &FakeModel::replying(r#"{"next": "narrator"}"#)).await;
        assert_eq!(decision.next, Route::Finish);
    }

    #[tokio::test]
    async fn test_model_cannot_repeat_last_speaker() {
        // Last speaker was creative; the model asking for creative again is
        // invalid and maps to FINISH rather than a repeated turn.
        let state = state_after(&[(Persona::Critic, "a"), (Persona::Creative, "b")]);
        let decision = route(&state, &FakeModel::replying(r#"{"next": "creative"}"#)).await;
        assert_eq!(decision.next, Route::Finish);
    }

    #[tokio::test]
    async fn test_json_extracted_from_fenced_response() {
        let state = state_after(&[(Persona::Critic, "a"), (Persona::Creative, "b")]);
        let fenced = "```json\n{\"next\": \"FINISH\", \"reasoning\": \"done\"}\n```";
        let decision = route(&state, &FakeModel::replying(fenced)).await;
        assert_eq!(decision.next, Route::Finish);
        assert_eq!(decision.reasoning, "done");
    }

    #[tokio::test]
    async fn test_router_never_repeats_a_speaker_over_a_full_topic() {
        // Drive the router through a full topic with a model that always
        // wants to continue; consecutive decisions must alternate.
        let model = FakeModel::replying(r#"{"next": "critic"}"#);
        let mut state = state_after(&[]);
        let mut previous: Option<Persona> = None;

        loop {
            let decision = route(&state, &model).await;
            match decision.next {
                Route::Finish => break,
                Route::Persona(p) => {
                    assert_ne!(previous, Some(p), "router repeated {}", p.id());
                    previous = Some(p);
                    state.push(AgentMessage::persona(p, "reply"));
                }
            }
        }
        assert!(state.topic_turns() >= MIN_TOPIC_TURNS);
        assert!(state.topic_turns() <= MAX_TOPIC_TURNS);
    }
}
