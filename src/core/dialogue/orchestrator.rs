//! Turn loop: routes between personas until FINISH or interruption.
//!
//! Cooperative cancellation, not task abort: the shared [`InterruptSignal`]
//! is checked before routing, inside each responder, and again before output
//! delivery. A persona step that completes after the signal was raised is
//! discarded rather than delivered, so the listener never hears stale speech
//! from an abandoned turn.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::persona::respond;
use super::supervisor;
use super::{
    AgentMessage, DialogueState, InterruptSignal, PersonaOutput, Route, TurnStatus,
};
use crate::services::{DialogueModel, PersonaVoice, ServiceError};

/// Async delivery hook invoked for each persona output, in order.
pub type OutputCallback =
    Arc<dyn Fn(PersonaOutput) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Everything a finished (or cut-off) turn produced.
#[derive(Debug)]
pub struct TurnOutcome {
    pub correlation_id: Uuid,
    pub status: TurnStatus,
    /// Delivered persona outputs, in speaking order.
    pub outputs: Vec<PersonaOutput>,
    /// Final message history, including the seed and the user message.
    pub messages: Vec<AgentMessage>,
}

/// Drives one dialogue turn end to end.
pub struct Orchestrator {
    voice: Arc<dyn PersonaVoice>,
    model: Arc<dyn DialogueModel>,
}

impl Orchestrator {
    pub fn new(voice: Arc<dyn PersonaVoice>, model: Arc<dyn DialogueModel>) -> Self {
        Self { voice, model }
    }

    /// Run a turn for one user utterance.
    ///
    /// `seed` is the trimmed history carried over from earlier turns;
    /// `interrupt` is shared with the connection and may be raised at any
    /// moment. Each delivered output is handed to `on_output` before the
    /// next routing step runs.
    pub async fn run_turn(
        &self,
        seed: Vec<AgentMessage>,
        user_text: &str,
        document_context: String,
        interrupt: Arc<InterruptSignal>,
        on_output: OutputCallback,
    ) -> Result<TurnOutcome, ServiceError> {
        let correlation_id = Uuid::new_v4();
        let mut state =
            DialogueState::new(seed, user_text, document_context, Arc::clone(&interrupt));
        let mut status = TurnStatus::Completed;

        info!(%correlation_id, "turn started");

        loop {
            if interrupt.is_raised() {
                interrupt.observe();
                status = TurnStatus::Interrupted;
                break;
            }

            let decision = supervisor::route(&state, self.model.as_ref()).await;
            debug!(%correlation_id, reasoning = %decision.reasoning, "routing decision");

            let persona = match decision.next {
                Route::Finish => break,
                Route::Persona(p) => p,
            };
            state.next = decision.next;

            // A raise during routing shows up here as a no-op response.
            let Some(output) = respond(persona, &state, self.voice.as_ref()).await? else {
                interrupt.observe();
                status = TurnStatus::Interrupted;
                break;
            };

            if interrupt.is_raised() {
                // Generation finished after the raise; discard, never deliver.
                interrupt.observe();
                status = TurnStatus::Interrupted;
                break;
            }

            state.push(AgentMessage::persona(persona, output.text.clone()));
            state.audio_outputs.push(output.clone());
            on_output(output).await;
        }

        info!(
            %correlation_id,
            outputs = state.audio_outputs.len(),
            interrupted = status == TurnStatus::Interrupted,
            "turn ended"
        );

        Ok(TurnOutcome {
            correlation_id,
            status,
            outputs: state.audio_outputs,
            messages: state.messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialogue::Persona;
    use crate::services::{ChatTurn, SpokenReply};
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;

    /// Voice stub that replies with the persona's voice name and canned audio,
    /// optionally raising the interrupt after a given number of replies.
    struct ScriptedVoice {
        replies: Mutex<usize>,
        raise_after: Option<(usize, Arc<InterruptSignal>)>,
    }

    impl ScriptedVoice {
        fn new() -> Self {
            Self { replies: Mutex::new(0), raise_after: None }
        }

        fn raising_after(count: usize, interrupt: Arc<InterruptSignal>) -> Self {
            Self { replies: Mutex::new(0), raise_after: Some((count, interrupt)) }
        }
    }

    #[async_trait]
    impl PersonaVoice for ScriptedVoice {
        async fn speak(
            &self,
            voice: &str,
            _turns: &[ChatTurn],
        ) -> Result<SpokenReply, ServiceError> {
            let count = {
                let mut replies = self.replies.lock();
                *replies += 1;
                *replies
            };
            if let Some((after, interrupt)) = &self.raise_after {
                if count > *after {
                    interrupt.raise();
                }
            }
            Ok(SpokenReply {
                text: format!("reply from {voice}"),
                audio: Some(Bytes::from_static(b"mp3")),
            })
        }

        async fn speak_text(&self, _turns: &[ChatTurn]) -> Result<String, ServiceError> {
            Ok("text reply".to_string())
        }
    }

    /// Model stub that always asks to continue; the router's ceiling and
    /// alternation rules bound the turn.
    struct EagerModel;

    #[async_trait]
    impl DialogueModel for EagerModel {
        async fn decide(&self, _system: &str, _user: &str) -> Result<String, ServiceError> {
            Ok(r#"{"next": "critic", "reasoning": "keep going"}"#.to_string())
        }
    }

    /// Model stub that finishes as soon as it is consulted.
    struct SatisfiedModel;

    #[async_trait]
    impl DialogueModel for SatisfiedModel {
        async fn decide(&self, _system: &str, _user: &str) -> Result<String, ServiceError> {
            Ok(r#"{"next": "FINISH", "reasoning": "resolved"}"#.to_string())
        }
    }

    fn collect_outputs() -> (OutputCallback, Arc<Mutex<Vec<PersonaOutput>>>) {
        let delivered: Arc<Mutex<Vec<PersonaOutput>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delivered);
        let callback: OutputCallback = Arc::new(move |output| {
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                sink.lock().push(output);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        (callback, delivered)
    }

    #[tokio::test]
    async fn test_completed_turn_is_critic_then_creative() {
        let orchestrator =
            Orchestrator::new(Arc::new(ScriptedVoice::new()), Arc::new(SatisfiedModel));
        let (callback, delivered) = collect_outputs();
        let interrupt = Arc::new(InterruptSignal::new());

        let outcome = orchestrator
            .run_turn(Vec::new(), "summarize this", String::new(), interrupt, callback)
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::Completed);
        let speakers: Vec<Persona> = outcome.outputs.iter().map(|o| o.persona).collect();
        assert_eq!(speakers, [Persona::Critic, Persona::Creative]);
        assert_eq!(delivered.lock().len(), 2);
        // History: user message plus one entry per delivered output.
        assert_eq!(outcome.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_no_persona_speaks_twice_in_a_row() {
        let orchestrator =
            Orchestrator::new(Arc::new(ScriptedVoice::new()), Arc::new(EagerModel));
        let (callback, _) = collect_outputs();
        let interrupt = Arc::new(InterruptSignal::new());

        let outcome = orchestrator
            .run_turn(Vec::new(), "debate this", String::new(), interrupt, callback)
            .await
            .unwrap();

        for pair in outcome.outputs.windows(2) {
            assert_ne!(pair[0].persona, pair[1].persona);
        }
        assert!(outcome.outputs.len() <= supervisor::MAX_TOPIC_TURNS);
    }

    #[tokio::test]
    async fn test_interrupt_before_start_produces_nothing() {
        let orchestrator =
            Orchestrator::new(Arc::new(ScriptedVoice::new()), Arc::new(SatisfiedModel));
        let (callback, delivered) = collect_outputs();
        let interrupt = Arc::new(InterruptSignal::new());
        interrupt.raise();

        let outcome = orchestrator
            .run_turn(Vec::new(), "never mind", String::new(), Arc::clone(&interrupt), callback)
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::Interrupted);
        assert!(outcome.outputs.is_empty());
        assert!(delivered.lock().is_empty());
        assert!(interrupt.is_observed());
    }

    #[tokio::test]
    async fn test_raise_during_generation_discards_completed_output() {
        let interrupt = Arc::new(InterruptSignal::new());
        // First reply delivered, the raise lands during the second.
        let voice = ScriptedVoice::raising_after(1, Arc::clone(&interrupt));
        let orchestrator = Orchestrator::new(Arc::new(voice), Arc::new(EagerModel));
        let (callback, delivered) = collect_outputs();

        let outcome = orchestrator
            .run_turn(Vec::new(), "debate this", String::new(), Arc::clone(&interrupt), callback)
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::Interrupted);
        assert_eq!(delivered.lock().len(), 1);
        assert_eq!(outcome.outputs.len(), 1);
        // The discarded second reply never enters the history either.
        assert_eq!(outcome.messages.len(), 2);
        assert!(interrupt.is_observed());
    }

    #[tokio::test]
    async fn test_seed_history_flows_into_outcome() {
        let orchestrator =
            Orchestrator::new(Arc::new(ScriptedVoice::new()), Arc::new(SatisfiedModel));
        let (callback, _) = collect_outputs();
        let seed = vec![AgentMessage::user("earlier question")];

        let outcome = orchestrator
            .run_turn(
                seed,
                "follow-up",
                String::new(),
                Arc::new(InterruptSignal::new()),
                callback,
            )
            .await
            .unwrap();

        assert_eq!(outcome.messages[0].text, "earlier question");
        assert_eq!(outcome.messages[1].text, "follow-up");
    }
}
