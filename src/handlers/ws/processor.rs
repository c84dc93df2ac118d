//! Protocol message dispatch and the speech-to-response pipeline.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::audio::{self, AudioChunk};
use crate::core::dialogue::policy::context_window;
use crate::core::dialogue::{
    AgentMessage, InterruptSignal, Orchestrator, OutputCallback, TurnStatus,
};
use crate::core::now_ms;
use crate::services::{ServiceError, Services};
use crate::state::AppState;

use super::messages::{IncomingMessage, OutgoingMessage};
use super::session::ConnectionSession;

/// Dispatch one protocol message. Returns false when the connection should
/// close.
pub async fn handle_incoming_message(
    message: IncomingMessage,
    session: &mut ConnectionSession,
    tx: &mpsc::Sender<OutgoingMessage>,
    app_state: &Arc<AppState>,
) -> bool {
    match message {
        IncomingMessage::ConnectionInit {
            user_id,
            session_id,
            document_id,
        } => {
            session.user_id = user_id;
            session.session_id = session_id;
            session.document_id = document_id;

            match app_state
                .services
                .store
                .get_document(&session.document_id)
                .await
            {
                Ok(Some(document)) => session.document_text = document.doc_text,
                Ok(None) => {
                    warn!(document_id = %session.document_id, "unknown document, continuing without context");
                }
                Err(e) => {
                    error!("document lookup failed: {e}");
                }
            }

            session.initialized = true;
            info!(
                visitor_id = %session.visitor_id,
                session_id = %session.session_id,
                "connection initialized"
            );
            let _ = tx
                .send(OutgoingMessage::ConnectionAck {
                    visitor_id: session.visitor_id.to_string(),
                    timestamp: now_ms(),
                })
                .await;
            true
        }

        IncomingMessage::SpeechStart { is_barge_in, .. } => {
            if !session.initialized {
                let _ = tx
                    .send(OutgoingMessage::error("connection not initialized"))
                    .await;
                return true;
            }

            session.begin_utterance();

            if is_barge_in == Some(true) {
                debug!(visitor_id = %session.visitor_id, "barge-in, cancelling turn");
                let _ = tx
                    .send(OutgoingMessage::Interrupt { timestamp: now_ms() })
                    .await;
            }
            true
        }

        IncomingMessage::AudioChunk(chunk) => {
            if session.initialized {
                session.pending_audio.push(chunk);
            }
            true
        }

        IncomingMessage::SpeechEnd { duration } => {
            if !session.initialized {
                let _ = tx
                    .send(OutgoingMessage::error("connection not initialized"))
                    .await;
                return true;
            }

            let chunks = session.take_pending_audio();
            if chunks.is_empty() {
                let _ = tx.send(OutgoingMessage::error("no audio captured")).await;
                return true;
            }
            debug!(
                chunks = chunks.len(),
                duration = duration.unwrap_or(0),
                "utterance complete"
            );

            // The pipeline runs detached so the read loop stays free to see
            // the next speech_start and raise the interrupt.
            let services = app_state.services.clone();
            let document_id = session.document_id.clone();
            let document_text = session.document_text.clone();
            let history = Arc::clone(&session.history);
            let interrupt = Arc::clone(&session.interrupt);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Err(e) = run_speech_pipeline(
                    chunks,
                    document_id,
                    document_text,
                    history,
                    interrupt,
                    services,
                    tx.clone(),
                )
                .await
                {
                    error!("speech pipeline failed: {e}");
                    let _ = tx
                        .send(OutgoingMessage::error(format!(
                            "failed to process speech: {e}"
                        )))
                        .await;
                }
            });
            true
        }

        IncomingMessage::Disconnect { .. } => {
            info!(visitor_id = %session.visitor_id, "client disconnect");
            false
        }
    }
}

/// Transcribe one captured utterance and run a dialogue turn on it.
async fn run_speech_pipeline(
    chunks: Vec<AudioChunk>,
    document_id: String,
    document_text: String,
    history: Arc<Mutex<Vec<AgentMessage>>>,
    interrupt: Arc<InterruptSignal>,
    services: Services,
    tx: mpsc::Sender<OutgoingMessage>,
) -> Result<(), ServiceError> {
    let (pcm, sample_rate) = audio::assemble_utterance(chunks)?;
    let wav = audio::wav_from_pcm(&pcm, sample_rate);

    let transcript = services.stt.transcribe(wav).await?;
    if interrupt.is_raised() {
        return Ok(());
    }

    let _ = tx
        .send(OutgoingMessage::Transcript {
            text: transcript.clone(),
            timestamp: now_ms(),
        })
        .await;

    // Silence or noise transcribes to nothing; no turn to run.
    if transcript.trim().is_empty() {
        return Ok(());
    }

    services
        .store
        .save_message(&document_id, "user", &transcript)
        .await?;

    // Seed before pushing, so the new utterance is not counted twice; the
    // turn itself appends the user message.
    let seed = {
        let mut history = history.lock();
        let seed = context_window(&history);
        history.push(AgentMessage::user(transcript.clone()));
        seed
    };

    let orchestrator = Orchestrator::new(services.voice.clone(), services.dialogue_model.clone());

    let callback: OutputCallback = {
        let tx = tx.clone();
        let store = services.store.clone();
        let document_id = document_id.clone();
        let interrupt = Arc::clone(&interrupt);
        Arc::new(move |output| {
            let tx = tx.clone();
            let store = store.clone();
            let document_id = document_id.clone();
            let interrupt = Arc::clone(&interrupt);
            Box::pin(async move {
                if interrupt.is_raised() {
                    return;
                }
                if let Err(e) = store
                    .save_message(&document_id, output.persona.id(), &output.text)
                    .await
                {
                    warn!("failed to persist agent message: {e}");
                }
                let _ = tx
                    .send(OutgoingMessage::AgentResponse {
                        agent_id: output.persona.id().to_string(),
                        text: output.text,
                        audio: output.audio.as_deref().map(audio::encode_base64),
                        timestamp: now_ms(),
                    })
                    .await;
            }) as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        })
    };

    let outcome = orchestrator
        .run_turn(seed, &transcript, document_text, interrupt, callback)
        .await?;

    if outcome.status == TurnStatus::Interrupted {
        info!(correlation_id = %outcome.correlation_id, "turn interrupted by user");
    }
    Ok(())
}
