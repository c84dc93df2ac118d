//! Two-persona dialogue turn engine.
//!
//! One turn runs from a user utterance until the router decides to finish or
//! the user interrupts. The pieces:
//! - `state` - append-only message history and per-turn dialogue state
//! - `interrupt` - the shared cancellation signal checked at every await
//! - `supervisor` - the turn router deciding who speaks next
//! - `persona` - the two fixed personas and their responder contract
//! - `orchestrator` - the loop that drives router and responders
//! - `policy` - history trimming for resumed turns
//! - `prompts` - fixed system prompts

mod interrupt;
mod orchestrator;
mod persona;
pub mod policy;
pub mod prompts;
mod state;
pub mod supervisor;

pub use interrupt::InterruptSignal;
pub use orchestrator::{Orchestrator, OutputCallback, TurnOutcome};
pub use persona::Persona;
pub use state::{AgentMessage, DialogueState, PersonaOutput, Route, Speaker, TurnStatus};
