//! Context window policy for resuming after an interruption.
//!
//! When a turn is cut off mid-flight the next turn does not replay the whole
//! transcript to the personas. Only the trailing user messages carry the
//! thread; stale persona output from the abandoned turn is dropped.

use super::AgentMessage;
use super::state::Speaker;

/// How many trailing user messages seed a resumed turn.
pub const RESUME_USER_WINDOW: usize = 2;

/// Keep only the last [`RESUME_USER_WINDOW`] user messages, in order.
pub fn context_window(history: &[AgentMessage]) -> Vec<AgentMessage> {
    let mut kept: Vec<AgentMessage> = history
        .iter()
        .rev()
        .filter(|m| m.speaker == Speaker::User)
        .take(RESUME_USER_WINDOW)
        .cloned()
        .collect();
    kept.reverse();
    kept
}
