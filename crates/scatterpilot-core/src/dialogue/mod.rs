//! Slot-filling dialogue: stages, prompts, the per-conversation engine, and
//! the simulated-latency hook.

mod delay;
mod engine;
mod prompts;
mod stage;

pub use delay::DelayPolicy;
pub use engine::{ConversationState, DialogueEngine};
pub use stage::Stage;
