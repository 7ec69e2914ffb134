//! Flow module - the questionnaire state machine.

mod continuation;
mod engine;
mod handle;
mod phase;
mod session;
mod snapshot;

pub use continuation::{
    continuation_prompt, ContinuationChoice, CONTINUATION_QUESTION_ID, CONTINUE_OPTION,
    SUBMIT_NOW_OPTION,
};
pub use engine::FlowEngine;
pub use handle::FlowHandle;
pub use phase::FlowPhase;
pub use session::{Session, StageProgress};
pub use snapshot::{FlowSnapshot, SnapshotError};
