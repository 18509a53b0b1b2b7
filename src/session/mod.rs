mod action;
mod assistant;
pub mod render;
mod state;
pub mod store;

pub use action::{Action, AudioClip, Notice, NoticeLevel, Outcome};
pub use assistant::{split_vocabulary, Assistant};
pub use render::{format_view_text, render, View};
pub use state::{SessionState, VocabularyItem};
pub use store::{MemorySessionStore, SessionId, SessionStore};
