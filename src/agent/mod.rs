//! Agent contract: the blocking interface every selectable agent satisfies,
//! and the adapter that puts async backends behind it.

pub mod adapter;
pub mod contract;
pub mod conversation;

pub use adapter::Adapter;
pub use contract::{Backend, ChatAgent};
pub use conversation::Conversation;
