//! These models represent the conversation as the frontend sees it
//!
//! Serving endpoints speak three related wire formats: plain chat-completion deltas,
//! chat-agent deltas keyed by message id, and responses-style typed items. Each of them
//! is converted into the chat-completion shaped [`message::Message`] immediately, which is
//! also the shape sent back to the endpoint as request context on the next turn.
pub mod message;
pub mod role;
pub mod turn;
