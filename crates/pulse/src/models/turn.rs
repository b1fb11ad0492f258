use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::render::Renderer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    content: String,
}

impl UserMessage {
    pub fn new<S: Into<String>>(content: S) -> Self {
        UserMessage {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Every message the endpoint produced for one user input
pub struct AssistantResponse {
    messages: Vec<Message>,
    request_id: Option<String>,
}

impl AssistantResponse {
    pub fn new(messages: Vec<Message>, request_id: Option<String>) -> Self {
        AssistantResponse {
            messages,
            request_id,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The correlation id used for feedback and tracing, if the endpoint reported one
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// One entry of the conversation history
pub enum Turn {
    User(UserMessage),
    Assistant(AssistantResponse),
}

impl Turn {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Turn::User(UserMessage::new(content))
    }

    /// The messages this turn contributes to the request context
    pub fn to_input_messages(&self) -> Vec<Message> {
        match self {
            Turn::User(user) => vec![Message::user(user.content())],
            Turn::Assistant(response) => response.messages().to_vec(),
        }
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        for message in self.to_input_messages() {
            renderer.render(&message);
        }
    }
}

impl From<AssistantResponse> for Turn {
    fn from(response: AssistantResponse) -> Self {
        Turn::Assistant(response)
    }
}
