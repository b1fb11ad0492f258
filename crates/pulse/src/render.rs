use crate::models::message::Message;

/// Handle to a display area that can be replaced in place or cleared
pub type AreaId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaContent<'a> {
    /// Transient status text such as "Thinking..."
    Notice(&'a str),
    Messages(&'a [Message]),
}

/// The display the frontend draws into.
///
/// Areas are allocated in display order. Replacing an area redraws only that area and
/// keeps its position relative to the others.
pub trait Renderer {
    fn allocate_placeholder(&mut self) -> AreaId;
    fn replace(&mut self, area: AreaId, content: AreaContent<'_>);
    fn clear(&mut self, area: AreaId);
    /// Draw a finished message permanently, outside of any area
    fn render(&mut self, message: &Message);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AreaState {
    #[default]
    Empty,
    Notice(String),
    Messages(Vec<Message>),
}

/// A change made to one area, in the order the renderer received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaEvent {
    Replaced { area: AreaId, state: AreaState },
    Cleared(AreaId),
}

/// Headless renderer keeping what would be visible in memory
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    areas: Vec<AreaState>,
    transcript: Vec<Message>,
    events: Vec<AreaEvent>,
    replacements: usize,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn areas(&self) -> &[AreaState] {
        &self.areas
    }

    pub fn area(&self, area: AreaId) -> Option<&AreaState> {
        self.areas.get(area)
    }

    /// Every message currently shown in an area, in display order
    pub fn visible_messages(&self) -> Vec<Message> {
        self.areas
            .iter()
            .filter_map(|area| match area {
                AreaState::Messages(messages) => Some(messages.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn visible_notices(&self) -> Vec<&str> {
        self.areas
            .iter()
            .filter_map(|area| match area {
                AreaState::Notice(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Messages drawn permanently through [`Renderer::render`]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Every area change so far, including content that is no longer visible
    pub fn events(&self) -> &[AreaEvent] {
        &self.events
    }

    /// Position in [`MemoryRenderer::events`] of the first time `text` was shown in `area`
    pub fn notice_position(&self, area: AreaId, text: &str) -> Option<usize> {
        self.events.iter().position(|event| match event {
            AreaEvent::Replaced {
                area: shown,
                state: AreaState::Notice(notice),
            } => *shown == area && notice == text,
            _ => false,
        })
    }

    /// How many times any area has been replaced
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl Renderer for MemoryRenderer {
    fn allocate_placeholder(&mut self) -> AreaId {
        self.areas.push(AreaState::Empty);
        self.areas.len() - 1
    }

    fn replace(&mut self, area: AreaId, content: AreaContent<'_>) {
        if let Some(state) = self.areas.get_mut(area) {
            *state = match content {
                AreaContent::Notice(text) => AreaState::Notice(text.to_string()),
                AreaContent::Messages(messages) => AreaState::Messages(messages.to_vec()),
            };
            self.events.push(AreaEvent::Replaced {
                area,
                state: state.clone(),
            });
            self.replacements += 1;
        }
    }

    fn clear(&mut self, area: AreaId) {
        if let Some(state) = self.areas.get_mut(area) {
            *state = AreaState::Empty;
            self.events.push(AreaEvent::Cleared(area));
        }
    }

    fn render(&mut self, message: &Message) {
        self.transcript.push(message.clone());
    }
}
