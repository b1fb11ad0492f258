use crate::models::message::Message;
use crate::models::turn::Turn;

/// Append-only log of the turns in a session.
///
/// The full log is flattened into the request context on every turn; nothing is windowed
/// or summarized.
#[derive(Debug, Clone, Default)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Flatten every turn, in order, into the endpoint's message list
    pub fn to_input_messages(&self) -> Vec<Message> {
        self.turns
            .iter()
            .flat_map(Turn::to_input_messages)
            .collect()
    }

    /// Drop turns appended after `len`, used to undo a turn that never completed
    pub(crate) fn rollback_to(&mut self, len: usize) {
        self.turns.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::turn::AssistantResponse;

    #[test]
    fn test_flattens_entire_history_in_order() {
        let mut history = History::new();
        history.append(Turn::user("first"));
        history.append(Turn::from(AssistantResponse::new(
            vec![Message::assistant("one"), Message::assistant("two")],
            None,
        )));
        history.append(Turn::user("second"));

        assert_eq!(
            history.to_input_messages(),
            vec![
                Message::user("first"),
                Message::assistant("one"),
                Message::assistant("two"),
                Message::user("second"),
            ]
        );
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_rollback_removes_only_newer_turns() {
        let mut history = History::new();
        history.append(Turn::user("kept"));
        let mark = history.len();
        history.append(Turn::user("dropped"));

        history.rollback_to(mark);
        assert_eq!(history.turns(), &[Turn::user("kept")]);
    }

    #[test]
    fn test_empty_history() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.to_input_messages().is_empty());
        assert!(history.last().is_none());
    }
}
