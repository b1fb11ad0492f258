//! Reduce the partial message fragments of delta-style protocols into whole messages.
//!
//! A fragment only ever adds information: text is appended, tool-call arguments are
//! appended to the call they name, and scalar fields overwrite earlier values. Feeding a
//! prefix of the fragments to a [`MessageBuilder`] yields a renderable partial message,
//! and feeding the rest afterwards gives the same result as feeding everything at once.
use std::collections::HashMap;

use serde_json::Value;

use crate::models::message::{string_field, FunctionCall, Message, ToolCall, FUNCTION_TOOL_TYPE};
use crate::models::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolCallFragment {
    pub id: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl ToolCallFragment {
    pub fn from_value(value: &Value) -> Self {
        let function = value.get("function");
        ToolCallFragment {
            id: string_field(value, "id"),
            kind: string_field(value, "type"),
            name: function.and_then(|f| string_field(f, "name")),
            arguments: function.and_then(|f| string_field(f, "arguments")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// One partial update to a single message
pub struct MessageFragment {
    pub id: Option<String>,
    pub role: Option<Role>,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallFragment>,
    pub tool_call_id: Option<String>,
}

impl MessageFragment {
    /// Read a chat-agent `delta` object, defaulting anything missing
    pub fn from_delta(delta: &Value) -> Self {
        MessageFragment {
            id: string_field(delta, "id"),
            role: delta
                .get("role")
                .and_then(Value::as_str)
                .map(|role| Role::from_wire(Some(role))),
            content: string_field(delta, "content"),
            tool_calls: delta
                .get("tool_calls")
                .and_then(Value::as_array)
                .map(|calls| calls.iter().map(ToolCallFragment::from_value).collect())
                .unwrap_or_default(),
            tool_call_id: string_field(delta, "tool_call_id"),
        }
    }

    pub fn text<S: Into<String>>(content: S) -> Self {
        MessageFragment {
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

/// Mutable record of one in-flight message
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    id: Option<String>,
    role: Option<Role>,
    content: String,
    tool_calls: Vec<ToolCall>,
    tool_call_index: HashMap<String, usize>,
    tool_call_id: Option<String>,
    fragments: usize,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &MessageFragment) {
        // Identity comes from the first fragment of the message
        if self.fragments == 0 {
            self.id = fragment.id.clone();
            self.role = fragment.role;
        }
        self.fragments += 1;

        if let Some(content) = &fragment.content {
            self.content.push_str(content);
        }

        for call in &fragment.tool_calls {
            self.push_tool_call(call);
        }

        if let Some(call_id) = fragment.tool_call_id.as_deref().filter(|id| !id.is_empty()) {
            self.tool_call_id = Some(call_id.to_string());
        }
    }

    fn push_tool_call(&mut self, call: &ToolCallFragment) {
        let Some(id) = call.id.as_deref().filter(|id| !id.is_empty()) else {
            return;
        };
        let name = call.name.as_deref().unwrap_or_default();
        let arguments = call.arguments.as_deref().unwrap_or_default();

        match self.tool_call_index.get(id) {
            Some(&index) => {
                let existing = &mut self.tool_calls[index].function;
                existing.arguments.push_str(arguments);
                if !name.is_empty() {
                    existing.name = name.to_string();
                }
            }
            None => {
                self.tool_call_index
                    .insert(id.to_string(), self.tool_calls.len());
                self.tool_calls.push(ToolCall {
                    id: id.to_string(),
                    kind: call
                        .kind
                        .clone()
                        .unwrap_or_else(|| FUNCTION_TOOL_TYPE.to_string()),
                    function: FunctionCall {
                        name: name.to_string(),
                        arguments: arguments.to_string(),
                    },
                });
            }
        }
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// The message as accumulated so far
    pub fn snapshot(&self) -> Message {
        Message {
            role: self.role.unwrap_or_default(),
            content: self.content.clone(),
            tool_calls: (!self.tool_calls.is_empty()).then(|| self.tool_calls.clone()),
            tool_call_id: self.tool_call_id.clone(),
            id: self.id.clone(),
        }
    }

    pub fn finish(self) -> Message {
        Message {
            role: self.role.unwrap_or_default(),
            content: self.content,
            tool_calls: (!self.tool_calls.is_empty()).then_some(self.tool_calls),
            tool_call_id: self.tool_call_id,
            id: self.id,
        }
    }
}

/// Reduce the fragments of one message, in arrival order, into the finished message
pub fn reduce_fragments<'a, I>(fragments: I) -> Message
where
    I: IntoIterator<Item = &'a MessageFragment>,
{
    let mut builder = MessageBuilder::new();
    for fragment in fragments {
        builder.push(fragment);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(id: &str, name: Option<&str>, arguments: &str) -> MessageFragment {
        MessageFragment {
            id: Some("msg".to_string()),
            tool_calls: vec![ToolCallFragment {
                id: Some(id.to_string()),
                kind: None,
                name: name.map(str::to_string),
                arguments: Some(arguments.to_string()),
            }],
            ..Default::default()
        }
    }

    fn sample_fragments() -> Vec<MessageFragment> {
        vec![
            MessageFragment {
                id: Some("msg".to_string()),
                role: Some(Role::Assistant),
                content: Some("Looking ".to_string()),
                ..Default::default()
            },
            call("a", Some("search"), "{\"q\":"),
            MessageFragment::text("it up"),
            call("b", Some("fetch"), "{}"),
            call("a", None, "\"x\"}"),
            MessageFragment {
                tool_call_id: Some("r1".to_string()),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_concatenates_text_without_trimming() {
        let fragments = vec![
            MessageFragment::text("The "),
            MessageFragment::text("answer "),
            MessageFragment::text(""),
            MessageFragment::text("is 42. "),
        ];
        let message = reduce_fragments(&fragments);
        assert_eq!(message.content, "The answer is 42. ");
        assert_eq!(message.role, Role::Assistant);
        assert!(message.tool_calls.is_none());
    }

    #[test]
    fn test_tool_calls_keep_first_seen_order() {
        let fragments = vec![call("a", None, "1"), call("b", None, "x"), call("a", None, "2")];
        let message = reduce_fragments(&fragments);

        let ids: Vec<_> = message.tool_calls().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(message.tool_calls()[0].function.arguments, "12");
        assert_eq!(message.tool_calls()[1].function.arguments, "x");
        assert_eq!(message.tool_calls()[0].kind, "function");
    }

    #[test]
    fn test_name_only_overwritten_when_supplied() {
        let fragments = vec![
            call("a", Some("first"), ""),
            call("a", Some(""), ""),
            call("a", None, ""),
        ];
        assert_eq!(reduce_fragments(&fragments).tool_calls()[0].function.name, "first");

        let fragments = vec![call("a", Some("first"), ""), call("a", Some("second"), "")];
        assert_eq!(reduce_fragments(&fragments).tool_calls()[0].function.name, "second");
    }

    #[test]
    fn test_tool_call_without_id_is_ignored() {
        let fragment = MessageFragment {
            tool_calls: vec![ToolCallFragment {
                arguments: Some("{}".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(reduce_fragments([&fragment]).tool_calls.is_none());
    }

    #[test]
    fn test_tool_call_id_last_non_empty_wins() {
        let ids = [None, Some("r1"), None, Some("r2"), Some("")];
        let fragments: Vec<_> = ids
            .iter()
            .map(|id| MessageFragment {
                tool_call_id: id.map(str::to_string),
                ..Default::default()
            })
            .collect();
        assert_eq!(reduce_fragments(&fragments).tool_call_id.as_deref(), Some("r2"));
    }

    #[test]
    fn test_reduction_is_idempotent() {
        let fragments = sample_fragments();
        assert_eq!(reduce_fragments(&fragments), reduce_fragments(&fragments));
    }

    #[test]
    fn test_prefix_then_suffix_matches_whole() {
        let fragments = sample_fragments();
        let whole = reduce_fragments(&fragments);

        for split in 0..=fragments.len() {
            let mut builder = MessageBuilder::new();
            for fragment in &fragments[..split] {
                builder.push(fragment);
            }
            let partial = builder.snapshot();
            assert_eq!(partial, reduce_fragments(&fragments[..split]));

            for fragment in &fragments[split..] {
                builder.push(fragment);
            }
            assert_eq!(builder.finish(), whole, "split at {split}");
        }
    }

    #[test]
    fn test_identity_from_first_fragment() {
        let fragments = vec![
            MessageFragment {
                id: Some("m1".to_string()),
                role: Some(Role::Tool),
                ..Default::default()
            },
            MessageFragment {
                id: Some("m2".to_string()),
                role: Some(Role::Assistant),
                content: Some("out".to_string()),
                ..Default::default()
            },
        ];
        let message = reduce_fragments(&fragments);
        assert_eq!(message.id.as_deref(), Some("m1"));
        assert_eq!(message.role, Role::Tool);
    }

    #[test]
    fn test_from_delta() {
        let fragment = MessageFragment::from_delta(&json!({
            "id": "m1",
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "c1",
                "type": "function",
                "function": {"name": "lookup", "arguments": "{\"a\""}
            }]
        }));

        assert_eq!(fragment.id.as_deref(), Some("m1"));
        assert_eq!(fragment.content, None);
        assert_eq!(fragment.tool_calls[0].name.as_deref(), Some("lookup"));
        assert_eq!(fragment.tool_calls[0].arguments.as_deref(), Some("{\"a\""));
    }
}
