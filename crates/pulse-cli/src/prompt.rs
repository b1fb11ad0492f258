use anyhow::Result;
use cliclack::input;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Only set for messages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    AskAgain,    // Nothing to send, prompt again
    Message,     // User sent a message
    History,     // Re-render the conversation so far
    ClearScreen, // Wipe the terminal
    Exit,        // User wants to leave the session
}

impl Input {
    fn command(input_type: InputType) -> Self {
        Input {
            input_type,
            content: None,
        }
    }
}

/// Classify a line typed at the prompt
pub fn parse_input(text: &str) -> Input {
    let text = text.trim();

    if text.is_empty() {
        Input::command(InputType::AskAgain)
    } else if text.eq_ignore_ascii_case("/exit") || text.eq_ignore_ascii_case("/quit") {
        Input::command(InputType::Exit)
    } else if text.eq_ignore_ascii_case("/history") {
        Input::command(InputType::History)
    } else if text.eq_ignore_ascii_case("/clear-screen") {
        Input::command(InputType::ClearScreen)
    } else if text.eq_ignore_ascii_case("/?") {
        print_help();
        Input::command(InputType::AskAgain)
    } else {
        Input {
            input_type: InputType::Message,
            content: Some(text.to_string()),
        }
    }
}

pub fn get_input(endpoint: &str) -> Result<Input> {
    let text: String = input(format!("{}  [Help: /?]", endpoint))
        .placeholder("")
        .required(false)
        .interact()?;

    Ok(parse_input(&text))
}

fn print_help() {
    println!("Commands:");
    println!("/exit, /quit - Exit the session");
    println!("/history - Show the conversation so far");
    println!("/clear-screen - Clear the terminal");
    println!("/? - Display this help message");
}
