use bat::WrappingMode;
use console::{measure_text_width, style, truncate_str, Term};
use pulse::models::message::{Message, ToolCall};
use pulse::models::role::Role;
use pulse::render::{AreaContent, AreaId, AreaState, Renderer};
use tracing::warn;

const THEME: &str = "zenburn";

/// Draws the live areas of an in-flight response in place at the bottom of the terminal,
/// and finished messages above them with syntax highlighting.
pub struct TerminalRenderer {
    term: Term,
    areas: Vec<AreaState>,
    drawn_rows: usize,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            areas: Vec::new(),
            drawn_rows: 0,
        }
    }

    /// Replace the live region with the final messages of a turn
    pub fn commit(&mut self, messages: &[Message]) {
        self.reset();
        for message in messages {
            self.render(message);
        }
    }

    /// Drop the live region without printing anything in its place
    pub fn reset(&mut self) {
        self.erase();
        self.areas.clear();
    }

    pub fn clear_screen(&mut self) {
        self.areas.clear();
        self.drawn_rows = 0;
        if let Err(e) = self.term.clear_screen() {
            warn!("Failed to clear the terminal: {}", e);
        }
    }

    fn erase(&mut self) {
        if self.drawn_rows == 0 {
            return;
        }
        if let Err(e) = self.term.clear_last_lines(self.drawn_rows) {
            warn!("Failed to clear the live region: {}", e);
        }
        self.drawn_rows = 0;
    }

    fn redraw(&mut self) {
        self.erase();

        let (height, width) = self.term.size();
        let width = usize::from(width).max(1);
        // Rows scrolled out of view cannot be cleared again, so keep one row for the cursor
        let limit = usize::from(height).saturating_sub(1).max(1);
        let lines: Vec<String> = self.areas.iter().flat_map(area_lines).collect();
        for line in &fit_tail(&lines, width, limit) {
            if let Err(e) = self.term.write_line(line) {
                warn!("Failed to draw the live region: {}", e);
                return;
            }
            self.drawn_rows += rows(line, width);
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn allocate_placeholder(&mut self) -> AreaId {
        self.areas.push(AreaState::Empty);
        self.areas.len() - 1
    }

    fn replace(&mut self, area: AreaId, content: AreaContent<'_>) {
        if let Some(slot) = self.areas.get_mut(area) {
            *slot = match content {
                AreaContent::Notice(text) => AreaState::Notice(text.to_string()),
                AreaContent::Messages(messages) => AreaState::Messages(messages.to_vec()),
            };
            self.redraw();
        }
    }

    fn clear(&mut self, area: AreaId) {
        if let Some(slot) = self.areas.get_mut(area) {
            *slot = AreaState::Empty;
            self.redraw();
        }
    }

    fn render(&mut self, message: &Message) {
        match message.role {
            Role::User => println!("{} {}", style(">").cyan().bold(), message.content),
            Role::Tool => print_panel(
                &message.content,
                &format!(
                    "Tool Response: {}",
                    message.tool_call_id.as_deref().unwrap_or_default()
                ),
                tool_output_language(&message.content),
            ),
            Role::Assistant => {
                if !message.content.is_empty() {
                    print_markdown(&message.content);
                }
                for call in message.tool_calls() {
                    print_tool_request(call);
                }
            }
        }
        println!();
    }
}

/// Plain lines shown for an area while the response is still streaming
fn area_lines(area: &AreaState) -> Vec<String> {
    match area {
        AreaState::Empty => Vec::new(),
        AreaState::Notice(text) => vec![style(text).dim().italic().to_string()],
        AreaState::Messages(messages) => messages
            .iter()
            .flat_map(|message| {
                let mut lines: Vec<String> = message.content.lines().map(str::to_string).collect();
                lines.extend(message.tool_calls().iter().map(|call| {
                    style(format!("{}({})", call.function.name, call.function.arguments))
                        .yellow()
                        .to_string()
                }));
                lines
            })
            .collect(),
    }
}

/// Terminal rows a line occupies once wrapped
fn rows(line: &str, width: usize) -> usize {
    measure_text_width(line).div_ceil(width).max(1)
}

/// The trailing lines of `lines` that fit in `limit` rows of `width` columns
fn fit_tail(lines: &[String], width: usize, limit: usize) -> Vec<String> {
    let mut used = 0;
    let mut start = lines.len();
    while start > 0 {
        let needed = rows(&lines[start - 1], width);
        if used + needed > limit {
            break;
        }
        used += needed;
        start -= 1;
    }

    match lines.last() {
        // A single line taller than the region is cut down to what fits
        Some(last) if start == lines.len() => {
            vec![truncate_str(last, width * limit - 1, "…").into_owned()]
        }
        _ => lines[start..].to_vec(),
    }
}

fn tool_output_language(content: &str) -> &'static str {
    if serde_json::from_str::<serde_json::Value>(content).is_ok() {
        "JSON"
    } else {
        "Markdown"
    }
}

fn print_tool_request(call: &ToolCall) {
    let arguments = serde_json::from_str::<serde_json::Value>(&call.function.arguments)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| call.function.arguments.clone());

    print_panel(
        &arguments,
        &format!("Tool Request: {}", call.function.name),
        "JSON",
    );
}

fn print_panel(content: &str, title: &str, language: &str) {
    let result = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()).name(title))
        .theme(THEME)
        .language(language)
        .grid(true)
        .header(true)
        .wrapping_mode(WrappingMode::Character)
        .print();

    if let Err(e) = result {
        warn!("Failed to highlight output: {}", e);
        println!("{}\n{}", title, content);
    }
}

fn print_markdown(content: &str) {
    let result = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(THEME)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();

    if let Err(e) = result {
        warn!("Failed to highlight output: {}", e);
        println!("{}", content);
    }
}
