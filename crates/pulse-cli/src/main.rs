mod configuration;
mod error;
mod prompt;
mod terminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use pulse::models::turn::AssistantResponse;
use pulse::render::{MemoryRenderer, Renderer};
use pulse::session::ChatSession;
use pulse::transport::databricks::DatabricksTransport;
use tracing_subscriber::EnvFilter;

use configuration::{Overrides, Settings};
use prompt::{get_input, InputType};
use terminal::TerminalRenderer;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serving endpoint to chat with (can also be set via SERVING_ENDPOINT environment variable)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Databricks host (can also be set via DATABRICKS_HOST environment variable)
    #[arg(long)]
    host: Option<String>,

    /// Databricks token (can also be set via DATABRICKS_TOKEN environment variable)
    #[arg(long)]
    token: Option<String>,

    /// Increase log output, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send a single message and print the response
    Run {
        /// Message to send
        #[arg(short, long)]
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::new(Overrides {
        serving_endpoint: cli.endpoint,
        host: cli.host,
        token: cli.token,
    })?;

    let transport = DatabricksTransport::new(settings.databricks.into_config())?;
    let mut session = ChatSession::start(Box::new(transport), &settings.serving_endpoint).await?;

    match cli.command {
        Some(Command::Run { text }) => run_once(&mut session, &text).await,
        None => run_interactive(&mut session).await,
    }
}

fn init_logging(verbose: u8) {
    // Logs go to stderr so they stay out of the live region
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_once(session: &mut ChatSession, text: &str) -> Result<()> {
    let response = session.submit(text, &mut MemoryRenderer::new()).await?;

    let mut terminal = TerminalRenderer::new();
    for message in response.messages() {
        terminal.render(message);
    }
    print_request_id(session, &response);
    Ok(())
}

async fn run_interactive(session: &mut ChatSession) -> Result<()> {
    let endpoint = session.endpoint().name.clone();
    cliclack::intro(style(format!(" pulse · {} ", endpoint)).on_cyan().black())?;

    let mut renderer = TerminalRenderer::new();
    loop {
        let input = get_input(&endpoint)?;
        match input.input_type {
            InputType::Message => {
                let Some(text) = input.content else {
                    continue;
                };
                match session.submit(&text, &mut renderer).await {
                    Ok(response) => {
                        renderer.commit(response.messages());
                        print_request_id(session, &response);
                    }
                    Err(e) => {
                        renderer.reset();
                        eprintln!("{}", style(format!("Error: {}", e)).red());
                    }
                }
            }
            InputType::History => session.render_history(&mut renderer),
            InputType::ClearScreen => renderer.clear_screen(),
            InputType::AskAgain => continue,
            InputType::Exit => break,
        }
    }

    cliclack::outro("Goodbye")?;
    Ok(())
}

fn print_request_id(session: &ChatSession, response: &AssistantResponse) {
    if !session.endpoint().capabilities.supports_feedback {
        return;
    }
    if let Some(request_id) = response.request_id() {
        println!("{}", style(format!("Request ID: {}", request_id)).dim());
    }
}
