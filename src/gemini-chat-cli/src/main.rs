//! Gemini Chat CLI - Main entry point.
//!
//! Streams answers from a running relay server. With a prompt argument it
//! runs one turn and exits; otherwise it reads prompts from stdin until
//! `/exit`.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gemini_chat_cli::styled_output::{LiveView, print_dim, print_error, print_info, print_warning};
use gemini_chat_cli::{
    ChatMessage, Conversation, DEFAULT_SERVER_URL, Role, StreamConsumer, TurnEnding,
};

/// Terminal chat client for the Gemini relay
#[derive(Parser)]
#[command(name = "gemini-chat")]
#[command(version)]
struct Args {
    /// Relay server URL
    #[arg(long, env = "GEMINI_CHAT_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Show the model's thoughts while streaming
    #[arg(long)]
    show_thoughts: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Prompt to send; starts an interactive session when omitted
    prompt: Vec<String>,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Stream one turn and record it. Returns whether the turn completed.
async fn chat_turn(
    consumer: &StreamConsumer,
    conversation: &mut Conversation,
    prompt: &str,
    show_thoughts: bool,
) -> bool {
    conversation.push_user(prompt);

    let mut view = LiveView::new(show_thoughts);
    let outcome = match consumer.stream_turn(prompt, |event| view.show(event)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            print_error(&e.to_string());
            return false;
        }
    };

    match &outcome.ending {
        TurnEnding::Completed => {}
        TurnEnding::Failed(message) => print_error(message),
        TurnEnding::Interrupted(reason) => {
            println!();
            print_warning(&format!("Stream interrupted: {reason}"));
        }
    }

    let completed = outcome.ending == TurnEnding::Completed;
    conversation.record(outcome.message);
    completed
}

fn print_history(conversation: &Conversation) {
    if conversation.is_empty() {
        print_dim("No messages yet");
        return;
    }

    for ChatMessage {
        role,
        content,
        thought,
    } in conversation.messages()
    {
        match role {
            Role::User => println!("you> {content}"),
            Role::Assistant => {
                if let Some(thought) = thought {
                    print_dim(&format!("thought: {thought}"));
                }
                println!("gemini> {content}");
            }
        }
    }
}

async fn interactive(consumer: &StreamConsumer, show_thoughts: bool) -> Result<()> {
    print_info(&format!(
        "Connected to {}. Type /exit to quit, /history to review, /clear to reset.",
        consumer.base_url()
    ));

    let mut conversation = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match line.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/history" => print_history(&conversation),
            "/clear" => {
                conversation.clear();
                print_dim("Conversation cleared");
            }
            prompt => {
                chat_turn(consumer, &mut conversation, prompt, show_thoughts).await;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(&args.log_level);

    let consumer = StreamConsumer::new(&args.server);

    if !args.prompt.is_empty() {
        let prompt = args.prompt.join(" ");
        let mut conversation = Conversation::new();
        return if chat_turn(&consumer, &mut conversation, &prompt, args.show_thoughts).await {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    if let Err(e) = interactive(&consumer, args.show_thoughts).await {
        print_error(&e.to_string());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
