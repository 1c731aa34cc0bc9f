//! The terminal front end for the concierge chat widget.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use concierge_core::ChatWidget;
use concierge_core::store::FileStore;
use concierge_core::transcript::{Message, Role};
use concierge_gemini::{GeminiBackend, GeminiConfigBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

const PERSONA: &str = include_str!("./persona.md");
const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // A missing credential surfaces as a session-initialization failure
    // inside the widget, not as a startup crash.
    let config = GeminiConfigBuilder::from_env()
        .unwrap_or_else(|err| {
            warn!("{err}");
            GeminiConfigBuilder::with_api_key("")
        })
        .build();
    let backend = GeminiBackend::new(config);

    let store = FileStore::new(env::temp_dir().join("concierge-session.json"));
    let mut widget = ChatWidget::open(&backend, PERSONA, store).await;

    if widget.is_visible() {
        render_transcript(widget.transcript().messages());
    } else {
        println!("The chat is closed. Type /open to start.");
    }

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/open" => {
                if !widget.is_visible() {
                    widget.toggle_visibility();
                    render_transcript(widget.transcript().messages());
                }
                continue;
            }
            "/close" => {
                if widget.is_visible() {
                    widget.toggle_visibility();
                }
                continue;
            }
            _ => {}
        }

        if !widget.is_visible() {
            println!("The chat is closed. Type /open to start.");
            continue;
        }

        widget.set_input(line);
        let seen = widget.transcript().messages().len();

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        widget.send().await;

        progress_bar.finish_and_clear();
        for message in &widget.transcript().messages()[seen..] {
            render_message(message);
        }
    }
}

fn render_transcript(messages: &[Message]) {
    for message in messages {
        render_message(message);
    }
}

fn render_message(message: &Message) {
    match message.role {
        Role::User => {
            println!(
                "{}{}",
                BAR_CHAR.bright_green(),
                message.content.bright_white()
            );
        }
        Role::Model => {
            println!(
                "{}{}",
                BAR_CHAR.bright_cyan(),
                message.content.bright_white()
            );
            if let Some(sources) = &message.sources {
                for (idx, source) in sources.iter().enumerate() {
                    println!(
                        "{}  [{}] {} ({})",
                        BAR_CHAR.bright_cyan(),
                        idx + 1,
                        source.title,
                        source.uri.bright_blue()
                    );
                }
            }
        }
        Role::Error => {
            println!(
                "{}{}",
                BAR_CHAR.bright_red(),
                message.content.bright_red()
            );
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
