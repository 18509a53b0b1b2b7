use std::io::{self, BufRead, Read};
use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Parser;
use language_assistant_rust::session::{self, Action, Notice, SessionState};
use language_assistant_rust::settings;

#[derive(Parser, Debug)]
#[command(
    name = "language-assistant-rust",
    version,
    about = "Translate text, explain its grammar, drill vocabulary and listen to it"
)]
struct Cli {
    /// Target language name (English, Japanese, Polish, ...)
    #[arg(short = 'l', long = "lang", default_value = "English")]
    lang: String,

    /// Completion model (default: settings [openai] model)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// API key (overrides OPENAI_API_KEY)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Drill the input word by word instead of translating it as a whole
    #[arg(long = "drill")]
    drill: bool,

    /// Also synthesize the translation and print the audio file path
    #[arg(long = "speak")]
    speak: bool,

    /// Show the selectable languages with their locale tags and exit
    #[arg(long = "show-languages")]
    show_languages: bool,

    /// Serve the browser UI and JSON API (address defaults to settings [server] addr)
    #[arg(long = "server", num_args = 0..=1, default_missing_value = "")]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Interactive mode
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(addr) = cli.server.clone() {
        language_assistant_rust::logging::init(true)?;
        let settings = settings::load_settings(cli.read_settings.as_deref().map(Path::new))?;
        let addr = if addr.trim().is_empty() {
            settings.server_addr.clone()
        } else {
            addr
        };
        return language_assistant_rust::server::run_server(settings, cli.key, addr).await;
    }

    language_assistant_rust::logging::init(cli.verbose)?;
    if cli.interactive {
        return run_interactive(cli).await;
    }

    let input = if cli.show_languages {
        None
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer)
    };

    let output = language_assistant_rust::run(
        language_assistant_rust::Config {
            lang: cli.lang,
            model: cli.model,
            key: cli.key,
            settings_path: cli.read_settings,
            drill: cli.drill,
            speak: cli.speak,
            show_languages: cli.show_languages,
        },
        input,
    )
    .await?;

    print_notices(&output.notices);
    if !output.text.is_empty() {
        println!("{}", output.text);
    }
    if output.has_errors() {
        return Err(anyhow!("one or more requests failed"));
    }
    Ok(())
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let prefix = if notice.is_error() { "error" } else { "warning" };
        eprintln!("{}: {}", prefix, notice.message);
    }
}

struct InteractiveState {
    assistant: language_assistant_rust::Assistant<
        language_assistant_rust::OpenAI,
        language_assistant_rust::OpenAI,
    >,
    languages: Vec<String>,
    session: SessionState,
    lang: String,
    last_text: String,
}

impl InteractiveState {
    fn new(cli: &Cli) -> Result<Self> {
        let settings = settings::load_settings(cli.read_settings.as_deref().map(Path::new))?;
        Ok(Self {
            assistant: language_assistant_rust::build_assistant(
                &settings,
                cli.key.clone(),
                cli.model.as_deref(),
            ),
            languages: settings.languages,
            session: SessionState::default(),
            lang: cli.lang.clone(),
            last_text: String::new(),
        })
    }

    async fn apply(&mut self, action: Action) {
        let session = std::mem::take(&mut self.session);
        let outcome = self.assistant.dispatch(session, action).await;
        self.session = outcome.state;
        print_notices(&outcome.notices);
        if let Some(clip) = outcome.audio {
            println!("audio: {}", clip.path.display());
        }
    }

    fn show(&self) {
        let view = session::render(&self.session, &self.languages);
        let text = session::format_view_text(&view);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
}

async fn run_interactive(cli: Cli) -> Result<()> {
    use std::io::Write;

    let mut state = InteractiveState::new(&cli)?;
    println!("Interactive mode. Use /quit or /exit to finish.");
    println!("Type /help to see available commands.");

    let mut line = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    loop {
        line.clear();
        print!("[{}] > ", state.lang);
        io::stdout().flush()?;
        if stdin_lock.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.starts_with('/') {
            if handle_interactive_command(input, &mut state).await? {
                break;
            }
            continue;
        }

        state.last_text = input.to_string();
        state
            .apply(Action::Translate {
                text: input.to_string(),
                language: state.lang.clone(),
            })
            .await;
        state.show();
    }
    Ok(())
}

async fn handle_interactive_command(input: &str, state: &mut InteractiveState) -> Result<bool> {
    let (command, arg) = split_command(input);
    match command {
        "/quit" | "/exit" => return Ok(true),
        "/help" => print_interactive_help(),
        "/show" => state.show(),
        "/clear" => {
            state.session = SessionState::default();
            state.last_text.clear();
            println!("session cleared");
        }
        "/languages" => {
            println!("{}", language_assistant_rust::format_languages(&state.languages));
        }
        "/lang" => {
            if arg.is_empty() {
                println!("lang: {}", state.lang);
            } else {
                state.lang = arg.to_string();
                println!("lang set to {}", arg);
            }
        }
        "/drill" => {
            let text = if arg.is_empty() {
                state.last_text.clone()
            } else {
                arg.to_string()
            };
            let language = state.lang.clone();
            state
                .apply(Action::DrillVocabulary { text, language })
                .await;
            state.show();
        }
        "/play" => {
            let action = if arg.is_empty() {
                Action::PlayAudio
            } else {
                match arg.parse::<usize>() {
                    Ok(number) if number > 0 => Action::PlayItemAudio { index: number - 1 },
                    _ => {
                        eprintln!("expected a vocabulary row number (1, 2, ...)");
                        return Ok(false);
                    }
                }
            };
            state.apply(action).await;
        }
        _ => eprintln!("unknown command: {}", command),
    }
    Ok(false)
}

/// Splits `/cmd rest` into the command word and its trimmed argument.
fn split_command(input: &str) -> (&str, &str) {
    let trimmed = input.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (trimmed, ""),
    }
}

fn print_interactive_help() {
    println!("Commands:");
    println!("  /quit, /exit                 Exit interactive mode");
    println!("  /lang <name>                 Set target language (or show current)");
    println!("  /languages                   Show selectable languages");
    println!("  /drill [words]               Drill words (defaults to the last input)");
    println!("  /play [row]                  Play the translation or a vocabulary row");
    println!("  /show                        Show the current translation and vocabulary");
    println!("  /clear                       Start a fresh session");
    println!("Any other line is translated into the current language.");
}
