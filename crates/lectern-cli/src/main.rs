//! lectern - study a PDF with an AI assistant from the terminal

mod commands;
mod config;
mod quiz_runner;
mod storage;

use anyhow::Context;
use clap::Parser;
use lectern_api::{DocumentStore, StudyClient};
use lectern_session::{Quiz, SessionEvent, StudySession, TurnHandle, TurnOutcome};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// lectern - chat about your documents and quiz yourself
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Document to study (see --documents)
    #[arg(short, long)]
    doc: Option<String>,

    /// Study server URL (default: http://localhost:8000)
    #[arg(short, long)]
    server: Option<String>,

    /// Send a single message and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// List processed documents
    #[arg(long)]
    documents: bool,

    /// Upload a PDF for processing
    #[arg(long, value_name = "PDF")]
    upload: Option<PathBuf>,

    /// Delete a document and its index from the server
    #[arg(long, value_name = "DOC_ID")]
    delete: Option<String>,

    /// Check that the server is up
    #[arg(long)]
    health: bool,

    /// Take a quiz saved with /export
    #[arg(long, value_name = "FILE")]
    take_quiz: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("lectern=debug,lectern_api=debug,lectern_session=debug")
            .with_writer(io::stderr)
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Quizzes on disk need no server
    if let Some(ref path) = args.take_quiz {
        return take_quiz_file(path);
    }

    let cfg = config::Config::load();

    // CLI takes precedence over the config file
    let server_url = args.server.clone().unwrap_or_else(|| cfg.server_url());
    let client = StudyClient::new(server_url);

    if args.health {
        return show_health(&client).await;
    }
    if args.documents {
        return list_documents(&client).await;
    }
    if let Some(ref path) = args.upload {
        return upload_document(&client, path).await;
    }
    if let Some(ref doc_id) = args.delete {
        return delete_document(&client, doc_id, &cfg).await;
    }

    let Some(doc_id) = args.doc.clone() else {
        eprintln!("No document selected.");
        list_documents(&client).await?;
        eprintln!("\nChoose one with: lectern --doc <doc_id>");
        std::process::exit(1);
    };

    let store = Arc::new(storage::FileConversationStore::new(cfg.conversations_dir()));
    let mut session = StudySession::open(doc_id, Arc::new(client), store, cfg.session_config());
    spawn_interrupt_listener(session.handle());

    if let Some(command) = args.command {
        return run_command(&mut session, &command).await;
    }

    run_interactive(&mut session, &cfg).await
}

/// Print streamed events until `done` fires and the backlog is drained
fn spawn_printer(
    mut receiver: broadcast::Receiver<SessionEvent>,
    done: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                biased;
                event = receiver.recv() => event,
                _ = done.cancelled() => break,
            };
            match event {
                Ok(SessionEvent::Content { text }) => {
                    print!("{}", text);
                    io::stdout().flush().ok();
                }
                Ok(SessionEvent::ToolStart { action }) => {
                    println!("\n[{}]", action);
                }
                Ok(SessionEvent::TurnEnd) => println!(),
                Ok(SessionEvent::Error { message }) => {
                    eprintln!("\nError: {}", message);
                }
                Ok(SessionEvent::Checkpoint { id }) => {
                    tracing::debug!("Checkpoint {}", id);
                }
                Ok(SessionEvent::TurnStart { .. } | SessionEvent::QuizReady { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Display skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// What a Ctrl-C does right now
#[derive(Debug, PartialEq)]
enum Interrupt {
    /// A response was streaming and has been cancelled
    AbortTurn,
    /// Nothing to cancel; leave the program
    Exit,
}

fn on_interrupt(handle: &TurnHandle) -> Interrupt {
    if handle.is_streaming() {
        handle.abort();
        Interrupt::AbortTurn
    } else {
        Interrupt::Exit
    }
}

/// Own SIGINT for the whole run: cancel a streaming turn, otherwise exit.
///
/// Once tokio installs its handler the default one is gone for good, so this
/// listener must outlive every turn.
fn spawn_interrupt_listener(handle: TurnHandle) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if on_interrupt(&handle) == Interrupt::Exit {
                println!();
                // 128 + SIGINT
                std::process::exit(130);
            }
        }
    });
}

/// Run one turn with live output
async fn run_turn(session: &mut StudySession, text: &str) -> anyhow::Result<TurnOutcome> {
    let done = CancellationToken::new();
    let printer = spawn_printer(session.subscribe(), done.clone());

    let outcome = session.send(text).await;
    done.cancel();
    let _ = printer.await;

    let outcome = outcome?;
    if outcome == TurnOutcome::Cancelled {
        println!("\n[Cancelled]");
    }
    Ok(outcome)
}

async fn run_command(session: &mut StudySession, command: &str) -> anyhow::Result<()> {
    println!("lectern> {}", command);
    println!();

    match run_turn(session, command).await? {
        TurnOutcome::Completed { quiz: Some(quiz) } => {
            println!(
                "\n[Quiz with {} questions found. Run interactively to take it.]",
                quiz.len()
            );
        }
        TurnOutcome::Failed { .. } => std::process::exit(1),
        _ => {}
    }
    Ok(())
}

async fn run_interactive(session: &mut StudySession, cfg: &config::Config) -> anyhow::Result<()> {
    let quiz_defaults = cfg.quiz_defaults();
    let mut last_quiz: Option<Quiz> = None;

    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("lectern ({})", session.doc_id());
        if !session.messages().is_empty() {
            eprintln!(
                "Resumed conversation with {} messages. /history to review, /new to start over.",
                session.messages().len()
            );
        }
        eprintln!("Type /help for commands. Ctrl-C cancels a response, or exits when idle.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let mut message = input.to_string();
        if let Some(result) = commands::execute_command(input, session, &quiz_defaults) {
            match result {
                commands::CommandResult::Send(text) => message = text,
                commands::CommandResult::NewConversation => {
                    match session.new_conversation() {
                        Ok(()) => println!("Started a new conversation."),
                        Err(e) => eprintln!("Error: {}", e),
                    }
                    last_quiz = None;
                    println!();
                    continue;
                }
                commands::CommandResult::Export(path) => {
                    match &last_quiz {
                        Some(quiz) => match export_quiz(quiz, &path) {
                            Ok(()) => println!("Saved quiz to {}", path.display()),
                            Err(e) => eprintln!("Error: {:#}", e),
                        },
                        None => println!("No quiz yet. Ask for one with /quiz."),
                    }
                    println!();
                    continue;
                }
                commands::CommandResult::TakeQuiz => {
                    match last_quiz.clone() {
                        Some(quiz) => take_quiz(quiz)?,
                        None => println!("No quiz yet. Ask for one with /quiz."),
                    }
                    println!();
                    continue;
                }
                commands::CommandResult::Message(msg) => {
                    println!("{}", msg);
                    println!();
                    continue;
                }
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                    println!();
                    continue;
                }
                commands::CommandResult::Exit => break,
            }
        }

        println!();
        match run_turn(session, &message).await {
            Ok(TurnOutcome::Completed { quiz: Some(quiz) }) => {
                last_quiz = Some(quiz.clone());
                if confirm(&format!(
                    "\nQuiz ready ({} questions). Take it now? [Y/n] ",
                    quiz.len()
                ))? {
                    take_quiz(quiz)?;
                } else {
                    println!("Take it later with /take or save it with /export <file>.");
                }
            }
            Ok(_) => {}
            Err(e) => eprintln!("Error: {}", e),
        }
        println!();
    }

    Ok(())
}

/// Ask a yes/no question; empty input means yes
fn confirm(question: &str) -> io::Result<bool> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.is_empty() || answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn take_quiz(quiz: Quiz) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    quiz_runner::run_quiz(quiz, &mut input, &mut out)?;
    Ok(())
}

fn take_quiz_file(path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let quiz = Quiz::from_json_str(&content)
        .with_context(|| format!("{} is not a valid quiz", path.display()))?;
    println!("{} questions from {}", quiz.len(), path.display());
    take_quiz(quiz)
}

fn export_quiz(quiz: &Quiz, path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, quiz.to_json_pretty())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// The server's own explanation when it sent one
fn describe(e: &lectern_api::Error) -> String {
    e.detail().unwrap_or_else(|| e.to_string())
}

async fn show_health(client: &StudyClient) -> anyhow::Result<()> {
    match client.health().await {
        Ok(health) if health.is_healthy() => {
            println!(
                "{} is healthy ({} {})",
                client.base_url(),
                health.service,
                health.version
            );
        }
        Ok(health) => {
            println!("{} reports status: {}", client.base_url(), health.status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Cannot reach {}: {}", client.base_url(), describe(&e));
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn list_documents(client: &StudyClient) -> anyhow::Result<()> {
    match client.list_documents().await {
        Ok(documents) if documents.is_empty() => {
            println!("No documents found.");
            println!("Upload one with: lectern --upload <file.pdf>");
        }
        Ok(documents) => {
            println!("Documents:\n");
            println!("{:<38} Filename", "ID");
            println!("{}", "-".repeat(70));
            for doc in documents {
                println!("{:<38} {}", doc.doc_id, doc.filename);
            }
            println!("\nStudy with: lectern --doc <doc_id>");
        }
        Err(e) => {
            eprintln!("Error listing documents: {}", describe(&e));
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn upload_document(client: &StudyClient, path: &Path) -> anyhow::Result<()> {
    if !path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    {
        eprintln!("Only PDF files are supported: {}", path.display());
        std::process::exit(1);
    }

    println!("Uploading {}...", path.display());
    match client.upload_document(path).await {
        Ok(doc) => {
            println!("Processed {} as {}", doc.filename, doc.doc_id);
            println!("\nStudy with: lectern --doc {}", doc.doc_id);
        }
        Err(e) => {
            eprintln!("Upload failed: {}", describe(&e));
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn delete_document(
    client: &StudyClient,
    doc_id: &str,
    cfg: &config::Config,
) -> anyhow::Result<()> {
    match client.delete_document(doc_id).await {
        Ok(result) => {
            if result.message.is_empty() {
                println!("Deleted {}", doc_id);
            } else {
                println!("{}", result.message);
            }
        }
        Err(e) => {
            eprintln!("Delete failed: {}", describe(&e));
            std::process::exit(1);
        }
    }

    // The local conversation is meaningless without the document
    let store = storage::FileConversationStore::new(cfg.conversations_dir());
    if let Err(e) = lectern_session::ConversationStore::remove(&store, doc_id) {
        tracing::warn!("Failed to remove saved conversation for {}: {}", doc_id, e);
    }
    Ok(())
}
