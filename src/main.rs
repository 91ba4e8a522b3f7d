//! ibis CLI: issue-based dialogue move engine.

use std::io::{self, BufRead, Write as _};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand};
use miette::Result;

use ibis::channel::{ControllerHandle, EngineOutput, MpscDialogueChannel};
use ibis::conversation::Conversation;
use ibis::database::NullDatabase;
use ibis::dme::DialogueMoveEngine;
use ibis::error::IbisError;
use ibis::seeds::{self, DomainPack};
use ibis::semantics::{Answer, Move, Proposition, Question, Speaker};

#[derive(Parser)]
#[command(name = "ibis", version, about = "Issue-based dialogue move engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive conversation in the terminal.
    Chat {
        /// Load a domain pack from a TOML file instead of the bundled
        /// room-booking pack (external packs run without a fact database).
        #[arg(long)]
        pack: Option<PathBuf>,
    },

    /// Inspect domain packs.
    Pack {
        #[command(subcommand)]
        action: PackAction,
    },
}

#[derive(Subcommand)]
enum PackAction {
    /// List the packs bundled into the binary.
    List,
    /// Show one pack, bundled (by id) or external (by path).
    Show {
        /// Pack id or TOML file path.
        id_or_path: String,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat { pack } => chat(pack),
        Commands::Pack { action } => match action {
            PackAction::List => pack_list(),
            PackAction::Show { id_or_path } => pack_show(&id_or_path),
        },
    }
}

// ── chat ────────────────────────────────────────────────────────────────

fn chat(pack: Option<PathBuf>) -> Result<()> {
    let state = match pack {
        Some(path) => {
            let pack = DomainPack::load(&path)?;
            seeds::state_from_pack(&pack, Arc::new(NullDatabase))?
        }
        None => seeds::room_booking_state()?,
    };

    println!("ibis chat — one move per line:");
    println!("  greet | request | ask <predicate> | <individual> | <predicate>=<argument>");
    println!("  several moves separated by \";\", /quit to leave");
    println!();

    let engine = DialogueMoveEngine::new(state);
    let (channel, handle) = MpscDialogueChannel::pair();
    let terminal = thread::spawn(move || run_terminal(handle));

    let result = Conversation::new(engine, channel).run();
    terminal.join().ok();

    // The terminal hanging up between turns is a normal way to leave.
    match result {
        Err(IbisError::Channel(_)) => Ok(()),
        other => Ok(other?),
    }
}

/// Terminal side of the conversation: print each system turn, read the
/// user's next one. Lockstep works because every user turn produces
/// exactly one NEXT_MOVES event.
fn run_terminal(handle: ControllerHandle) {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        match handle.next_output() {
            Ok(Some(EngineOutput::NextMoves(moves))) => {
                println!("sys> {}", render_moves(&moves));
            }
            _ => return,
        }

        print!("usr> ");
        io::stdout().flush().ok();
        let Some(Ok(line)) = lines.next() else {
            return;
        };
        let line = line.trim();
        if line == "/quit" {
            return;
        }
        if handle.says(Speaker::Usr, parse_utterance(line)).is_err() {
            return;
        }
    }
}

// ── move parsing / rendering ────────────────────────────────────────────

/// Parse one typed utterance with the debug grammar documented at startup.
fn parse_utterance(line: &str) -> Vec<Move> {
    line.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_move)
        .collect()
}

fn parse_move(text: &str) -> Move {
    if text == "greet" {
        Move::Greet
    } else if text == "request" {
        Move::Request
    } else if let Some(predicate) = text.strip_prefix("ask ") {
        Move::Ask(Question::whq(predicate.trim()))
    } else if let Some((predicate, argument)) = text.split_once('=') {
        Move::Answer(Answer::fact(Proposition::new(
            predicate.trim(),
            argument.trim(),
        )))
    } else {
        Move::Answer(Answer::short(text))
    }
}

fn render_moves(moves: &[Move]) -> String {
    if moves.is_empty() {
        return "…".to_string();
    }
    moves
        .iter()
        .map(render_move)
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_move(a_move: &Move) -> String {
    match a_move {
        Move::Greet => "Hello!".to_string(),
        Move::Request => "(request)".to_string(),
        Move::DontUnderstand => "Sorry, I don't understand.".to_string(),
        Move::Ask(q) => format!("Which {}?", q.predicate().replace('_', " ")),
        Move::Answer(Answer::Fact(fact)) => format!(
            "The {} is {}.",
            fact.predicate.replace('_', " "),
            fact.argument
        ),
        Move::Answer(Answer::Short(individual)) => format!("{individual}."),
    }
}

// ── pack inspection ─────────────────────────────────────────────────────

fn pack_list() -> Result<()> {
    for pack in seeds::bundled_packs()? {
        println!("{}  —  {}", pack.id, pack.name);
        if !pack.description.is_empty() {
            println!("    {}", pack.description);
        }
    }
    Ok(())
}

fn pack_show(id_or_path: &str) -> Result<()> {
    let path = PathBuf::from(id_or_path);
    let pack = if path.exists() {
        DomainPack::load(&path)?
    } else {
        seeds::bundled(id_or_path)?
    };

    println!("{} ({})", pack.name, pack.id);
    if !pack.description.is_empty() {
        println!("{}", pack.description);
    }
    println!();
    println!("predicates:");
    for p in &pack.predicates {
        println!("  {} : {}", p.name, p.sort);
    }
    println!("individuals:");
    for i in &pack.individuals {
        println!("  {} : {}", i.name, i.sort);
    }
    println!("plans:");
    for plan in &pack.plans {
        let goal = plan
            .issue
            .as_deref()
            .map(|q| format!("issue ?{q}"))
            .or_else(|| plan.task.as_deref().map(|t| format!("task {t}")))
            .unwrap_or_else(|| "<no goal>".to_string());
        println!("  {goal} ({} steps)", plan.steps.len());
    }
    if !pack.beliefs.is_empty() {
        println!("opening beliefs:");
        for fact in &pack.beliefs {
            println!("  {}({})", fact.predicate, fact.argument);
        }
    }
    Ok(())
}
