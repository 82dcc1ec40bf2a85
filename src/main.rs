use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rug_quest::config::settings::{EngineSettings, Provider};
use rug_quest::config::settings_io::{load_settings, save_settings};
use rug_quest::engine::apply_turn::{TurnController, MAX_FREE_TEXT_CHARS, START_CHOICE};
use rug_quest::engine::engine::{spawn_session, SessionHandle};
use rug_quest::engine::launch::CuratedLaunchPrices;
use rug_quest::engine::llm_client::{build_generator, LmStudioClient};
use rug_quest::engine::termination::SessionStatus;
use rug_quest::model::game_state::GameState;
use rug_quest::model::turn_result::TurnOutcome;

const WRITE_YOUR_OWN: &str = "✍️ Write your own";
const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Parser)]
#[command(name = "rug_quest")]
#[command(about = "Launch a memecoin with Reply Guy, one degen move at a time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a session in the terminal
    Play {
        /// Narrative generator to use (overrides settings)
        #[arg(long, value_enum)]
        provider: Option<Provider>,

        /// Token ticker, without the $
        #[arg(long)]
        token: Option<String>,

        /// Seed for launch prices and the offline generator
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check the connection to the local LM Studio server
    Check,

    /// Print the active settings, or write them to the settings file
    Config {
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut settings = load_settings();

    match cli.command {
        Commands::Play {
            provider,
            token,
            seed,
        } => {
            if let Some(provider) = provider {
                settings.provider = provider;
            }
            if let Some(token) = token {
                settings.token_name = token.trim_start_matches('$').to_uppercase();
            }
            play(&settings, seed.unwrap_or_else(rand::random))
        }

        Commands::Check => {
            let client = LmStudioClient::new(&settings)?;
            println!("{}", client.test_connection()?);
            Ok(())
        }

        Commands::Config { write } => {
            if write {
                let path = save_settings(&settings)?;
                println!("Wrote {}", path.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            Ok(())
        }
    }
}

fn play(settings: &EngineSettings, seed: u64) -> Result<()> {
    let generator = build_generator(settings, seed).context("cannot start the narrative generator")?;
    let controller = TurnController::new(generator)
        .with_policy(settings.termination_policy())
        .with_seed(CuratedLaunchPrices::seeded(seed));

    let session = spawn_session(controller, &settings.token_name);
    let result = game_loop(&session);
    session.shutdown();
    result
}

fn game_loop(session: &SessionHandle) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut state = session.snapshot()?;

    loop {
        render(&state);

        let mut menu = state.current_options.clone();
        if !state.game_over {
            menu.push(WRITE_YOUR_OWN.to_string());
        }
        for (i, option) in menu.iter().enumerate() {
            println!("  {}) {}", i + 1, option);
        }
        println!("  q) quit");

        let Some(line) = prompt(&mut lines, "> ")? else {
            return Ok(());
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(());
        }

        let Some(picked) = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| menu.get(i))
        else {
            println!("Pick a number, boss.");
            continue;
        };

        let (choice, free_text) = if picked == WRITE_YOUR_OWN {
            let Some(text) = read_free_text(&mut lines)? else {
                return Ok(());
            };
            (picked.clone(), Some(text))
        } else if state.game_over {
            (START_CHOICE.to_string(), None)
        } else {
            (picked.clone(), None)
        };

        let report = session.play(&choice, free_text.as_deref(), |_| {
            println!("\n  Reply Guy is typing...");
        })?;

        if let TurnOutcome::Degraded { reason } | TurnOutcome::Rejected { reason } = &report.outcome {
            log::warn!("Turn not applied: {}", reason);
        }
        state = report.state;
    }
}

fn read_free_text(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<Option<String>> {
    loop {
        let Some(text) = prompt(lines, &format!("Your move ({} chars max): ", MAX_FREE_TEXT_CHARS))? else {
            return Ok(None);
        };
        let text = text.trim().to_string();
        match text.chars().count() {
            0 => println!("Say something, ser."),
            n if n > MAX_FREE_TEXT_CHARS => println!("{} chars is too many, keep it under {}.", n, MAX_FREE_TEXT_CHARS),
            _ => return Ok(Some(text)),
        }
    }
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, label: &str) -> Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;
    lines.next().transpose().map_err(Into::into)
}

fn render(state: &GameState) {
    let arrow = if state.is_price_positive { "▲" } else { "▼" };
    println!();
    println!(
        "${}  ${:.4}  {} {:+.2}%   [{}]  turn {}",
        state.token_name,
        state.price,
        arrow,
        state.price_change_percent,
        state.current_scene,
        state.turn_count
    );
    println!("  {}", sparkline(state));
    println!();

    if !state.current_message.is_empty() {
        println!("  Reply Guy: {}", state.current_message);
    }
    if SessionStatus::of(state) == SessionStatus::Ended {
        println!();
        println!("  GAME OVER: {}", state.end_message);
    }
    println!();
}

fn sparkline(state: &GameState) -> String {
    let points: Vec<f64> = state.price_history.iter().copied().collect();
    let min = points.iter().copied().fold(f64::INFINITY, f64::min);
    let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    points
        .iter()
        .map(|p| {
            if span <= 0.0 {
                SPARK_BARS[3]
            } else {
                let idx = ((p - min) / span * (SPARK_BARS.len() - 1) as f64).round() as usize;
                SPARK_BARS[idx.min(SPARK_BARS.len() - 1)]
            }
        })
        .collect()
}
