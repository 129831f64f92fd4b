use std::{io::Write, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    start_game, DriverConfig, GameHandle, GameSetup, GameUpdate, HttpMoveService, Phase,
    ShakmatyRules,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

mod input;
mod render;

use input::{commands, parse_input, Input, InputError, HELP};

#[derive(Parser, Debug)]
#[command(about = "Play chess against humans or engines through a move service")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8443")]
    server_url: String,
    /// `human` or an engine label such as `random`.
    #[arg(long, default_value = "human")]
    player_one: String,
    #[arg(long, default_value = "random")]
    player_two: String,
    /// Pause before each automated move after the first.
    #[arg(long, default_value_t = 250)]
    delay_ms: u64,
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let setup = GameSetup::from_selections(&args.player_one, &args.player_two)?;
    let config = DriverConfig {
        automated_move_delay: Duration::from_millis(args.delay_ms),
        request_timeout: Duration::from_secs(args.timeout_secs),
        ..DriverConfig::default()
    };
    let service = HttpMoveService::new(&args.server_url, &config)?;
    info!(server_url = %service.base_url(), mode = %setup.mode, "starting game");

    let (mut handle, driver) = start_game(Arc::new(service), ShakmatyRules, setup, config)
        .await
        .context("could not start the game")?;
    println!("{}", render::board(&handle.snapshot().fen));
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            update = handle.next_update() => {
                let Some(update) = update else { break };
                if show_update(&handle, &update) {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Flow::Quit = handle_line(&handle, &line) {
                    break;
                }
            }
        }
        prompt();
    }

    drop(handle);
    if let Err(err) = driver.await {
        warn!(error = %err, "game driver ended abnormally");
    }
    Ok(())
}

/// Prints an update; returns `true` once the game is over.
fn show_update(handle: &GameHandle<ShakmatyRules>, update: &GameUpdate) -> bool {
    if let GameUpdate::MoveApplied { fen, pairs, .. } = update {
        println!("\n{}", render::board(fen));
        println!("{}", render::history(pairs));
    }
    if let Some(line) = render::status(update) {
        println!("{line}");
    }
    if let GameUpdate::GameOver(_) = update {
        let snapshot = handle.snapshot();
        println!("final position: {}", snapshot.fen);
        return true;
    }
    false
}

fn handle_line(handle: &GameHandle<ShakmatyRules>, line: &str) -> Flow {
    let promotion_pending = handle.snapshot().phase == Phase::PromotionPending;
    let input = match parse_input(line, promotion_pending) {
        Ok(input) => input,
        Err(InputError::Empty) => return Flow::Continue,
        Err(err) => {
            println!("{err}");
            return Flow::Continue;
        }
    };

    match input {
        Input::Quit => return Flow::Quit,
        Input::Help => println!("{HELP}"),
        Input::Board => {
            let snapshot = handle.snapshot();
            println!("{}", render::board(&snapshot.fen));
            println!("{}", render::history(&snapshot.history.pairs()));
        }
        Input::Hint(square) => {
            let targets = handle.legal_targets(square);
            if targets.is_empty() {
                println!("no moves from {square}");
            } else {
                let targets: Vec<String> = targets.iter().map(ToString::to_string).collect();
                println!("{square}: {}", targets.join(" "));
            }
        }
        Input::Move(descriptor) => {
            // Drag-start veto before any gesture is queued.
            if let Err(rejection) = handle.can_begin_gesture(descriptor.from) {
                println!("not now: {rejection}");
                return Flow::Continue;
            }
        }
        Input::Promote(_) | Input::CancelPromotion | Input::Retry => {}
    }

    for command in commands(&input) {
        if let Err(err) = handle.dispatch(command) {
            println!("{err}");
            break;
        }
    }
    Flow::Continue
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
