//! Headless Go Fish matches.
//!
//! Every simulated human gets its own session on an in-process loopback
//! transport, exactly as separate devices would. The smallest human id hosts
//! the match and runs the automated players; the rest follow its snapshots.

mod config;

use anyhow::{Error, anyhow};
use config::BotsConfig;
use ctrlc::set_handler;
use go_fish::{
    SessionManager, SessionView,
    bot::{BotDecision, BotPacing, RandomStrategy, Strategy, decide, spawn_bots},
    entities::{Participant, Phase, PlayerId},
    net::transport::LoopbackHub,
    session::{SessionHandle, StateChangeNotification},
};
use log::{debug, info, warn};
use pico_args::Arguments;
use rand::{SeedableRng, rngs::StdRng};
use tokio::{sync::mpsc, task::JoinSet, time::sleep};

const HELP: &str = "\
Play Go Fish between simulated humans and automated players

USAGE:
  gf_bots [OPTIONS]

OPTIONS:
  --humans     N           Simulated human players     [default: env GF_HUMANS or 1]
  --bots       N           Automated players           [default: env GF_BOTS or 2]
  --games      N           Matches to play             [default: env GF_GAMES or 1]
  --seed       N           Seed for reproducible runs  [default: env GF_SEED or random]
  --think-ms   MS          Base thinking pause         [default: env GF_THINK_MS or 300]

FLAGS:
  -v, --verbose            Print every game log line
  -h, --help               Print help information

ENVIRONMENT:
  RUST_LOG                 Log filter (default: info)
";

const HUMAN_NAMES: [&str; 6] = ["Alice", "Bob", "Carol", "Dave", "Erin", "Frank"];

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let config = BotsConfig::from_args(&mut pargs)?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
    info!(
        "Playing {} game(s): {} human(s), {} bot(s)",
        config.games, config.humans, config.bots
    );

    for game in 0..config.games {
        let seed = config.seed.map(|seed| seed.wrapping_add(game as u64));
        let view = play_match(&config, seed).await?;
        report(game + 1, &view, config.verbose);
    }

    Ok(())
}

/// Runs one match to completion and returns the host's final view.
async fn play_match(config: &BotsConfig, seed: Option<u64>) -> Result<SessionView, Error> {
    let manager = SessionManager::new();
    let hub = LoopbackHub::new();
    let session_config = config.session_config();

    let mut roster: Vec<Participant> = (0..config.humans)
        .map(|i| {
            let name = HUMAN_NAMES[i % HUMAN_NAMES.len()];
            Participant::human(format!("human-{}", i + 1), name)
        })
        .collect();
    roster.extend(spawn_bots(config.bots));

    // Every endpoint must be listening before the host deals.
    let mut seats = Vec::new();
    for (i, participant) in roster.iter().filter(|p| !p.is_automated).enumerate() {
        let session_id = manager
            .create_session_with_strategy(
                session_config.clone(),
                participant.clone(),
                hub.transport(participant.id.clone()),
                strategy(seed, i as u64 + 100),
            )
            .await
            .map_err(|e| anyhow!("Failed to create session: {e}"))?;
        let handle = manager
            .get_session(session_id)
            .await
            .ok_or_else(|| anyhow!("Session {session_id} vanished"))?;
        hub.register(participant.id.clone(), handle.clone());

        let (tx, rx) = mpsc::channel(1024);
        handle
            .subscribe(tx)
            .await
            .map_err(|e| anyhow!("Failed to subscribe: {e}"))?;
        seats.push((participant.id.clone(), handle, rx));
    }

    let mut drivers = JoinSet::new();
    for (i, (local, handle, rx)) in seats.into_iter().enumerate() {
        let response = handle
            .match_formed(roster.clone())
            .await
            .map_err(|e| anyhow!("Session closed before the match formed: {e}"))?;
        if !response.is_success() {
            return Err(anyhow!("Match rejected: {response:?}"));
        }
        let pacing = BotPacing::new(
            session_config.bot_think_time_ms,
            session_config.bot_think_variance_ms,
        );
        drivers.spawn(drive_human(
            local,
            handle,
            rx,
            strategy(seed, i as u64),
            pacing,
            rng(seed, i as u64),
        ));
    }

    let mut final_views = Vec::new();
    while let Some(joined) = drivers.join_next().await {
        final_views.push(joined??);
    }

    let host_view = final_views
        .into_iter()
        .find(|view| view.is_host)
        .ok_or_else(|| anyhow!("No session hosted the match"))?;
    Ok(host_view)
}

/// Plays one simulated human: waits for its turn on its own view, pauses
/// like a person would, then asks.
async fn drive_human(
    local: PlayerId,
    handle: SessionHandle,
    mut notifications: mpsc::Receiver<StateChangeNotification>,
    mut strategy: Box<dyn Strategy>,
    pacing: BotPacing,
    mut rng: StdRng,
) -> Result<SessionView, Error> {
    let mut acted_on = None;

    while let Some(notification) = notifications.recv().await {
        match notification {
            StateChangeNotification::SessionEnded { disconnected } => {
                return Err(anyhow!(
                    "{local}: session ended early (disconnected: {disconnected:?})"
                ));
            }
            StateChangeNotification::BookCompleted(book) => {
                debug!("{local}: {} completed a book of {}s", book.player_id, book.rank);
            }
            StateChangeNotification::StateChanged | StateChangeNotification::GameOver => {}
        }

        let view = handle.view().await.map_err(|e| anyhow!("{local}: {e}"))?;
        if view.phase == Phase::GameOver {
            return Ok(view);
        }
        if !view.is_turn_of(&local) || view.sequence == acted_on {
            continue;
        }

        acted_on = view.sequence;
        sleep(pacing.think_delay(&mut rng)).await;
        match decide(strategy.as_mut(), &view.players, &local) {
            BotDecision::Ask { target, rank } => {
                let response = handle
                    .submit_ask(local.clone(), target, rank)
                    .await
                    .map_err(|e| anyhow!("{local}: {e}"))?;
                if !response.is_success() {
                    warn!("{local}: ask refused: {:?}", response.error_message());
                }
            }
            BotDecision::Pass => warn!("{local}: nothing to ask with"),
        }
    }

    Err(anyhow!("{local}: session stopped without finishing"))
}

fn strategy(seed: Option<u64>, salt: u64) -> Box<dyn Strategy> {
    match seed {
        Some(seed) => Box::new(RandomStrategy::seeded(seed.wrapping_add(salt))),
        None => Box::new(RandomStrategy::new()),
    }
}

fn rng(seed: Option<u64>, salt: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(salt).wrapping_mul(31)),
        None => StdRng::from_os_rng(),
    }
}

fn report(game: usize, view: &SessionView, verbose: bool) {
    if verbose {
        for line in &view.log {
            println!("  {line}");
        }
    }
    let standings: Vec<String> = view
        .players
        .iter()
        .map(|p| format!("{} {}", p.display_name, p.books))
        .collect();
    let winners: Vec<&str> = view.winners.iter().map(|p| p.display_name.as_str()).collect();
    println!(
        "Game {game}: {} | winner(s): {}",
        standings.join(", "),
        winners.join(", ")
    );
}
