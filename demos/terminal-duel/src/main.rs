use rand::seq::IndexedRandom;
use throwdown::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Signs in with `THROWDOWN_TOKEN` if set, otherwise plays as a guest.
struct EnvIdentity;

impl IdentityProvider for EnvIdentity {
    async fn identity(&self) -> Identity {
        match std::env::var("THROWDOWN_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Identity::Token(token.trim().to_owned()),
            _ => Identity::Guest,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Join { ranked: bool },
    Leave,
    Choose(Choice),
    Auto,
    Reset,
    Help,
    Quit,
}

fn parse(line: &str) -> Option<Command> {
    let line = line.trim().to_ascii_lowercase();
    let command = match line.as_str() {
        "ranked" => Command::Join { ranked: true },
        "casual" | "join" => Command::Join { ranked: false },
        "leave" => Command::Leave,
        "auto" => Command::Auto,
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Choose(other.parse().ok()?),
    };
    Some(command)
}

const HELP: &str = "\
commands:
  ranked | casual     join the matchmaking queue
  leave               leave the queue
  rock | paper | scissors (or r/p/s)
                      choose for the current round
  auto                toggle random auto-play
  reset               back to idle (also clears errors)
  quit";

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(state: &SessionState) -> String {
    match state.phase {
        Phase::Idle => "idle. type `ranked` or `casual` to find a match".to_owned(),
        Phase::Queued => format!(
            "searching for a {} match...",
            if state.ranked == Some(true) { "ranked" } else { "casual" }
        ),
        Phase::Playing => {
            let opponent = state
                .opponent
                .as_ref()
                .map_or("?", |o| o.username.as_str());
            let mine = state
                .my_pending_choice
                .map_or_else(|| "-".to_owned(), |c| c.to_string());
            let theirs = if state.opponent_has_chosen { "ready" } else { "thinking" };
            format!(
                "round {} vs {opponent} | {:>2}s | score {} | you: {mine} | them: {theirs}",
                state.current_round, state.seconds_remaining, state.score
            )
        }
        Phase::RoundResolved => match &state.last_round_outcome {
            Some(outcome) => format!(
                "round {}: {} vs {} -> {} | score {}",
                outcome.round,
                outcome.your_choice,
                outcome.opponent_choice,
                match outcome.winner {
                    RoundWinner::You => "you win the round",
                    RoundWinner::Opponent => "opponent wins the round",
                    RoundWinner::Draw => "draw",
                },
                state.score
            ),
            None => format!("round {} resolved", state.current_round),
        },
        Phase::MatchComplete => match &state.match_outcome {
            Some(outcome) => {
                let result = match outcome.result {
                    MatchResult::Win => "you won",
                    MatchResult::Loss => "you lost",
                    MatchResult::Draw => "draw",
                };
                let rating = match (outcome.elo_change, outcome.new_elo) {
                    (Some(change), Some(new)) => format!(" | rating {change:+} -> {new}"),
                    _ => String::new(),
                };
                format!(
                    "match over: {result} {}-{}{rating}. type `reset` to play again",
                    outcome.your_score, outcome.opponent_score
                )
            }
            None => "match over".to_owned(),
        },
        Phase::Failed => format!(
            "error: {}. type `reset` to continue",
            state.failure.as_deref().unwrap_or("unknown")
        ),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    throwdown::logging::init();

    let config = ClientConfig::from_env()?;
    eprintln!("connecting to {}", config.endpoint);
    let client = ThrowdownClient::connect(&config, &EnvIdentity).await?;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = client.subscribe();
    let mut connected = client.watch_connected();
    let mut auto = false;
    let mut last_line = String::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse(&line) {
                    Some(Command::Join { ranked }) => client.join_queue(ranked),
                    Some(Command::Leave) => client.leave_queue(),
                    Some(Command::Choose(choice)) => client.submit_choice(choice),
                    Some(Command::Reset) => client.reset(),
                    Some(Command::Auto) => {
                        auto = !auto;
                        println!("auto-play {}", if auto { "on" } else { "off" });
                        if auto && client.state().can_choose() {
                            client.submit_choice(random_choice());
                        }
                    }
                    Some(Command::Help) => println!("{HELP}"),
                    Some(Command::Quit) => break,
                    None => println!("unknown command {:?}, try `help`", line.trim()),
                }
            }

            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                let rendered = render(&state);
                if rendered != last_line {
                    println!("{rendered}");
                    last_line = rendered;
                }
                if auto && state.can_choose() {
                    client.submit_choice(random_choice());
                }
            }

            _ = connected.wait_for(|c| !*c) => {
                println!("disconnected from server");
                break;
            }
        }
    }

    client.shutdown();
    tracing::debug!("terminal duel exiting");
    Ok(())
}

fn random_choice() -> Choice {
    *Choice::ALL
        .choose(&mut rand::rng())
        .unwrap_or(&Choice::Rock)
}
