//! watchout-admin CLI tool
//!
//! Reads statistics from the registry and starts rounds.
//!
//! Usage:
//!   watchout-admin list-players
//!   watchout-admin average-last-n <n> <player>
//!   watchout-admin average-between <t1> <t2>
//!   watchout-admin start
//!   watchout-admin broadcast <message>

use serde::de::DeserializeOwned;
use watchout_protocols::{AverageResponse, BroadcastRequest, PeerInfo};

/// Players needed before a round can start.
const MIN_PLAYERS: usize = 2;

enum Command {
    ListPlayers,
    AverageLastN { n: usize, player: u32 },
    AverageBetween { t1: u64, t2: u64 },
    Start,
    Broadcast { message: String },
}

fn print_usage() {
    eprintln!("watchout-admin - Administer a WatchOut game");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  watchout-admin list-players              List registered players");
    eprintln!("  watchout-admin average-last-n <n> <id>   Average of a player's last n heart-rate values");
    eprintln!("  watchout-admin average-between <t1> <t2> Average heart rate between two timestamps (ms)");
    eprintln!("  watchout-admin start                     Start a round");
    eprintln!("  watchout-admin broadcast <message>       Send a message to every player");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  WATCHOUT_REGISTRY_URL  Registry base URL (default: http://127.0.0.1:1337)");
}

fn registry_url() -> String {
    std::env::var("WATCHOUT_REGISTRY_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:1337".to_string())
        .trim_end_matches('/')
        .to_string()
}

fn arg<T: std::str::FromStr>(args: &[String], index: usize, name: &str) -> Result<T, String> {
    let raw = args
        .get(index)
        .ok_or_else(|| format!("Error: missing <{name}> argument"))?;
    raw.parse()
        .map_err(|_| format!("Error: invalid <{name}>: {raw}"))
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    match args.get(1).map(String::as_str) {
        Some("list-players") => Ok(Command::ListPlayers),
        Some("average-last-n") => Ok(Command::AverageLastN {
            n: arg(args, 2, "n")?,
            player: arg(args, 3, "player")?,
        }),
        Some("average-between") => Ok(Command::AverageBetween {
            t1: arg(args, 2, "t1")?,
            t2: arg(args, 3, "t2")?,
        }),
        Some("start") => Ok(Command::Start),
        Some("broadcast") if args.len() > 2 => Ok(Command::Broadcast {
            message: args[2..].join(" "),
        }),
        Some("broadcast") => Err("Error: broadcast requires a message".to_string()),
        Some(other) => Err(format!("Unknown command: {other}")),
        None => Err(String::new()),
    }
}

async fn get<T: DeserializeOwned>(
    http: &reqwest::Client,
    path: &str,
    query: &[(&str, String)],
) -> Result<T, String> {
    let url = format!("{}{}", registry_url(), path);
    let response = http
        .get(&url)
        .query(query)
        .send()
        .await
        .map_err(|e| format!("Failed to reach registry at {url}: {e}\nIs watchout-registry running?"))?;
    decode(response).await
}

async fn post<B: serde::Serialize, T: DeserializeOwned>(
    http: &reqwest::Client,
    path: &str,
    body: &B,
) -> Result<T, String> {
    let url = format!("{}{}", registry_url(), path);
    let response = http
        .post(&url)
        .json(body)
        .send()
        .await
        .map_err(|e| format!("Failed to reach registry at {url}: {e}\nIs watchout-registry running?"))?;
    decode(response).await
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, String> {
    let status = response.status();
    let body = response.text().await.map_err(|e| e.to_string())?;
    if !status.is_success() {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"].as_str().map(str::to_string))
            .unwrap_or(body);
        return Err(format!("Error {}: {}", status.as_u16(), message));
    }
    serde_json::from_str(&body).map_err(|e| format!("Invalid response: {e}"))
}

async fn broadcast(http: &reqwest::Client, message: String) -> Result<(), String> {
    let reply: serde_json::Value = post(http, "/broadcast", &BroadcastRequest { message }).await?;
    println!("Delivered to {} players", reply["delivered"]);
    Ok(())
}

async fn execute(command: Command) -> Result<(), String> {
    let http = reqwest::Client::new();
    match command {
        Command::ListPlayers => {
            let players: Vec<PeerInfo> = get(&http, "/players/get-all", &[]).await?;
            if players.is_empty() {
                println!("(none)");
            }
            for player in players {
                println!("{}", player);
            }
        }
        Command::AverageLastN { n, player } => {
            let reply: AverageResponse = get(
                &http,
                "/players/heart-rate/average/last-n",
                &[("n", n.to_string()), ("player", player.to_string())],
            )
            .await?;
            println!(
                "Average of the last {} heart-rate values of player {}: {:.2}",
                n, player, reply.average
            );
        }
        Command::AverageBetween { t1, t2 } => {
            let reply: AverageResponse = get(
                &http,
                "/players/heart-rate/average/between-time",
                &[("t1", t1.to_string()), ("t2", t2.to_string())],
            )
            .await?;
            println!("Average heart rate between {} and {}: {:.2}", t1, t2, reply.average);
        }
        Command::Start => {
            let players: Vec<PeerInfo> = get(&http, "/players/get-all", &[]).await?;
            if players.len() < MIN_PLAYERS {
                return Err(format!(
                    "Error: at least {} players are needed to start, {} registered",
                    MIN_PLAYERS,
                    players.len()
                ));
            }
            broadcast(&http, "start".to_string()).await?;
        }
        Command::Broadcast { message } => broadcast(&http, message).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    if matches!(args.get(1).map(String::as_str), Some("-h" | "--help" | "help")) {
        print_usage();
        std::process::exit(0);
    }

    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(e) => {
            if !e.is_empty() {
                eprintln!("{}", e);
            }
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = execute(command).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
