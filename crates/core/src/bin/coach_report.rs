//! Print the JSON position report for a FEN or for the final position of
//! every game in a PGN file.

use chess_coach_core::parser::parse_pgn_file;
use chess_coach_core::{analyze_fen, analyze_position, MotifConfig, PositionReport, Result};
use serde::Serialize;
use std::env;
use std::process;

#[derive(Serialize)]
struct GameReport {
    summary: String,
    last_move: Option<String>,
    report: PositionReport,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("coach_report");

    if args.len() < 3 {
        print_usage(program);
        process::exit(1);
    }

    let config = MotifConfig::from_env();
    let outcome = match args[1].as_str() {
        "fen" => report_fen(&args[2], &config),
        "pgn" => report_pgn(&args[2], &config),
        _ => {
            print_usage(program);
            process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> <argument>", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  fen \"<fen>\"    Report on a single position");
    eprintln!("  pgn <file>      Report on the final position of each game");
}

fn report_fen(fen: &str, config: &MotifConfig) -> Result<()> {
    let report = analyze_fen(fen, config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn report_pgn(path: &str, config: &MotifConfig) -> Result<()> {
    let games = parse_pgn_file(path)?;
    let reports: Vec<GameReport> = games
        .into_iter()
        .map(|game| GameReport {
            summary: game.summary(),
            report: analyze_position(&game.final_position, None, config),
            last_move: game.last_move,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
