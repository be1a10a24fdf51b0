use std::sync::Arc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use dataxo::{
    DataxoResult, DisappearingMode, GameId, GameUseCase, InMemoryGameRepository, ModeConfig, Move,
    Side, SideRequest, WinSide, MODE_WITH_FRIEND,
};

/// Plays random legal games through the engine and reports the outcomes
#[derive(Parser, Debug)]
#[command(name = "simulate", version)]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 100)]
    games: usize,

    #[arg(long, default_value_t = 4)]
    board_width: i32,

    #[arg(long, default_value_t = 4)]
    board_height: i32,

    #[arg(long, default_value_t = 4)]
    win_line_length: i32,

    /// Pieces per side kept on the board, 0 for unlimited
    #[arg(long, default_value_t = 6)]
    piece_limit: i32,

    /// Give up on a game after this many moves
    #[arg(long, default_value_t = 500)]
    max_moves: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Tally {
    x: usize,
    o: usize,
    draw: usize,
    unfinished: usize,
    logic_errors: usize,
    moves: usize,
}

type Engine = GameUseCase<InMemoryGameRepository>;

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = ModeConfig::new(
        args.board_width,
        args.board_height,
        args.win_line_length,
        args.piece_limit,
    );
    let mode = match DisappearingMode::new(config) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    let engine = GameUseCase::new(Arc::new(InMemoryGameRepository::new()), Arc::new(mode));
    let mut rng = StdRng::seed_from_u64(args.seed);

    println!("Dataxo simulation");
    println!("  - Board: {}x{}", config.board_width, config.board_height);
    println!("  - Win line: {}", config.win_line_length);
    println!("  - Piece limit: {}", config.piece_limit);
    println!("  - Games: {} (seed {})", args.games, args.seed);

    let mut tally = Tally::default();
    for game_num in 0..args.games {
        let (winner, moves) = match play_game(&engine, &mut rng, args.max_moves).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_logic_error() => {
                log::warn!("game {} discarded: {}", game_num + 1, e);
                tally.logic_errors += 1;
                continue;
            }
            Err(e) => {
                eprintln!("game {} aborted: {}", game_num + 1, e);
                std::process::exit(1);
            }
        };

        tally.moves += moves;
        match winner {
            WinSide::X => tally.x += 1,
            WinSide::O => tally.o += 1,
            WinSide::Draw => tally.draw += 1,
            WinSide::None => tally.unfinished += 1,
        }
        if args.verbose {
            println!("  game {}: {} after {} moves", game_num + 1, winner, moves);
        }
    }

    let games = args.games.max(1) as f64;
    println!("\nResults:");
    println!("  X wins:     {} ({:.1}%)", tally.x, tally.x as f64 / games * 100.0);
    println!("  O wins:     {} ({:.1}%)", tally.o, tally.o as f64 / games * 100.0);
    println!("  Draws:      {}", tally.draw);
    println!("  Unfinished: {}", tally.unfinished);
    println!("  Discarded:  {}", tally.logic_errors);
    println!("  Avg moves:  {:.1}", tally.moves as f64 / games);
}

/// Plays one game to completion or `max_moves`, always choosing a random
/// free cell.
async fn play_game(engine: &Engine, rng: &mut StdRng, max_moves: usize) -> DataxoResult<(WinSide, usize)> {
    let game_id = new_game(engine).await?;

    for in_game_id in 0..max_moves {
        let game = engine.get_game(game_id).await?;
        let board = game.board();
        let config = game.config;

        let free: Vec<(i32, i32)> = (0..config.board_height)
            .flat_map(|y| (0..config.board_width).map(move |x| (x, y)))
            .filter(|&(x, y)| board.side_at(x, y) == Side::None)
            .collect();
        let Some(&(x, y)) = free.choose(rng) else {
            return Ok((WinSide::None, in_game_id));
        };

        let side = if in_game_id % 2 == 0 { Side::X } else { Side::O };
        let result = engine
            .make_move(game_id, Move::new(in_game_id, x, y, side))
            .await?;
        if result.game_finished {
            let game = engine.get_game(game_id).await?;
            return Ok((game.winner, in_game_id + 1));
        }
    }

    Ok((WinSide::None, max_moves))
}

async fn new_game(engine: &Engine) -> DataxoResult<GameId> {
    let created = engine
        .create_game("sim-x".into(), MODE_WITH_FRIEND, SideRequest::X)
        .await?;
    engine.join_game(created.game_id, "sim-o".into()).await?;
    engine.start_game(created.game_id).await?;
    Ok(created.game_id)
}
