use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bisca_core::GameState;
use bisca_eval::{load_weights, save_weights, NnueWeights, INPUT_SIZE};
use bisca_rng::Lcg64;
use bisca_search::{choose_move, Engine, MctsConfig, TransTable};
use bisca_selfplay::{run_self_play, write_report, write_samples, SelfPlayConfig, SelfPlayReport};

#[derive(Parser)]
#[command(name = "bisca")]
#[command(about = "Bisca4 engine and self-play driver", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive engine loop (newgame / show / play <idx> / bestmove / quit)
    Engine {
        /// Evaluator weight file; random weights are used if it cannot be loaded
        #[arg(long, default_value = "nnue.bin")]
        nnue: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        /// Let the search see the opponent's hand
        #[arg(long)]
        perfect: bool,

        /// Random seed (defaults to current time)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Generate self-play training data
    Selfplay {
        #[arg(long, default_value = "nnue.bin")]
        nnue: PathBuf,

        /// Dataset output path
        #[arg(long, default_value = "dataset.bin")]
        dataset: PathBuf,

        /// Plain-text summary output path
        #[arg(long, default_value = "selfplay_report.txt")]
        report: PathBuf,

        /// Re-save the weights used for the run
        #[arg(long)]
        out_weights: Option<PathBuf>,

        #[arg(short, long, default_value = "200")]
        games: u32,

        #[command(flatten)]
        engine: EngineArgs,

        /// Worker threads (0 = all cores)
        #[arg(short, long, default_value = "0")]
        threads: usize,

        #[arg(long)]
        perfect: bool,

        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Write a freshly initialized random weight file
    Genweights {
        #[arg(long, default_value = "nnue_random.bin")]
        out: PathBuf,

        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Pit two engine configurations against each other
    Match {
        /// First engine: "ab" or "mcts"
        #[arg(long, default_value = "ab")]
        engine_a: String,

        /// Second engine: "ab" or "mcts"
        #[arg(long, default_value = "mcts")]
        engine_b: String,

        #[arg(long, default_value = "nnue.bin")]
        nnue: PathBuf,

        #[arg(short, long, default_value = "100")]
        games: u32,

        #[command(flatten)]
        engine: EngineArgs,

        #[arg(long)]
        perfect: bool,

        #[arg(short, long)]
        seed: Option<u64>,
    },
}

/// Search configuration shared by the subcommands.
#[derive(clap::Args)]
struct EngineArgs {
    /// Use MCTS instead of alpha-beta
    #[arg(long)]
    mcts: bool,

    /// Alpha-beta search depth
    #[arg(short, long, default_value = "3")]
    depth: u32,

    /// Root-parallel alpha-beta instead of iterative deepening
    #[arg(long)]
    root_mt: bool,

    /// MCTS iteration budget
    #[arg(short, long, default_value = "2000")]
    iterations: u32,

    /// MCTS exploration constant
    #[arg(long, default_value = "1.41421356")]
    cpuct: f32,

    /// MCTS rollout step cap (0 = play rollouts to the end)
    #[arg(long, default_value = "0")]
    rollout_limit: u32,
}

impl EngineArgs {
    fn to_engine(&self, use_evaluator: bool) -> Engine {
        if self.mcts {
            Engine::Mcts {
                config: MctsConfig {
                    iterations: self.iterations.max(1),
                    exploration: self.cpuct.max(0.01),
                    rollout_limit: self.rollout_limit,
                },
                use_evaluator,
            }
        } else {
            Engine::AlphaBeta {
                depth: self.depth.max(1),
                root_parallel: self.root_mt,
            }
        }
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

/// Load weights, falling back to random initialization with a warning.
/// Returns whether the file loaded, so MCTS callers can skip the evaluator.
fn load_or_random(path: &Path, rng: &mut Lcg64) -> (NnueWeights, bool) {
    match load_weights(path) {
        Ok(w) => {
            if w.input_size != INPUT_SIZE {
                eprintln!(
                    "Warning: network has input size {} (expected {}).",
                    w.input_size, INPUT_SIZE
                );
            }
            println!("NNUE loaded from {}", path.display());
            (w, true)
        }
        Err(e) => {
            eprintln!(
                "Warning: could not load NNUE from '{}' ({}). Using random weights.",
                path.display(),
                e
            );
            (NnueWeights::init_random(INPUT_SIZE, rng), false)
        }
    }
}

fn run_engine_mode(nnue: &Path, engine_args: &EngineArgs, perfect: bool, seed: u64) -> i32 {
    let mut rng = Lcg64::new(seed);
    let (weights, loaded) = load_or_random(nnue, &mut rng);
    let engine = engine_args.to_engine(loaded);
    let table = TransTable::default();

    let mut state = GameState::deal(&mut rng);
    println!("Bisca4 engine ready.");
    println!("{}", state);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("quit") | Some("exit") => break,
            Some("newgame") => {
                state = GameState::deal(&mut rng);
                println!("New game started.");
                println!("{}", state);
            }
            Some("show") => println!("{}", state),
            Some("bestmove") => {
                let choice = choose_move(&state, &engine, &weights, &table, perfect, &mut rng);
                match choice.mv {
                    Some(mv) => match choice.visits {
                        Some(v) => println!(
                            "bestmove index={} eval={:.4} visits={}",
                            mv, choice.eval, v
                        ),
                        None => println!("bestmove index={} eval={:.4}", mv, choice.eval),
                    },
                    None => println!("bestmove index=-1 eval={:.4}", choice.eval),
                }
            }
            Some("play") => match parts.next().and_then(|s| s.parse::<usize>().ok()) {
                Some(idx) => {
                    let player = state.current_player;
                    if state.play_card(player, idx) {
                        state.maybe_close_trick();
                        println!("Played index {}.", idx);
                        println!("{}", state);
                    } else {
                        println!("Illegal move (idx={}).", idx);
                    }
                }
                None => println!("Usage: play <hand index>"),
            },
            Some(_) => println!("Unknown command."),
            None => {}
        }
    }
    0
}

#[allow(clippy::too_many_arguments)]
fn run_selfplay_mode(
    nnue: &Path,
    dataset: &Path,
    report_path: &Path,
    out_weights: Option<&Path>,
    games: u32,
    engine_args: &EngineArgs,
    threads: usize,
    perfect: bool,
    seed: u64,
) -> i32 {
    let mut rng = Lcg64::new(seed);
    let (weights, loaded) = load_or_random(nnue, &mut rng);

    let cfg = SelfPlayConfig {
        games,
        engine: engine_args.to_engine(loaded),
        perfect_info: perfect,
        threads,
        base_seed: seed,
    };

    println!(
        "Self-play: games={} threads={} perfectInfo={}",
        games,
        if threads == 0 { "auto".to_string() } else { threads.to_string() },
        if perfect { 1 } else { 0 }
    );

    let output = run_self_play(&cfg, &weights);
    println!("Total samples: {}", output.samples.len());

    if let Err(e) = write_samples(dataset, &output.samples) {
        eprintln!("Error: could not write dataset to {}: {}", dataset.display(), e);
        return 1;
    }
    println!("Dataset written to {}", dataset.display());

    let report = SelfPlayReport::from_output(&output, perfect);
    if let Err(e) = write_report(report_path, &report) {
        eprintln!("Warning: could not write report: {}", e);
    }

    if let Some(out) = out_weights {
        if let Err(e) = save_weights(&weights, out) {
            eprintln!("Warning: could not save weights to {}: {}", out.display(), e);
        }
    }
    0
}

fn run_genweights_mode(out: &Path, seed: u64) -> i32 {
    let mut rng = Lcg64::new(seed);
    let weights = NnueWeights::init_random(INPUT_SIZE, &mut rng);
    match save_weights(&weights, out) {
        Ok(()) => {
            println!(
                "Random NNUE written to '{}' (input={}, h1={}, h2={})",
                out.display(),
                weights.input_size,
                weights.hidden1,
                weights.hidden2
            );
            0
        }
        Err(e) => {
            eprintln!("Error: could not write weights to '{}': {}", out.display(), e);
            1
        }
    }
}

fn parse_engine_kind(name: &str, args: &EngineArgs, use_evaluator: bool) -> Option<Engine> {
    match name.to_ascii_lowercase().as_str() {
        "ab" | "alphabeta" => Some(Engine::AlphaBeta {
            depth: args.depth.max(1),
            root_parallel: args.root_mt,
        }),
        "mcts" => Some(Engine::Mcts {
            config: MctsConfig {
                iterations: args.iterations.max(1),
                exploration: args.cpuct.max(0.01),
                rollout_limit: args.rollout_limit,
            },
            use_evaluator,
        }),
        _ => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn run_match_mode(
    engine_a: &str,
    engine_b: &str,
    nnue: &Path,
    games: u32,
    engine_args: &EngineArgs,
    perfect: bool,
    seed: u64,
) -> i32 {
    let mut rng = Lcg64::new(seed);
    let (weights, loaded) = load_or_random(nnue, &mut rng);

    let (Some(a), Some(b)) = (
        parse_engine_kind(engine_a, engine_args, loaded),
        parse_engine_kind(engine_b, engine_args, loaded),
    ) else {
        eprintln!("Unknown engine type (expected 'ab' or 'mcts').");
        return 1;
    };

    let table = TransTable::default();
    let mut wins = [0u32; 2]; // [engine A, engine B]
    let mut draws = 0u32;

    for game in 0..games {
        // Alternate seats so neither engine always leads.
        let a_seat = (game % 2) as usize;
        let mut state = GameState::deal(&mut rng);

        while !state.finished {
            let player = state.current_player;
            let engine = if player == a_seat { &a } else { &b };
            let choice = choose_move(&state, engine, &weights, &table, perfect, &mut rng);
            let Some(mv) = choice.mv else {
                break;
            };
            if !state.play_card(player, mv) {
                break;
            }
            state.maybe_close_trick();
        }

        let a_score = state.score[a_seat];
        let b_score = state.score[1 - a_seat];
        if a_score > b_score {
            wins[0] += 1;
        } else if b_score > a_score {
            wins[1] += 1;
        } else {
            draws += 1;
        }
    }

    println!(
        "Match over {} games: {}={} {}={} draws={}",
        games, engine_a, wins[0], engine_b, wins[1], draws
    );
    0
}

fn main() {
    let args = Args::parse();

    let code = match args.command {
        Command::Engine {
            nnue,
            engine,
            perfect,
            seed,
        } => run_engine_mode(&nnue, &engine, perfect, seed.unwrap_or_else(time_seed)),

        Command::Selfplay {
            nnue,
            dataset,
            report,
            out_weights,
            games,
            engine,
            threads,
            perfect,
            seed,
        } => run_selfplay_mode(
            &nnue,
            &dataset,
            &report,
            out_weights.as_deref(),
            games.max(1),
            &engine,
            threads,
            perfect,
            seed.unwrap_or_else(time_seed),
        ),

        Command::Genweights { out, seed } => {
            run_genweights_mode(&out, seed.unwrap_or_else(time_seed))
        }

        Command::Match {
            engine_a,
            engine_b,
            nnue,
            games,
            engine,
            perfect,
            seed,
        } => run_match_mode(
            &engine_a,
            &engine_b,
            &nnue,
            games.max(1),
            &engine,
            perfect,
            seed.unwrap_or_else(time_seed),
        ),
    };

    std::process::exit(code);
}
