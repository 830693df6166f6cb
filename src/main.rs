//! nn-builder - CLI entry point
//!
//! Inspect, score and convert network files from the terminal.

use clap::{Parser, Subcommand};
use nn_builder::challenge::{self, CHALLENGES};
use nn_builder::codec;
use nn_builder::grid::{sample_network, Grid};
use nn_builder::neural::evaluate_full;
use nn_builder::score::{score, ScoreBand};
use nn_builder::{Config, Network};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nn-builder")]
#[command(version)]
#[command(about = "Build, evaluate and score small feed-forward networks")]
struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Write the starting network (2 inputs, 1 linear output)
    New {
        /// Output path
        #[arg(short, long, default_value = "network.json")]
        output: PathBuf,
    },

    /// Evaluate a network at one input point
    Eval {
        /// Network file
        network: PathBuf,

        /// First input (defaults to the file's input values)
        #[arg(long, allow_hyphen_values = true)]
        x1: Option<f64>,

        /// Second input (defaults to the file's input values)
        #[arg(long, allow_hyphen_values = true)]
        x2: Option<f64>,
    },

    /// Score a network against a challenge
    Score {
        /// Network file
        network: PathBuf,

        /// Challenge id
        #[arg(short = 'C', long)]
        challenge: String,
    },

    /// Print a network's heatmap as text
    Render {
        /// Network file
        network: PathBuf,

        /// Characters per side
        #[arg(short, long, default_value = "32")]
        size: usize,

        /// Render the challenge target next to the network
        #[arg(short = 'C', long)]
        challenge: Option<String>,
    },

    /// List built-in challenges
    Challenges,

    /// Write a challenge's pre-authored solution
    Solution {
        /// Challenge id
        challenge: String,

        /// Output path
        #[arg(short, long, default_value = "solution.json")]
        output: PathBuf,
    },

    /// Validate a network file
    Validate {
        /// Network file
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.log_level.as_str()),
    )
    .init();

    match cli.command {
        Commands::Init { output } => generate_config(output),
        Commands::New { output } => write_network(&config, &Network::identity(), output),
        Commands::Eval { network, x1, x2 } => evaluate(&config, network, x1, x2),
        Commands::Score { network, challenge } => score_network(&config, network, &challenge),
        Commands::Render {
            network,
            size,
            challenge,
        } => render(&config, network, size, challenge.as_deref()),
        Commands::Challenges => list_challenges(),
        Commands::Solution { challenge, output } => write_solution(&config, &challenge, output),
        Commands::Validate { file } => validate(&config, file),
    }
}

fn find_challenge(id: &str) -> Result<&'static challenge::Challenge, Box<dyn std::error::Error>> {
    challenge::find(id).ok_or_else(|| format!("unknown challenge '{}'", id).into())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn write_network(
    config: &Config,
    net: &Network,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    codec::export_file(&output, net, &[0.0, 0.0], &config.limits)?;
    println!("Network saved to: {:?}", output);
    Ok(())
}

fn evaluate(
    config: &Config,
    path: PathBuf,
    x1: Option<f64>,
    x2: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let imported = codec::import_file(&path, &config.limits)?;
    let inputs = [
        x1.unwrap_or(imported.inputs[0]),
        x2.unwrap_or(imported.inputs[1]),
    ];

    let trace = evaluate_full(&imported.network, &inputs);
    println!("=== Forward Pass ===");
    println!("Input: ({}, {})", inputs[0], inputs[1]);
    for (l, layer) in imported.network.layers.iter().enumerate() {
        println!();
        println!("Layer {} ({})", l + 1, layer.activation.label());
        for (n, (pre, act)) in trace.pre_activations[l + 1]
            .iter()
            .zip(&trace.activations[l + 1])
            .enumerate()
        {
            println!("  n{}: z = {:.6}  a = {:.6}", n, pre, act);
        }
    }
    println!();
    println!("Output: {}", trace.output());
    Ok(())
}

fn score_network(
    config: &Config,
    path: PathBuf,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let challenge = find_challenge(id)?;
    let imported = codec::import_file(&path, &config.limits)?;

    let resolution = config.grid.resolution;
    let s = score(
        &sample_network(&imported.network, resolution),
        &challenge.target_grid(resolution),
    );

    println!("Challenge: {} ({})", challenge.name, challenge.formula);
    println!("Score: {:.1} ({})", s, ScoreBand::from_score(s));
    Ok(())
}

const RAMP: &[u8] = b" .:-=+*#%@";

fn render_rows(grid: &Grid, size: usize) -> Vec<String> {
    let step = grid.resolution as f64 / size as f64;
    (0..size)
        .map(|row| {
            let j = ((row as f64 * step) as usize).min(grid.resolution - 1);
            (0..size)
                .map(|col| {
                    let i = ((col as f64 * step) as usize).min(grid.resolution - 1);
                    let level = grid.normalized(i, j) * (RAMP.len() - 1) as f64;
                    RAMP[level.round() as usize] as char
                })
                .collect()
        })
        .collect()
}

fn render(
    config: &Config,
    path: PathBuf,
    size: usize,
    challenge: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let size = size.max(2);
    let imported = codec::import_file(&path, &config.limits)?;
    let resolution = config.grid.resolution;
    let grid = sample_network(&imported.network, resolution);

    let target = challenge
        .map(find_challenge)
        .transpose()?
        .map(|c| c.target_grid(resolution));

    let left = render_rows(&grid, size);
    match &target {
        Some(target) => {
            let right = render_rows(target, size);
            for (a, b) in left.iter().zip(&right) {
                println!("{}  |  {}", a, b);
            }
            println!();
            let s = score(&grid, target);
            println!("Score: {:.1} ({})", s, ScoreBand::from_score(s));
        }
        None => {
            for row in &left {
                println!("{}", row);
            }
        }
    }
    println!("Range: [{:.3}, {:.3}]", grid.min, grid.max);
    Ok(())
}

fn list_challenges() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Challenges ===");
    for c in &CHALLENGES {
        let solution = if c.solution().is_some() { "" } else { " (no solution)" };
        println!("{:<8} {:<14} {:<7} {}{}", c.id, c.name, c.difficulty, c.formula, solution);
    }
    Ok(())
}

fn write_solution(
    config: &Config,
    id: &str,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let challenge = find_challenge(id)?;
    let solution = challenge
        .solution()
        .ok_or_else(|| format!("challenge '{}' has no solution", id))?;
    write_network(config, &solution, output)
}

fn validate(config: &Config, path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    match codec::import_file(&path, &config.limits) {
        Ok(imported) => {
            let net = &imported.network;
            println!("Valid ({:?} layout)", imported.shape);
            println!("Layers: {}", net.layer_count());
            println!("Hidden neurons: {}", net.complexity());
            println!("Weights: {}", net.total_weights());
            println!("Input: ({}, {})", imported.inputs[0], imported.inputs[1]);
            Ok(())
        }
        Err(e) => {
            println!("Invalid: {}", e);
            Err(e.into())
        }
    }
}
