use clap::{Parser, Subcommand};

use gridq::algo::{QTableAgent, QTableAgentConfig};
use gridq::grid::{render, Grid, MapError, Position};
use gridq::gridworld::{GridWorld, DEFAULT_MAP};

#[derive(Parser)]
#[command(name = "gridq")]
#[command(about = "Tabular Q-learning on ASCII grid worlds", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent by random exploration and print the learned Q-table
    Learn {
        /// Map description, rows separated by `|`
        #[arg(default_value = DEFAULT_MAP)]
        map: String,

        /// Number of training episodes
        #[arg(long, default_value_t = 100)]
        episodes: u32,

        /// Learning rate, in [0, 1]
        #[arg(long, default_value_t = QTableAgentConfig::default().alpha)]
        alpha: f32,

        /// Discount factor, in [0, 1]
        #[arg(long, default_value_t = QTableAgentConfig::default().gamma)]
        gamma: f32,

        /// Per-episode step cap
        #[arg(long, default_value_t = QTableAgentConfig::default().max_steps)]
        max_steps: u32,
    },

    /// Render a map with the agent drawn at the demo position
    Print {
        /// Map description, rows separated by `|`
        #[arg(default_value = DEFAULT_MAP)]
        map: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), MapError> {
    match cli.command {
        Commands::Learn {
            map,
            episodes,
            alpha,
            gamma,
            max_steps,
        } => {
            let mut world = GridWorld::new(&map)?;
            let config = QTableAgentConfig {
                alpha,
                gamma,
                max_steps,
            };
            let mut agent = QTableAgent::new(&world, config);
            agent.learn(&mut world, episodes);
            print!("{}", agent.table());
        }
        Commands::Print { map } => {
            let grid = Grid::parse(&map)?;
            println!("{}", render(&grid, Position::new(1, 0)));
        }
    }

    Ok(())
}
