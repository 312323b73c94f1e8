pub mod q_table;

pub use q_table::{EpisodeOutcome, QTable, QTableAgent, QTableAgentConfig};
