//! Self-play orchestration: drive whole games with a search engine on both
//! sides, harvest (feature, outcome) training pairs across worker threads,
//! and persist them as a flat binary dataset.

mod dataset;
mod runner;

pub use dataset::{read_samples, write_samples, DatasetError, Sample};
pub use runner::{
    play_game, run_self_play, write_report, SelfPlayConfig, SelfPlayOutput, SelfPlayReport,
};
