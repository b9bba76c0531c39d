use thiserror::Error;

use super::combine::CombineError;
use super::config::ConfigError;
use super::ranking::RankingError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Series assembly failed: {source}")]
    Combine {
        #[from]
        source: CombineError,
    },

    #[error("Ranking failed: {source}")]
    Ranking {
        #[from]
        source: RankingError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}
