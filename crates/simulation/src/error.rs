use thiserror::Error;
use tick_vault_core::VaultError;
use tick_vault_core::engine::EngineError;
use tick_vault_domain::MathError;

/// Errors raised while setting up or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulation parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Math(#[from] MathError),
}
