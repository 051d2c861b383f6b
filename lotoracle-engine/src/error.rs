use lotoracle_db::models::{Numbers, MAX_NUMBER, PICK_COUNT};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Historique vide : aucun tirage exploitable")]
    EmptyDataset,

    #[error("Données insuffisantes : {required} requis, {actual} disponibles")]
    InsufficientData { required: usize, actual: usize },

    #[error("Échec du sous-système {subsystem} : {reason}")]
    SubsystemFailure { subsystem: &'static str, reason: String },

    #[error("Grille invalide : {0:?}")]
    InvalidCandidate(Vec<u8>),

    #[error("La stratégie intelligence exige les numéros machine")]
    MissingMachineData,
}

pub type Result<T> = std::result::Result<T, OracleError>;

impl OracleError {
    pub fn subsystem(subsystem: &'static str, reason: impl Into<String>) -> Self {
        OracleError::SubsystemFailure { subsystem, reason: reason.into() }
    }
}

/// Contrôle de forme d'une grille produite : 5 numéros distincts dans [1, 90].
/// Retourne la grille triée.
pub fn check_candidate(numbers: &[u8]) -> Result<Numbers> {
    let invalid = || OracleError::InvalidCandidate(numbers.to_vec());
    if numbers.len() != PICK_COUNT {
        return Err(invalid());
    }
    let mut out = [0u8; PICK_COUNT];
    out.copy_from_slice(numbers);
    out.sort_unstable();
    if out[0] < 1 || out[PICK_COUNT - 1] > MAX_NUMBER {
        return Err(invalid());
    }
    if out.windows(2).any(|w| w[0] == w[1]) {
        return Err(invalid());
    }
    Ok(out)
}
