use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OracleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Ml,
    Genetic,
    Pattern,
    Intelligence,
    Yearly,
    Ensemble,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::Ml,
        Strategy::Genetic,
        Strategy::Pattern,
        Strategy::Intelligence,
        Strategy::Yearly,
        Strategy::Ensemble,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Ml => "ml",
            Strategy::Genetic => "genetic",
            Strategy::Pattern => "pattern",
            Strategy::Intelligence => "intelligence",
            Strategy::Yearly => "yearly",
            Strategy::Ensemble => "ensemble",
        }
    }

    /// Poids de la stratégie, commun au vote d'ensemble et à l'extraction
    /// des numéros de consensus.
    pub fn weight(&self) -> f64 {
        match self {
            Strategy::Ml => 1.0,
            Strategy::Genetic => 1.2,
            Strategy::Pattern => 1.1,
            Strategy::Intelligence => 1.3,
            Strategy::Yearly | Strategy::Ensemble => 1.0,
        }
    }

    /// Paliers essayés dans l'ordre jusqu'à obtenir une grille valide. La
    /// grille par défaut de la configuration termine toujours la chaîne.
    pub fn fallback_chain(&self) -> &'static [Tier] {
        match self {
            Strategy::Ml => &[Tier::Ml, Tier::Frequency, Tier::Default],
            Strategy::Genetic => &[Tier::Genetic, Tier::Frequency, Tier::Default],
            Strategy::Pattern => &[Tier::Pattern, Tier::Frequency, Tier::Default],
            Strategy::Intelligence => &[Tier::Intelligence, Tier::Frequency, Tier::Default],
            Strategy::Yearly => &[Tier::Yearly, Tier::MlBoosted, Tier::Pattern, Tier::Frequency, Tier::Default],
            Strategy::Ensemble => &[Tier::Ensemble, Tier::Frequency, Tier::Default],
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        // "all" est un ancien alias de l'ensemble
        if wanted == "all" {
            return Ok(Strategy::Ensemble);
        }
        Strategy::ALL
            .into_iter()
            .find(|candidate| candidate.name() == wanted)
            .ok_or_else(|| OracleError::subsystem("strategy", format!("stratégie inconnue : {s}")))
    }
}

/// Palier qui a effectivement produit une grille.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Ml,
    Genetic,
    Pattern,
    Intelligence,
    Yearly,
    MlBoosted,
    Ensemble,
    Frequency,
    Default,
}

impl Tier {
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Ml => "ml",
            Tier::Genetic => "genetic",
            Tier::Pattern => "pattern",
            Tier::Intelligence => "intelligence",
            Tier::Yearly => "yearly",
            Tier::MlBoosted => "ml_boosted",
            Tier::Ensemble => "ensemble",
            Tier::Frequency => "frequency",
            Tier::Default => "default",
        }
    }
}
