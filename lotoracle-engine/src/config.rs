use lotoracle_db::models::Numbers;
use serde::{Deserialize, Serialize};

/// Grille rendue quand aucun palier ne produit de grille valide.
pub const DEFAULT_TICKET: Numbers = [10, 25, 45, 65, 80];

/// Paramètres globaux du moteur. Toutes les constantes numériques des
/// analyseurs et modèles sont regroupées ici ; un fichier JSON partiel
/// suffit, les champs absents reprennent leur valeur par défaut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Fenêtre des tirages récents pour l'analyse de motifs.
    pub recent_window: usize,
    /// Fenêtre utilisée par les analyseurs du score de confiance.
    pub confidence_window: usize,
    /// Grille universelle quand toute la chaîne de repli échoue.
    pub default_ticket: Numbers,
    pub anti_pattern_rounds: usize,
    pub classifier: ClassifierConfig,
    pub genetic: GeneticConfig,
    pub regime: RegimeConfig,
    pub yearly: YearlyConfig,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            recent_window: 50,
            confidence_window: 100,
            default_ticket: DEFAULT_TICKET,
            anti_pattern_rounds: 10,
            classifier: ClassifierConfig::default(),
            genetic: GeneticConfig::default(),
            regime: RegimeConfig::default(),
            yearly: YearlyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Pondère les classes inversement à leur effectif.
    pub class_balanced: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            class_balanced: false,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Tirages observés avant chaque cible d'apprentissage.
    pub lookback: usize,
    /// Historique minimal pour entraîner le classifieur.
    pub min_history: usize,
    pub smote_neighbors: usize,
    pub seed: u64,
    pub forest: ForestConfig,
    pub boosting: BoostingConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            lookback: 50,
            min_history: 60,
            smote_neighbors: 5,
            seed: 42,
            forest: ForestConfig::default(),
            boosting: BoostingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub tournament_size: usize,
    /// Plafond de tirages pour construire un individu initial valide.
    pub max_init_attempts: usize,
    /// Historique récent servant à la distribution de probabilités.
    pub distribution_window: usize,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 150,
            generations: 75,
            mutation_rate: 0.3,
            tournament_size: 3,
            max_init_attempts: 10_000,
            distribution_window: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Tirages récents examinés (coupés en deux moitiés).
    pub window: usize,
    pub threshold: f64,
    /// Écart maximal entre numéros consécutifs pour un tirage « groupé ».
    pub cluster_gap: u8,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self { window: 100, threshold: 0.25, cluster_gap: 25 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearlyConfig {
    /// Découpage en pseudo-années quand les dates manquent.
    pub draws_per_year: usize,
    /// Tirages de l'année courante requis pour appliquer son bonus.
    pub min_current_year_draws: usize,
    /// Échantillons minimaux pour entraîner le prédicteur par date.
    pub min_training_samples: usize,
    pub candidate_pool: usize,
    pub forest: ForestConfig,
    pub boosting: BoostingConfig,
    pub forest_weight: f64,
}

impl Default for YearlyConfig {
    fn default() -> Self {
        Self {
            draws_per_year: 300,
            min_current_year_draws: 10,
            min_training_samples: 100,
            candidate_pool: 30,
            forest: ForestConfig {
                n_trees: 60,
                max_depth: 12,
                min_samples_split: 8,
                min_samples_leaf: 4,
                class_balanced: true,
                seed: 42,
            },
            boosting: BoostingConfig {
                n_estimators: 40,
                max_depth: 4,
                learning_rate: 0.1,
                min_samples_split: 8,
                min_samples_leaf: 4,
            },
            forest_weight: 0.6,
        }
    }
}

impl OracleConfig {
    /// Charge une configuration JSON (champs manquants = valeurs par défaut).
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Configuration allégée pour les tests : mêmes règles, modèles plus petits.
#[cfg(test)]
pub(crate) fn test_config() -> OracleConfig {
    let mut config = OracleConfig::default();
    config.classifier.forest.n_trees = 10;
    config.classifier.boosting.n_estimators = 10;
    config.genetic.population_size = 40;
    config.genetic.generations = 15;
    config.yearly.forest.n_trees = 8;
    config.yearly.forest.max_depth = 6;
    config.yearly.boosting.n_estimators = 8;
    config
}
