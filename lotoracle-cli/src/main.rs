mod display;
mod import;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use lotoracle_db::db::{count_draws, db_path, fetch_draws, fetch_last_draws, migrate, open_db};
use lotoracle_db::models::{Draw, Numbers};
use lotoracle_db::rusqlite::Connection;
use lotoracle_engine::analysis::{gap, zone};
use lotoracle_engine::{Engine, HistoricalDataset, OracleConfig, Strategy};
use crate::display::{
    display_draws, display_gaps, display_import_summary, display_patterns, display_prediction,
    display_primary, display_regime, display_trends, display_yearly, display_zones,
};

#[derive(Parser)]
#[command(name = "lotoracle", about = "Prédictions multi-stratégies pour les tirages 5/90")]
struct Cli {
    /// Journalisation détaillée (équivaut à RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fichier de configuration JSON du moteur
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer des tirages depuis un CSV (type,date,g1..g5[,m1..m5])
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Analyser l'historique : motifs, régime, zones, écarts, tendances, années
    Analyze {
        /// Restreindre l'analyse à un type de jeu
        #[arg(short = 't', long)]
        lotto_type: Option<String>,
    },

    /// Prédire le prochain tirage
    Predict {
        /// ml, genetic, pattern, intelligence, yearly ou ensemble
        #[arg(short, long, default_value = "ensemble")]
        strategy: Strategy,

        /// Nombre de grilles annuelles à calculer
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Restreindre l'historique à un type de jeu
        #[arg(short = 't', long)]
        lotto_type: Option<String>,

        /// Résultat complet en JSON
        #[arg(long)]
        json: bool,

        /// N'afficher que la grille principale
        #[arg(short, long)]
        quiet: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<OracleConfig> {
    let Some(path) = path else {
        return Ok(OracleConfig::default());
    };
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Configuration absente, valeurs par défaut");
        return Ok(OracleConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    OracleConfig::from_json(&text).with_context(|| format!("Configuration invalide {:?}", path))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Analyze { lotto_type } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_analyze(&conn, config, lotto_type.as_deref())
        }
        Command::Predict { strategy, count, lotto_type, json, quiet } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_predict(&conn, config, strategy, count, lotto_type.as_deref(), json, quiet)
        }
    }
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("Base vide. Lancez d'abord : lotoracle import");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

/// Historique complet, éventuellement filtré sur un type de jeu.
fn load_history(conn: &Connection, lotto_type: Option<&str>) -> Result<Vec<Draw>> {
    let draws = fetch_draws(conn)?;
    Ok(match lotto_type {
        Some(kind) => draws.into_iter().filter(|d| d.lotto_type.eq_ignore_ascii_case(kind)).collect(),
        None => draws,
    })
}

/// Numéros machine alignés sur l'historique, seulement si tous les tirages
/// en ont.
fn machine_numbers(draws: &[Draw]) -> Option<Vec<Numbers>> {
    draws.iter().map(|d| d.machine).collect()
}

fn build_engine(draws: &[Draw], config: OracleConfig) -> Result<Engine> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Entraînement sur {} tirages…", draws.len()));

    let engine = Engine::new(HistoricalDataset::from_records(draws), config);
    spinner.finish_and_clear();
    Ok(engine?)
}

fn cmd_analyze(conn: &Connection, config: OracleConfig, lotto_type: Option<&str>) -> Result<()> {
    let draws = load_history(conn, lotto_type)?;
    if draws.is_empty() {
        println!("Aucun tirage. Lancez d'abord : lotoracle import");
        return Ok(());
    }
    let engine = build_engine(&draws, config)?;
    let history = engine.dataset();

    display_patterns(&engine.analyze_patterns(history.recent(engine.config().recent_window)));
    display_regime(engine.regime());
    display_zones(&zone::analyze(history.draws()));
    display_gaps(&gap::analyze(history.recent(engine.config().confidence_window)));
    display_trends(engine.trends());
    display_yearly(&engine.yearly_summary());
    Ok(())
}

fn cmd_predict(
    conn: &Connection,
    config: OracleConfig,
    strategy: Strategy,
    count: usize,
    lotto_type: Option<&str>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let draws = load_history(conn, lotto_type)?;
    if draws.is_empty() {
        println!("Aucun tirage. Lancez d'abord : lotoracle import");
        return Ok(());
    }
    let machine = machine_numbers(&draws);
    let engine = build_engine(&draws, config)?;
    let result = engine
        .generate_predictions(strategy, count, machine.as_deref())
        .with_context(|| format!("Échec de la stratégie {strategy}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if quiet {
        if let Some(ticket) = result.primary() {
            display_primary(&ticket);
        }
    } else {
        display_prediction(&result);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_numbers_all_or_nothing() {
        let full = vec![
            Draw::new("A", "2024-01-01", [1, 2, 3, 4, 5], Some([6, 7, 8, 9, 10])),
            Draw::new("A", "2024-01-02", [11, 12, 13, 14, 15], Some([16, 17, 18, 19, 20])),
        ];
        assert_eq!(machine_numbers(&full).map(|m| m.len()), Some(2));

        let mut partial = full.clone();
        partial.push(Draw::new("A", "2024-01-03", [21, 22, 23, 24, 25], None));
        assert_eq!(machine_numbers(&partial), None);
    }

    #[test]
    fn test_load_config_missing_file() {
        let config = load_config(Some(Path::new("/nonexistent/oracle.json"))).unwrap();
        assert_eq!(config, OracleConfig::default());
    }

    #[test]
    fn test_cli_parses_strategy() {
        let cli = Cli::try_parse_from(["lotoracle", "predict", "--strategy", "genetic", "--json"]).unwrap();
        match cli.command {
            Command::Predict { strategy, json, .. } => {
                assert_eq!(strategy, Strategy::Genetic);
                assert!(json);
            }
            _ => panic!("commande inattendue"),
        }
    }
}
