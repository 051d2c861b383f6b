use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use lotoracle_db::models::{Draw, Numbers};
use lotoracle_engine::analysis::gap::GapAnalysis;
use lotoracle_engine::analysis::regime::RegimeReport;
use lotoracle_engine::analysis::trend::TrendReport;
use lotoracle_engine::analysis::zone::ZoneAnalysis;
use lotoracle_engine::analysis::PatternSummary;
use lotoracle_engine::yearly::YearlySummary;
use lotoracle_engine::PredictionResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn format_list(numbers: &[u8]) -> String {
    if numbers.is_empty() {
        return "—".to_string();
    }
    numbers.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Date", "Jeu", "Gagnants", "Machine"]);
    for draw in draws {
        let machine = draw.machine.map(|m| format_numbers(&m)).unwrap_or_else(|| "—".to_string());
        table.add_row(vec![&draw.date, &draw.lotto_type, &format_numbers(&draw.winning), &machine]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_patterns(summary: &PatternSummary) {
    println!("\n📊 Motifs sur les {} derniers tirages\n", summary.window);
    let mut table = new_table(vec!["Indicateur", "Valeur"]);
    table.add_row(vec!["Somme moyenne".to_string(), format!("{:.1} (σ {:.1})", summary.sum_mean, summary.sum_std)]);
    table.add_row(vec!["Plage de somme".to_string(), format!("{} – {}", summary.sum_range.0, summary.sum_range.1)]);
    table.add_row(vec!["Pairs (mode)".to_string(), summary.even_mode.to_string()]);
    table.add_row(vec!["Hauts (mode)".to_string(), summary.high_mode.to_string()]);
    table.add_row(vec!["Chauds".to_string(), format_list(&summary.hot_numbers)]);
    table.add_row(vec!["Froids".to_string(), format_list(&summary.cold_numbers)]);
    table.add_row(vec!["Dus".to_string(), format_list(&summary.due_numbers())]);
    println!("{table}");
}

pub fn display_regime(report: &RegimeReport) {
    let status = if report.detected { "changement détecté" } else { "stable" };
    println!("\n── Régime : {} (confiance {:.2}) ──", status, report.confidence);
    if report.details.is_empty() {
        return;
    }
    let mut table = new_table(vec!["Métrique", "Variation"]);
    for (metric, change) in &report.details {
        table.add_row(vec![metric.clone(), format!("{:+.1} %", change * 100.0)]);
    }
    println!("{table}");
}

pub fn display_zones(zones: &ZoneAnalysis) {
    println!("\n── Zones ──");
    let mut table = new_table(vec!["Zone", "Total", "Récent", "Retard"]);
    for zone in 0..zones.total_counts.len() {
        let label = format!("{}-{}", zone * 10 + 1, zone * 10 + 10);
        let color = if zones.hot_zones.contains(&zone) {
            Color::Green
        } else if zones.cold_zones.contains(&zone) {
            Color::Red
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(label).fg(color),
            Cell::new(zones.total_counts[zone]),
            Cell::new(zones.recent_counts[zone]),
            Cell::new(format!("{:.2}", zones.due_scores[zone])),
        ]);
    }
    println!("{table}");
}

pub fn display_gaps(gaps: &GapAnalysis) {
    println!(
        "\n── Écarts : moyenne {:.1}, σ {:.1}, min {}, max {}, plage idéale {:.1} – {:.1} ──",
        gaps.mean, gaps.std, gaps.min, gaps.max, gaps.ideal_range.0, gaps.ideal_range.1
    );
    let common: Vec<String> = gaps.common_gaps.iter().map(|(g, c)| format!("{g} ({c})")).collect();
    println!("  Écarts fréquents : {}", common.join(", "));
}

pub fn display_trends(trends: &TrendReport) {
    println!("\n── Tendances ──");
    println!("  En hausse      : {}", format_list(&trends.rising));
    println!("  En baisse      : {}", format_list(&trends.falling));
    println!("  En accélération: {}", format_list(&trends.accelerating));
}

pub fn display_yearly(summary: &YearlySummary) {
    let origin = if summary.estimated_years { " (estimées)" } else { "" };
    println!("\n── Analyse annuelle : {} années{} ──", summary.total_years, origin);
    let mut table = new_table(vec!["Année", "Tirages"]);
    for (year, draws) in &summary.draws_per_year {
        table.add_row(vec![year.to_string(), draws.to_string()]);
    }
    println!("{table}");
    println!("  Motifs détectés : {} [{}]", summary.patterns_detected, summary.pattern_types.join(", "));
    println!("  Chauds récurrents : {}", format_list(&summary.top_recurring_hot));
    println!("  Socle stable      : {}", format_list(&summary.stable_foundation));
    println!(
        "  Modèle par date   : {}",
        if summary.date_model_trained { "entraîné" } else { "non entraîné" }
    );
    if let Some(date) = &summary.target_date {
        println!("  Date visée        : {date}");
    }
    if let Some(kind) = &summary.target_lotto_type {
        println!("  Jeu visé          : {kind}");
    }
}

fn confidence_color(level: &str) -> Color {
    match level {
        "high" => Color::Green,
        "medium" => Color::Yellow,
        "low" => Color::DarkYellow,
        _ => Color::Red,
    }
}

pub fn display_prediction(result: &PredictionResult) {
    println!("\n🎯 Prédiction « {} » (graine {})\n", result.strategy, result.seed);

    let mut table = new_table(vec!["Stratégie", "Grille", "Palier", "Réparations", "Confiance"]);
    for (strategy, output) in &result.outputs {
        let report = result.confidence.get(strategy);
        for (i, candidate) in output.candidates.iter().enumerate() {
            let confidence = match (i, report) {
                (0, Some(r)) => Cell::new(format!("{:.2} {}", r.confidence, r.level.label()))
                    .fg(confidence_color(r.level.label())),
                _ => Cell::new("—"),
            };
            table.add_row(vec![
                Cell::new(strategy.name()),
                Cell::new(format_numbers(candidate)),
                Cell::new(output.tier.name()),
                Cell::new(output.repair_rounds),
                confidence,
            ]);
        }
    }
    println!("{table}");

    println!("\n  Deux sûrs    : {}", format_list(&result.two_sure));
    println!("  Trois directs: {}", format_list(&result.three_direct));

    if let Some(report) = result.confidence.get(&result.strategy) {
        println!("  {}", report.recommendation);
    }

    if !result.yearly.is_empty() {
        println!("\n── Grilles annuelles ──");
        let mut table = new_table(vec!["#", "Grille", "Somme", "Pairs", "Hauts", "Confiance", "Source"]);
        for (i, p) in result.yearly.iter().enumerate() {
            table.add_row(vec![
                (i + 1).to_string(),
                format_numbers(&p.numbers),
                p.sum.to_string(),
                p.evens.to_string(),
                p.highs.to_string(),
                format!("{:.2}", p.confidence),
                format!("{:?}", p.source),
            ]);
        }
        println!("{table}");
    }
}

/// Ligne courte pour `--quiet` : la grille principale seule.
pub fn display_primary(ticket: &Numbers) {
    println!("{}", format_numbers(ticket));
}
