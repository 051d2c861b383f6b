use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use lotoracle_db::rusqlite::Connection;
use std::path::Path;
use tracing::warn;

use lotoracle_db::db::insert_draw;
use lotoracle_db::models::{Draw, to_numbers};

/// Accepte `JJ/MM/AAAA` ou `AAAA-MM-JJ`, rend une date ISO.
fn parse_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

fn parse_numbers(record: &csv::StringRecord, start: usize) -> Result<Option<Vec<u8>>> {
    let fields: Vec<&str> = (start..start + 5)
        .map(|idx| record.get(idx).map(str::trim).unwrap_or(""))
        .collect();
    if fields.iter().all(|f| f.is_empty()) {
        return Ok(None);
    }
    let numbers = fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            f.parse::<u8>()
                .with_context(|| format!("Impossible de parser '{}' (index {})", f, start + i))
        })
        .collect::<Result<Vec<u8>>>()?;
    Ok(Some(numbers))
}

/// Ligne `type,date,g1..g5[,m1..m5]`.
fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let lotto_type = record.get(0).map(str::trim).unwrap_or("");
    if lotto_type.is_empty() {
        bail!("Type de tirage manquant");
    }
    let date = parse_date(record.get(1).unwrap_or(""))?;

    let Some(winning) = parse_numbers(record, 2)? else {
        bail!("Numéros gagnants manquants");
    };
    let winning = to_numbers(&winning)?;
    let machine = parse_numbers(record, 7)?.map(|m| to_numbers(&m)).transpose()?;

    Ok(Draw::new(lotto_type, &date, winning, machine))
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        let draw = record_result
            .context("Erreur de lecture")
            .and_then(|record| parse_record(&record));
        match draw.and_then(|draw| insert_draw(&tx, &draw)) {
            Ok(true) => result.inserted += 1,
            Ok(false) => result.skipped += 1,
            Err(e) => {
                warn!(line, error = %e, "Ligne rejetée");
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotoracle_db::db::{count_draws, fetch_draws, migrate};

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("17/02/2026").unwrap(), "2026-02-17");
        assert_eq!(parse_date("2020-01-01").unwrap(), "2020-01-01");
        assert!(parse_date("2020/13/01").is_err());
    }

    #[test]
    fn test_parse_record_with_machine() {
        let draw = parse_record(&record(&[
            "MONDAY SPECIAL", "01/01/2024", "50", "1", "20", "3", "9", "90", "2", "60", "4", "33",
        ]))
        .unwrap();
        assert_eq!(draw.date, "2024-01-01");
        assert_eq!(draw.winning, [1, 3, 9, 20, 50]);
        assert_eq!(draw.machine, Some([2, 4, 33, 60, 90]));
    }

    #[test]
    fn test_parse_record_without_machine() {
        let draw = parse_record(&record(&["LUCKY", "2024-01-02", "5", "15", "25", "35", "45"])).unwrap();
        assert_eq!(draw.machine, None);
        let draw = parse_record(&record(&["LUCKY", "2024-01-02", "5", "15", "25", "35", "45", "", "", "", "", ""])).unwrap();
        assert_eq!(draw.machine, None);
    }

    #[test]
    fn test_parse_record_rejects_bad_numbers() {
        assert!(parse_record(&record(&["A", "2024-01-02", "5", "5", "25", "35", "45"])).is_err());
        assert!(parse_record(&record(&["A", "2024-01-02", "5", "15", "25", "35", "91"])).is_err());
        assert!(parse_record(&record(&["", "2024-01-02", "5", "15", "25", "35", "45"])).is_err());
    }

    #[test]
    fn test_import_csv() {
        let path = std::env::temp_dir().join(format!("lotoracle-import-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "lotto_type,draw_date,w1,w2,w3,w4,w5,m1,m2,m3,m4,m5\n\
             A,01/01/2024,1,2,3,4,5,10,20,30,40,50\n\
             A,01/01/2024,1,2,3,4,5,10,20,30,40,50\n\
             A,02/01/2024,6,7,8,9,99,,,,,\n\
             B,03/01/2024,6,7,8,9,11,,,,,\n",
        )
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let result = import_csv(&conn, &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(result.total_records, 4);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(count_draws(&conn).unwrap(), 2);
        assert_eq!(fetch_draws(&conn).unwrap()[1].lotto_type, "B");
    }
}
