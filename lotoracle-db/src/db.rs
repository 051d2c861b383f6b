use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{Draw, Numbers};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    lotto_type  TEXT NOT NULL,
    draw_date   TEXT NOT NULL,
    win_1       INTEGER NOT NULL,
    win_2       INTEGER NOT NULL,
    win_3       INTEGER NOT NULL,
    win_4       INTEGER NOT NULL,
    win_5       INTEGER NOT NULL,
    mach_1      INTEGER,
    mach_2      INTEGER,
    mach_3      INTEGER,
    mach_4      INTEGER,
    mach_5      INTEGER,
    UNIQUE(lotto_type, draw_date)
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotoracle.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

/// Insère un tirage ; retourne `false` si (lotto_type, date) existe déjà.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let m = draw.machine;
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (lotto_type, draw_date, win_1, win_2, win_3, win_4, win_5, mach_1, mach_2, mach_3, mach_4, mach_5)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            draw.lotto_type,
            draw.date,
            draw.winning[0],
            draw.winning[1],
            draw.winning[2],
            draw.winning[3],
            draw.winning[4],
            m.map(|n| n[0]),
            m.map(|n| n[1]),
            m.map(|n| n[2]),
            m.map(|n| n[3]),
            m.map(|n| n[4]),
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

const SELECT_DRAWS: &str = "SELECT lotto_type, draw_date, win_1, win_2, win_3, win_4, win_5, mach_1, mach_2, mach_3, mach_4, mach_5 FROM draws";

fn row_to_draw(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draw> {
    let machine: [Option<u8>; 5] = [row.get(7)?, row.get(8)?, row.get(9)?, row.get(10)?, row.get(11)?];
    // numéros machine retenus seulement s'ils sont complets
    let machine = match machine {
        [Some(a), Some(b), Some(c), Some(d), Some(e)] => Some([a, b, c, d, e]),
        _ => None,
    };
    let winning: Numbers = [row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?];
    Ok(Draw { lotto_type: row.get(0)?, date: row.get(1)?, winning, machine })
}

/// Tout l'historique, en ordre chronologique (le plus ancien d'abord).
pub fn fetch_draws(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_DRAWS} ORDER BY draw_date ASC, id ASC"))
        .context("Échec de la lecture des tirages")?;
    let draws = stmt.query_map([], row_to_draw)?.collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Derniers `limit` tirages, rendus en ordre chronologique (le plus ancien d'abord).
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_DRAWS} ORDER BY draw_date DESC, id DESC LIMIT ?1"))
        .context("Échec de la lecture des tirages")?;
    let mut draws = stmt.query_map([limit], row_to_draw)?.collect::<Result<Vec<_>, _>>()?;
    draws.reverse();
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}
