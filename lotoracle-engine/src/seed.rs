use lotoracle_db::models::Numbers;
use sha2::{Digest, Sha256};

/// Empreinte textuelle de l'historique : chaque tirage trié, puis la liste
/// elle-même triée, `[(1, 2, 3, 4, 5), (6, 7, 8, 9, 10)]`.
pub fn dataset_fingerprint(draws: &[Numbers]) -> String {
    let mut sorted_draws: Vec<Numbers> = draws
        .iter()
        .map(|d| {
            let mut sorted = *d;
            sorted.sort_unstable();
            sorted
        })
        .collect();
    sorted_draws.sort_unstable();
    let tuples: Vec<String> = sorted_draws
        .iter()
        .map(|d| {
            let parts: Vec<String> = d.iter().map(|n| n.to_string()).collect();
            format!("({})", parts.join(", "))
        })
        .collect();
    format!("[{}]", tuples.join(", "))
}

/// Graine d'une requête : SHA-256 de l'empreinte suivie du nom de stratégie,
/// 4 premiers octets en big-endian, réduits modulo 2^31.
pub fn derive_seed(draws: &[Numbers], strategy: &str) -> u64 {
    let mut text = dataset_fingerprint(draws);
    text.push_str(strategy);
    stable_hash(&text) % (1u64 << 31)
}

/// Hachage stable (indépendant du processus) d'un texte.
pub fn stable_hash(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as u64
}
