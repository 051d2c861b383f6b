use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Plus grand numéro tirable (tirages 5/90).
pub const MAX_NUMBER: u8 = 90;
/// Nombre de numéros par tirage.
pub const PICK_COUNT: usize = 5;

/// Cinq numéros distincts, triés par ordre croissant.
pub type Numbers = [u8; PICK_COUNT];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub lotto_type: String,
    /// Date ISO `YYYY-MM-DD`.
    pub date: String,
    pub winning: Numbers,
    /// Numéros « machine » tirés juste après les gagnants, absents sur certains jeux.
    pub machine: Option<Numbers>,
}

impl Draw {
    pub fn new(lotto_type: &str, date: &str, winning: Numbers, machine: Option<Numbers>) -> Self {
        Self {
            lotto_type: lotto_type.to_string(),
            date: date.to_string(),
            winning: sorted(winning),
            machine: machine.map(sorted),
        }
    }
}

pub fn sorted(mut numbers: Numbers) -> Numbers {
    numbers.sort_unstable();
    numbers
}

/// Vérifie la forme d'un tirage : 5 numéros distincts dans [1, 90].
pub fn validate_numbers(numbers: &[u8]) -> Result<()> {
    if numbers.len() != PICK_COUNT {
        bail!("Attendu {} numéros, reçu {}", PICK_COUNT, numbers.len());
    }
    for &n in numbers {
        if n < 1 || n > MAX_NUMBER {
            bail!("Numéro {} hors limites (1-{})", n, MAX_NUMBER);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Numéro en double : {}", numbers[i]);
            }
        }
    }
    Ok(())
}

/// Convertit une tranche validée en tableau trié.
pub fn to_numbers(numbers: &[u8]) -> Result<Numbers> {
    validate_numbers(numbers)?;
    let mut out = [0u8; PICK_COUNT];
    out.copy_from_slice(numbers);
    Ok(sorted(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_numbers_ok() {
        assert!(validate_numbers(&[1, 2, 3, 4, 5]).is_ok());
        assert!(validate_numbers(&[90, 89, 45, 12, 7]).is_ok());
    }

    #[test]
    fn test_validate_numbers_out_of_range() {
        assert!(validate_numbers(&[0, 2, 3, 4, 5]).is_err());
        assert!(validate_numbers(&[1, 2, 3, 4, 91]).is_err());
    }

    #[test]
    fn test_validate_numbers_duplicate() {
        assert!(validate_numbers(&[7, 7, 3, 4, 5]).is_err());
    }

    #[test]
    fn test_validate_numbers_wrong_length() {
        assert!(validate_numbers(&[1, 2, 3, 4]).is_err());
        assert!(validate_numbers(&[1, 2, 3, 4, 5, 6]).is_err());
    }

    #[test]
    fn test_to_numbers_sorts() {
        assert_eq!(to_numbers(&[80, 3, 45, 12, 7]).unwrap(), [3, 7, 12, 45, 80]);
    }

    #[test]
    fn test_draw_new_sorts_both_sets() {
        let draw = Draw::new("MONDAY SPECIAL", "2024-01-01", [50, 1, 20, 3, 9], Some([90, 2, 60, 4, 33]));
        assert_eq!(draw.winning, [1, 3, 9, 20, 50]);
        assert_eq!(draw.machine, Some([2, 4, 33, 60, 90]));
    }
}
