//! Debtor pool generation.

use crate::model::debt::Debtor;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

const FIRST_DEBTOR_ID: u32 = 5000;

const SURNAMES: &[&str] = &[
    "Acosta", "Benitez", "Castro", "Dominguez", "Escobar", "Ferreyra", "Gimenez", "Herrera",
    "Ibarra", "Juarez", "Ledesma", "Molina", "Navarro", "Ojeda", "Paz", "Quiroga", "Romero",
    "Sosa", "Toledo", "Vega", "Zarate",
];

const SECTORS: &[&str] = &[
    "Agro", "Construcciones", "Energia", "Logistica", "Alimentos", "Textil", "Minera",
    "Servicios", "Industrias", "Inversiones",
];

const LEGAL_FORMS: &[&str] = &["S.A.", "S.R.L.", "S.A.S.", "y Asociados"];

/// Draws `size` debtors with unique tax ids.
pub(crate) fn debtor_pool<R: Rng>(rng: &mut R, size: usize) -> Vec<Debtor> {
    let mut seen_tax_ids = HashSet::with_capacity(size);
    let mut pool = Vec::with_capacity(size);

    for offset in 0..size {
        let name = company_name(rng);
        let tax_id = loop {
            let candidate = format!(
                "30-{:08}-{}",
                rng.gen_range(0..100_000_000u32),
                rng.gen_range(0..10u32)
            );
            if seen_tax_ids.insert(candidate.clone()) {
                break candidate;
            }
        };
        pool.push(Debtor {
            id: FIRST_DEBTOR_ID + offset as u32,
            name,
            tax_id,
        });
    }

    pool
}

fn company_name<R: Rng>(rng: &mut R) -> String {
    let surname = SURNAMES.choose(rng).copied().unwrap_or("Sosa");
    let form = LEGAL_FORMS.choose(rng).copied().unwrap_or("S.A.");
    if rng.gen_bool(0.5) {
        let partner = SURNAMES.choose(rng).copied().unwrap_or("Paz");
        format!("{surname}, {partner} {form}")
    } else {
        let sector = SECTORS.choose(rng).copied().unwrap_or("Servicios");
        format!("{sector} {surname} {form}")
    }
}

#[cfg(test)]
mod tests {
    use super::debtor_pool;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn pool_has_unique_sequential_ids_and_tax_ids() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let pool = debtor_pool(&mut rng, 25);

        assert_eq!(pool.len(), 25);
        assert_eq!(pool[0].id, 5000);
        assert_eq!(pool[24].id, 5024);
        let tax_ids: HashSet<_> = pool.iter().map(|debtor| debtor.tax_id.as_str()).collect();
        assert_eq!(tax_ids.len(), 25);
        assert!(pool
            .iter()
            .all(|debtor| debtor.tax_id.starts_with("30-") && debtor.tax_id.len() == 13));
    }
}
