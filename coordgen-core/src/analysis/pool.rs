use std::collections::BTreeSet;

use crate::error::{CoordGenError, Result};
use crate::models::{EligiblePool, FrequencyTable, Number, Variant};

/// Retire les numéros exclus (manuels + `exclude_coldest` plus froids) du
/// classement puis garde les `top_k` premiers.
pub fn filter_pool(
    table: &FrequencyTable,
    manual: &BTreeSet<Number>,
    exclude_coldest: usize,
    top_k: usize,
) -> Result<EligiblePool> {
    if top_k < Variant::SIZE {
        return Err(CoordGenError::Config(format!(
            "top-K = {top_k}, il faut au moins {} numéros par variante",
            Variant::SIZE
        )));
    }

    let mut excluded: BTreeSet<Number> = manual.clone();
    excluded.extend(table.coldest(exclude_coldest));

    let numbers: Vec<Number> = table
        .ranking()
        .iter()
        .copied()
        .filter(|n| !excluded.contains(n))
        .take(top_k)
        .collect();

    if numbers.len() < top_k {
        log::debug!("pool réduit : {} numéros au lieu de {}", numbers.len(), top_k);
    }

    Ok(EligiblePool { numbers, excluded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_text;

    fn sample_table() -> FrequencyTable {
        // 1:4, 2:3, 3:3, 4:2, 5:1, 6:1, 7:1
        analyze_text("1,2,3,4\n1,2,3,5\n1,2,3,4\n1,6,7").unwrap()
    }

    #[test]
    fn test_top_k_truncates() {
        let pool = filter_pool(&sample_table(), &BTreeSet::new(), 0, 4).unwrap();
        assert_eq!(pool.numbers, vec![1, 2, 3, 4]);
        assert!(pool.excluded.is_empty());
    }

    #[test]
    fn test_manual_exclusion() {
        let manual: BTreeSet<Number> = [2, 99].into_iter().collect();
        let pool = filter_pool(&sample_table(), &manual, 0, 5).unwrap();
        assert_eq!(pool.numbers, vec![1, 3, 4, 5, 6]);
        assert!(pool.excluded.contains(&99));
    }

    #[test]
    fn test_auto_exclusion_breaks_ties_by_descending_number() {
        // 5, 6 et 7 sont à égalité (1) : on exclut d'abord 7 puis 6.
        let pool = filter_pool(&sample_table(), &BTreeSet::new(), 2, 10).unwrap();
        assert_eq!(pool.excluded, [6, 7].into_iter().collect());
        assert_eq!(pool.numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_manual_and_auto_union() {
        let manual: BTreeSet<Number> = [1].into_iter().collect();
        let pool = filter_pool(&sample_table(), &manual, 1, 10).unwrap();
        assert_eq!(pool.excluded, [1, 7].into_iter().collect());
        assert_eq!(pool.numbers, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_pool_invariants() {
        let table = sample_table();
        let manual: BTreeSet<Number> = [3].into_iter().collect();
        let pool = filter_pool(&table, &manual, 2, 4).unwrap();
        assert!(pool.len() <= 4);
        let unique: BTreeSet<Number> = pool.numbers.iter().copied().collect();
        assert_eq!(unique.len(), pool.len());
        assert!(pool.numbers.iter().all(|n| table.contains(*n)));
        assert!(pool.numbers.iter().all(|n| !pool.excluded.contains(n)));
    }

    #[test]
    fn test_fewer_than_k_is_not_an_error() {
        let pool = filter_pool(&sample_table(), &BTreeSet::new(), 5, 10).unwrap();
        assert_eq!(pool.numbers, vec![1, 2]);
    }

    #[test]
    fn test_top_k_below_four_rejected() {
        let err = filter_pool(&sample_table(), &BTreeSet::new(), 0, 3).unwrap_err();
        assert!(matches!(err, CoordGenError::Config(_)));
    }
}
