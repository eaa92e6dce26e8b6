use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

pub type Number = u32;

/// Un tirage historique, dans l'ordre de la ligne source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub numbers: Vec<Number>,
}

/// Fréquence d'apparition de chaque numéro, avec un classement total :
/// compte décroissant, puis numéro croissant en cas d'égalité.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<Number, u32>,
    ranking: Vec<Number>,
}

impl FrequencyTable {
    pub fn from_counts(counts: BTreeMap<Number, u32>) -> Self {
        let mut ranking: Vec<Number> = counts.keys().copied().collect();
        ranking.sort_by_key(|n| (Reverse(counts[n]), *n));
        Self { counts, ranking }
    }

    pub fn count(&self, number: Number) -> u32 {
        self.counts.get(&number).copied().unwrap_or(0)
    }

    pub fn contains(&self, number: Number) -> bool {
        self.counts.contains_key(&number)
    }

    pub fn ranking(&self) -> &[Number] {
        &self.ranking
    }

    /// (numéro, compte) dans l'ordre du classement.
    pub fn ranked(&self) -> impl Iterator<Item = (Number, u32)> + '_ {
        self.ranking.iter().map(|&n| (n, self.counts[&n]))
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| c as u64).sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Les `n` numéros les plus froids : compte croissant, puis numéro
    /// décroissant (inverse du départage du classement).
    pub fn coldest(&self, n: usize) -> Vec<Number> {
        let mut cold: Vec<Number> = self.counts.keys().copied().collect();
        cold.sort_by_key(|num| (self.counts[num], Reverse(*num)));
        cold.truncate(n);
        cold
    }
}

/// Numéros retenus pour la génération, du plus fréquent au moins fréquent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligiblePool {
    pub numbers: Vec<Number>,
    pub excluded: BTreeSet<Number>,
}

impl EligiblePool {
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn contains(&self, number: Number) -> bool {
        self.numbers.contains(&number)
    }

    /// Découpe le pool en (top-k, reste). `k` est borné à la taille du pool.
    pub fn split(&self, k: usize) -> (&[Number], &[Number]) {
        self.numbers.split_at(k.min(self.numbers.len()))
    }
}

/// Combinaison de 4 numéros distincts, toujours triée. Seul `from_numbers`
/// construit une valeur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variant([Number; 4]);

impl Variant {
    pub const SIZE: usize = 4;

    /// `None` sauf si les numéros donnent exactement 4 valeurs distinctes.
    pub fn from_numbers(numbers: impl IntoIterator<Item = Number>) -> Option<Self> {
        let distinct: BTreeSet<Number> = numbers.into_iter().collect();
        if distinct.len() != Self::SIZE {
            return None;
        }
        let mut arr = [0; Self::SIZE];
        for (slot, n) in arr.iter_mut().zip(distinct) {
            *slot = n;
        }
        Some(Self(arr))
    }

    pub fn numbers(&self) -> &[Number; Self::SIZE] {
        &self.0
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a} {b} {c} {d}")
    }
}

pub type VariantSet = BTreeSet<Variant>;

/// Résultat d'une génération : un résultat partiel n'est pas une erreur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub variants: VariantSet,
    pub requested: usize,
    pub achieved: usize,
}

impl GenerationOutcome {
    pub fn new(variants: VariantSet, requested: usize) -> Self {
        let achieved = variants.len();
        Self { variants, requested, achieved }
    }

    pub fn is_partial(&self) -> bool {
        self.achieved < self.requested
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateEntry {
    pub number: Number,
    pub x: f64,
    pub y: f64,
}

pub type CoordinateMap = BTreeMap<Number, Point>;

/// Construit la table de recherche ; en cas de doublon la dernière entrée gagne.
pub fn coordinate_map(entries: &[CoordinateEntry]) -> CoordinateMap {
    entries
        .iter()
        .map(|e| (e.number, Point { x: e.x, y: e.y }))
        .collect()
}

/// Ligne de la table de variantes : identifiant + numéros bruts séparés par des espaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRow {
    pub id: i64,
    pub combination: String,
}

impl VariantRow {
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.combination.split_whitespace()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariant {
    pub id: i64,
    pub combination: String,
    pub coordinates: Vec<Option<Point>>,
}

impl ResolvedVariant {
    /// Coordonnées résolues uniquement, dans l'ordre source.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.coordinates.iter().flatten().copied()
    }

    pub fn unresolved_count(&self) -> usize {
        self.coordinates.iter().filter(|c| c.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(Number, u32)]) -> FrequencyTable {
        FrequencyTable::from_counts(pairs.iter().copied().collect())
    }

    #[test]
    fn test_ranking_ties_ascending() {
        let t = table(&[(4, 1), (1, 1), (3, 2), (2, 2)]);
        assert_eq!(t.ranking(), &[2, 3, 1, 4]);
    }

    #[test]
    fn test_coldest_ties_descending() {
        let t = table(&[(1, 1), (2, 3), (3, 1), (4, 1), (5, 2)]);
        assert_eq!(t.coldest(2), vec![4, 3]);
        assert_eq!(t.coldest(10).len(), 5);
        assert!(t.coldest(0).is_empty());
    }

    #[test]
    fn test_count_missing_is_zero() {
        let t = table(&[(7, 3)]);
        assert_eq!(t.count(7), 3);
        assert_eq!(t.count(8), 0);
        assert_eq!(t.total(), 3);
    }

    #[test]
    fn test_variant_sorted_and_distinct() {
        let v = Variant::from_numbers([9, 2, 7, 4]).unwrap();
        assert_eq!(v.numbers(), &[2, 4, 7, 9]);
        assert_eq!(v.to_string(), "2 4 7 9");
    }

    #[test]
    fn test_variant_rejects_duplicates_and_wrong_size() {
        assert!(Variant::from_numbers([1, 1, 2, 3]).is_none());
        assert!(Variant::from_numbers([1, 2, 3]).is_none());
        assert!(Variant::from_numbers([1, 2, 3, 4, 5]).is_none());
    }

    #[test]
    fn test_variant_rejects_repeated_unsorted_input() {
        assert!(Variant::from_numbers([4, 4, 1, 0]).is_none());
        let v = Variant::from_numbers([4, 2, 1, 0]).unwrap();
        assert!(v.numbers().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_variant_order_insensitive() {
        let a = Variant::from_numbers([1, 2, 3, 4]).unwrap();
        let b = Variant::from_numbers([4, 3, 2, 1]).unwrap();
        let set: VariantSet = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_coordinate_map_last_write_wins() {
        let entries = [
            CoordinateEntry { number: 1, x: 10.0, y: 20.0 },
            CoordinateEntry { number: 1, x: 30.0, y: 40.0 },
        ];
        let map = coordinate_map(&entries);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1], Point { x: 30.0, y: 40.0 });
    }

    #[test]
    fn test_pool_split_clamped() {
        let pool = EligiblePool { numbers: vec![5, 3, 8], excluded: BTreeSet::new() };
        let (top, rest) = pool.split(10);
        assert_eq!(top, &[5, 3, 8]);
        assert!(rest.is_empty());
        let (top, rest) = pool.split(1);
        assert_eq!(top, &[5]);
        assert_eq!(rest, &[3, 8]);
    }
}
