use std::str::FromStr;

use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, RngExt, SeedableRng};

use crate::config::GeneratorLimits;
use crate::error::{CoordGenError, Result};
use crate::models::{
    EligiblePool, FrequencyTable, GenerationOutcome, Number, Variant, VariantSet,
};

/// Stratégie de génération. La charge utile donne la taille de la tranche
/// « chaude » prise en tête du pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Uniform,
    HotBiased { hot: usize },
    ColdHotHybrid { hot: usize },
    PremiumExhaustive { top: usize },
    RandomPairs,
    FrequencyWeighted,
    Mixed,
}

impl Strategy {
    pub const HOT_BIASED: Strategy = Strategy::HotBiased { hot: 10 };
    pub const COLD_HOT_HYBRID: Strategy = Strategy::ColdHotHybrid { hot: 20 };
    pub const PREMIUM_EXHAUSTIVE: Strategy = Strategy::PremiumExhaustive { top: 25 };

    pub const ALL: [Strategy; 7] = [
        Strategy::Uniform,
        Strategy::HOT_BIASED,
        Strategy::COLD_HOT_HYBRID,
        Strategy::PREMIUM_EXHAUSTIVE,
        Strategy::RandomPairs,
        Strategy::FrequencyWeighted,
        Strategy::Mixed,
    ];

    /// Stratégies tirées au sort par `Mixed`.
    const MIXABLE: [Strategy; 6] = [
        Strategy::Uniform,
        Strategy::HOT_BIASED,
        Strategy::COLD_HOT_HYBRID,
        Strategy::PREMIUM_EXHAUSTIVE,
        Strategy::RandomPairs,
        Strategy::FrequencyWeighted,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::Uniform => "uniform",
            Strategy::HotBiased { .. } => "hot-biased",
            Strategy::ColdHotHybrid { .. } => "cold-hot-hybrid",
            Strategy::PremiumExhaustive { .. } => "premium-exhaustive",
            Strategy::RandomPairs => "random-pairs",
            Strategy::FrequencyWeighted => "frequency-weighted",
            Strategy::Mixed => "mixed",
        }
    }

    /// Vrai si au moins un tirage peut aboutir avec ce pool.
    fn feasible(&self, pool: &EligiblePool, weighted: bool) -> bool {
        let len = pool.len();
        match *self {
            Strategy::Uniform | Strategy::RandomPairs => len >= Variant::SIZE,
            Strategy::HotBiased { hot } => {
                let (top, rest) = pool.split(hot);
                top.len() >= 3 && !rest.is_empty()
            }
            Strategy::ColdHotHybrid { hot } => {
                let (top, rest) = pool.split(hot);
                top.len() >= 2 && rest.len() >= 2
            }
            Strategy::PremiumExhaustive { top } => {
                let (head, rest) = pool.split(top);
                head.len() >= 3 && !rest.is_empty()
            }
            Strategy::FrequencyWeighted => weighted,
            Strategy::Mixed => Self::MIXABLE.iter().any(|s| s.feasible(pool, weighted)),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Strategy {
    type Err = CoordGenError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_lowercase();
        Strategy::ALL
            .iter()
            .find(|strategy| strategy.tag() == tag)
            .copied()
            .ok_or_else(|| {
                let tags: Vec<&str> = Strategy::ALL.iter().map(|s| s.tag()).collect();
                CoordGenError::Config(format!(
                    "stratégie inconnue '{}' (attendu : {})",
                    s,
                    tags.join(", ")
                ))
            })
    }
}

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

struct DrawContext<'a> {
    pool: &'a EligiblePool,
    weights: Option<WeightedIndex<u32>>,
}

pub fn generate<R: Rng + ?Sized>(
    pool: &EligiblePool,
    table: &FrequencyTable,
    strategy: Strategy,
    target: usize,
    limits: &GeneratorLimits,
    rng: &mut R,
) -> Result<GenerationOutcome> {
    limits.validate()?;
    if target == 0 {
        return Ok(GenerationOutcome::new(VariantSet::new(), 0));
    }

    if let Strategy::PremiumExhaustive { top } = strategy {
        let candidates = exhaustive_candidates(pool, top, limits.max_exhaustive)?;
        let total = candidates.len();
        let unique: VariantSet = candidates.into_iter().collect();
        let variants: VariantSet = unique.into_iter().take(target).collect();
        log::debug!("{}: {} candidats, {} retenus", strategy, total, variants.len());
        return Ok(GenerationOutcome::new(variants, target));
    }

    let weights = frequency_weights(pool, table);
    if !strategy.feasible(pool, weights.is_some()) {
        log::warn!(
            "{}: pool de {} numéros insuffisant, aucune variante possible",
            strategy,
            pool.len()
        );
        return Ok(GenerationOutcome::new(VariantSet::new(), target));
    }

    let ctx = DrawContext { pool, weights };
    let max_attempts = target.saturating_mul(limits.attempt_factor);
    let mut variants = VariantSet::new();
    let mut attempts = 0usize;

    while variants.len() < target && attempts < max_attempts {
        attempts += 1;
        if let Some(variant) = draw(strategy, &ctx, rng) {
            variants.insert(variant);
        }
    }

    let outcome = GenerationOutcome::new(variants, target);
    if outcome.is_partial() {
        log::warn!(
            "{}: {} variantes sur {} après {} tentatives",
            strategy,
            outcome.achieved,
            outcome.requested,
            attempts
        );
    }
    Ok(outcome)
}

/// Toutes les combinaisons de 3 numéros du top `top` × chaque numéro du reste,
/// avant déduplication. Échoue si la taille projetée dépasse `max`.
pub fn exhaustive_candidates(pool: &EligiblePool, top: usize, max: usize) -> Result<Vec<Variant>> {
    let projected = projected_exhaustive_size(pool, top);
    if projected > max {
        return Err(CoordGenError::Config(format!(
            "stratégie exhaustive : {projected} combinaisons projetées, plafond {max}"
        )));
    }

    let (head, rest) = pool.split(top);
    let mut candidates = Vec::with_capacity(projected);

    for i in 0..head.len() {
        for j in (i + 1)..head.len() {
            for k in (j + 1)..head.len() {
                for &r in rest {
                    if let Some(v) = Variant::from_numbers([head[i], head[j], head[k], r]) {
                        candidates.push(v);
                    }
                }
            }
        }
    }

    Ok(candidates)
}

/// C(|top|, 3) × |reste|.
pub fn projected_exhaustive_size(pool: &EligiblePool, top: usize) -> usize {
    let (head, rest) = pool.split(top);
    let n = head.len();
    let triples = if n < 3 { 0 } else { n * (n - 1) * (n - 2) / 6 };
    triples.saturating_mul(rest.len())
}

/// Poids = compte de chaque numéro ; `None` si moins de 4 numéros ont un poids non nul.
fn frequency_weights(pool: &EligiblePool, table: &FrequencyTable) -> Option<WeightedIndex<u32>> {
    let weights: Vec<u32> = pool.numbers.iter().map(|&n| table.count(n)).collect();
    if weights.iter().filter(|&&w| w > 0).count() < Variant::SIZE {
        return None;
    }
    WeightedIndex::new(&weights).ok()
}

fn draw<R: Rng + ?Sized>(strategy: Strategy, ctx: &DrawContext, rng: &mut R) -> Option<Variant> {
    let pool = ctx.pool;
    match strategy {
        Strategy::Uniform => draw_uniform(&pool.numbers, rng),
        Strategy::HotBiased { hot } => draw_split(pool, hot, 3, rng),
        Strategy::ColdHotHybrid { hot } => draw_split(pool, hot, 2, rng),
        Strategy::PremiumExhaustive { top } => draw_split(pool, top, 3, rng),
        Strategy::RandomPairs => draw_random_pairs(&pool.numbers, rng),
        Strategy::FrequencyWeighted => {
            let weights = ctx.weights.as_ref()?;
            draw_weighted(&pool.numbers, weights, rng)
        }
        Strategy::Mixed => {
            let pick = Strategy::MIXABLE[rng.random_range(0..Strategy::MIXABLE.len())];
            draw(pick, ctx, rng)
        }
    }
}

fn pick_distinct<R: Rng + ?Sized>(slice: &[Number], amount: usize, rng: &mut R) -> Option<Vec<Number>> {
    if slice.len() < amount {
        return None;
    }
    Some(
        index::sample(rng, slice.len(), amount)
            .into_iter()
            .map(|i| slice[i])
            .collect(),
    )
}

fn draw_uniform<R: Rng + ?Sized>(numbers: &[Number], rng: &mut R) -> Option<Variant> {
    Variant::from_numbers(pick_distinct(numbers, Variant::SIZE, rng)?)
}

/// `from_top` numéros de la tranche chaude, le reste hors tranche.
fn draw_split<R: Rng + ?Sized>(
    pool: &EligiblePool,
    hot: usize,
    from_top: usize,
    rng: &mut R,
) -> Option<Variant> {
    let (top, rest) = pool.split(hot);
    let mut numbers = pick_distinct(top, from_top, rng)?;
    numbers.extend(pick_distinct(rest, Variant::SIZE - from_top, rng)?);
    Variant::from_numbers(numbers)
}

/// Deux paires indépendantes ; si elles se recouvrent la variante est rejetée.
fn draw_random_pairs<R: Rng + ?Sized>(numbers: &[Number], rng: &mut R) -> Option<Variant> {
    let first = pick_distinct(numbers, 2, rng)?;
    let second = pick_distinct(numbers, 2, rng)?;
    Variant::from_numbers(first.into_iter().chain(second))
}

/// 4 tirages avec remise ; rejeté si moins de 4 valeurs distinctes.
fn draw_weighted<R: Rng + ?Sized>(
    numbers: &[Number],
    weights: &WeightedIndex<u32>,
    rng: &mut R,
) -> Option<Variant> {
    Variant::from_numbers((0..Variant::SIZE).map(|_| numbers[weights.sample(rng)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    /// Pool 1..=n, le numéro i apparaît (n - i + 1) fois.
    fn ranked(n: u32) -> (EligiblePool, FrequencyTable) {
        let counts: BTreeMap<Number, u32> = (1..=n).map(|i| (i, n - i + 1)).collect();
        let table = FrequencyTable::from_counts(counts);
        let pool = EligiblePool {
            numbers: table.ranking().to_vec(),
            excluded: BTreeSet::new(),
        };
        (pool, table)
    }

    fn run(strategy: Strategy, n: u32, target: usize, seed: u64) -> GenerationOutcome {
        let (pool, table) = ranked(n);
        let mut rng = StdRng::seed_from_u64(seed);
        generate(&pool, &table, strategy, target, &GeneratorLimits::default(), &mut rng).unwrap()
    }

    fn assert_well_formed(outcome: &GenerationOutcome, pool_len: u32) {
        for v in &outcome.variants {
            let nums = v.numbers();
            assert!(nums.windows(2).all(|w| w[0] < w[1]), "{:?}", nums);
            assert!(nums.iter().all(|&n| n >= 1 && n <= pool_len), "{:?}", nums);
        }
        assert_eq!(outcome.achieved, outcome.variants.len());
        assert!(outcome.achieved <= outcome.requested);
    }

    #[test]
    fn test_strategy_tags_roundtrip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.tag().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!(" Hot-Biased ".parse::<Strategy>().unwrap(), Strategy::HOT_BIASED);
        assert!("lucky".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_uniform_reaches_target() {
        let outcome = run(Strategy::Uniform, 30, 50, 42);
        assert_eq!(outcome.achieved, 50);
        assert!(!outcome.is_partial());
        assert_well_formed(&outcome, 30);
    }

    #[test]
    fn test_uniform_marginals_not_skewed() {
        let outcome = run(Strategy::Uniform, 20, 2000, 7);
        assert_eq!(outcome.achieved, 2000);
        let mut hits = [0usize; 21];
        for v in &outcome.variants {
            for &n in v.numbers() {
                hits[n as usize] += 1;
            }
        }
        // Espérance : 2000 × 4 / 20 = 400 par numéro.
        for (n, &h) in hits.iter().enumerate().skip(1) {
            assert!((300..=500).contains(&h), "numéro {n} : {h} apparitions");
        }
    }

    #[test]
    fn test_hot_biased_slices() {
        let outcome = run(Strategy::HOT_BIASED, 30, 40, 1);
        assert_eq!(outcome.achieved, 40);
        for v in &outcome.variants {
            let hot = v.numbers().iter().filter(|&&n| n <= 10).count();
            assert_eq!(hot, 3, "{v}");
        }
    }

    #[test]
    fn test_cold_hot_hybrid_slices() {
        let outcome = run(Strategy::COLD_HOT_HYBRID, 30, 40, 2);
        assert_eq!(outcome.achieved, 40);
        for v in &outcome.variants {
            let hot = v.numbers().iter().filter(|&&n| n <= 20).count();
            assert_eq!(hot, 2, "{v}");
        }
    }

    #[test]
    fn test_random_pairs_partial_when_domain_small() {
        // Un pool de 4 numéros n'admet qu'une seule variante.
        let outcome = run(Strategy::RandomPairs, 4, 5, 3);
        assert_eq!(outcome.requested, 5);
        assert_eq!(outcome.achieved, 1);
        assert!(outcome.is_partial());
        let only = outcome.variants.iter().next().unwrap();
        assert_eq!(only.numbers(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_frequency_weighted_well_formed() {
        let outcome = run(Strategy::FrequencyWeighted, 25, 30, 4);
        assert_eq!(outcome.achieved, 30);
        assert_well_formed(&outcome, 25);
    }

    #[test]
    fn test_weighted_draw_favours_frequent_numbers() {
        let counts: BTreeMap<Number, u32> =
            [(1, 100), (2, 100), (3, 100), (4, 100), (5, 1), (6, 1), (7, 1), (8, 1)]
                .into_iter()
                .collect();
        let table = FrequencyTable::from_counts(counts);
        let pool = EligiblePool { numbers: table.ranking().to_vec(), excluded: BTreeSet::new() };
        let weights = frequency_weights(&pool, &table).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let mut heavy = 0usize;
        let mut light = 0usize;
        for _ in 0..500 {
            if let Some(v) = draw_weighted(&pool.numbers, &weights, &mut rng) {
                for &n in v.numbers() {
                    if n <= 4 { heavy += 1 } else { light += 1 }
                }
            }
        }
        assert!(heavy > light * 10, "heavy={heavy} light={light}");
    }

    #[test]
    fn test_weighted_infeasible_without_four_weights() {
        let counts: BTreeMap<Number, u32> =
            [(1, 5), (2, 5), (3, 5), (4, 0), (5, 0)].into_iter().collect();
        let table = FrequencyTable::from_counts(counts);
        let pool = EligiblePool { numbers: table.ranking().to_vec(), excluded: BTreeSet::new() };
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = generate(
            &pool,
            &table,
            Strategy::FrequencyWeighted,
            3,
            &GeneratorLimits::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.achieved, 0);
        assert_eq!(outcome.requested, 3);
    }

    #[test]
    fn test_mixed_well_formed() {
        let outcome = run(Strategy::Mixed, 40, 60, 5);
        assert_eq!(outcome.achieved, 60);
        assert_well_formed(&outcome, 40);
    }

    #[test]
    fn test_exhaustive_candidate_count() {
        let (pool, _) = ranked(28);
        let candidates = exhaustive_candidates(&pool, 25, 100_000).unwrap();
        // C(25, 3) × 3
        assert_eq!(candidates.len(), 2300 * 3);
        assert_eq!(projected_exhaustive_size(&pool, 25), candidates.len());

        let unique: BTreeSet<Variant> = candidates.iter().copied().collect();
        assert_eq!(unique.len(), candidates.len());
        for v in &candidates {
            let head = v.numbers().iter().filter(|&&n| n <= 25).count();
            assert_eq!(head, 3, "{v}");
        }
    }

    #[test]
    fn test_exhaustive_generate_truncates_in_order() {
        let outcome = run(Strategy::PREMIUM_EXHAUSTIVE, 28, 3, 0);
        assert_eq!(outcome.achieved, 3);
        let got: Vec<[Number; 4]> = outcome.variants.iter().map(|v| *v.numbers()).collect();
        assert_eq!(got, vec![[1, 2, 3, 26], [1, 2, 3, 27], [1, 2, 3, 28]]);
    }

    #[test]
    fn test_exhaustive_small_domain_is_partial() {
        // top 25 = 5 numéros, reste vide → aucune combinaison.
        let outcome = run(Strategy::PREMIUM_EXHAUSTIVE, 5, 10, 0);
        assert_eq!(outcome.achieved, 0);
        let outcome = run(Strategy::PremiumExhaustive { top: 4 }, 5, 10, 0);
        assert_eq!(outcome.achieved, 4);
    }

    #[test]
    fn test_exhaustive_ceiling_rejected() {
        let (pool, table) = ranked(60);
        let limits = GeneratorLimits { attempt_factor: 50, max_exhaustive: 1_000 };
        let mut rng = StdRng::seed_from_u64(0);
        let err = generate(&pool, &table, Strategy::PREMIUM_EXHAUSTIVE, 10, &limits, &mut rng)
            .unwrap_err();
        assert!(matches!(err, CoordGenError::Config(_)));
    }

    #[test]
    fn test_infeasible_hot_biased_returns_empty() {
        let outcome = run(Strategy::HOT_BIASED, 8, 5, 0);
        assert_eq!(outcome.achieved, 0);
        assert_eq!(outcome.requested, 5);
    }

    #[test]
    fn test_zero_target() {
        let outcome = run(Strategy::Uniform, 30, 0, 0);
        assert!(outcome.variants.is_empty());
        assert!(!outcome.is_partial());
    }

    #[test]
    fn test_seed_determinism() {
        for strategy in Strategy::ALL {
            let a = run(strategy, 35, 20, 123);
            let b = run(strategy, 35, 20, 123);
            assert_eq!(a, b, "{strategy}");
        }
    }

    #[test]
    fn test_attempt_ceiling_bounds_loop() {
        let (pool, table) = ranked(4);
        let limits = GeneratorLimits { attempt_factor: 1, max_exhaustive: 10 };
        let mut rng = StdRng::seed_from_u64(9);
        let outcome =
            generate(&pool, &table, Strategy::Uniform, 1_000, &limits, &mut rng).unwrap();
        assert_eq!(outcome.achieved, 1);
        assert_eq!(outcome.requested, 1_000);
    }

    #[test]
    fn test_zero_attempt_factor_is_config_error() {
        let (pool, table) = ranked(30);
        let limits = GeneratorLimits { attempt_factor: 0, max_exhaustive: 10 };
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate(&pool, &table, Strategy::Uniform, 5, &limits, &mut rng).unwrap_err();
        assert!(matches!(err, CoordGenError::Config(_)));
    }
}
