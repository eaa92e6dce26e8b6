pub mod pool;
pub mod sampler;

use std::collections::BTreeMap;

use crate::error::{CoordGenError, Result};
use crate::models::{FrequencyTable, Number, Round};

/// Une ligne = un tirage, numéros séparés par des virgules. Les lignes vides
/// sont ignorées mais comptent dans la numérotation des erreurs.
pub fn parse_rounds(text: &str) -> Result<Vec<Round>> {
    let mut rounds = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let numbers = line
            .split(',')
            .map(|token| parse_number(token, idx + 1))
            .collect::<Result<Vec<Number>>>()?;
        rounds.push(Round { numbers });
    }

    log::debug!("{} tirages lus", rounds.len());
    Ok(rounds)
}

fn parse_number(token: &str, line: usize) -> Result<Number> {
    let trimmed = token.trim();
    match trimmed.parse::<Number>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CoordGenError::Parse {
            line,
            token: trimmed.to_string(),
        }),
    }
}

pub fn analyze(rounds: &[Round]) -> FrequencyTable {
    let mut counts: BTreeMap<Number, u32> = BTreeMap::new();

    for round in rounds {
        for &n in &round.numbers {
            *counts.entry(n).or_insert(0) += 1;
        }
    }

    FrequencyTable::from_counts(counts)
}

#[cfg(test)]
pub(crate) fn analyze_text(text: &str) -> Result<FrequencyTable> {
    Ok(analyze(&parse_rounds(text)?))
}
