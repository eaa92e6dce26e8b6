use crate::models::{CoordinateMap, Number, ResolvedVariant, VariantRow};

/// Interprète un jeton comme numéro : "3" et "3.0" donnent 3 ; les valeurs
/// fractionnaires, négatives ou non numériques donnent `None`. Pas de
/// troncature : "3.5" reste non résolu au lieu de devenir 3.
pub fn parse_number_token(token: &str) -> Option<Number> {
    let value = token.trim().parse::<f64>().ok()?;
    number_from_float(value)
}

pub(crate) fn number_from_float(value: f64) -> Option<Number> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > Number::MAX as f64 {
        return None;
    }
    Some(value as Number)
}

/// Associe chaque jeton de chaque variante à sa coordonnée. Fonction totale :
/// un jeton inconnu ou illisible donne `None` à sa position.
pub fn resolve(coords: &CoordinateMap, rows: &[VariantRow]) -> Vec<ResolvedVariant> {
    rows.iter()
        .map(|row| {
            let coordinates = row
                .tokens()
                .map(|token| parse_number_token(token).and_then(|n| coords.get(&n).copied()))
                .collect();
            ResolvedVariant {
                id: row.id,
                combination: row.combination.clone(),
                coordinates,
            }
        })
        .collect()
}
