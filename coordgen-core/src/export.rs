use csv::Writer;

use crate::error::{CoordGenError, Result};
use crate::models::{GenerationOutcome, ResolvedVariant};

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| CoordGenError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|e| CoordGenError::Schema(e.to_string()))
}

/// `id,variant,coordinates` ; les coordonnées non résolues restent `null`.
pub fn results_to_csv(resolved: &[ResolvedVariant]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["id", "variant", "coordinates"])?;

    for r in resolved {
        let coordinates = serde_json::to_string(&r.coordinates)?;
        writer.write_record([r.id.to_string(), r.combination.clone(), coordinates])?;
    }

    finish(writer)
}

/// Variantes générées au format attendu par `parse_variants_csv`, numérotées à partir de 1.
pub fn variants_to_csv(outcome: &GenerationOutcome) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["id", "combinatie"])?;

    for (i, variant) in outcome.variants.iter().enumerate() {
        writer.write_record([(i + 1).to_string(), variant.to_string()])?;
    }

    finish(writer)
}
