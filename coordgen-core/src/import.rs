use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::Value;

use crate::error::{CoordGenError, Result};
use crate::models::{CoordinateEntry, VariantRow};
use crate::resolve::number_from_float;

const NUMBER_ALIASES: &[&str] = &["number", "nr", "numar", "număr"];
const COMBINATION_ALIASES: &[&str] = &["combinatie", "combinație", "combination", "numbers"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateFormat {
    /// CSV avec en-tête (number|nr, x, y).
    Csv,
    Json,
    /// Saisie manuelle sans en-tête : `numero,x,y` par ligne.
    Manual,
}

impl CoordinateFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(CoordinateFormat::Csv),
            "json" => Some(CoordinateFormat::Json),
            "txt" => Some(CoordinateFormat::Manual),
            _ => None,
        }
    }
}

pub fn parse_coordinates(text: &str, format: CoordinateFormat) -> Result<Vec<CoordinateEntry>> {
    match format {
        CoordinateFormat::Csv => parse_coordinates_csv(text),
        CoordinateFormat::Json => parse_coordinates_json(text),
        CoordinateFormat::Manual => parse_coordinates_manual(text),
    }
}

fn to_numeric(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn normalize(header: &str) -> String {
    header.trim().to_lowercase()
}

fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.contains(&normalize(h).as_str()))
}

fn missing_column(name: &str, headers: &StringRecord) -> CoordGenError {
    let found: Vec<&str> = headers.iter().collect();
    CoordGenError::Schema(format!("colonne '{}' absente (colonnes : {})", name, found.join(", ")))
}

/// Ligne de coordonnées ; `None` si une valeur manque ou n'est pas numérique.
fn entry_from_cells(number: Option<&str>, x: Option<&str>, y: Option<&str>) -> Option<CoordinateEntry> {
    Some(CoordinateEntry {
        number: number_from_float(to_numeric(number?)?)?,
        x: to_numeric(x?)?,
        y: to_numeric(y?)?,
    })
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

pub fn parse_coordinates_csv(text: &str) -> Result<Vec<CoordinateEntry>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let number_idx = find_column(&headers, NUMBER_ALIASES).ok_or_else(|| missing_column("number", &headers))?;
    let x_idx = find_column(&headers, &["x"]).ok_or_else(|| missing_column("x", &headers))?;
    let y_idx = find_column(&headers, &["y"]).ok_or_else(|| missing_column("y", &headers))?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        match entry_from_cells(record.get(number_idx), record.get(x_idx), record.get(y_idx)) {
            Some(entry) => entries.push(entry),
            None => log::warn!("coordonnées ligne {} ignorée : {:?}", record_line(&record), record),
        }
    }
    Ok(entries)
}

pub fn parse_coordinates_manual(text: &str) -> Result<Vec<CoordinateEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        match entry_from_cells(record.get(0), record.get(1), record.get(2)) {
            Some(entry) => entries.push(entry),
            None => log::warn!("coordonnées ligne {} ignorée : {:?}", record_line(&record), record),
        }
    }
    Ok(entries)
}

/// Accepte une liste d'objets ou un objet `{ "coordinates": [...] }`.
pub fn parse_coordinates_json(text: &str) -> Result<Vec<CoordinateEntry>> {
    let doc: Value = serde_json::from_str(text)?;
    let items = match &doc {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("coordinates") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CoordGenError::Schema(
                    "objet JSON sans liste 'coordinates'".to_string(),
                ));
            }
        },
        _ => {
            return Err(CoordGenError::Schema(
                "document JSON : liste ou objet 'coordinates' attendu".to_string(),
            ));
        }
    };

    let rows: Vec<Vec<(String, &Value)>> = items
        .iter()
        .map(|item| match item {
            Value::Object(map) => map.iter().map(|(k, v)| (normalize(k), v)).collect(),
            _ => Vec::new(),
        })
        .collect();

    if !rows.is_empty() {
        for (name, aliases) in [("number", NUMBER_ALIASES), ("x", &["x"][..]), ("y", &["y"][..])] {
            let present = rows
                .iter()
                .any(|row| row.iter().any(|(k, _)| aliases.contains(&k.as_str())));
            if !present {
                return Err(CoordGenError::Schema(format!(
                    "champ '{name}' absent de toutes les coordonnées"
                )));
            }
        }
    }

    let mut entries = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match json_entry(row) {
            Some(entry) => entries.push(entry),
            None => log::warn!("coordonnée #{} ignorée : {}", idx + 1, items[idx]),
        }
    }
    Ok(entries)
}

fn json_field(row: &[(String, &Value)], aliases: &[&str]) -> Option<f64> {
    let (_, value) = row.iter().find(|(k, _)| aliases.contains(&k.as_str()))?;
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => to_numeric(s),
        _ => None,
    }
}

fn json_entry(row: &[(String, &Value)]) -> Option<CoordinateEntry> {
    Some(CoordinateEntry {
        number: number_from_float(json_field(row, NUMBER_ALIASES)?)?,
        x: json_field(row, &["x"])?,
        y: json_field(row, &["y"])?,
    })
}

fn parse_id(raw: &str, line: u64) -> Result<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| {
            to_numeric(raw)
                .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
                .map(|v| v as i64)
        })
        .ok_or_else(|| CoordGenError::Schema(format!("ligne {line} : identifiant invalide '{raw}'")))
}

/// CSV avec en-tête `id` et `combinatie` (ou un alias).
pub fn parse_variants_csv(text: &str) -> Result<Vec<VariantRow>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let id_idx = find_column(&headers, &["id"]).ok_or_else(|| missing_column("id", &headers))?;
    let combo_idx = find_column(&headers, COMBINATION_ALIASES)
        .ok_or_else(|| missing_column("combinatie", &headers))?;

    read_variant_records(reader.records(), id_idx, combo_idx)
}

/// Saisie manuelle sans en-tête : `id,1 2 3 4` par ligne.
pub fn parse_variants_manual(text: &str) -> Result<Vec<VariantRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    read_variant_records(reader.records(), 0, 1)
}

fn read_variant_records(
    records: impl Iterator<Item = csv::Result<StringRecord>>,
    id_idx: usize,
    combo_idx: usize,
) -> Result<Vec<VariantRow>> {
    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        let line = record_line(&record);
        let raw_id = record
            .get(id_idx)
            .ok_or_else(|| CoordGenError::Schema(format!("ligne {line} : identifiant manquant")))?;
        let id = parse_id(raw_id, line)?;
        let combination = record.get(combo_idx).unwrap_or_default().to_string();
        rows.push(VariantRow { id, combination });
    }
    Ok(rows)
}
