use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use textplots::{Chart, Plot, Shape};

use coordgen_core::Strategy;
use coordgen_core::models::{EligiblePool, FrequencyTable, GenerationOutcome, Point, ResolvedVariant};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_point(point: &Option<Point>) -> String {
    match point {
        Some(p) => format!("({}, {})", p.x, p.y),
        None => "—".to_string(),
    }
}

pub fn display_frequencies(table: &FrequencyTable, top: Option<usize>) {
    if table.is_empty() {
        println!("Aucun tirage à analyser.");
        return;
    }

    println!("\n📊 Fréquences ({} numéros, {} occurrences)\n", table.len(), table.total());

    let mut out = new_table(vec!["Rang", "Numéro", "Fréquence"]);
    let limit = top.unwrap_or(table.len());
    for (rank, (number, count)) in table.ranked().take(limit).enumerate() {
        out.add_row(vec![
            (rank + 1).to_string(),
            format!("{:2}", number),
            count.to_string(),
        ]);
    }
    println!("{out}");
}

pub fn display_pool(pool: &EligiblePool) {
    let numbers = pool
        .numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    println!("\nPool éligible ({}) : {}", pool.len(), numbers);

    if !pool.excluded.is_empty() {
        let excluded = pool
            .excluded
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!("Exclus ({}) : {}", pool.excluded.len(), excluded);
    }
}

pub fn display_outcome(outcome: &GenerationOutcome, strategy: Strategy) {
    println!("\n🎲 Variantes générées ({strategy})\n");

    let mut table = new_table(vec!["#", "Variante"]);
    for (i, variant) in outcome.variants.iter().enumerate() {
        let numbers = variant
            .numbers()
            .iter()
            .map(|n| format!("{:2}", n))
            .collect::<Vec<_>>()
            .join(" - ");
        table.add_row(vec![(i + 1).to_string(), numbers]);
    }
    println!("{table}");

    if outcome.is_partial() {
        println!(
            "⚠️  {} variantes obtenues sur {} demandées",
            outcome.achieved, outcome.requested
        );
    } else {
        println!("{} variantes.", outcome.achieved);
    }
}

pub fn display_results(resolved: &[ResolvedVariant]) {
    if resolved.is_empty() {
        println!("Aucune variante à afficher.");
        return;
    }

    let mut table = new_table(vec!["ID", "Variante", "Coordonnées", "Non résolus"]);
    for r in resolved {
        let coords = r
            .coordinates
            .iter()
            .map(format_point)
            .collect::<Vec<_>>()
            .join(" ");
        let unresolved = r.unresolved_count();
        let color = if unresolved > 0 { Color::Red } else { Color::Green };
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(&r.combination),
            Cell::new(coords),
            Cell::new(unresolved).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_variant_plot(variant: &ResolvedVariant) {
    println!("\n📈 Variante {}\n", variant.id);

    // Axe Y inversé : sur l'écran, y croît vers le bas.
    let points: Vec<(f32, f32)> = variant
        .points()
        .map(|p| (p.x as f32, -(p.y as f32)))
        .collect();

    if points.is_empty() {
        println!("⚠️  Aucune coordonnée valide.");
        return;
    }

    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0));
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));

    let shape = Shape::Points(&points);
    let mut chart = Chart::new_with_y_range(120, 60, x_min, x_max, y_min, y_max);
    println!("{}", chart.lineplot(&shape));

    let mut table = new_table(vec!["Ordre", "X", "Y"]);
    for (i, p) in variant.points().enumerate() {
        table.add_row(vec![(i + 1).to_string(), p.x.to_string(), p.y.to_string()]);
    }
    println!("{table}");
}

fn padded_range(values: impl Iterator<Item = f32>) -> (f32, f32) {
    let (min, max) = values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let pad = ((max - min) * 0.1).max(1.0);
    (min - pad, max + pad)
}
