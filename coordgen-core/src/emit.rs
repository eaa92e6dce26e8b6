//! Génération du macro Lua (tap / wait) à partir des variantes résolues.
//!
//! Les délais ne sont jamais tirés ici : le script reçoit les bornes et
//! appelle `math.random` à l'exécution.

use crate::config::{EmitterConfig, Range};
use crate::error::{CoordGenError, Result};
use crate::models::{Point, ResolvedVariant};

const VARIANTS_OPEN: &str = "local variants = {";

/// Partie entière, comme une conversion `int()`.
fn pixel(value: f64) -> i64 {
    value.trunc() as i64
}

fn variant_literal(points: &[Point]) -> String {
    let coords: Vec<String> = points
        .iter()
        .map(|p| format!("{{x={}, y={}}}", pixel(p.x), pixel(p.y)))
        .collect();
    format!("{{{}}}", coords.join(", "))
}

fn push_line(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

/// `local <nom>Min, <nom>Max = min, max`
fn range_directive(name: &str, range: Range) -> String {
    format!("local {name}Min, {name}Max = {}, {}", range.min, range.max)
}

pub fn emit(resolved: &[ResolvedVariant], config: &EmitterConfig) -> Result<String> {
    config.validate()?;

    let per_variant: Vec<Vec<Point>> = resolved.iter().map(|r| r.points().collect()).collect();
    let counts: Vec<String> = per_variant.iter().map(|p| p.len().to_string()).collect();
    let n = resolved.len();

    let mut out = String::new();
    push_line(&mut out, format!("-- {} variantes (coordonnées par variante : {})", n, counts.join(", ")));
    push_line(&mut out, VARIANTS_OPEN);
    for (variant, points) in resolved.iter().zip(&per_variant) {
        push_line(
            &mut out,
            format!(
                "    {}, -- id {} : {} coordonnées",
                variant_literal(points),
                variant.id,
                points.len()
            ),
        );
    }
    out.push_str("}\n\n");

    push_line(&mut out, "-- Politique de délais : bornes tirées à l'exécution par math.random");
    push_line(&mut out, format!("local enterX, enterY = {}, {}", config.enter_x, config.enter_y));
    push_line(&mut out, format!("local jitterX, jitterY = {}, {}", config.jitter_x, config.jitter_y));
    push_line(&mut out, range_directive("tapDelay", config.tap_delay));
    push_line(&mut out, range_directive("postNumbersDelay", config.post_numbers_delay));
    push_line(&mut out, range_directive("finalDelay", config.final_delay));
    out.push('\n');

    push_line(&mut out, format!("-- Boucle principale sur {n} variantes"));
    out.push_str(ACTION_LOOP);
    out.push('\n');
    out.push_str("print(\"Macro terminée après \" .. #variants .. \" variantes\")\n");

    log::debug!("script Lua : {} variantes, {} octets", n, out.len());
    Ok(out)
}

const ACTION_LOOP: &str = r#"for i = 1, #variants do
    local numbers = variants[i]

    for j = 1, #numbers do
        local x, y = numbers[j].x, numbers[j].y
        Screen:click(x, y)
        wait(math.random(tapDelayMin, tapDelayMax))
    end

    wait(math.random(postNumbersDelayMin, postNumbersDelayMax))

    local randomEnterX = enterX + math.random(-jitterX, jitterX)
    local randomEnterY = enterY + math.random(-jitterY, jitterY)
    Screen:click(randomEnterX, randomEnterY)

    wait(math.random(finalDelayMin, finalDelayMax))
end
"#;

/// Relit le littéral `variants` d'un script émis : une liste de taps par variante.
pub fn parse_script_taps(script: &str) -> Result<Vec<Vec<(i64, i64)>>> {
    let mut lines = script.lines().enumerate();
    lines
        .by_ref()
        .find(|(_, line)| line.trim() == VARIANTS_OPEN)
        .ok_or_else(|| CoordGenError::Parse {
            line: 0,
            token: VARIANTS_OPEN.to_string(),
        })?;

    let mut variants = Vec::new();
    for (idx, line) in lines {
        let line = line.trim();
        if line == "}" {
            return Ok(variants);
        }
        let literal = line.split(" -- ").next().unwrap_or_default();
        variants.push(parse_taps(literal, idx + 1)?);
    }

    Err(CoordGenError::Parse {
        line: script.lines().count(),
        token: "}".to_string(),
    })
}

fn parse_taps(literal: &str, line: usize) -> Result<Vec<(i64, i64)>> {
    let bad = |token: &str| CoordGenError::Parse { line, token: token.to_string() };

    literal
        .split("{x=")
        .skip(1)
        .map(|chunk| {
            let (x, rest) = chunk.split_once(", y=").ok_or_else(|| bad(chunk))?;
            let (y, _) = rest.split_once('}').ok_or_else(|| bad(chunk))?;
            let x = x.trim().parse::<i64>().map_err(|_| bad(x))?;
            let y = y.trim().parse::<i64>().map_err(|_| bad(y))?;
            Ok((x, y))
        })
        .collect()
}
