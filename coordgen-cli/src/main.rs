mod display;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use coordgen_core::analysis::sampler::{projected_exhaustive_size, seeded_rng};
use coordgen_core::analysis::{analyze, parse_rounds};
use coordgen_core::config::Config;
use coordgen_core::export::{results_to_csv, variants_to_csv};
use coordgen_core::import::{
    CoordinateFormat, parse_coordinates, parse_variants_csv, parse_variants_manual,
};
use coordgen_core::models::{Number, ResolvedVariant, coordinate_map};
use coordgen_core::{Strategy, emit, filter_pool, generate, resolve};

use crate::display::{
    display_frequencies, display_outcome, display_pool, display_results, display_variant_plot,
};

#[derive(Parser)]
#[command(name = "coordgen", about = "Générateur de coordonnées pour variantes")]
struct Cli {
    /// Fichier de configuration JSON (délais du macro, plafonds de génération)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fréquences des numéros sur l'historique (une ligne = un tirage)
    Analyze {
        /// Fichier des tirages (numéros séparés par des virgules)
        #[arg(short, long)]
        rounds: PathBuf,

        /// N'afficher que les N premiers
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Générer des variantes de 4 numéros à partir de l'historique
    Generate {
        #[arg(short, long)]
        rounds: PathBuf,

        /// uniform, hot-biased, cold-hot-hybrid, premium-exhaustive, random-pairs, frequency-weighted, mixed
        #[arg(short, long, default_value = "uniform")]
        strategy: Strategy,

        /// Nombre de variantes demandées
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// Taille du pool éligible (au moins 4)
        #[arg(short = 'k', long, default_value = "30")]
        top_k: usize,

        /// Numéros exclus manuellement (séparés par des virgules)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<Number>,

        /// Exclure automatiquement les N numéros les plus froids
        #[arg(long, default_value = "0")]
        exclude_cold: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Fichier CSV de sortie (id,combinatie)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Résoudre les variantes en coordonnées et exporter (CSV, Lua)
    Resolve {
        /// Coordonnées : .csv (avec en-tête), .json ou .txt (numero,x,y)
        #[arg(short, long)]
        coords: PathBuf,

        /// Variantes : .csv (avec en-tête) ou .txt (id,combinaison)
        #[arg(short, long)]
        variants: PathBuf,

        /// Export tabulaire
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Export du macro Lua
        #[arg(long)]
        lua: Option<PathBuf>,
    },

    /// Visualiser les points d'une variante
    Plot {
        #[arg(short, long)]
        coords: PathBuf,

        #[arg(short, long)]
        variants: PathBuf,

        /// Identifiant de la variante
        #[arg(long)]
        id: i64,
    },

    /// Écrire la configuration par défaut
    InitConfig {
        #[arg(short, long, default_value = "coordgen.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze { rounds, top } => cmd_analyze(&rounds, top),
        Command::Generate {
            rounds,
            strategy,
            count,
            top_k,
            exclude,
            exclude_cold,
            seed,
            output,
        } => {
            let exclude: BTreeSet<Number> = exclude.into_iter().collect();
            cmd_generate(
                &config,
                &rounds,
                strategy,
                count,
                top_k,
                &exclude,
                exclude_cold,
                seed,
                output.as_deref(),
            )
        }
        Command::Resolve {
            coords,
            variants,
            csv,
            lua,
        } => cmd_resolve(&config, &coords, &variants, csv.as_deref(), lua.as_deref()),
        Command::Plot {
            coords,
            variants,
            id,
        } => cmd_plot(&coords, &variants, id),
        Command::InitConfig { output } => cmd_init_config(&output),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
    let config = Config::from_json(&json)
        .with_context(|| format!("Configuration invalide {:?}", path))?;
    log::info!("configuration chargée depuis {:?}", path);
    Ok(config)
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Impossible d'ouvrir {:?}", path))
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

fn cmd_analyze(rounds_path: &Path, top: Option<usize>) -> Result<()> {
    let rounds = parse_rounds(&read_text(rounds_path)?)
        .with_context(|| format!("Tirages invalides dans {:?}", rounds_path))?;
    let table = analyze(&rounds);
    display_frequencies(&table, top);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    config: &Config,
    rounds_path: &Path,
    strategy: Strategy,
    count: usize,
    top_k: usize,
    exclude: &BTreeSet<Number>,
    exclude_cold: usize,
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let rounds = parse_rounds(&read_text(rounds_path)?)
        .with_context(|| format!("Tirages invalides dans {:?}", rounds_path))?;
    if rounds.is_empty() {
        bail!("Aucun tirage dans {:?}", rounds_path);
    }

    let table = analyze(&rounds);
    let pool = filter_pool(&table, exclude, exclude_cold, top_k)?;
    display_pool(&pool);

    let mut rng = seeded_rng(seed);

    let outcome = if let Strategy::PremiumExhaustive { top } = strategy {
        let projected = projected_exhaustive_size(&pool, top);
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.set_message(format!("Énumération de {projected} combinaisons..."));
        pb.enable_steady_tick(Duration::from_millis(100));
        let outcome = generate(&pool, &table, strategy, count, &config.generator, &mut rng)?;
        pb.finish_with_message("Énumération terminée");
        outcome
    } else {
        generate(&pool, &table, strategy, count, &config.generator, &mut rng)?
    };

    display_outcome(&outcome, strategy);

    if let Some(path) = output {
        fs::write(path, variants_to_csv(&outcome)?)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        println!("Variantes sauvegardées dans : {}", path.display());
    }

    Ok(())
}

fn load_resolved(coords_path: &Path, variants_path: &Path) -> Result<Vec<ResolvedVariant>> {
    let format = CoordinateFormat::from_extension(&extension(coords_path))
        .unwrap_or(CoordinateFormat::Manual);
    let entries = parse_coordinates(&read_text(coords_path)?, format)
        .with_context(|| format!("Coordonnées invalides dans {:?}", coords_path))?;
    if entries.is_empty() {
        bail!("Aucune coordonnée valide dans {:?}", coords_path);
    }
    println!("✅ {} coordonnées chargées.", entries.len());

    let text = read_text(variants_path)?;
    let rows = if extension(variants_path) == "csv" {
        parse_variants_csv(&text)
    } else {
        parse_variants_manual(&text)
    }
    .with_context(|| format!("Variantes invalides dans {:?}", variants_path))?;
    if rows.is_empty() {
        bail!("Aucune variante dans {:?}", variants_path);
    }
    println!("✅ {} variantes chargées.", rows.len());

    Ok(resolve(&coordinate_map(&entries), &rows))
}

fn cmd_resolve(
    config: &Config,
    coords_path: &Path,
    variants_path: &Path,
    csv_path: Option<&Path>,
    lua_path: Option<&Path>,
) -> Result<()> {
    let resolved = load_resolved(coords_path, variants_path)?;
    display_results(&resolved);

    let unresolved: usize = resolved.iter().map(|r| r.unresolved_count()).sum();
    if unresolved > 0 {
        log::warn!("{unresolved} numéros sans coordonnées");
    }

    if let Some(path) = csv_path {
        fs::write(path, results_to_csv(&resolved)?)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        println!("CSV écrit : {}", path.display());
    }

    if let Some(path) = lua_path {
        fs::write(path, emit(&resolved, &config.emitter)?)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        println!("Macro Lua écrit : {}", path.display());
    }

    Ok(())
}

fn cmd_plot(coords_path: &Path, variants_path: &Path, id: i64) -> Result<()> {
    let resolved = load_resolved(coords_path, variants_path)?;
    let Some(variant) = resolved.iter().find(|r| r.id == id) else {
        bail!("Variante {} introuvable", id);
    };
    display_variant_plot(variant);
    Ok(())
}

fn cmd_init_config(output: &Path) -> Result<()> {
    if output.exists() {
        bail!("{:?} existe déjà", output);
    }
    fs::write(output, Config::default().to_json()?)
        .with_context(|| format!("Impossible d'écrire {:?}", output))?;
    println!("Configuration par défaut écrite dans : {}", output.display());
    Ok(())
}
