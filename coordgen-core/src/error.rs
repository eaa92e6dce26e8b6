use thiserror::Error;

/// Erreurs du pipeline analyse → génération → résolution → émission.
#[derive(Error, Debug)]
pub enum CoordGenError {
    /// Texte de tirage mal formé : tout le lot est rejeté.
    #[error("Ligne {line} : valeur invalide '{token}'")]
    Parse { line: usize, token: String },

    /// Table de coordonnées ou de variantes sans les colonnes requises.
    #[error("Schéma invalide : {0}")]
    Schema(String),

    /// Paramètre hors limites (top-K < 4, plafond exhaustif dépassé, ...).
    #[error("Configuration invalide : {0}")]
    Config(String),

    #[error("Erreur CSV : {0}")]
    Csv(#[from] csv::Error),

    #[error("Erreur JSON : {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoordGenError>;
