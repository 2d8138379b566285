//! Export-side row projection.
//!
//! The actual spreadsheet writer lives outside this crate; it receives
//! the full in-memory record sequence (never the windowed page)
//! projected into tabular rows with the census column labels and a
//! human-readable verification label.

use chrono::Utc;
use serde::Serialize;

use crate::models::Victim;

/// One exported row. Serde field names are the spreadsheet column
/// headers, so a serde-aware tabular writer emits them directly.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Nom")]
    pub nom: String,
    #[serde(rename = "Prénoms")]
    pub prenoms: String,
    #[serde(rename = "Date de naissance")]
    pub date_naissance: String,
    #[serde(rename = "CIN")]
    pub cin: String,
    #[serde(rename = "Nombre")]
    pub nombre: u32,
    #[serde(rename = "Arrondissement")]
    pub arrondissement: String,
    #[serde(rename = "Fokontany")]
    pub fokontany: String,
    #[serde(rename = "Vérifié")]
    pub verifie: String,
    #[serde(rename = "Dernière modification")]
    pub derniere_modification: String,
}

impl From<&Victim> for ExportRow {
    fn from(v: &Victim) -> Self {
        Self {
            timestamp: v.timestamp.clone(),
            nom: v.nom.clone(),
            prenoms: v.prenoms.clone().unwrap_or_default(),
            date_naissance: v.date_naissance.clone().unwrap_or_default(),
            cin: v.cin.clone(),
            nombre: v.nombre,
            arrondissement: v.arrondissement.clone(),
            fokontany: v.fokontany.clone(),
            verifie: if v.checked { "Oui" } else { "Non" }.to_string(),
            derniere_modification: v.last_modified.clone(),
        }
    }
}

/// Project the full record sequence into export rows.
pub fn to_rows(victims: &[Victim]) -> Vec<ExportRow> {
    victims.iter().map(ExportRow::from).collect()
}

/// Dated default file name, e.g. `sinistres_2026-08-29.xlsx`.
pub fn export_file_name() -> String {
    format!("sinistres_{}.xlsx", Utc::now().format("%Y-%m-%d"))
}
