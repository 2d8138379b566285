//! Import-side row normalization.
//!
//! The file codec (xlsx/csv reader) lives outside this crate and hands
//! us raw `header -> value` mappings, one per spreadsheet row. This
//! module turns those into `Victim` records: header matching is
//! case-insensitive over an ordered alias list per logical field, the
//! CIN is sanitized into a document id, and rows without a CIN get a
//! synthesized id unique within the batch.

use std::collections::HashMap;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;
use tracing::warn;

use crate::gateway::GatewayError;
use crate::models::Victim;

/// One raw spreadsheet row, headers as the file spelled them.
pub type RawRow = HashMap<String, String>;

/// Maximum length of a CIN-derived document id.
const MAX_ID_LENGTH: usize = 100;

/// Length of the random suffix on synthesized ids.
const SYNTH_SUFFIX_LENGTH: usize = 9;

// Header aliases per logical field, tried in order. Census exports
// have come in with several spellings over time.
const ALIAS_TIMESTAMP: &[&str] = &["timestamp", "horodatage"];
const ALIAS_NOM: &[&str] = &["nom"];
const ALIAS_PRENOMS: &[&str] = &["prénoms", "prenoms"];
const ALIAS_NAISSANCE: &[&str] = &["date de naissance", "naissance"];
const ALIAS_CIN: &[&str] = &["cin", "n° cin"];
const ALIAS_NOMBRE: &[&str] = &["nombre", "foyer", "nombre dans le foyer"];
const ALIAS_ARRONDISSEMENT: &[&str] = &["arrondissement"];
const ALIAS_FOKONTANY: &[&str] = &["fokontany"];

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Import aborted: {0}")]
    Gateway(#[from] GatewayError),
}

/// Outcome of a completed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records written to the collection.
    pub count: usize,
    /// Malformed rows skipped during normalization.
    pub skipped: usize,
}

/// Records ready for upsert plus the count of rows dropped on the way.
#[derive(Debug)]
pub struct NormalizedBatch {
    pub victims: Vec<Victim>,
    pub skipped: usize,
}

/// Sanitize a CIN into a document id: whitespace runs become `_`,
/// anything outside `[A-Za-z0-9_-]` is dropped, capped at 100 chars.
/// Returns `None` when nothing usable remains.
pub fn sanitize_cin(cin: &str) -> Option<String> {
    let mut out = String::new();
    let mut pending_sep = false;
    for c in cin.trim().chars() {
        if c.is_whitespace() {
            pending_sep = !out.is_empty();
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.push(c);
        }
        // Everything else (slashes, accents, punctuation) is dropped.
    }
    out.truncate(MAX_ID_LENGTH);
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Synthesize a document id for a row without a usable CIN.
fn synth_id(index: usize) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SYNTH_SUFFIX_LENGTH)
        .map(char::from)
        .collect();
    format!(
        "victim_{}_{}_{}",
        index,
        Utc::now().timestamp_millis(),
        suffix.to_lowercase()
    )
}

/// Look a logical field up by its alias list, case-insensitively.
fn get_val<'a>(row: &'a HashMap<String, &str>, aliases: &[&str]) -> &'a str {
    for alias in aliases {
        if let Some(value) = row.get(&alias.to_lowercase()) {
            return value;
        }
    }
    ""
}

fn parse_nombre(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(0)
}

/// Normalize raw rows into victims. Rows carrying neither a name nor a
/// CIN are skipped with a warning; they are not fatal to the batch.
pub fn normalize_rows(rows: impl IntoIterator<Item = RawRow>) -> NormalizedBatch {
    let mut victims = Vec::new();
    let mut skipped = 0;

    for (index, raw) in rows.into_iter().enumerate() {
        // Lower-cased, trimmed headers for alias matching
        let row: HashMap<String, &str> = raw
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.as_str()))
            .collect();

        let nom = get_val(&row, ALIAS_NOM).trim().to_string();
        let cin = get_val(&row, ALIAS_CIN).trim().to_string();

        if nom.is_empty() && cin.is_empty() {
            warn!(row = index, "Skipping row without name or CIN");
            skipped += 1;
            continue;
        }

        let id = sanitize_cin(&cin).unwrap_or_else(|| synth_id(index));
        let now = Utc::now().to_rfc3339();

        let prenoms = get_val(&row, ALIAS_PRENOMS).trim();
        let naissance = get_val(&row, ALIAS_NAISSANCE).trim();
        let timestamp = get_val(&row, ALIAS_TIMESTAMP).trim();

        victims.push(Victim {
            id,
            timestamp: if timestamp.is_empty() {
                now.clone()
            } else {
                timestamp.to_string()
            },
            nom,
            prenoms: (!prenoms.is_empty()).then(|| prenoms.to_string()),
            date_naissance: (!naissance.is_empty()).then(|| naissance.to_string()),
            cin,
            nombre: parse_nombre(get_val(&row, ALIAS_NOMBRE)),
            arrondissement: get_val(&row, ALIAS_ARRONDISSEMENT).trim().to_string(),
            fokontany: get_val(&row, ALIAS_FOKONTANY).trim().to_string(),
            checked: false,
            last_modified: now,
        });
    }

    NormalizedBatch { victims, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sanitize_cin_spaces_and_slashes() {
        assert_eq!(sanitize_cin("123 456/A").as_deref(), Some("123_456A"));
        assert_eq!(sanitize_cin("  101234567890 ").as_deref(), Some("101234567890"));
        assert_eq!(sanitize_cin("AB-12_34").as_deref(), Some("AB-12_34"));
        assert_eq!(sanitize_cin("///").as_deref(), None);
        assert_eq!(sanitize_cin(""), None);
    }

    #[test]
    fn test_sanitize_cin_caps_length() {
        let long = "9".repeat(250);
        assert_eq!(sanitize_cin(&long).expect("id").len(), MAX_ID_LENGTH);
    }

    #[test]
    fn test_header_aliases_are_case_insensitive() {
        let batch = normalize_rows(vec![row(&[
            ("NOM", "Rakoto"),
            ("Prénoms", "Hery"),
            ("N° CIN", "123 456"),
            ("Nombre dans le foyer", "4"),
            ("ARRONDISSEMENT", "1er"),
            ("Fokontany ", "Isotry"),
        ])]);
        assert_eq!(batch.skipped, 0);
        let v = &batch.victims[0];
        assert_eq!(v.id, "123_456");
        assert_eq!(v.nom, "Rakoto");
        assert_eq!(v.prenoms.as_deref(), Some("Hery"));
        assert_eq!(v.nombre, 4);
        assert_eq!(v.arrondissement, "1er");
        assert_eq!(v.fokontany, "Isotry");
        assert!(!v.checked);
    }

    #[test]
    fn test_row_without_identity_is_skipped() {
        let batch = normalize_rows(vec![
            row(&[("nom", ""), ("cin", "")]),
            row(&[("nom", "Rabe")]),
        ]);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.victims.len(), 1);
        assert_eq!(batch.victims[0].nom, "Rabe");
    }

    #[test]
    fn test_empty_cin_gets_unique_synthesized_ids() {
        let batch = normalize_rows(vec![
            row(&[("nom", "Rabe")]),
            row(&[("nom", "Rasoa")]),
        ]);
        let ids: Vec<&str> = batch.victims.iter().map(|v| v.id.as_str()).collect();
        assert!(ids[0].starts_with("victim_"));
        assert!(ids[1].starts_with("victim_"));
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_unparseable_nombre_defaults_to_zero() {
        let batch = normalize_rows(vec![row(&[("nom", "Rabe"), ("nombre", "beaucoup")])]);
        assert_eq!(batch.victims[0].nombre, 0);
    }
}
