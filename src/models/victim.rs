use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A registered victim of the disaster census.
///
/// Field names on the wire match the remote document store exactly
/// (camelCase, French field names from the original census form).
/// Absent fields normalize to empty string / zero so that spreadsheet
/// rows with holes still round-trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Victim {
    /// Document id. Immutable once assigned; derived from the sanitized
    /// CIN when available, otherwise synthesized at import time.
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub prenoms: Option<String>,
    #[serde(rename = "dateNaissance", default)]
    pub date_naissance: Option<String>,
    #[serde(default)]
    pub cin: String,
    /// Household size ("Nombre dans le foyer").
    #[serde(default)]
    pub nombre: u32,
    #[serde(default)]
    pub arrondissement: String,
    #[serde(default)]
    pub fokontany: String,
    /// Verification flag toggled by operators.
    #[serde(default)]
    pub checked: bool,
    #[serde(rename = "lastModified", default)]
    pub last_modified: String,
}

impl Victim {
    /// Case-insensitive substring match across the searchable fields
    /// (nom, prénoms, CIN, arrondissement, fokontany).
    ///
    /// `needle` must already be lower-cased. A missing field never
    /// matches; it is not an error.
    pub fn matches_query(&self, needle: &str) -> bool {
        let hit = |field: &str| field.to_lowercase().contains(needle);
        hit(&self.nom)
            || self.prenoms.as_deref().is_some_and(hit)
            || hit(&self.cin)
            || hit(&self.arrondissement)
            || hit(&self.fokontany)
    }
}

/// Partial update applied to a single victim document.
///
/// Only the mutable fields appear; the remote store merges them into
/// the existing document (per-document last-write-wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VictimPatch {
    pub checked: bool,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
}

impl VictimPatch {
    /// Patch flipping the verification flag to `checked`, stamped now.
    pub fn set_checked(checked: bool) -> Self {
        Self {
            checked,
            last_modified: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Victim {
        Victim {
            id: "101234567890".to_string(),
            timestamp: "2026-01-20T08:00:00Z".to_string(),
            nom: "Rakotoarisoa".to_string(),
            prenoms: Some("Jean Hery".to_string()),
            date_naissance: Some("1985-03-12".to_string()),
            cin: "101 234 567 890".to_string(),
            nombre: 5,
            arrondissement: "5e Arrondissement".to_string(),
            fokontany: "Andraisoro".to_string(),
            checked: false,
            last_modified: "2026-01-20T08:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_matches_query_across_fields() {
        let v = sample();
        assert!(v.matches_query("rakoto"));
        assert!(v.matches_query("hery"));
        assert!(v.matches_query("101 234"));
        assert!(v.matches_query("andraisoro"));
        assert!(v.matches_query("5e arr"));
        assert!(!v.matches_query("ravalomanana"));
    }

    #[test]
    fn test_matches_query_missing_field_is_no_match() {
        let mut v = sample();
        v.prenoms = None;
        assert!(!v.matches_query("hery"));
        // Other fields still match
        assert!(v.matches_query("rakoto"));
    }

    #[test]
    fn test_deserialize_sparse_document() {
        // A document written by an early import with most fields absent
        let v: Victim = serde_json::from_str(r#"{"id": "x1", "nom": "Rabe"}"#)
            .expect("sparse document should parse");
        assert_eq!(v.nom, "Rabe");
        assert_eq!(v.cin, "");
        assert_eq!(v.nombre, 0);
        assert!(!v.checked);
        assert!(v.prenoms.is_none());
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert!(json.get("dateNaissance").is_some());
        assert!(json.get("lastModified").is_some());
        assert!(json.get("date_naissance").is_none());
    }
}
