use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque authenticated-session token (serialized cookie set).
///
/// Supplied once per run by whatever acquired the browser session; the
/// pipeline only ever forwards it as a request header and never refreshes it.
#[derive(Clone)]
pub struct SessionCredential(String);

impl SessionCredential {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionCredential {
    // Never print the cookie value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionCredential(<{} bytes>)", self.0.len())
    }
}

/// One job listing returned by the search endpoint.
///
/// Field names follow the wire shape of `resultats` entries; unknown wire
/// fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    /// Stable identifier, used as the ledger key.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "intitule")]
    pub title: String,
    #[serde(rename = "nomCommercial")]
    pub company_name: String,
    #[serde(rename = "salaireTexte", default)]
    pub salary_text: Option<String>,
}

/// The board serves posting ids as either strings or bare numbers depending
/// on the endpoint version; normalise both to a string key.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// Server-reported total size of the result set.
    pub total_count: u64,
    pub postings: Vec<Posting>,
}

/// Sort specification for the search request.
#[derive(Debug, Clone, Serialize)]
pub struct SortSpec {
    #[serde(rename = "type")]
    pub sort_type: String,
    pub direction: String,
}

/// Fixed per-run search query, serialized to the wire shape of the search
/// endpoint. Pagination travels separately (`range`/`startIndex`), so a
/// filter value is constant for the whole run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub lieux: Vec<String>,
    pub types_contrat: Vec<String>,
    pub types_convention: Vec<String>,
    pub type_client: String,
    pub sorts: Vec<SortSpec>,
    pub active_filtre: bool,
    /// Free-text inclusion/exclusion expression in the board's query syntax.
    pub mots_cles: String,
    /// Salary bounds in k€, as the strings the endpoint expects.
    pub salaire_minimum: String,
    pub salaire_maximum: String,
}

impl Default for SearchFilter {
    /// Permanent-contract developer postings, newest first.
    fn default() -> Self {
        Self {
            lieux: Vec::new(),
            types_contrat: vec!["101888".to_string()],
            types_convention: vec![
                "143684".to_string(),
                "143685".to_string(),
                "143686".to_string(),
                "143687".to_string(),
                "143706".to_string(),
            ],
            type_client: "CADRE".to_string(),
            sorts: vec![SortSpec {
                sort_type: "DATE".to_string(),
                direction: "DESCENDING".to_string(),
            }],
            active_filtre: true,
            mots_cles: "(JS OU REACT OU node OU angular OU python) ET NON (ADMINISTRATEUR OU \
                        EXPERT OU DEVOPS OU SECURITE OU CHEF OU RESPONSABLE OU PRODUCT OU \
                        MANAGER OU LEAD OU SYSTEME)"
                .to_string(),
            salaire_minimum: "35".to_string(),
            salaire_maximum: "200".to_string(),
        }
    }
}

impl SearchFilter {
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.mots_cles = keywords.into();
        self
    }

    pub fn with_salary_range(
        mut self,
        minimum: impl Into<String>,
        maximum: impl Into<String>,
    ) -> Self {
        self.salaire_minimum = minimum.into();
        self.salaire_maximum = maximum.into();
        self
    }
}

/// The fixed base of every application payload: who is applying and what
/// they are looking for. The placeholder fields are serialized as `null`
/// because the endpoint expects them present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    /// Member account id.
    pub id_cadre: String,
    /// Stored CV id attached to every application.
    pub id_cv: String,
    pub id_profil: Option<String>,
    pub stocker_cv_fichier: bool,
    pub stocker_lm_fichier: Option<bool>,
    pub lm_texte_saisie: Option<String>,
    pub nom_cv_fichier: Option<String>,
    pub nom_lm_fichier: Option<String>,
    pub cv_piece_jointe: Option<String>,
    pub lm_piece_jointe: Option<String>,
    pub message_cadre: Option<String>,
    pub ic_id_nom_formation_nature: u32,
    pub ic_id_nom_formation_discipline: u32,
    pub ic_id_nom_formation_niveau: u32,
    pub ic_date_obtention_formation: String,
    pub ic_id_nom_experience_metier: Option<u32>,
    pub ic_id_nom_experience_fonction: Option<u32>,
    pub ic_id_nom_experience_secteur: String,
    pub ic_id_nom_souhait_fonction: u32,
    pub ic_id_nom_souhait_metier: u32,
    pub ic_id_nom_souhait_secteur: u32,
    pub ic_id_nom_souhait_lieu: u32,
}

impl ApplicantProfile {
    pub fn new(id_cadre: impl Into<String>, id_cv: impl Into<String>) -> Self {
        Self {
            id_cadre: id_cadre.into(),
            id_cv: id_cv.into(),
            id_profil: None,
            stocker_cv_fichier: false,
            stocker_lm_fichier: None,
            lm_texte_saisie: None,
            nom_cv_fichier: None,
            nom_lm_fichier: None,
            cv_piece_jointe: None,
            lm_piece_jointe: None,
            message_cadre: None,
            ic_id_nom_formation_nature: 20009,
            ic_id_nom_formation_discipline: 30016,
            ic_id_nom_formation_niveau: 20019,
            ic_date_obtention_formation: "2024-12-31T23:00:00.000Z".to_string(),
            ic_id_nom_experience_metier: None,
            ic_id_nom_experience_fonction: None,
            ic_id_nom_experience_secteur: String::new(),
            ic_id_nom_souhait_fonction: 101809,
            ic_id_nom_souhait_metier: 600042,
            ic_id_nom_souhait_secteur: 101569,
            ic_id_nom_souhait_lieu: 564326,
        }
    }
}

/// Per-posting request body for the application endpoint.
///
/// Two variants exist: the base payload (`idLm: null`) and the
/// cover-letter retry (`idLm` populated). Built fresh per posting, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPayload {
    #[serde(flatten)]
    pub profile: ApplicantProfile,
    pub id_offre: String,
    pub id_lm: Option<i64>,
}

impl ApplicationPayload {
    pub fn base(profile: ApplicantProfile, posting_id: &str) -> Self {
        Self {
            profile,
            id_offre: posting_id.to_string(),
            id_lm: None,
        }
    }

    pub fn with_cover_letter(mut self, cover_letter_id: i64) -> Self {
        self.id_lm = Some(cover_letter_id);
        self
    }
}

/// Response body from the application endpoint, kept as parsed JSON when
/// possible and downgraded to the raw text otherwise. Classification only
/// ever needs the HTTP status plus one JSON field, so an unparsable body is
/// not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(serde_json::Value),
    Text(String),
}

impl ApiBody {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => ApiBody::Json(value),
            Err(_) => ApiBody::Text(raw.to_string()),
        }
    }

    /// Top-level string field lookup, `None` for text bodies.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        match self {
            ApiBody::Json(value) => value.get(name)?.as_str(),
            ApiBody::Text(_) => None,
        }
    }
}

impl fmt::Display for ApiBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiBody::Json(value) => write!(f, "{value}"),
            ApiBody::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Raw outcome of one POST to the application endpoint. Any HTTP status is
/// `Ok` at this level; only transport failures are errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ApiBody,
}

/// What one pipeline run did, reported on normal completion.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub fetched: usize,
    pub applied: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}
