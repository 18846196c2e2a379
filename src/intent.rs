//! Interpretación de la intención estructurada devuelta por el modelo.
//!
//! La respuesta del modelo puede venir decorada (bloques ```json, texto antes
//! o después). Se extrae el objeto JSON, se valida contra un esquema estricto
//! y se decide si continuar con la generación o rechazar la petición.

use serde::Deserialize;
use thiserror::Error;

pub const TIMELINE_NOT_SPECIFIED: &str = "Not specified";

const DEFAULT_REJECTION: &str =
    "The request could not be turned into a learning roadmap. Please rephrase it.";
const NO_ASPIRATIONS: &str = "No learning goals could be identified in the request.";

/// Esquema de la respuesta del modelo. `error` es obligatorio.
#[derive(Debug, Clone, Deserialize)]
struct RawIntent {
    #[serde(default)]
    timeline: Option<String>,
    #[serde(default)]
    known_skills: Option<Vec<String>>,
    #[serde(default)]
    aspirations: Option<Vec<String>>,
    error: bool,
    #[serde(default)]
    notes: Option<String>,
}

/// Intención validada con la que se puede generar un roadmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub timeline: String,
    pub known_skills: Vec<String>,
    pub aspirations: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentDecision {
    Proceed(Intent),
    /// Rechazo decidido por el modelo; `message` es su nota, tal cual.
    Reject { message: String },
}

/// La respuesta no se pudo entender (distinto de un rechazo).
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("la respuesta del modelo no contiene un objeto JSON")]
    NoJsonObject,
    #[error("la respuesta del modelo no cumple el esquema de intención: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Quita los marcadores de bloque de código y se queda con el tramo entre la
/// primera `{` y la última `}`.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let cleaned = response.trim();
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    (start < end).then(|| cleaned[start..=end].trim())
}

/// Interpreta la respuesta cruda del modelo a la petición de intención.
pub fn interpret_response(response: &str) -> Result<IntentDecision, IntentError> {
    let stripped = response.replace("```json", "").replace("```", "");
    let json = extract_json_object(&stripped).ok_or(IntentError::NoJsonObject)?;
    let raw: RawIntent = serde_json::from_str(json)?;
    Ok(decide(raw))
}

fn decide(raw: RawIntent) -> IntentDecision {
    let notes = raw.notes.unwrap_or_default().trim().to_string();

    if raw.error {
        let message = if notes.is_empty() {
            DEFAULT_REJECTION.to_string()
        } else {
            notes
        };
        return IntentDecision::Reject { message };
    }

    let aspirations: Vec<String> = clean_list(raw.aspirations);
    if aspirations.is_empty() {
        return IntentDecision::Reject {
            message: NO_ASPIRATIONS.to_string(),
        };
    }

    let timeline = raw
        .timeline
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| TIMELINE_NOT_SPECIFIED.to_string());

    IntentDecision::Proceed(Intent {
        timeline,
        known_skills: clean_list(raw.known_skills),
        aspirations,
        notes,
    })
}

fn clean_list(items: Option<Vec<String>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn valid_intent_proceeds() {
        let response = r#"{"timeline":"30 days","known_skills":["Python"],"aspirations":["DSA"],"error":false,"notes":""}"#;
        assert_eq!(
            interpret_response(response).unwrap(),
            IntentDecision::Proceed(Intent {
                timeline: "30 days".into(),
                known_skills: vec!["Python".into()],
                aspirations: vec!["DSA".into()],
                notes: String::new(),
            })
        );
    }

    #[test]
    fn decorated_response_is_unwrapped() {
        let response = "Sure! Here it is:\n```json\n{\n  \"timeline\": \"90 days\",\n  \"aspirations\": [\"DSA for Amazon\"],\n  \"error\": false\n}\n```\nGood luck!";
        match interpret_response(response).unwrap() {
            IntentDecision::Proceed(intent) => {
                assert_eq!(intent.timeline, "90 days");
                assert!(intent.known_skills.is_empty());
            }
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn missing_or_blank_timeline_defaults() {
        for response in [
            r#"{"aspirations":["Rust"],"error":false}"#,
            r#"{"timeline":"  ","aspirations":["Rust"],"error":false}"#,
            r#"{"timeline":null,"aspirations":["Rust"],"error":false}"#,
        ] {
            match interpret_response(response).unwrap() {
                IntentDecision::Proceed(intent) => {
                    assert_eq!(intent.timeline, TIMELINE_NOT_SPECIFIED)
                }
                other => panic!("unexpected decision: {other:?}"),
            }
        }
    }

    #[test]
    fn flagged_intent_is_rejected_with_model_note() {
        let response = r#"{"timeline":"7 days","aspirations":["DSA for Amazon"],"error":true,"notes":"Timeline is unrealistic."}"#;
        assert_eq!(
            interpret_response(response).unwrap(),
            IntentDecision::Reject {
                message: "Timeline is unrealistic.".into()
            }
        );
    }

    #[test]
    fn flagged_intent_without_note_uses_fallback() {
        let decision = interpret_response(r#"{"error":true,"notes":""}"#).unwrap();
        assert_eq!(
            decision,
            IntentDecision::Reject {
                message: DEFAULT_REJECTION.into()
            }
        );
    }

    #[test]
    fn valid_flag_without_aspirations_is_rejected() {
        let decision = interpret_response(r#"{"aspirations":["  "],"error":false}"#).unwrap();
        assert_eq!(
            decision,
            IntentDecision::Reject {
                message: NO_ASPIRATIONS.into()
            }
        );
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            interpret_response("I cannot help with that."),
            Err(IntentError::NoJsonObject)
        ));
    }

    #[test]
    fn schema_violations_are_malformed() {
        assert!(matches!(
            interpret_response(r#"{"timeline":"30 days","aspirations":["DSA"]}"#),
            Err(IntentError::Schema(_))
        ));
        assert!(matches!(
            interpret_response(r#"{"error":"false","aspirations":["DSA"]}"#),
            Err(IntentError::Schema(_))
        ));
        assert!(matches!(
            interpret_response(r#"{"error": false, "aspirations": [}"#),
            Err(IntentError::Schema(_))
        ));
    }
}
