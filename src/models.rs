//! Modelos de dominio (roadmaps, secciones, versiones y usuarios).
//!
//! La forma JSON usa `camelCase` porque es la que consume el frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Un enlace extraído de una celda o de un link markdown `[titulo](url)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

/// Un bloque contiguo del roadmap (un rango de días).
///
/// `id` se genera al parsear, de modo que el estado `completed` sobrevive a
/// reordenaciones o regeneraciones parciales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub content: String,
    pub day_range: String,
    pub focus_area: String,
    pub topics: Vec<String>,
    pub resources: Vec<Resource>,
    pub completed: bool,
}

impl Section {
    pub fn new(
        day_range: String,
        focus_area: String,
        content: String,
        topics: Vec<String>,
        resources: Vec<Resource>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: format!("{day_range}: {focus_area}"),
            content,
            day_range,
            focus_area,
            topics,
            resources,
            completed: false,
        }
    }
}

/// Instantánea del markdown en el historial de versiones (sólo se añade).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Roadmap persistido, propiedad de un único usuario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub markdown_content: String,
    pub sections: Vec<Section>,
    pub versions: Vec<Version>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Roadmap {
    pub fn progress(&self) -> Progress {
        Progress::of(&self.sections)
    }
}

/// Datos necesarios para crear un roadmap nuevo.
#[derive(Debug, Clone)]
pub struct NewRoadmap {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub markdown_content: String,
    pub sections: Vec<Section>,
    pub prompt: Option<String>,
}

/// Resumen para el listado de roadmaps de un usuario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub progress: Progress,
}

impl From<&Roadmap> for RoadmapSummary {
    fn from(roadmap: &Roadmap) -> Self {
        Self {
            id: roadmap.id.clone(),
            title: roadmap.title.clone(),
            description: roadmap.description.clone(),
            created_at: roadmap.created_at,
            last_updated: roadmap.last_updated,
            progress: roadmap.progress(),
        }
    }
}

/// Progreso del usuario sobre un roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Porcentaje redondeado al entero más cercano (0 si no hay secciones).
    pub percent: u8,
}

impl Progress {
    pub fn of(sections: &[Section]) -> Self {
        let completed = sections.iter().filter(|s| s.completed).count();
        Self::from_counts(completed, sections.len())
    }

    pub fn from_counts(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

/// Usuario registrado (el alta la gestiona la capa de autenticación).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// Cómo se referencia una sección al marcarla como completada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionRef {
    Id(String),
    Index(usize),
}

impl SectionRef {
    /// Posición de la sección referenciada dentro de `sections`.
    pub fn position_in(&self, sections: &[Section]) -> Option<usize> {
        match self {
            SectionRef::Id(id) => sections.iter().position(|s| &s.id == id),
            SectionRef::Index(index) => (*index < sections.len()).then_some(*index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn section(completed: bool) -> Section {
        let mut s = Section::new(
            "Day 1–3".to_string(),
            "Arrays".to_string(),
            String::new(),
            vec![],
            vec![],
        );
        s.completed = completed;
        s
    }

    #[test]
    fn progress_is_zero_without_sections() {
        assert_eq!(
            Progress::of(&[]),
            Progress {
                completed: 0,
                total: 0,
                percent: 0
            }
        );
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        let sections = vec![section(true), section(false), section(false)];
        assert_eq!(Progress::of(&sections).percent, 33);

        let sections = vec![section(true), section(true), section(false)];
        assert_eq!(Progress::of(&sections).percent, 67);
    }

    #[test]
    fn new_section_has_title_and_fresh_id() {
        let a = section(false);
        let b = section(false);
        assert_eq!(a.title, "Day 1–3: Arrays");
        assert!(!a.completed);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn section_ref_resolves_by_id_and_index() {
        let sections = vec![section(false), section(false)];
        let second = SectionRef::Id(sections[1].id.clone());
        assert_eq!(second.position_in(&sections), Some(1));
        assert_eq!(SectionRef::Index(0).position_in(&sections), Some(0));
        assert_eq!(SectionRef::Index(2).position_in(&sections), None);
        assert_eq!(SectionRef::Id("nope".into()).position_in(&sections), None);
    }

    #[test]
    fn section_serializes_in_camel_case() {
        let value = serde_json::to_value(section(false)).unwrap();
        assert_eq!(value["dayRange"], "Day 1–3");
        assert_eq!(value["focusArea"], "Arrays");
        assert_eq!(value["completed"], false);
    }
}
