//! Persistencia de roadmaps y usuarios.
//!
//! [`RoadmapStore`] es la frontera con el almacén de documentos. Hay dos
//! implementaciones: Neo4j para producción y una en memoria para desarrollo
//! y tests. No hay bloqueo optimista: con escrituras concurrentes sobre el
//! mismo roadmap gana la última.

mod memory;
mod neo4j;

pub use memory::InMemoryStore;
pub use neo4j::Neo4jStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{NewRoadmap, Roadmap, RoadmapSummary, Section, User};

#[async_trait]
pub trait RoadmapStore: Send + Sync {
    /// Comprueba que el almacén responde.
    async fn ping(&self) -> Result<()>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Crea el roadmap con una única versión inicial.
    async fn create_roadmap(&self, new: NewRoadmap) -> Result<Roadmap>;

    async fn get_roadmap(&self, id: &str) -> Result<Option<Roadmap>>;

    /// Roadmaps del usuario, del más reciente al más antiguo.
    async fn list_roadmaps(&self, user_id: &str) -> Result<Vec<RoadmapSummary>>;

    /// Devuelve `false` si no existe el roadmap o la sección.
    async fn set_section_completed(
        &self,
        roadmap_id: &str,
        section_id: &str,
        completed: bool,
    ) -> Result<bool>;

    /// Sustituye markdown y secciones y añade una versión al historial.
    /// Devuelve `None` si el roadmap no existe.
    async fn append_version(
        &self,
        roadmap_id: &str,
        markdown: &str,
        sections: Vec<Section>,
        prompt: Option<String>,
    ) -> Result<Option<Roadmap>>;
}
