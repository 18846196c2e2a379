use std::sync::Arc;

use crate::{config::AppConfig, llm::TextGenerator, store::RoadmapStore};

/// Estado compartido por todos los handlers. Cada petición es independiente;
/// el único estado mutable vive en el almacén.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn RoadmapStore>,
    pub llm: Arc<dyn TextGenerator>,
}
