//! Flujos de negocio sobre roadmaps.
//!
//! Generación:
//!   1. Prompt de intención con el texto libre del usuario.
//!   2. El modelo devuelve la intención en JSON; si la rechaza, se corta aquí
//!      y no hay segunda llamada.
//!   3. Prompt de roadmap con la duración y los objetivos.
//!   4. El modelo devuelve la tabla markdown, que se parsea en secciones.
//!   5. Se guarda el roadmap con su primera versión.
//!
//! Refinado: tabla actual + instrucción → tabla revisada → secciones. No se
//! guarda; para conservarla el cliente llama a [`save_version`].

use tracing::{debug, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    intent::{self, IntentDecision},
    llm::TextGenerator,
    models::{NewRoadmap, Progress, Roadmap, Section, SectionRef, User},
    parser::{self, RoadmapFormat},
    prompts,
    store::RoadmapStore,
};

/// Genera, parsea y guarda un roadmap nuevo a partir del texto del usuario.
pub async fn generate_roadmap(
    llm: &dyn TextGenerator,
    store: &dyn RoadmapStore,
    user: &User,
    prompt: &str,
) -> ApiResult<Roadmap> {
    // 1) Extraer la intención
    let intent_prompt = prompts::intent_prompt(prompt)?;
    let raw_intent = llm
        .generate(&intent_prompt)
        .await
        .map_err(ApiError::upstream)?;

    let intent = match intent::interpret_response(&raw_intent) {
        Ok(IntentDecision::Proceed(intent)) => intent,
        Ok(IntentDecision::Reject { message }) => {
            info!("Petición rechazada por el validador de intención: {}", message);
            return Err(ApiError::IntentRejected(message));
        }
        Err(e) => {
            warn!("Respuesta de intención no interpretable: {}. Respuesta LLM: '{}'", e, raw_intent);
            return Err(ApiError::MalformedModelOutput(e.to_string()));
        }
    };
    info!(
        "Intención validada: duración '{}', objetivos {:?}, conocimientos previos {:?}",
        intent.timeline, intent.aspirations, intent.known_skills
    );
    if !intent.notes.is_empty() {
        debug!("Notas del validador de intención: {}", intent.notes);
    }

    // 2) Generar la tabla del roadmap
    let roadmap_prompt = prompts::roadmap_prompt(&intent.timeline, &intent.aspirations)?;
    let markdown = llm
        .generate(&roadmap_prompt)
        .await
        .map_err(ApiError::upstream)?;

    // 3) Parsear y guardar
    let parsed = parser::parse_roadmap(&markdown, None);
    let goals = intent.aspirations.join(", ");
    let new = NewRoadmap {
        user_id: user.id.clone(),
        title: format!("Roadmap for {goals}"),
        description: format!("A {} roadmap for learning {goals}", intent.timeline),
        markdown_content: markdown,
        sections: parsed.sections,
        prompt: Some(prompt.to_string()),
    };

    let roadmap = store.create_roadmap(new).await.map_err(ApiError::store)?;
    info!(
        "Roadmap {} creado para {} con {} secciones",
        roadmap.id,
        user.email,
        roadmap.sections.len()
    );
    Ok(roadmap)
}

/// Resultado de un refinado (vista previa, sin persistir).
#[derive(Debug, Clone)]
pub struct RefinedRoadmap {
    pub markdown: String,
    pub sections: Vec<Section>,
}

pub async fn refine_roadmap(
    llm: &dyn TextGenerator,
    table: &str,
    instruction: &str,
    format: Option<RoadmapFormat>,
) -> ApiResult<RefinedRoadmap> {
    if table.trim().is_empty() {
        return Err(ApiError::BadRequest("Table content is required".to_string()));
    }

    let refine_prompt = prompts::refine_prompt(table, instruction)?;
    let markdown = llm
        .generate(&refine_prompt)
        .await
        .map_err(ApiError::upstream)?;
    let parsed = parser::parse_roadmap(&markdown, format);

    Ok(RefinedRoadmap {
        markdown,
        sections: parsed.sections,
    })
}

/// Carga un roadmap comprobando que pertenece a `user`.
pub async fn load_owned(
    store: &dyn RoadmapStore,
    user: &User,
    roadmap_id: &str,
) -> ApiResult<Roadmap> {
    let roadmap = store
        .get_roadmap(roadmap_id)
        .await
        .map_err(ApiError::store)?
        .ok_or(ApiError::RoadmapNotFound)?;

    if roadmap.user_id != user.id {
        warn!("{} intentó acceder al roadmap ajeno {}", user.email, roadmap_id);
        return Err(ApiError::Forbidden);
    }
    Ok(roadmap)
}

/// Marca o desmarca una sección. Devuelve la sección actualizada y el
/// progreso resultante.
pub async fn set_completion(
    store: &dyn RoadmapStore,
    user: &User,
    roadmap_id: &str,
    section: &SectionRef,
    completed: bool,
) -> ApiResult<(Section, Progress)> {
    let mut roadmap = load_owned(store, user, roadmap_id).await?;
    let position = section
        .position_in(&roadmap.sections)
        .ok_or(ApiError::SectionNotFound)?;
    let section_id = roadmap.sections[position].id.clone();

    let updated = store
        .set_section_completed(roadmap_id, &section_id, completed)
        .await
        .map_err(ApiError::store)?;
    if !updated {
        return Err(ApiError::SectionNotFound);
    }

    roadmap.sections[position].completed = completed;
    info!(
        "Sección {} del roadmap {} marcada como completed={}",
        section_id, roadmap_id, completed
    );
    Ok((
        roadmap.sections[position].clone(),
        Progress::of(&roadmap.sections),
    ))
}

/// Guarda un markdown (normalmente un refinado aceptado) como nueva versión.
///
/// Las secciones nuevas cuyo título coincide con una sección anterior heredan
/// su `id` y su estado `completed`.
pub async fn save_version(
    store: &dyn RoadmapStore,
    user: &User,
    roadmap_id: &str,
    markdown: &str,
    prompt: Option<String>,
    format: Option<RoadmapFormat>,
) -> ApiResult<Roadmap> {
    if markdown.trim().is_empty() {
        return Err(ApiError::BadRequest("Markdown content is required".to_string()));
    }

    let current = load_owned(store, user, roadmap_id).await?;
    let mut sections = parser::parse_roadmap(markdown, format).sections;
    carry_over_progress(&current.sections, &mut sections);

    store
        .append_version(roadmap_id, markdown, sections, prompt)
        .await
        .map_err(ApiError::store)?
        .ok_or(ApiError::RoadmapNotFound)
}

fn carry_over_progress(previous: &[Section], next: &mut [Section]) {
    let mut taken = vec![false; previous.len()];
    for section in next.iter_mut() {
        let matched = previous
            .iter()
            .enumerate()
            .find(|(i, old)| !taken[*i] && old.title == section.title);
        if let Some((i, old)) = matched {
            taken[i] = true;
            section.id = old.id.clone();
            section.completed = old.completed;
        }
    }
}
