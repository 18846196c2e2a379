//! Almacén en memoria (backend `memory`); se pierde al reiniciar.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::RoadmapStore;
use crate::models::{NewRoadmap, Roadmap, RoadmapSummary, Section, User, Version};

#[derive(Default)]
struct State {
    users: Vec<User>,
    roadmaps: Vec<Roadmap>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Crea un almacén con los usuarios dados ya registrados.
    pub fn with_users<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let users = emails
            .into_iter()
            .map(|email| User {
                id: Uuid::new_v4().to_string(),
                email: email.into(),
            })
            .collect();
        Self {
            state: RwLock::new(State {
                users,
                roadmaps: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl RoadmapStore for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_roadmap(&self, new: NewRoadmap) -> Result<Roadmap> {
        let now = Utc::now();
        let roadmap = Roadmap {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            title: new.title,
            description: new.description,
            versions: vec![Version {
                content: new.markdown_content.clone(),
                timestamp: now,
                prompt: new.prompt,
            }],
            markdown_content: new.markdown_content,
            sections: new.sections,
            created_at: now,
            last_updated: now,
        };

        self.state.write().await.roadmaps.push(roadmap.clone());
        Ok(roadmap)
    }

    async fn get_roadmap(&self, id: &str) -> Result<Option<Roadmap>> {
        let state = self.state.read().await;
        Ok(state.roadmaps.iter().find(|r| r.id == id).cloned())
    }

    async fn list_roadmaps(&self, user_id: &str) -> Result<Vec<RoadmapSummary>> {
        let state = self.state.read().await;
        Ok(state
            .roadmaps
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .map(RoadmapSummary::from)
            .collect())
    }

    async fn set_section_completed(
        &self,
        roadmap_id: &str,
        section_id: &str,
        completed: bool,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(roadmap) = state.roadmaps.iter_mut().find(|r| r.id == roadmap_id) else {
            return Ok(false);
        };
        let Some(section) = roadmap.sections.iter_mut().find(|s| s.id == section_id) else {
            return Ok(false);
        };

        section.completed = completed;
        roadmap.last_updated = Utc::now();
        Ok(true)
    }

    async fn append_version(
        &self,
        roadmap_id: &str,
        markdown: &str,
        sections: Vec<Section>,
        prompt: Option<String>,
    ) -> Result<Option<Roadmap>> {
        let mut state = self.state.write().await;
        let Some(roadmap) = state.roadmaps.iter_mut().find(|r| r.id == roadmap_id) else {
            return Ok(None);
        };

        let now = Utc::now();
        roadmap.markdown_content = markdown.to_string();
        roadmap.sections = sections;
        roadmap.versions.push(Version {
            content: markdown.to_string(),
            timestamp: now,
            prompt,
        });
        roadmap.last_updated = now;
        Ok(Some(roadmap.clone()))
    }
}
