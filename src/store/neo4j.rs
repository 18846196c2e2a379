//! Almacén de roadmaps sobre Neo4j.
//!
//! Grafo:
//!   (:User)-[:OWNS]->(:Roadmap)-[:HAS_SECTION]->(:Section)
//!                              -[:HAS_VERSION]->(:Version)
//!
//! El orden de secciones y versiones se guarda en la propiedad `position`.
//! Los recursos de una sección se guardan como JSON en `resources`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neo4rs::{query, Graph, Row, Txn};
use tracing::info;
use url::Url;
use uuid::Uuid;

use super::RoadmapStore;
use crate::config::Neo4jConfig;
use crate::models::{
    NewRoadmap, Progress, Resource, Roadmap, RoadmapSummary, Section, User, Version,
};

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub async fn connect(cfg: &Neo4jConfig) -> Result<Self> {
        let url = Url::parse(&cfg.uri)?;
        let host = url.host_str().unwrap_or("localhost");
        let port = url.port().unwrap_or(7687);
        let addr = format!("{host}:{port}");

        info!("Conectando a Neo4j en {addr}...");
        let graph = Graph::new(&addr, &cfg.user, &cfg.password).await?;
        info!("Conexión a Neo4j OK");
        Ok(Self { graph })
    }

    /// Crea constraints básicos para las etiquetas usadas en el grafo:
    /// :User, :Roadmap y :Section.
    pub async fn ensure_schema(&self) -> Result<()> {
        let statements = [
            "CREATE CONSTRAINT user_id IF NOT EXISTS
             FOR (u:User)
             REQUIRE u.id IS UNIQUE",
            "CREATE CONSTRAINT user_email IF NOT EXISTS
             FOR (u:User)
             REQUIRE u.email IS UNIQUE",
            "CREATE CONSTRAINT roadmap_id IF NOT EXISTS
             FOR (r:Roadmap)
             REQUIRE r.id IS UNIQUE",
            "CREATE CONSTRAINT section_id IF NOT EXISTS
             FOR (s:Section)
             REQUIRE s.id IS UNIQUE",
        ];

        for stmt in statements {
            self.graph.run(query(stmt)).await?;
        }

        info!("Esquema de Neo4j asegurado (constraints básicos creados).");
        Ok(())
    }

    async fn load_sections(&self, roadmap_id: &str) -> Result<Vec<Section>> {
        let mut cursor = self
            .graph
            .execute(
                query(
                    "MATCH (:Roadmap {id: $id})-[:HAS_SECTION]->(s:Section)
                     RETURN s.id AS id, s.title AS title, s.content AS content,
                            s.day_range AS day_range, s.focus_area AS focus_area,
                            s.topics AS topics, s.resources AS resources,
                            s.completed AS completed
                     ORDER BY s.position",
                )
                .param("id", roadmap_id),
            )
            .await?;

        let mut sections = Vec::new();
        while let Some(row) = cursor.next().await? {
            let resources = decode_resources(&text(&row, "resources")?)?;
            sections.push(Section {
                id: text(&row, "id")?,
                title: text(&row, "title")?,
                content: text(&row, "content")?,
                day_range: text(&row, "day_range")?,
                focus_area: text(&row, "focus_area")?,
                topics: row.get::<Vec<String>>("topics").unwrap_or_default(),
                resources,
                completed: row.get::<bool>("completed").unwrap_or(false),
            });
        }
        Ok(sections)
    }

    async fn load_versions(&self, roadmap_id: &str) -> Result<Vec<Version>> {
        let mut cursor = self
            .graph
            .execute(
                query(
                    "MATCH (:Roadmap {id: $id})-[:HAS_VERSION]->(v:Version)
                     RETURN v.content AS content, v.timestamp AS timestamp, v.prompt AS prompt
                     ORDER BY v.position",
                )
                .param("id", roadmap_id),
            )
            .await?;

        let mut versions = Vec::new();
        while let Some(row) = cursor.next().await? {
            let timestamp = text(&row, "timestamp")?;
            versions.push(Version {
                content: text(&row, "content")?,
                timestamp: parse_timestamp(&timestamp)?,
                prompt: row.get::<String>("prompt").filter(|p| !p.is_empty()),
            });
        }
        Ok(versions)
    }
}

fn text(row: &Row, key: &str) -> Result<String> {
    row.get::<String>(key)
        .ok_or_else(|| anyhow!("Falta campo '{key}' en resultado de Neo4j"))
}

fn encode_resources(resources: &[Resource]) -> Result<String> {
    serde_json::to_string(resources).context("No se pudieron serializar los recursos")
}

fn decode_resources(raw: &str) -> Result<Vec<Resource>> {
    serde_json::from_str(raw).context("Recursos de sección con JSON inválido")
}

/// Los conteos de Cypher llegan como `i64`; un valor negativo se trata como 0.
fn progress_from_counts(completed: i64, total: i64) -> Progress {
    let total = usize::try_from(total).unwrap_or(0);
    let completed = usize::try_from(completed).unwrap_or(0).min(total);
    Progress::from_counts(completed, total)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Fecha inválida en Neo4j: '{raw}'"))?
        .with_timezone(&Utc))
}

async fn insert_sections(tx: &Txn, roadmap_id: &str, sections: &[Section]) -> Result<()> {
    for (position, section) in sections.iter().enumerate() {
        tx.run(
            query(
                "MATCH (r:Roadmap {id: $roadmap_id})
                 CREATE (r)-[:HAS_SECTION]->(:Section {
                     id: $id, position: $position, title: $title, content: $content,
                     day_range: $day_range, focus_area: $focus_area, topics: $topics,
                     resources: $resources, completed: $completed
                 })",
            )
            .param("roadmap_id", roadmap_id)
            .param("id", section.id.clone())
            .param("position", position as i64)
            .param("title", section.title.clone())
            .param("content", section.content.clone())
            .param("day_range", section.day_range.clone())
            .param("focus_area", section.focus_area.clone())
            .param("topics", section.topics.clone())
            .param("resources", encode_resources(&section.resources)?)
            .param("completed", section.completed),
        )
        .await?;
    }
    Ok(())
}

async fn insert_version(tx: &Txn, roadmap_id: &str, version: &Version) -> Result<()> {
    tx.run(
        query(
            "MATCH (r:Roadmap {id: $roadmap_id})
             OPTIONAL MATCH (r)-[:HAS_VERSION]->(existing:Version)
             WITH r, count(existing) AS position
             CREATE (r)-[:HAS_VERSION]->(:Version {
                 position: position, content: $content, timestamp: $timestamp, prompt: $prompt
             })",
        )
        .param("roadmap_id", roadmap_id)
        .param("content", version.content.clone())
        .param("timestamp", version.timestamp.to_rfc3339())
        .param("prompt", version.prompt.clone().unwrap_or_default()),
    )
    .await?;
    Ok(())
}

#[async_trait]
impl RoadmapStore for Neo4jStore {
    async fn ping(&self) -> Result<()> {
        self.graph.run(query("RETURN 1")).await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut cursor = self
            .graph
            .execute(
                query("MATCH (u:User {email: $email}) RETURN u.id AS id, u.email AS email LIMIT 1")
                    .param("email", email),
            )
            .await?;

        match cursor.next().await? {
            Some(row) => Ok(Some(User {
                id: text(&row, "id")?,
                email: text(&row, "email")?,
            })),
            None => Ok(None),
        }
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

        let tx = self.graph.start_txn().await?;
        tx.run(
            query(
                "MATCH (u:User {id: $user_id})
                 CREATE (u)-[:OWNS]->(:Roadmap {
                     id: $id, user_id: $user_id, title: $title, description: $description,
                     markdown: $markdown, created_at: $created_at, last_updated: $created_at
                 })",
            )
            .param("id", roadmap.id.clone())
            .param("user_id", roadmap.user_id.clone())
            .param("title", roadmap.title.clone())
            .param("description", roadmap.description.clone())
            .param("markdown", roadmap.markdown_content.clone())
            .param("created_at", now.to_rfc3339()),
        )
        .await?;
        insert_sections(&tx, &roadmap.id, &roadmap.sections).await?;
        insert_version(&tx, &roadmap.id, &roadmap.versions[0]).await?;
        tx.commit().await?;

        info!(
            "Roadmap {} guardado con {} secciones",
            roadmap.id,
            roadmap.sections.len()
        );
        Ok(roadmap)
    }

    async fn get_roadmap(&self, id: &str) -> Result<Option<Roadmap>> {
        let mut cursor = self
            .graph
            .execute(
                query(
                    "MATCH (r:Roadmap {id: $id})
                     RETURN r.id AS id, r.user_id AS user_id, r.title AS title,
                            r.description AS description, r.markdown AS markdown,
                            r.created_at AS created_at, r.last_updated AS last_updated",
                )
                .param("id", id),
            )
            .await?;

        let Some(row) = cursor.next().await? else {
            return Ok(None);
        };

        let created_at = text(&row, "created_at")?;
        let last_updated = text(&row, "last_updated")?;
        Ok(Some(Roadmap {
            id: text(&row, "id")?,
            user_id: text(&row, "user_id")?,
            title: text(&row, "title")?,
            description: text(&row, "description")?,
            markdown_content: text(&row, "markdown")?,
            sections: self.load_sections(id).await?,
            versions: self.load_versions(id).await?,
            created_at: parse_timestamp(&created_at)?,
            last_updated: parse_timestamp(&last_updated)?,
        }))
    }

    async fn list_roadmaps(&self, user_id: &str) -> Result<Vec<RoadmapSummary>> {
        let mut cursor = self
            .graph
            .execute(
                query(
                    "MATCH (r:Roadmap {user_id: $user_id})
                     OPTIONAL MATCH (r)-[:HAS_SECTION]->(s:Section)
                     RETURN r.id AS id, r.title AS title, r.description AS description,
                            r.created_at AS created_at, r.last_updated AS last_updated,
                            count(s) AS total,
                            sum(CASE WHEN s.completed THEN 1 ELSE 0 END) AS completed
                     ORDER BY created_at DESC",
                )
                .param("user_id", user_id),
            )
            .await?;

        let mut summaries = Vec::new();
        while let Some(row) = cursor.next().await? {
            let created_at = text(&row, "created_at")?;
            let last_updated = text(&row, "last_updated")?;
            let total = row.get::<i64>("total").unwrap_or(0);
            let completed = row.get::<i64>("completed").unwrap_or(0);
            summaries.push(RoadmapSummary {
                id: text(&row, "id")?,
                title: text(&row, "title")?,
                description: text(&row, "description")?,
                created_at: parse_timestamp(&created_at)?,
                last_updated: parse_timestamp(&last_updated)?,
                progress: progress_from_counts(completed, total),
            });
        }
        Ok(summaries)
    }

    async fn set_section_completed(
        &self,
        roadmap_id: &str,
        section_id: &str,
        completed: bool,
    ) -> Result<bool> {
        let mut cursor = self
            .graph
            .execute(
                query(
                    "MATCH (r:Roadmap {id: $roadmap_id})-[:HAS_SECTION]->(s:Section {id: $section_id})
                     SET s.completed = $completed, r.last_updated = $now
                     RETURN s.id AS id",
                )
                .param("roadmap_id", roadmap_id)
                .param("section_id", section_id)
                .param("completed", completed)
                .param("now", Utc::now().to_rfc3339()),
            )
            .await?;

        Ok(cursor.next().await?.is_some())
    }

    async fn append_version(
        &self,
        roadmap_id: &str,
        markdown: &str,
        sections: Vec<Section>,
        prompt: Option<String>,
    ) -> Result<Option<Roadmap>> {
        if self.get_roadmap(roadmap_id).await?.is_none() {
            return Ok(None);
        }

        let version = Version {
            content: markdown.to_string(),
            timestamp: Utc::now(),
            prompt,
        };

        let tx = self.graph.start_txn().await?;
        tx.run(
            query("MATCH (r:Roadmap {id: $id}) SET r.markdown = $markdown, r.last_updated = $now")
                .param("id", roadmap_id)
                .param("markdown", markdown)
                .param("now", version.timestamp.to_rfc3339()),
        )
        .await?;
        tx.run(
            query("MATCH (:Roadmap {id: $id})-[:HAS_SECTION]->(s:Section) DETACH DELETE s")
                .param("id", roadmap_id),
        )
        .await?;
        insert_sections(&tx, roadmap_id, &sections).await?;
        insert_version(&tx, roadmap_id, &version).await?;
        tx.commit().await?;

        info!("Nueva versión añadida al roadmap {roadmap_id}");
        self.get_roadmap(roadmap_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_through_rfc3339() {
        let now = Utc::now();
        assert_eq!(parse_timestamp(&now.to_rfc3339()).unwrap(), now);
    }

    #[test]
    fn invalid_timestamp_is_an_error() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn resources_survive_the_json_property() {
        let resources = vec![
            Resource {
                title: "Arrays".into(),
                url: "https://gfg.org/arrays".into(),
            },
            Resource {
                title: "Trees".into(),
                url: "https://gfg.org/trees".into(),
            },
        ];
        let encoded = encode_resources(&resources).unwrap();
        assert_eq!(decode_resources(&encoded).unwrap(), resources);
        assert_eq!(encode_resources(&[]).unwrap(), "[]");
    }

    #[test]
    fn corrupt_resources_property_is_an_error() {
        assert!(decode_resources("not json").is_err());
        assert!(decode_resources(r#"[{"title":"x"}]"#).is_err());
    }

    #[test]
    fn cypher_counts_map_to_progress() {
        assert_eq!(progress_from_counts(1, 4), Progress::from_counts(1, 4));
        assert_eq!(progress_from_counts(1, 4).percent, 25);
        assert_eq!(progress_from_counts(0, 0).percent, 0);
        assert_eq!(progress_from_counts(-3, 2), Progress::from_counts(0, 2));
        assert_eq!(progress_from_counts(5, 2).completed, 2);
    }
}
