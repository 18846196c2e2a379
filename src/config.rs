//! Carga y gestión de configuración de la aplicación (Neo4j + LLM + sesión).
//!
//! Todo se valida al arrancar: si falta la clave del modelo el proceso no
//! llega a levantar el servidor.

use anyhow::{anyhow, Result};
use std::env;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Gemini,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            other => Err(anyhow!("Proveedor LLM no soportado: {other}")),
        }
    }

    pub fn default_chat_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Gemini => "gemini-2.0-flash",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Neo4j,
    Memory,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "neo4j" => Ok(Self::Neo4j),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("Backend de almacenamiento no soportado: {other}")),
        }
    }
}

/// Credenciales de Neo4j (sólo obligatorias con el backend `neo4j`).
#[derive(Clone, Debug)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub static_dir: String,

    pub store_backend: StoreBackend,
    pub neo4j: Option<Neo4jConfig>,
    /// Emails dados de alta al arrancar con el backend `memory`.
    pub seed_users: Vec<String>,

    pub llm_provider: LlmProvider,
    pub llm_api_key: String,
    pub llm_chat_model: String,
    pub llm_temperature: f64,

    /// Cabecera que la capa de autenticación rellena con el email del usuario.
    pub session_header: String,
    pub refine_requires_auth: bool,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que [`AppConfig::from_env`] pero leyendo de `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| anyhow!("Falta {key} en el entorno"));

        let server_addr = var("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:3322".to_string());
        let static_dir = var("STATIC_DIR").unwrap_or_else(|| "frontend".to_string());

        let store_backend =
            StoreBackend::from_str(&var("STORE_BACKEND").unwrap_or_else(|| "neo4j".to_string()))?;
        let neo4j = match store_backend {
            StoreBackend::Neo4j => Some(Neo4jConfig {
                uri: required("NEO4J_URI")?,
                user: required("NEO4J_USER")?,
                password: required("NEO4J_PASSWORD")?,
            }),
            StoreBackend::Memory => None,
        };
        let seed_users: Vec<String> = var("SEED_USERS")
            .map(|raw| {
                raw.split(',')
                    .map(|email| email.trim().to_string())
                    .filter(|email| !email.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let llm_provider =
            LlmProvider::from_str(&var("LLM_PROVIDER").unwrap_or_else(|| "gemini".to_string()))?;
        let llm_api_key = required("LLM_API_KEY")?;
        let llm_chat_model = var("LLM_CHAT_MODEL")
            .unwrap_or_else(|| llm_provider.default_chat_model().to_string());
        let llm_temperature = match var("LLM_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|e| anyhow!("LLM_TEMPERATURE no es un número válido ('{raw}'): {e}"))?,
            None => 0.7,
        };

        let session_header = var("SESSION_HEADER")
            .unwrap_or_else(|| "x-user-email".to_string())
            .to_lowercase();
        let refine_requires_auth = match var("REFINE_REQUIRES_AUTH") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow!("REFINE_REQUIRES_AUTH debe ser true o false ('{raw}')"))?,
            None => true,
        };

        Ok(Self {
            server_addr,
            static_dir,
            store_backend,
            neo4j,
            seed_users,
            llm_provider,
            llm_api_key,
            llm_chat_model,
            llm_temperature,
            session_header,
            refine_requires_auth,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
