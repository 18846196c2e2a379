//! Abstracción sobre Rig para trabajar con distintos proveedores de LLM.
//!
//! El resto de la aplicación sólo ve [`TextGenerator`]: un prompt entra y un
//! texto sale. Cada llamada es un único viaje de ida y vuelta, sin timeout,
//! reintentos ni cancelación.

use anyhow::Result;
use async_trait::async_trait;
use rig::client::CompletionClient as _;
use rig::completion::Prompt;
use rig::providers::{gemini, openai};
use tracing::{debug, info};

use crate::config::{AppConfig, LlmProvider};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Envía `prompt` al modelo y devuelve su respuesta en texto plano.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone)]
enum ProviderClient {
    OpenAI(openai::Client),
    Gemini(gemini::Client),
}

/// Gestor del modelo de chat.
///
/// El cliente se construye una sola vez al arrancar con la clave explícita
/// de la configuración.
#[derive(Clone)]
pub struct LlmManager {
    client: ProviderClient,
    pub chat_model: String,
    pub temperature: f64,
}

impl LlmManager {
    /// Construye el manager a partir de la configuración.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let client = match cfg.llm_provider {
            LlmProvider::OpenAI => ProviderClient::OpenAI(openai::Client::new(&cfg.llm_api_key)),
            LlmProvider::Gemini => ProviderClient::Gemini(gemini::Client::new(&cfg.llm_api_key)),
        };

        info!(
            "LLM configurado: {:?} con el modelo '{}' (temperatura {})",
            cfg.llm_provider, cfg.llm_chat_model, cfg.llm_temperature
        );

        Ok(Self {
            client,
            chat_model: cfg.llm_chat_model.clone(),
            temperature: cfg.llm_temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for LlmManager {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Prompt enviado al modelo '{}':\n{}", self.chat_model, prompt);

        let answer = match &self.client {
            ProviderClient::OpenAI(client) => {
                let agent = client
                    .agent(&self.chat_model)
                    .temperature(self.temperature)
                    .build();
                agent.prompt(prompt).await?
            }
            ProviderClient::Gemini(client) => {
                let agent = client
                    .agent(&self.chat_model)
                    .temperature(self.temperature)
                    .build();
                agent.prompt(prompt).await?
            }
        };

        debug!("Respuesta del modelo ({} caracteres):\n{}", answer.len(), answer);
        Ok(answer)
    }
}

#[cfg(test)]
pub mod testing {
    //! Generador con respuestas guionizadas para los tests.

    use super::*;
    use anyhow::anyhow;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                replies: Mutex::new(VecDeque::from([Err(message.to_string())])),
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// Prompts recibidos, en orden.
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(message)) => Err(anyhow!(message)),
                None => Err(anyhow!("no quedan respuestas guionizadas")),
            }
        }
    }
}
