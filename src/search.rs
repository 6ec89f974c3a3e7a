// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DE BUSCA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait do provedor de busca externo e o LookupClient, que transforma a
// resposta do provedor em um LookupOutcome por unidade.
// Implementações: Serper (Google), Mock para testes, Cache (search_cache).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::types::{LookupOutcome, TextUnit, Url};

/// Erros do provedor de busca
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("Search API error: {0}")]
    ApiError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Rate limit exceeded")]
    RateLimitError,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response format: {0}")]
    ParseError(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),
}

/// Um resultado retornado pelo provedor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// URL do resultado
    #[serde(alias = "link")]
    pub url: Url,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            snippet: String::new(),
        }
    }
}

/// Provedor externo de busca por frase exata.
///
/// A engine só usa duas informações da resposta: se a lista é vazia e a
/// URL do primeiro resultado. Qualquer backend com esse contrato serve.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Executa uma busca e retorna os resultados na ordem do provedor
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

/// Envolve a unidade em aspas para busca de frase exata
pub fn exact_phrase_query(unit: &str) -> String {
    format!("\"{}\"", unit.replace('"', ""))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LOOKUP CLIENT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente de lookup: uma unidade → um [`LookupOutcome`].
///
/// Não faz retry. Erros do provedor viram `Failed(reason)`.
/// É `Clone` e compartilha o provedor via `Arc`, então pode ser usado
/// por várias tasks ao mesmo tempo.
#[derive(Clone)]
pub struct LookupClient {
    provider: Arc<dyn SearchProvider>,
}

impl LookupClient {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Busca a unidade como frase exata
    pub async fn lookup(&self, unit: &TextUnit) -> LookupOutcome {
        let query = exact_phrase_query(unit.as_str());

        match self.provider.search(&query).await {
            Ok(hits) => match hits.into_iter().next() {
                Some(first) => LookupOutcome::Found(first.url),
                None => LookupOutcome::NotFound,
            },
            Err(e) => {
                log::warn!("⚠️ Busca falhou para {}: {}", query, e);
                LookupOutcome::Failed(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for LookupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupClient").finish_non_exhaustive()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO SERPER (GOOGLE)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

/// Cliente para a API do Serper (resultados do Google)
pub struct SerperClient {
    api_key: String,
    endpoint: String,
    results_num: usize,
    client: reqwest::Client,
}

impl SerperClient {
    pub fn new(api_key: String) -> Self {
        Self::from_config(api_key, &SearchConfig::default())
    }

    /// Cria o cliente usando endpoint, timeout e número de resultados da config
    pub fn from_config(api_key: String, config: &SearchConfig) -> Self {
        Self {
            api_key,
            endpoint: config.endpoint.clone(),
            results_num: config.results_num,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.http_timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Cria o cliente lendo `SERPER_API_KEY` do ambiente
    pub fn from_env(config: &SearchConfig) -> Result<Self, SearchError> {
        let key = std::env::var("SERPER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SearchError::MissingApiKey("SERPER_API_KEY".into()))?;
        Ok(Self::from_config(key, config))
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest {
                q: query,
                num: self.results_num,
            })
            .send()
            .await
            .map_err(|e| SearchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: SerperResponse = response
                .json()
                .await
                .map_err(|e| SearchError::ParseError(e.to_string()))?;
            log::debug!("🔍 Serper: {} resultados para {}", body.organic.len(), query);
            Ok(body.organic)
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            Err(SearchError::AuthError(format!("HTTP {}", status)))
        } else if status.as_u16() == 429 {
            Err(SearchError::RateLimitError)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(SearchError::ApiError(format!("({}): {}", status, error_text)))
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Provedor mock configurável.
///
/// - Frases registradas com [`with_hit`](Self::with_hit) retornam um resultado
/// - Frases em [`failing_on`](Self::failing_on) retornam erro
/// - Frases em [`panicking_on`](Self::panicking_on) entram em panic
/// - Latência fixa, jitter aleatório e atrasos por frase simulam um provedor real
///
/// As frases são comparadas sem as aspas da busca exata.
#[derive(Debug, Default)]
pub struct ScriptedSearchProvider {
    hits: HashMap<String, Url>,
    failures: HashSet<String>,
    panics: HashSet<String>,
    slow: HashMap<String, Duration>,
    latency: Duration,
    jitter_ms: u64,
    calls: AtomicUsize,
}

impl ScriptedSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra um match para a frase
    pub fn with_hit(mut self, phrase: &str, url: &str) -> Self {
        self.hits.insert(phrase.to_string(), url.to_string());
        self
    }

    /// Faz a busca da frase falhar
    pub fn failing_on(mut self, phrase: &str) -> Self {
        self.failures.insert(phrase.to_string());
        self
    }

    /// Faz a busca da frase entrar em panic
    pub fn panicking_on(mut self, phrase: &str) -> Self {
        self.panics.insert(phrase.to_string());
        self
    }

    /// Atraso extra apenas para a frase
    pub fn slow_on(mut self, phrase: &str, delay: Duration) -> Self {
        self.slow.insert(phrase.to_string(), delay);
        self
    }

    /// Latência fixa por chamada
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Atraso aleatório adicional em [0, max_ms]
    pub fn with_jitter(mut self, max_ms: u64) -> Self {
        self.jitter_ms = max_ms;
        self
    }

    /// Número de chamadas recebidas
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let phrase = query.trim_matches('"');

        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        let extra = self.slow.get(phrase).copied().unwrap_or_default();
        let delay = self.latency + extra + Duration::from_millis(jitter);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.panics.contains(phrase) {
            panic!("mock provider panicked on '{}'", phrase);
        }
        if self.failures.contains(phrase) {
            return Err(SearchError::ApiError(format!("mock failure for '{}'", phrase)));
        }

        Ok(self
            .hits
            .get(phrase)
            .map(|url| vec![SearchHit::new(url.clone())])
            .unwrap_or_default())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UTILITÁRIOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Extrai hostname de uma URL
pub fn extract_hostname(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
}
