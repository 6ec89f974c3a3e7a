// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO DO RUNTIME, BUSCA E VERIFICAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Configurações para o runtime Tokio, o provedor de busca e a engine de
// verificação. Todas as configurações podem ser definidas via .env
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::str::FromStr;
use std::time::Duration;

use crate::scoring::ScorePolicy;
use crate::verification::EngineConfig;

/// Endpoint padrão do Serper
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://google.serper.dev/search";

/// Configuração do runtime Tokio.
///
/// Controla número de threads e comportamento do async runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Número de worker threads do Tokio.
    /// Se None, usa cálculo dinâmico: min(cpu_cores, max_threads).
    pub worker_threads: Option<usize>,

    /// Número máximo de threads (limite superior para cálculo dinâmico).
    /// Padrão: 16
    pub max_threads: usize,

    /// Número máximo de blocking threads.
    /// Padrão: 512 (padrão do Tokio)
    pub max_blocking_threads: usize,

    /// Nome das threads do runtime.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None, // Dinâmico
            max_threads: 16,
            max_blocking_threads: 512,
            thread_name: "plagiarism-check".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Calcula número efetivo de worker threads.
    ///
    /// Se `worker_threads` está definido, usa esse valor.
    /// Senão, calcula: min(cpu_cores, max_threads)
    pub fn effective_worker_threads(&self) -> usize {
        if let Some(threads) = self.worker_threads {
            threads
        } else {
            let cpu_cores = num_cpus::get();
            std::cmp::min(cpu_cores, self.max_threads)
        }
    }
}

/// Configuração do provedor de busca
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Endpoint HTTP do provedor
    pub endpoint: String,
    /// Número de resultados pedidos por query (padrão: 10)
    pub results_num: usize,
    /// Timeout de cada requisição HTTP em segundos (padrão: 30)
    pub http_timeout_secs: u64,
    /// TTL do cache de resultados. None = sem cache
    pub cache_ttl_secs: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            results_num: 10,
            http_timeout_secs: 30,
            cache_ttl_secs: None,
        }
    }
}

/// Configuração completa de uma verificação
#[derive(Debug, Clone, Default)]
pub struct CheckConfig {
    pub search: SearchConfig,
    pub engine: EngineConfig,
    pub score_policy: ScorePolicy,
}

/// Lê uma variável numérica positiva; valores inválidos são ignorados com warning
fn env_positive<T>(name: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default + std::fmt::Display,
{
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => {
            log::info!("📦 {}={}", name, value);
            Some(value)
        }
        _ => {
            log::warn!("⚠️ Valor inválido para {}: '{}' (ignorado)", name, raw);
            None
        }
    }
}

/// Carrega configuração do runtime a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `TOKIO_THREADS`: Número fixo de threads (opcional)
/// - `TOKIO_MAX_THREADS`: Máximo de threads para cálculo dinâmico (padrão: 16)
/// - `TOKIO_MAX_BLOCKING`: Máximo de blocking threads (padrão: 512)
pub fn load_runtime_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();

    if let Some(threads) = env_positive::<usize>("TOKIO_THREADS") {
        config.worker_threads = Some(threads);
    }
    if let Some(max) = env_positive::<usize>("TOKIO_MAX_THREADS") {
        config.max_threads = max;
    }
    if let Some(blocking) = env_positive::<usize>("TOKIO_MAX_BLOCKING") {
        config.max_blocking_threads = blocking;
    }

    if config.worker_threads.is_none() {
        log::info!(
            "🔧 Tokio: {} threads (dinâmico: min({} cores, {} max))",
            config.effective_worker_threads(),
            num_cpus::get(),
            config.max_threads
        );
    }

    config
}

/// Carrega configuração da verificação a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `SEARCH_ENDPOINT`: Endpoint do provedor (padrão: Serper)
/// - `SEARCH_RESULTS_NUM`: Resultados por query (padrão: 10)
/// - `SEARCH_HTTP_TIMEOUT_SECS`: Timeout HTTP (padrão: 30)
/// - `CHECK_CACHE_TTL_SECS`: Ativa cache de resultados com esse TTL
/// - `CHECK_MAX_CONCURRENCY`: Limite de buscas simultâneas
/// - `CHECK_TIMEOUT_SECS`: Deadline da verificação inteira
/// - `CHECK_SCORE_POLICY`: "count-failures" (padrão) ou "exclude-failures"
///
/// # Exemplo
///
/// ```rust,ignore
/// // .env
/// CHECK_MAX_CONCURRENCY=8
/// CHECK_TIMEOUT_SECS=20
///
/// // código
/// let config = load_check_config();
/// assert_eq!(config.engine.max_concurrency, 8);
/// ```
pub fn load_check_config() -> CheckConfig {
    let mut config = CheckConfig::default();

    if let Ok(endpoint) = std::env::var("SEARCH_ENDPOINT") {
        if !endpoint.trim().is_empty() {
            config.search.endpoint = endpoint.trim().to_string();
        }
    }
    if let Some(num) = env_positive::<usize>("SEARCH_RESULTS_NUM") {
        config.search.results_num = num;
    }
    if let Some(secs) = env_positive::<u64>("SEARCH_HTTP_TIMEOUT_SECS") {
        config.search.http_timeout_secs = secs;
    }
    config.search.cache_ttl_secs = env_positive::<u64>("CHECK_CACHE_TTL_SECS");

    if let Some(max) = env_positive::<usize>("CHECK_MAX_CONCURRENCY") {
        config.engine.max_concurrency = max;
    }
    if let Some(secs) = env_positive::<u64>("CHECK_TIMEOUT_SECS") {
        config.engine.timeout = Some(Duration::from_secs(secs));
    }

    if let Ok(policy) = std::env::var("CHECK_SCORE_POLICY") {
        config.score_policy = ScorePolicy::from_env(&policy);
        log::info!("📦 CHECK_SCORE_POLICY={}", config.score_policy);
    }

    config
}

/// Instala panic hook que loga o panic em vez de imprimir no stderr.
///
/// Panics dentro de uma busca já são capturados pela engine; o hook só
/// garante que fiquem registrados no log com thread e localização.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        log::error!("[PANIC] Thread {} at {}: {}", thread_name, location, message);
    }));
}

/// Cria o runtime Tokio com configuração customizada.
///
/// Deve ser chamada no início do programa, antes de qualquer código async.
pub fn create_tokio_runtime(config: &RuntimeConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let worker_threads = config.effective_worker_threads();

    log::info!(
        "🚀 Criando runtime Tokio: {} workers, {} blocking max",
        worker_threads,
        config.max_blocking_threads
    );

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(config.max_blocking_threads)
        .thread_name(&config.thread_name)
        .enable_all()
        .build()
}
