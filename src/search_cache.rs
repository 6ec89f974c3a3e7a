// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CACHE DE BUSCA (SEARCH CACHE)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Decorator de SearchProvider com cache TTL. Evita repetir a mesma frase
// no provedor (textos com sentenças repetidas, reexecuções próximas).
// Só respostas de sucesso são guardadas: erro nunca vira cache.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::search::{SearchError, SearchHit, SearchProvider};

/// Configuração do cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL das entradas (em segundos)
    pub ttl_secs: u64,
    /// Tamanho máximo do cache (número de entradas)
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300, // 5 minutos
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    /// Configuração com TTL customizado e limite padrão
    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            ..Default::default()
        }
    }
}

/// Normaliza a query para uso como chave (case e espaços)
pub fn cache_key(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Entrada do cache
#[derive(Debug, Clone)]
struct CacheEntry {
    hits: Vec<SearchHit>,
    /// None = TTL fora do intervalo representável; a entrada não expira
    expires_at: Option<DateTime<Utc>>,
    last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    fn new(hits: Vec<SearchHit>, ttl_secs: u64) -> Self {
        let now = Utc::now();
        let expires_at = i64::try_from(ttl_secs)
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl));

        Self {
            hits,
            expires_at,
            last_accessed: now,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }
}

/// Estatísticas do cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
    /// Taxa de hit (0.0 - 1.0)
    pub hit_rate: f64,
}

/// Provedor com cache TTL na frente de outro provedor.
///
/// # Exemplo
///
/// ```rust,ignore
/// let inner: Arc<dyn SearchProvider> = Arc::new(SerperClient::new(key));
/// let cached = CachedSearchProvider::new(inner, CacheConfig::with_ttl(600));
/// let client = LookupClient::new(Arc::new(cached));
/// ```
pub struct CachedSearchProvider {
    inner: Arc<dyn SearchProvider>,
    store: RwLock<HashMap<String, CacheEntry>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CachedSearchProvider {
    pub fn new(inner: Arc<dyn SearchProvider>, config: CacheConfig) -> Self {
        Self {
            inner,
            store: RwLock::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    // O mapa continua consistente mesmo se outra thread entrou em panic
    // com o lock, então um lock envenenado é reaproveitado.
    fn get(&self, key: &str) -> Option<Vec<SearchHit>> {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = store.get_mut(key) {
            if !entry.is_expired() {
                entry.last_accessed = Utc::now();
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.hits.clone());
            }
            // Expirado, remover
            store.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn set(&self, key: String, hits: Vec<SearchHit>) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        if store.len() >= self.config.max_entries && !store.contains_key(&key) {
            self.evict_oldest(&mut store);
        }
        store.insert(key, CacheEntry::new(hits, self.config.ttl_secs));
    }

    /// Remove a entrada acessada há mais tempo
    fn evict_oldest(&self, store: &mut HashMap<String, CacheEntry>) {
        if let Some(oldest_key) = store
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone())
        {
            store.remove(&oldest_key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Retorna número de entradas
    pub fn len(&self) -> usize {
        self.store.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Verifica se está vazio
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retorna estatísticas do cache
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            entries: self.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

#[async_trait]
impl SearchProvider for CachedSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let key = cache_key(query);
        if let Some(hits) = self.get(&key) {
            log::debug!("💾 Cache hit: {}", key);
            return Ok(hits);
        }

        let hits = self.inner.search(query).await?;
        self.set(key, hits.clone());
        Ok(hits)
    }
}
