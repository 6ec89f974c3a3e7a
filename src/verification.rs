// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ENGINE DE VERIFICAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Dispara um lookup por unidade em paralelo (tasks Tokio limitadas por
// semáforo) e remonta o resultado na ordem da entrada.
//
// Garantias:
// - Uma entrada por unidade, na ordem da entrada
// - Falha (ou panic) de uma busca não afeta as outras
// - Sem retry: cada unidade é buscada no máximo uma vez
// - Com deadline: unidades pendentes viram Failed("cancelled")
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::search::LookupClient;
use crate::types::{LookupOutcome, TextUnit, UnitResult, VerificationResult};
use crate::utils::ActionTimer;

/// Teto do padrão dinâmico de concorrência
const DEFAULT_CONCURRENCY_CAP: usize = 32;

/// Configuração da engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Máximo de buscas simultâneas (1 = sequencial)
    pub max_concurrency: usize,
    /// Deadline da verificação inteira. None = espera todas as buscas
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: std::cmp::min(num_cpus::get() * 4, DEFAULT_CONCURRENCY_CAP),
            timeout: None,
        }
    }
}

impl EngineConfig {
    /// Uma busca por vez, na ordem da entrada
    pub fn sequential() -> Self {
        Self {
            max_concurrency: 1,
            ..Default::default()
        }
    }

    /// Define o limite de concorrência (mínimo 1)
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Define o deadline da verificação
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Concorrência usada para `units` unidades: min(limite, unidades), no mínimo 1
    pub fn effective_concurrency(&self, units: usize) -> usize {
        self.max_concurrency.min(units).max(1)
    }
}

/// Engine de verificação concorrente.
///
/// # Exemplo
///
/// ```rust,ignore
/// let client = LookupClient::new(Arc::new(SerperClient::new(key)));
/// let engine = VerificationEngine::new(client);
/// let result = engine.verify(&units).await;
/// assert_eq!(result.len(), units.len());
/// ```
#[derive(Debug, Clone)]
pub struct VerificationEngine {
    client: LookupClient,
    config: EngineConfig,
}

impl VerificationEngine {
    pub fn new(client: LookupClient) -> Self {
        Self::with_config(client, EngineConfig::default())
    }

    pub fn with_config(client: LookupClient, config: EngineConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Verifica todas as unidades e retorna o resultado na ordem da entrada.
    ///
    /// Nunca falha: erros de busca viram `Failed` na unidade correspondente.
    pub async fn verify(&self, units: &[TextUnit]) -> VerificationResult {
        self.verify_with_progress(units, |_, _| {}).await
    }

    /// Igual a [`verify`](Self::verify), chamando `on_complete(index, result)`
    /// à medida que cada busca termina (ordem de conclusão, não de entrada).
    pub async fn verify_with_progress<F>(&self, units: &[TextUnit], mut on_complete: F) -> VerificationResult
    where
        F: FnMut(usize, &UnitResult),
    {
        if units.is_empty() {
            log::debug!("Nenhuma unidade para verificar");
            return VerificationResult::empty();
        }

        let concurrency = self.config.effective_concurrency(units.len());
        log::info!(
            "🔎 Verificando {} unidades (concorrência: {})",
            units.len(),
            concurrency
        );
        let timer = ActionTimer::start("Verificação");

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut tasks = JoinSet::new();

        for (index, unit) in units.iter().enumerate() {
            let client = self.client.clone();
            let unit = unit.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, LookupOutcome::cancelled(), 0),
                };

                let timer = ActionTimer::start("lookup");
                let outcome = AssertUnwindSafe(client.lookup(&unit))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        LookupOutcome::Failed(format!("lookup panicked: {}", panic_message(&*payload)))
                    });

                (index, outcome, timer.stop())
            });
        }

        // Um slot por índice; cada task escreve apenas no seu
        let mut slots: Vec<Option<(LookupOutcome, u64)>> = vec![None; units.len()];
        let mut record = |joined: Result<(usize, LookupOutcome, u64), JoinError>| match joined {
            Ok((index, outcome, elapsed_ms)) => {
                if let LookupOutcome::Failed(reason) = &outcome {
                    log::warn!("⚠️ Unidade {} não verificada: {}", index + 1, reason);
                }
                let entry = UnitResult {
                    unit: units[index].clone(),
                    outcome: outcome.clone(),
                    elapsed_ms,
                };
                on_complete(index, &entry);
                slots[index] = Some((outcome, elapsed_ms));
            }
            // Task abortada pelo deadline; o slot fica vazio e vira "cancelled"
            Err(e) if e.is_cancelled() => {}
            Err(e) => log::error!("❌ Task de busca interrompida: {}", e),
        };

        // Deadline fora do intervalo representável equivale a não ter deadline
        let deadline = self
            .config
            .timeout
            .and_then(|t| tokio::time::Instant::now().checked_add(t));

        loop {
            let next = match deadline {
                Some(deadline) => {
                    let joined = tokio::time::timeout_at(deadline, tasks.join_next()).await;
                    match joined {
                        Ok(next) => next,
                        Err(_) => {
                            log::warn!(
                                "⏰ Deadline da verificação atingido; {} buscas pendentes canceladas",
                                tasks.len()
                            );
                            tasks.abort_all();
                            // Tasks que terminaram antes do abort ainda entregam o resultado
                            while let Some(joined) = tasks.join_next().await {
                                record(joined);
                            }
                            break;
                        }
                    }
                }
                None => tasks.join_next().await,
            };

            match next {
                Some(joined) => record(joined),
                None => break,
            }
        }

        let entries: Vec<UnitResult> = units
            .iter()
            .zip(slots)
            .map(|(unit, slot)| {
                let (outcome, elapsed_ms) = slot.unwrap_or_else(|| (LookupOutcome::cancelled(), 0));
                UnitResult {
                    unit: unit.clone(),
                    outcome,
                    elapsed_ms,
                }
            })
            .collect();

        let result = VerificationResult::new(entries);
        log::info!(
            "✅ Verificação concluída em {}ms: {} encontradas, {} falhas, {} total",
            timer.stop(),
            result.found_count(),
            result.failed_count(),
            result.len()
        );

        result
    }
}

/// Extrai a mensagem de um payload de panic
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ScriptedSearchProvider, SearchError, SearchHit, SearchProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn units(texts: &[&str]) -> Vec<TextUnit> {
        texts.iter().map(|t| TextUnit::new(t).unwrap()).collect()
    }

    fn engine(provider: ScriptedSearchProvider, config: EngineConfig) -> VerificationEngine {
        VerificationEngine::with_config(LookupClient::new(Arc::new(provider)), config)
    }

    /// Provedor que mede quantas buscas rodam ao mesmo tempo
    #[derive(Default)]
    struct InFlightProvider {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SearchProvider for InFlightProvider {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, SearchError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    #[test]
    fn test_effective_concurrency() {
        let config = EngineConfig::default().with_max_concurrency(8);
        assert_eq!(config.effective_concurrency(3), 3);
        assert_eq!(config.effective_concurrency(100), 8);
        assert_eq!(config.effective_concurrency(0), 1);
        assert_eq!(EngineConfig::default().with_max_concurrency(0).max_concurrency, 1);
        assert_eq!(EngineConfig::sequential().effective_concurrency(10), 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let provider = Arc::new(ScriptedSearchProvider::new());
        let engine = VerificationEngine::new(LookupClient::new(provider.clone()));

        let result = engine.verify(&[]).await;
        assert!(result.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_order_preserved_under_jitter() {
        let texts: Vec<String> = (0..40).map(|i| format!("sentence number {}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let input = units(&refs);

        let mut provider = ScriptedSearchProvider::new().with_jitter(30);
        for (i, text) in texts.iter().enumerate() {
            if i % 3 == 0 {
                provider = provider.with_hit(text, &format!("https://example.com/{}", i));
            }
        }

        let result = engine(provider, EngineConfig::default().with_max_concurrency(16))
            .verify(&input)
            .await;

        assert_eq!(result.len(), input.len());
        for (i, entry) in result.iter().enumerate() {
            assert_eq!(entry.unit, input[i]);
            if i % 3 == 0 {
                assert_eq!(entry.outcome, LookupOutcome::Found(format!("https://example.com/{}", i)));
            } else {
                assert_eq!(entry.outcome, LookupOutcome::NotFound);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_is_isolated() {
        let input = units(&["one", "two", "three", "four", "five"]);
        let provider = ScriptedSearchProvider::new()
            .with_hit("one", "https://one.com")
            .with_hit("four", "https://four.com")
            .failing_on("three");

        let result = engine(provider, EngineConfig::default()).verify(&input).await;

        let outcomes: Vec<_> = result.outcomes().cloned().collect();
        assert_eq!(outcomes[0], LookupOutcome::Found("https://one.com".into()));
        assert_eq!(outcomes[1], LookupOutcome::NotFound);
        assert!(outcomes[2].is_failed());
        assert_eq!(outcomes[3], LookupOutcome::Found("https://four.com".into()));
        assert_eq!(outcomes[4], LookupOutcome::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panic_is_isolated() {
        let input = units(&["fine", "explodes", "also fine"]);
        let provider = ScriptedSearchProvider::new()
            .with_hit("also fine", "https://ok.com")
            .panicking_on("explodes");

        let result = engine(provider, EngineConfig::default()).verify(&input).await;

        assert_eq!(result.len(), 3);
        assert_eq!(result.entries()[0].outcome, LookupOutcome::NotFound);
        match &result.entries()[1].outcome {
            LookupOutcome::Failed(reason) => assert!(reason.contains("panicked")),
            other => panic!("esperado Failed, veio {:?}", other),
        }
        assert_eq!(result.entries()[2].outcome, LookupOutcome::Found("https://ok.com".into()));
    }

    #[tokio::test]
    async fn test_timeout_marks_pending_as_cancelled() {
        let input = units(&["quick", "stuck", "quick too"]);
        let provider = ScriptedSearchProvider::new()
            .with_hit("quick", "https://quick.com")
            .slow_on("stuck", Duration::from_secs(30));

        let config = EngineConfig::default().with_timeout(Duration::from_millis(300));
        let result = engine(provider, config).verify(&input).await;

        assert_eq!(result.len(), 3);
        assert_eq!(result.entries()[0].outcome, LookupOutcome::Found("https://quick.com".into()));
        assert_eq!(result.entries()[1].outcome, LookupOutcome::cancelled());
        assert_eq!(result.entries()[2].outcome, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_means_no_deadline() {
        let input = units(&["a", "b"]);
        for timeout in [Duration::from_secs(u64::MAX), Duration::MAX] {
            let provider = ScriptedSearchProvider::new()
                .with_hit("a", "https://a.com")
                .with_latency(Duration::from_millis(5));

            let result = engine(provider, EngineConfig::default().with_timeout(timeout))
                .verify(&input)
                .await;

            assert_eq!(result.len(), 2);
            assert_eq!(result.entries()[0].outcome, LookupOutcome::Found("https://a.com".into()));
            assert_eq!(result.entries()[1].outcome, LookupOutcome::NotFound);
        }
    }

    /// Provedor que bloqueia a thread antes de responder, para que as buscas
    /// terminem depois do deadline mas antes do próximo poll da engine
    struct BlockingProvider {
        block: Duration,
        stuck: &'static str,
    }

    #[async_trait]
    impl SearchProvider for BlockingProvider {
        async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
            if query.trim_matches('"') == self.stuck {
                tokio::time::sleep(Duration::from_secs(30)).await;
                return Ok(vec![]);
            }
            std::thread::sleep(self.block);
            Ok(vec![SearchHit::new("https://done.com")])
        }
    }

    #[tokio::test]
    async fn test_lookups_finished_at_deadline_are_kept() {
        let input = units(&["first", "second", "stuck", "third"]);
        let provider = BlockingProvider {
            block: Duration::from_millis(40),
            stuck: "stuck",
        };
        let config = EngineConfig::default()
            .with_max_concurrency(4)
            .with_timeout(Duration::from_millis(60));

        let result = VerificationEngine::with_config(LookupClient::new(Arc::new(provider)), config)
            .verify(&input)
            .await;

        let done = LookupOutcome::Found("https://done.com".into());
        assert_eq!(result.len(), 4);
        assert_eq!(result.entries()[0].outcome, done);
        assert_eq!(result.entries()[1].outcome, done);
        assert_eq!(result.entries()[2].outcome, LookupOutcome::cancelled());
        assert_eq!(result.entries()[3].outcome, done);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_bound_respected() {
        let provider = Arc::new(InFlightProvider::default());
        let engine = VerificationEngine::with_config(
            LookupClient::new(provider.clone()),
            EngineConfig::default().with_max_concurrency(3),
        );
        let texts: Vec<String> = (0..12).map(|i| format!("unit {}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let result = engine.verify(&units(&refs)).await;

        assert_eq!(result.len(), 12);
        assert!(provider.peak.load(Ordering::SeqCst) <= 3);
        assert!(provider.peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_each_unit_looked_up_once() {
        let provider = Arc::new(ScriptedSearchProvider::new().failing_on("b"));
        let engine = VerificationEngine::new(LookupClient::new(provider.clone()));

        let result = engine.verify(&units(&["a", "b", "c", "d"])).await;

        assert_eq!(result.len(), 4);
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn test_progress_callback_sees_every_unit() {
        let input = units(&["x", "y", "z"]);
        let provider = ScriptedSearchProvider::new().with_hit("y", "https://y.com");
        let mut seen = Vec::new();

        let result = engine(provider, EngineConfig::sequential())
            .verify_with_progress(&input, |index, entry| seen.push((index, entry.outcome.is_found())))
            .await;

        seen.sort_by_key(|(index, _)| *index);
        assert_eq!(seen, vec![(0, false), (1, true), (2, false)]);
        assert_eq!(result.found_count(), 1);
    }
}
