// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PLAGIARISM CHECKER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Pipeline completo: texto → segmentação → verificação → score.
// A granularidade é validada antes de qualquer busca ser disparada.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::CheckConfig;
use crate::scoring::{score_with, ScoreBreakdown, ScorePolicy};
use crate::search::{LookupClient, SearchProvider};
use crate::search_cache::{CacheConfig, CachedSearchProvider};
use crate::types::{LookupOutcome, PlagiarismScore, UnitResult, VerificationResult};
use crate::utils::segment::{segment, Granularity, SegmentError};
use crate::utils::{ActionTimer, TimingStats};
use crate::verification::{EngineConfig, VerificationEngine};

/// Erros do pipeline. Sempre acontecem antes de qualquer busca.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Segment(#[from] SegmentError),
}

/// Relatório de uma execução
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlagiarismReport {
    /// ID único desta execução
    pub run_id: Uuid,
    pub granularity: Granularity,
    pub policy: ScorePolicy,
    pub score: PlagiarismScore,
    pub breakdown: ScoreBreakdown,
    /// Resultado por unidade, na ordem do texto
    pub results: VerificationResult,
    /// Tempo total da execução
    pub elapsed_ms: u64,
}

impl PlagiarismReport {
    /// Estatísticas de tempo das buscas concluídas
    pub fn timing(&self) -> TimingStats {
        TimingStats::from_times(
            self.results
                .iter()
                .filter(|r| !matches!(&r.outcome, LookupOutcome::Failed(reason) if reason == LookupOutcome::CANCELLED))
                .map(|r| r.elapsed_ms),
        )
    }
}

/// Orquestra segmentação, verificação e score
#[derive(Debug, Clone)]
pub struct PlagiarismChecker {
    engine: VerificationEngine,
    policy: ScorePolicy,
}

impl PlagiarismChecker {
    /// Cria checker com configuração padrão da engine
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self::with_engine_config(provider, EngineConfig::default())
    }

    pub fn with_engine_config(provider: Arc<dyn SearchProvider>, config: EngineConfig) -> Self {
        Self {
            engine: VerificationEngine::with_config(LookupClient::new(provider), config),
            policy: ScorePolicy::default(),
        }
    }

    /// Monta o checker a partir da configuração carregada do ambiente.
    /// Envolve o provedor em cache quando `cache_ttl_secs` está definido.
    pub fn from_config(provider: Arc<dyn SearchProvider>, config: &CheckConfig) -> Self {
        let provider: Arc<dyn SearchProvider> = match config.search.cache_ttl_secs {
            Some(ttl) => {
                log::info!("💾 Cache de busca ativo (TTL {}s)", ttl);
                Arc::new(CachedSearchProvider::new(provider, CacheConfig::with_ttl(ttl)))
            }
            None => provider,
        };

        Self::with_engine_config(provider, config.engine.clone()).with_policy(config.score_policy)
    }

    pub fn with_policy(mut self, policy: ScorePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn engine(&self) -> &VerificationEngine {
        &self.engine
    }

    /// Verifica o texto com a granularidade informada por nome
    /// ("sentence" ou "paragraph").
    pub async fn check(&self, text: &str, granularity: &str) -> Result<PlagiarismReport, CheckError> {
        let granularity = granularity.parse::<Granularity>()?;
        Ok(self.check_with(text, granularity, |_, _| {}).await)
    }

    /// Verifica o texto chamando `on_unit` a cada busca concluída
    pub async fn check_with<F>(&self, text: &str, granularity: Granularity, on_unit: F) -> PlagiarismReport
    where
        F: FnMut(usize, &UnitResult),
    {
        let timer = ActionTimer::start("Checagem de plágio");
        let units = segment(text, granularity);
        log::info!("✂️ {} unidades ({})", units.len(), granularity);

        let results = self.engine.verify_with_progress(&units, on_unit).await;
        let score = score_with(&results, self.policy);
        let breakdown = ScoreBreakdown::from(&results);

        PlagiarismReport {
            run_id: Uuid::new_v4(),
            granularity,
            policy: self.policy,
            score,
            breakdown,
            results,
            elapsed_ms: timer.stop_and_log(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ScriptedSearchProvider;

    #[tokio::test]
    async fn test_check_sentence_pipeline() {
        let provider = Arc::new(ScriptedSearchProvider::new().with_hit("AI is cool", "https://ai.com"));
        let checker = PlagiarismChecker::new(provider);

        let report = checker.check("AI is cool. It's 110 real.", "sentence").await.unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.score.value(), 50.0);
        assert_eq!(report.breakdown, ScoreBreakdown { found: 1, not_found: 1, failed: 0 });
        assert_eq!(report.granularity, Granularity::Sentence);
    }

    #[tokio::test]
    async fn test_invalid_granularity_dispatches_nothing() {
        let provider = Arc::new(ScriptedSearchProvider::new());
        let checker = PlagiarismChecker::new(provider.clone());

        let err = checker.check("Some text. More text.", "word").await.unwrap_err();

        assert!(matches!(err, CheckError::Segment(SegmentError::InvalidGranularity(ref g)) if g == "word"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_scores_zero() {
        let provider = Arc::new(ScriptedSearchProvider::new());
        let checker = PlagiarismChecker::new(provider.clone());

        let report = checker.check("   \n  ", "paragraph").await.unwrap();

        assert!(report.results.is_empty());
        assert_eq!(report.score, PlagiarismScore::ZERO);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_from_config_applies_policy_and_cache() {
        let provider = Arc::new(
            ScriptedSearchProvider::new()
                .with_hit("repeated line", "https://r.com")
                .failing_on("broken line"),
        );
        let mut config = CheckConfig::default();
        config.search.cache_ttl_secs = Some(60);
        config.engine = EngineConfig::sequential();
        config.score_policy = ScorePolicy::ExcludeFailures;

        let checker = PlagiarismChecker::from_config(provider.clone(), &config);
        let report = checker
            .check("repeated line\nrepeated line\nbroken line\nclean line", "paragraph")
            .await
            .unwrap();

        // 2 encontradas de 3 verificadas
        assert!((report.score.value() - 66.666).abs() < 0.01);
        assert!(report.results.entries()[2].outcome.is_failed());
        // A linha repetida só vai ao provedor uma vez
        assert_eq!(provider.calls(), 3);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let provider = Arc::new(ScriptedSearchProvider::new().with_hit("hello", "https://h.com"));
        let checker = PlagiarismChecker::new(provider);

        let report = tokio_test::block_on(checker.check_with("hello\nworld", Granularity::Paragraph, |_, _| {}));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["granularity"], "paragraph");
        assert_eq!(json["policy"], "count-failures");
        assert_eq!(json["results"][0]["unit"], "hello");
        assert_eq!(json["results"][0]["outcome"]["kind"], "found");
        assert_eq!(json["results"][1]["outcome"]["kind"], "not_found");
        assert_eq!(report.results.entries()[1].outcome, LookupOutcome::NotFound);
    }
}
