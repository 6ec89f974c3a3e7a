// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SCORER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Reduz um VerificationResult a um percentual de unidades encontradas.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{LookupOutcome, PlagiarismScore, VerificationResult};

/// Como unidades com busca falha entram no denominador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScorePolicy {
    /// Falhas contam como "não plagiado" e entram no total
    #[default]
    #[serde(rename = "count-failures")]
    CountFailuresAsClean,
    /// Falhas saem do total; só unidades realmente verificadas contam
    #[serde(rename = "exclude-failures")]
    ExcludeFailures,
}

impl ScorePolicy {
    /// Converte string do .env. Qualquer valor desconhecido cai no padrão.
    ///
    /// - "exclude-failures" / "exclude" → ExcludeFailures
    /// - "count-failures" ou qualquer outro valor → CountFailuresAsClean
    pub fn from_env(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "exclude-failures" | "exclude" => Self::ExcludeFailures,
            _ => Self::CountFailuresAsClean,
        }
    }
}

impl fmt::Display for ScorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountFailuresAsClean => write!(f, "count-failures"),
            Self::ExcludeFailures => write!(f, "exclude-failures"),
        }
    }
}

/// Contagem de outcomes de uma verificação
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl ScoreBreakdown {
    /// Total de unidades
    pub fn total(&self) -> usize {
        self.found + self.not_found + self.failed
    }

    /// Unidades que o provedor conseguiu verificar
    pub fn checked(&self) -> usize {
        self.found + self.not_found
    }
}

impl From<&VerificationResult> for ScoreBreakdown {
    fn from(result: &VerificationResult) -> Self {
        result
            .outcomes()
            .fold(Self::default(), |mut acc, outcome| {
                match outcome {
                    LookupOutcome::Found(_) => acc.found += 1,
                    LookupOutcome::NotFound => acc.not_found += 1,
                    LookupOutcome::Failed(_) => acc.failed += 1,
                }
                acc
            })
    }
}

/// `found / total * 100`, com falhas contando como não plagiadas. 0 para resultado vazio.
pub fn score(result: &VerificationResult) -> PlagiarismScore {
    score_with(result, ScorePolicy::CountFailuresAsClean)
}

/// Calcula o score usando a política informada
pub fn score_with(result: &VerificationResult, policy: ScorePolicy) -> PlagiarismScore {
    let breakdown = ScoreBreakdown::from(result);
    let denominator = match policy {
        ScorePolicy::CountFailuresAsClean => breakdown.total(),
        ScorePolicy::ExcludeFailures => breakdown.checked(),
    };
    PlagiarismScore::from_ratio(breakdown.found, denominator)
}
