// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIPOS COMPARTILHADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Modelo de resultado usado pelo segmentador, pela engine de verificação
// e pelo scorer.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Tipo de URL (alias para String)
pub type Url = String;

/// Unidade de texto (sentença ou parágrafo) produzida pela segmentação.
///
/// Imutável e nunca vazia após trim. Internamente usa `Arc<str>` para que
/// a mesma unidade possa ser enviada para várias tasks sem cópia.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextUnit(Arc<str>);

impl TextUnit {
    /// Cria uma unidade a partir de texto já limpo.
    ///
    /// Retorna `None` quando o texto é vazio ou só contém espaços.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(Arc::from(trimmed)))
        }
    }

    /// Texto da unidade
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TextUnit {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resultado da busca de uma unidade no provedor externo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// Existe ao menos um match exato; carrega a URL do primeiro resultado
    Found(Url),
    /// O provedor respondeu sem resultados
    NotFound,
    /// Não foi possível verificar (rede, auth, quota, parsing, cancelamento)
    Failed(String),
}

impl LookupOutcome {
    /// Motivo usado quando o deadline global da verificação expira
    pub const CANCELLED: &'static str = "cancelled";

    /// Outcome para unidades que não completaram antes do deadline
    pub fn cancelled() -> Self {
        Self::Failed(Self::CANCELLED.to_string())
    }

    /// Retorna true se a unidade foi encontrada online
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Retorna true se a busca falhou
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// URL de evidência, se houver
    pub fn evidence_url(&self) -> Option<&str> {
        match self {
            Self::Found(url) => Some(url),
            _ => None,
        }
    }
}

/// Par (unidade, outcome) de uma verificação
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitResult {
    /// Unidade verificada
    pub unit: TextUnit,
    /// Resultado da busca
    pub outcome: LookupOutcome,
    /// Tempo gasto na busca desta unidade (0 quando cancelada)
    pub elapsed_ms: u64,
}

/// Resultado completo de uma execução de `verify`.
///
/// Sempre tem exatamente uma entrada por unidade de entrada, na mesma
/// ordem da entrada, independente da ordem de conclusão das buscas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationResult {
    entries: Vec<UnitResult>,
}

impl VerificationResult {
    /// Cria resultado a partir de entradas já ordenadas
    pub fn new(entries: Vec<UnitResult>) -> Self {
        Self { entries }
    }

    /// Resultado vazio (entrada sem unidades)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Número de unidades
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Retorna true se não há unidades
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entradas na ordem da entrada
    pub fn entries(&self) -> &[UnitResult] {
        &self.entries
    }

    /// Itera sobre as entradas
    pub fn iter(&self) -> std::slice::Iter<'_, UnitResult> {
        self.entries.iter()
    }

    /// Outcomes na ordem da entrada
    pub fn outcomes(&self) -> impl Iterator<Item = &LookupOutcome> {
        self.entries.iter().map(|e| &e.outcome)
    }

    /// Quantidade de unidades com outcome `Found`
    pub fn found_count(&self) -> usize {
        self.outcomes().filter(|o| o.is_found()).count()
    }

    /// Quantidade de unidades com outcome `Failed`
    pub fn failed_count(&self) -> usize {
        self.outcomes().filter(|o| o.is_failed()).count()
    }
}

impl<'a> IntoIterator for &'a VerificationResult {
    type Item = &'a UnitResult;
    type IntoIter = std::slice::Iter<'a, UnitResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for VerificationResult {
    type Item = UnitResult;
    type IntoIter = std::vec::IntoIter<UnitResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Percentual de unidades encontradas online, sempre em [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlagiarismScore(f64);

impl PlagiarismScore {
    /// Score zero
    pub const ZERO: Self = Self(0.0);

    /// Calcula `part / total * 100`, com 0 quando `total == 0`
    pub fn from_ratio(part: usize, total: usize) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let pct = part.min(total) as f64 / total as f64 * 100.0;
        Self(pct)
    }

    /// Valor percentual
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for PlagiarismScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}
