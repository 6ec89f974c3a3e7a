//! # Plagiarism Check
//!
//! Estima quanto de um texto já existe online. O texto é dividido em
//! unidades (sentenças ou parágrafos), cada unidade é buscada literalmente
//! em um provedor de busca e o score é o percentual de unidades que
//! retornaram pelo menos um resultado.
//!
//! ## Fluxo
//!
//! ```text
//! texto → segment → [TextUnit] → VerificationEngine (N buscas em paralelo)
//!       → VerificationResult (ordem da entrada) → score → PlagiarismScore
//! ```
//!
//! ## Componentes
//!
//! ### 1. Segmentação (`utils::segment`)
//! - **Sentence**: split em `.` `?` `!` que não estejam colados a dígitos
//! - **Paragraph**: split por quebra de linha
//!
//! ### 2. Lookup (`search`)
//! Trait `SearchProvider` para o provedor externo (Serper, mock, cache) e o
//! `LookupClient`, que transforma a resposta em `Found`, `NotFound` ou `Failed`.
//!
//! ### 3. Engine de verificação (`verification`)
//! Tasks Tokio limitadas por semáforo, um slot por unidade, deadline opcional.
//! Falhas de uma unidade nunca abortam as outras.
//!
//! ### 4. Score (`scoring`)
//! `found / total * 100`, 0 para entrada vazia.
//!
//! ## Exemplo de Uso
//!
//! ```rust,ignore
//! use plagiarism_check::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = Arc::new(SerperClient::new(api_key));
//!     let checker = PlagiarismChecker::new(provider);
//!     let report = checker.check("AI is cool. It's 110 real.", "sentence").await.unwrap();
//!     println!("{}", report.score);
//! }
//! ```

#![warn(rust_2018_idioms)]

/// Tipos fundamentais: [`TextUnit`], [`LookupOutcome`], [`VerificationResult`],
/// [`PlagiarismScore`].
pub mod types;

/// Provedor de busca externo e cliente de lookup.
///
/// - [`search::SearchProvider`]: contrato do provedor
/// - [`search::SerperClient`]: Google via Serper
/// - [`search::ScriptedSearchProvider`]: provedor configurável para testes
/// - [`search::LookupClient`]: uma unidade → um outcome
pub mod search;

/// Cache TTL na frente de qualquer provedor.
pub mod search_cache;

/// Engine de verificação concorrente.
pub mod verification;

/// Cálculo do score.
pub mod scoring;

/// Pipeline texto → score.
pub mod checker;

/// Formatação do relatório para a CLI.
pub mod report;

/// Utilitários: segmentação e timing.
pub mod utils;

/// Configuração via variáveis de ambiente.
///
/// **Runtime Tokio:**
/// - `TOKIO_THREADS`, `TOKIO_MAX_THREADS`, `TOKIO_MAX_BLOCKING`
///
/// **Busca:**
/// - `SERPER_API_KEY`: chave do Serper
/// - `SEARCH_ENDPOINT`, `SEARCH_RESULTS_NUM`, `SEARCH_HTTP_TIMEOUT_SECS`
///
/// **Verificação:**
/// - `CHECK_MAX_CONCURRENCY`: buscas simultâneas
/// - `CHECK_TIMEOUT_SECS`: deadline da execução
/// - `CHECK_CACHE_TTL_SECS`: ativa cache
/// - `CHECK_SCORE_POLICY`: "count-failures" ou "exclude-failures"
pub mod config;

// Re-exports principais
pub use checker::{CheckError, PlagiarismChecker, PlagiarismReport};
pub use config::{
    create_tokio_runtime, install_panic_hook, load_check_config, load_runtime_config, CheckConfig,
    RuntimeConfig, SearchConfig,
};
pub use scoring::{score, score_with, ScoreBreakdown, ScorePolicy};
pub use types::*;
pub use verification::{EngineConfig, VerificationEngine};

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude com imports comuns.
pub mod prelude {
    pub use crate::checker::{CheckError, PlagiarismChecker, PlagiarismReport};
    pub use crate::scoring::{score, score_with, ScorePolicy};
    pub use crate::search::{LookupClient, SearchProvider, SerperClient};
    pub use crate::types::*;
    pub use crate::utils::segment::{segment, segment_by, Granularity};
    pub use crate::verification::{EngineConfig, VerificationEngine};
}
