// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIMING UTILITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários para medir tempo das buscas e da execução completa.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::time::Instant;

/// Timer para medir duração de operações
pub struct ActionTimer {
    start: Instant,
    action_name: String,
}

impl ActionTimer {
    /// Inicia um novo timer para uma ação
    pub fn start(action_name: &str) -> Self {
        Self {
            start: Instant::now(),
            action_name: action_name.to_string(),
        }
    }

    /// Retorna o tempo decorrido em milissegundos
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Para o timer e loga o tempo decorrido
    pub fn stop_and_log(self) -> u64 {
        let elapsed = self.elapsed_ms();
        log::info!("⏱️  {} completado em {}ms", self.action_name, elapsed);
        elapsed
    }

    /// Para o timer e retorna o tempo sem logar
    pub fn stop(self) -> u64 {
        self.elapsed_ms()
    }
}

/// Estatísticas agregadas dos tempos de busca de uma execução
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingStats {
    /// Tempos individuais (ms), sem ordem definida
    pub lookup_times: Vec<u64>,
}

impl TimingStats {
    /// Cria estatísticas a partir de uma lista de tempos
    pub fn from_times(times: impl IntoIterator<Item = u64>) -> Self {
        Self {
            lookup_times: times.into_iter().collect(),
        }
    }

    /// Média dos tempos (0 quando vazio)
    pub fn avg(&self) -> f64 {
        if self.lookup_times.is_empty() {
            0.0
        } else {
            self.lookup_times.iter().sum::<u64>() as f64 / self.lookup_times.len() as f64
        }
    }

    /// Maior tempo registrado
    pub fn max(&self) -> u64 {
        self.lookup_times.iter().copied().max().unwrap_or(0)
    }

    /// Percentil por nearest-rank (p em 0..=100)
    pub fn percentile(&self, p: f64) -> u64 {
        if self.lookup_times.is_empty() {
            return 0;
        }
        let mut sorted = self.lookup_times.clone();
        sorted.sort_unstable();
        let rank = ((p.clamp(0.0, 100.0) / 100.0) * sorted.len() as f64).ceil() as usize;
        sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
    }

    /// Formata um resumo das estatísticas
    pub fn summary(&self) -> String {
        format!(
            "Lookups: {} calls, avg {:.1}ms, p95 {}ms, max {}ms",
            self.lookup_times.len(),
            self.avg(),
            self.percentile(95.0),
            self.max()
        )
    }
}
