// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RELATÓRIO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Formatação legível do resultado para a CLI. Nada aqui afeta o score.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::checker::PlagiarismReport;
use crate::search::extract_hostname;
use crate::types::{LookupOutcome, UnitResult};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Linha de uma unidade: `Chunk 1 : <texto> .... True .... <url|None>`
pub fn format_unit_line(index: usize, entry: &UnitResult) -> String {
    let (found, evidence) = match &entry.outcome {
        LookupOutcome::Found(url) => ("True", url.as_str()),
        LookupOutcome::NotFound => ("False", "None"),
        LookupOutcome::Failed(_) => ("Error", "None"),
    };

    let mut line = format!("Chunk {} : {} .... {} .... {}", index + 1, entry.unit, found, evidence);
    if let LookupOutcome::Failed(reason) = &entry.outcome {
        line.push_str(&format!(" ({})", reason));
    }
    line
}

/// Quantas unidades encontradas por domínio, em ordem alfabética
pub fn evidence_by_host(report: &PlagiarismReport) -> BTreeMap<String, usize> {
    let mut hosts = BTreeMap::new();
    for url in report.results.outcomes().filter_map(LookupOutcome::evidence_url) {
        let host = extract_hostname(url).unwrap_or_else(|| url.to_string());
        *hosts.entry(host).or_insert(0) += 1;
    }
    hosts
}

/// Escreve o relatório completo: uma linha por unidade e o resumo final
pub fn write_report<W: Write>(out: &mut W, report: &PlagiarismReport) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, " PLAGIARISM CHECK ({})", report.granularity)?;
    writeln!(out, "{}", RULE)?;

    for (index, entry) in report.results.iter().enumerate() {
        writeln!(out, "{}", format_unit_line(index, entry))?;
    }

    let hosts = evidence_by_host(report);
    if !hosts.is_empty() {
        writeln!(out)?;
        writeln!(out, "Fontes:")?;
        for (host, count) in &hosts {
            writeln!(out, "  - {} ({})", host, count)?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "Unidades: {} | Encontradas: {} | Não encontradas: {} | Falhas: {}",
        report.breakdown.total(),
        report.breakdown.found,
        report.breakdown.not_found,
        report.breakdown.failed
    )?;
    writeln!(out, "{}", report.timing().summary())?;
    writeln!(out, "Plagiarism Score: {}", report.score)?;
    writeln!(out, "Runtime: {:.3} seconds", report.elapsed_ms as f64 / 1000.0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{score, ScoreBreakdown, ScorePolicy};
    use crate::types::{TextUnit, VerificationResult};
    use crate::utils::segment::Granularity;
    use uuid::Uuid;

    fn entry(text: &str, outcome: LookupOutcome) -> UnitResult {
        UnitResult {
            unit: TextUnit::new(text).unwrap(),
            outcome,
            elapsed_ms: 12,
        }
    }

    fn sample_report() -> PlagiarismReport {
        let results = VerificationResult::new(vec![
            entry("AI is cool", LookupOutcome::Found("https://en.wikipedia.org/wiki/AI".into())),
            entry("It's 110 real", LookupOutcome::NotFound),
            entry("Broken", LookupOutcome::Failed("Rate limit exceeded".into())),
            entry("Again", LookupOutcome::Found("https://en.wikipedia.org/wiki/X".into())),
        ]);
        PlagiarismReport {
            run_id: Uuid::new_v4(),
            granularity: Granularity::Sentence,
            policy: ScorePolicy::default(),
            score: score(&results),
            breakdown: ScoreBreakdown::from(&results),
            results,
            elapsed_ms: 1500,
        }
    }

    #[test]
    fn test_format_unit_line() {
        let report = sample_report();
        let lines: Vec<String> = report
            .results
            .iter()
            .enumerate()
            .map(|(i, e)| format_unit_line(i, e))
            .collect();

        assert_eq!(lines[0], "Chunk 1 : AI is cool .... True .... https://en.wikipedia.org/wiki/AI");
        assert_eq!(lines[1], "Chunk 2 : It's 110 real .... False .... None");
        assert_eq!(lines[2], "Chunk 3 : Broken .... Error .... None (Rate limit exceeded)");
    }

    #[test]
    fn test_evidence_by_host() {
        let hosts = evidence_by_host(&sample_report());
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts["en.wikipedia.org"], 2);
    }

    #[test]
    fn test_write_report() {
        let mut buffer = Vec::new();
        write_report(&mut buffer, &sample_report()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("PLAGIARISM CHECK (sentence)"));
        assert!(text.contains("Plagiarism Score: 50.00%"));
        assert!(text.contains("Runtime: 1.500 seconds"));
        assert!(text.contains("Falhas: 1"));
        assert!(text.contains("  - en.wikipedia.org (2)"));
    }
}
