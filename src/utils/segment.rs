// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SEGMENT - Divisão do texto em unidades
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Divide o texto de entrada em unidades (sentenças ou parágrafos) que serão
// buscadas literalmente no provedor.
//
// Granularidades:
// - Sentence: split em . ? ! sem dígito (Unicode) imediatamente antes ou depois
// - Paragraph: split por quebras de linha
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::TextUnit;

/// Terminadores de sentença candidatos. O filtro de dígitos vizinhos é
/// feito à parte porque o crate `regex` não suporta look-around.
static SENTENCE_TERMINATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.?!]").expect("regex de terminador é válido"));

/// Dígito decimal Unicode (categoria Nd), não só ASCII: `٣.٥` também é decimal.
static DECIMAL_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d$").expect("regex de dígito é válido"));

/// Erros de segmentação
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("Invalid granularity '{0}'. Choose 'sentence' or 'paragraph'")]
    InvalidGranularity(String),
}

/// Granularidade da divisão
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Uma unidade por sentença
    #[default]
    Sentence,
    /// Uma unidade por linha não vazia
    Paragraph,
}

impl Granularity {
    /// Nome usado na CLI e nos relatórios
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sentence => "sentence",
            Self::Paragraph => "paragraph",
        }
    }
}

impl FromStr for Granularity {
    type Err = SegmentError;

    /// Case-insensitive: "sentence" ou "paragraph". Qualquer outro valor falha.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sentence" => Ok(Self::Sentence),
            "paragraph" => Ok(Self::Paragraph),
            _ => Err(SegmentError::InvalidGranularity(value.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Divide o texto em unidades não vazias, na ordem em que aparecem.
///
/// # Exemplo
/// ```rust
/// use plagiarism_check::utils::segment::{segment, Granularity};
///
/// let units = segment("AI is cool. It's 110 real.", Granularity::Sentence);
/// assert_eq!(units.len(), 2);
/// assert_eq!(units[1].as_str(), "It's 110 real");
/// ```
pub fn segment(text: &str, granularity: Granularity) -> Vec<TextUnit> {
    let pieces = match granularity {
        Granularity::Sentence => split_sentences(text),
        Granularity::Paragraph => text.split('\n').collect(),
    };

    pieces.into_iter().filter_map(TextUnit::new).collect()
}

/// Interpreta a granularidade a partir do nome e segmenta.
///
/// Falha com [`SegmentError::InvalidGranularity`] antes de tocar no texto.
pub fn segment_by(text: &str, granularity: &str) -> Result<Vec<TextUnit>, SegmentError> {
    let granularity = granularity.parse::<Granularity>()?;
    Ok(segment(text, granularity))
}

/// Split em terminadores que não tenham dígito imediatamente antes ou depois.
/// O terminador é descartado.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for m in SENTENCE_TERMINATOR.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();

        if before.is_some_and(is_decimal_digit) || after.is_some_and(is_decimal_digit) {
            continue;
        }

        pieces.push(&text[start..m.start()]);
        start = m.end();
    }

    pieces.push(&text[start..]);
    pieces
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
