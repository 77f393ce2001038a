//! Formato texto da API `entries` do Nightscout.
//!
//! Uma leitura por linha, campos separados por TAB, strings entre aspas:
//!
//! ```text
//! "2024-03-10T12:00:00.000Z"	1710072000000	123	"Flat"	"xDrip-DexcomG6"
//!  dateString                 date (ms)       sgv  direction device
//! ```
//!
//! Linhas inválidas são descartadas individualmente; o lote nunca aborta.

use crate::error::ParseError;
use crate::types::{Entry, Trend, Unit};
use chrono::{DateTime, Utc};
use tracing::debug;

const FIELD_SEPARATOR: char = '\t';

/// Interpreta uma linha da resposta.
pub fn parse_line(line: &str, unit: Unit) -> Result<Entry, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let fields: Vec<&str> = line
        .split(FIELD_SEPARATOR)
        .map(|f| f.trim().trim_matches('"'))
        .collect();

    let date_string = fields.first().copied().unwrap_or_default();
    let epoch_ms = fields.get(1).copied().unwrap_or_default();
    let timestamp = parse_timestamp(date_string, epoch_ms)?;

    let raw_value = fields
        .get(2)
        .copied()
        .filter(|f| !f.is_empty())
        .ok_or(ParseError::MissingField("sgv"))?;
    let value: f64 = raw_value
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ParseError::InvalidValue(raw_value.to_string()))?;

    // Direção ausente não invalida a leitura
    let trend = fields
        .get(3)
        .map_or(Trend::None, |token| Trend::from_token(token));

    Ok(Entry::new(timestamp, unit.from_mg_dl(value), unit, trend))
}

/// ISO 8601 em `dateString` tem prioridade; cai para epoch em milissegundos.
fn parse_timestamp(date_string: &str, epoch_ms: &str) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(date_string) {
        return Ok(ts.with_timezone(&Utc));
    }

    if epoch_ms.is_empty() && date_string.is_empty() {
        return Err(ParseError::MissingField("date"));
    }

    epoch_ms
        .parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite())
        .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
        .ok_or_else(|| ParseError::InvalidTimestamp(format!("{date_string} / {epoch_ms}")))
}

/// Interpreta o corpo inteiro: linha a linha, descarta falhas, remove
/// duplicatas e ordena do mais recente para o mais antigo.
pub fn parse_entries(body: &str, unit: Unit) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::new();

    for line in body.replace("\r\n", "\n").split('\n') {
        match parse_line(line, unit) {
            Ok(entry) => {
                if !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
            Err(ParseError::Empty) => {}
            Err(e) => debug!("Linha ignorada ({e}): {line:?}"),
        }
    }

    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const LINE: &str =
        "\"2024-03-10T12:00:00.000Z\"\t1710072000000\t123\t\"Flat\"\t\"xDrip-DexcomG6\"";

    #[test]
    fn parses_nightscout_line() {
        let entry = parse_line(LINE, Unit::MgDl).unwrap();
        assert_eq!(
            entry.timestamp,
            Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
        );
        assert_eq!(entry.value, 123.0);
        assert_eq!(entry.trend, Trend::Flat);
        assert_eq!(entry.digits(), vec![1, 2, 3]);
    }

    #[test]
    fn parse_is_deterministic() {
        assert_eq!(parse_line(LINE, Unit::MgDl), parse_line(LINE, Unit::MgDl));
    }

    #[test]
    fn falls_back_to_epoch_millis() {
        let entry = parse_line("\"garbage\"\t1710072000000\t98\t\"SingleDown\"", Unit::MgDl).unwrap();
        assert_eq!(entry.timestamp.timestamp_millis(), 1_710_072_000_000);
        assert_eq!(entry.trend, Trend::SingleDown);
    }

    #[test]
    fn converts_to_mmol() {
        let entry = parse_line(LINE, Unit::MmolL).unwrap();
        assert_eq!(entry.value, 6.8);
        assert_eq!(entry.digits(), vec![6, 8]);
    }

    #[test]
    fn missing_direction_is_none() {
        let entry = parse_line("\"2024-03-10T12:00:00Z\"\t1710072000000\t140", Unit::MgDl).unwrap();
        assert_eq!(entry.trend, Trend::None);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_line("   ", Unit::MgDl), Err(ParseError::Empty));
        assert_eq!(
            parse_line("\"2024-03-10T12:00:00Z\"\t1710072000000", Unit::MgDl),
            Err(ParseError::MissingField("sgv"))
        );
        assert!(matches!(
            parse_line("\"2024-03-10T12:00:00Z\"\t1710072000000\tabc\t\"Flat\"", Unit::MgDl),
            Err(ParseError::InvalidValue(_))
        ));
        assert!(matches!(
            parse_line("yesterday\tnoon\t120", Unit::MgDl),
            Err(ParseError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn batch_skips_dedups_and_sorts() {
        let body = concat!(
            "\"2024-03-10T11:55:00Z\"\t0\t118\t\"Flat\"\r\n",
            "not a record\r\n",
            "\"2024-03-10T12:00:00Z\"\t0\t123\t\"FortyFiveUp\"\r\n",
            "\"2024-03-10T11:55:00Z\"\t0\t118\t\"Flat\"\r\n",
            "\r\n",
        );
        let entries = parse_entries(body, Unit::MgDl);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].value, 123.0);
        assert_eq!(entries[1].value, 118.0);
        assert!(entries[0].timestamp > entries[1].timestamp);
    }

    #[test]
    fn empty_body_yields_nothing() {
        assert!(parse_entries("", Unit::MgDl).is_empty());
    }
}
