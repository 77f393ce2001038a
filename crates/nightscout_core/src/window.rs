//! Recorte temporal das leituras para o gráfico.

use crate::types::Entry;
use chrono::Duration;

/// Folga além do intervalo pedido, para o gráfico sempre ter contexto à
/// esquerda mesmo com dados esparsos.
pub const WINDOW_PADDING_HOURS: i64 = 5;

/// Mantém as leituras com `timestamp >= max - (span + 5h)`, preservando a
/// ordem de entrada. Entrada vazia retorna vazio.
pub fn window(entries: &[Entry], span_hours: u32) -> Vec<Entry> {
    let Some(max_timestamp) = entries.iter().map(|e| e.timestamp).max() else {
        return Vec::new();
    };
    let min_timestamp =
        max_timestamp - Duration::hours(i64::from(span_hours) + WINDOW_PADDING_HOURS);

    entries
        .iter()
        .filter(|e| e.timestamp >= min_timestamp)
        .copied()
        .collect()
}
