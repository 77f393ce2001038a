//! Políticas de alarme e de aviso de conectividade.
//!
//! Funções puras: recebem o instante atual e o último disparo, e o
//! controlador decide o que fazer com o resultado.

use crate::config::AlarmConfig;
use chrono::{DateTime, Duration, Utc};

/// Título do aviso de conectividade.
pub const CONNECTIVITY_TITLE: &str = "Network unavailable";

/// Classificação de um valor frente aos limites configurados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseLevel {
    /// Valor zero (sentinela "sem dados")
    NoData,
    Low,
    InRange,
    High,
}

/// Retorna o [`GlucoseLevel`] para um valor dado os limites.
pub fn level_for_value(value: f64, low: f64, high: f64) -> GlucoseLevel {
    if value == 0.0 {
        GlucoseLevel::NoData
    } else if value >= high {
        GlucoseLevel::High
    } else if value <= low {
        GlucoseLevel::Low
    } else {
        GlucoseLevel::InRange
    }
}

/// Decide se o alarme sonoro deve tocar.
///
/// Valor zero ignora o cooldown: perda total de dados sempre realerta.
pub fn should_alarm(
    alarm: &AlarmConfig,
    value: f64,
    last_alarm: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    if !alarm.enabled {
        return false;
    }
    if value < alarm.high && value > alarm.low {
        return false;
    }
    if value == 0.0 {
        return true;
    }

    match last_alarm {
        Some(last) => now > last + Duration::minutes(i64::from(alarm.interval)),
        None => true,
    }
}

/// Decide se um aviso de conectividade pode ser exibido.
/// O intervalo mínimo é de 1 minuto, mesmo com `update_interval` = 0.
pub fn should_notify_connectivity(
    last_notification: Option<DateTime<Utc>>,
    update_interval_minutes: u32,
    now: DateTime<Utc>,
) -> bool {
    let interval = i64::from(update_interval_minutes.max(1));
    match last_notification {
        Some(last) => now >= last + Duration::minutes(interval),
        None => true,
    }
}

/// Mensagem da causa mais interna de uma cadeia de erros.
pub fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut root = err;
    while let Some(inner) = root.source() {
        root = inner;
    }
    root.to_string()
}

/// Texto exibido no aviso de conectividade.
pub fn connectivity_message(root_cause: &str) -> String {
    format!("Connectivity issue detected. The app will keep retrying.\n{root_cause}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn alarm() -> AlarmConfig {
        AlarmConfig {
            enabled: true,
            low: 70.0,
            high: 180.0,
            interval: 30,
        }
    }

    #[test]
    fn levels() {
        assert_eq!(level_for_value(0.0, 70.0, 180.0), GlucoseLevel::NoData);
        assert_eq!(level_for_value(65.0, 70.0, 180.0), GlucoseLevel::Low);
        assert_eq!(level_for_value(70.0, 70.0, 180.0), GlucoseLevel::Low);
        assert_eq!(level_for_value(120.0, 70.0, 180.0), GlucoseLevel::InRange);
        assert_eq!(level_for_value(180.0, 70.0, 180.0), GlucoseLevel::High);
    }

    #[test]
    fn alarm_fires_when_out_of_range_and_never_fired() {
        assert!(should_alarm(&alarm(), 250.0, None, now()));
        assert!(should_alarm(&alarm(), 60.0, None, now()));
        assert!(!should_alarm(&alarm(), 120.0, None, now()));
    }

    #[test]
    fn alarm_cooldown_suppresses_repeat() {
        let last = Some(now() - Duration::minutes(20));
        assert!(!should_alarm(&alarm(), 250.0, last, now()));

        let last = Some(now() - Duration::minutes(31));
        assert!(should_alarm(&alarm(), 250.0, last, now()));

        // Exatamente no limite ainda não dispara (comparação estrita)
        let last = Some(now() - Duration::minutes(30));
        assert!(!should_alarm(&alarm(), 250.0, last, now()));
    }

    #[test]
    fn zero_value_bypasses_cooldown() {
        let last = Some(now() - Duration::minutes(20));
        assert!(should_alarm(&alarm(), 0.0, last, now()));
    }

    #[test]
    fn disabled_alarm_never_fires() {
        let mut cfg = alarm();
        cfg.enabled = false;
        assert!(!should_alarm(&cfg, 0.0, None, now()));
        assert!(!should_alarm(&cfg, 400.0, None, now()));
    }

    #[test]
    fn connectivity_debounce() {
        assert!(should_notify_connectivity(None, 5, now()));

        let last = Some(now() - Duration::minutes(4));
        assert!(!should_notify_connectivity(last, 5, now()));

        let last = Some(now() - Duration::minutes(5));
        assert!(should_notify_connectivity(last, 5, now()));
    }

    #[test]
    fn connectivity_interval_floor_is_one_minute() {
        let last = Some(now() - Duration::seconds(30));
        assert!(!should_notify_connectivity(last, 0, now()));

        let last = Some(now() - Duration::seconds(60));
        assert!(should_notify_connectivity(last, 0, now()));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn root_cause_walks_chain() {
        let err = Outer(std::io::Error::other("connection refused"));
        assert_eq!(root_cause(&err), "connection refused");
        assert!(connectivity_message("x").ends_with("\nx"));
    }
}
