//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável. Carregado uma vez na
//! inicialização; o núcleo trata o resultado como snapshot imutável.

use crate::error::StartupError;
use crate::types::{MGDL_PER_MMOL, Unit};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use tracing::info;

/// Conexão com o servidor Nightscout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NightscoutConfig {
    /// URL base da API (ex: "https://meu-site.herokuapp.com/api/v1/")
    pub base_url: String,
    /// API secret em texto puro; enviado como hash SHA-1
    pub api_secret: String,
    /// Timeout de cada requisição (segundos)
    pub request_timeout_secs: u64,
}

impl Default for NightscoutConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_secret: String::new(),
            request_timeout_secs: 15,
        }
    }
}

impl NightscoutConfig {
    /// Hash SHA-1 (hex minúsculo) enviado no header `API-Secret`.
    pub fn api_secret_hash(&self) -> String {
        format!("{:x}", Sha1::digest(self.api_secret.as_bytes()))
    }
}

/// Ícone de status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub unit: Unit,
    /// Intervalo de atualização (minutos)
    pub update_interval: u32,
    /// Colore os dígitos (verde no alvo, vermelho fora)
    pub use_color: bool,
    /// Estilo: "classic", "dark", "high_contrast"
    pub style: String,
    /// Atlas de glifos (relativo ao executável)
    pub symbols_path: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            unit: Unit::MgDl,
            update_interval: 5,
            use_color: true,
            style: "classic".into(),
            symbols_path: PathBuf::from("symbols.png"),
        }
    }
}

/// Limites e cooldown do alarme sonoro.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    pub enabled: bool,
    pub low: f64,
    pub high: f64,
    /// Cooldown entre alarmes (minutos)
    pub interval: u32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        let (low, high) = AlarmConfig::default_thresholds(Unit::MgDl);
        Self {
            enabled: false,
            low,
            high,
            interval: 30,
        }
    }
}

/// Maior leitura possível de um sensor (600 mg/dL) em mmol/L.
const MAX_MMOL: f64 = 600.0 / MGDL_PER_MMOL;

impl AlarmConfig {
    /// Limites padrão (baixo, alto) na unidade de exibição.
    pub fn default_thresholds(unit: Unit) -> (f64, f64) {
        match unit {
            Unit::MgDl => (70.0, 180.0),
            Unit::MmolL => (3.9, 10.0),
        }
    }
}

/// Janela do gráfico de histórico.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Horas exibidas no gráfico
    pub time_range: u32,
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub font_size: f32,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            time_range: 3,
            width: 400,
            height: 200,
            font_family: "Segoe UI".into(),
            font_size: 12.0,
        }
    }
}

impl DiagramConfig {
    /// Quantidade de leituras pedidas para preencher o gráfico.
    pub fn entry_count(&self) -> usize {
        self.time_range as usize * 60
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub nightscout: NightscoutConfig,
    pub display: DisplayConfig,
    pub alarm: AlarmConfig,
    pub diagram: DiagramConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    ///
    /// Arquivo ausente é fatal: um modelo padrão é gravado no caminho para
    /// o usuário preencher, e o erro é propagado.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        if !path.exists() {
            if AppConfig::default().save(path).is_ok() {
                info!("Modelo de configuração gravado em {}", path.display());
            }
            return Err(StartupError::MissingFile(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| StartupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        info!("Configuração carregada de {}", path.display());
        Ok(config)
    }

    /// Interpreta e valida um documento TOML.
    ///
    /// Limites de alarme omitidos seguem a unidade de `display.unit`.
    pub fn from_toml(content: &str) -> Result<Self, StartupError> {
        let invalid = |e: toml::de::Error| StartupError::InvalidConfig(e.to_string());
        let table: toml::Table = content.parse().map_err(invalid)?;
        let has_alarm_key = |key: &str| {
            table
                .get("alarm")
                .and_then(|alarm| alarm.get(key))
                .is_some()
        };
        let (low_set, high_set) = (has_alarm_key("low"), has_alarm_key("high"));

        let mut config: AppConfig = toml::Value::Table(table).try_into().map_err(invalid)?;
        let (low, high) = AlarmConfig::default_thresholds(config.display.unit);
        if !low_set {
            config.alarm.low = low;
        }
        if !high_set {
            config.alarm.high = high;
        }

        let errors = config.validate();
        if !errors.is_empty() {
            return Err(StartupError::InvalidConfig(errors.join("; ")));
        }
        Ok(config)
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        exe_dir().join("config.toml")
    }

    /// Resolve caminhos relativos contra o diretório do executável.
    pub fn resolve_path(path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            exe_dir().join(path)
        }
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.nightscout.base_url.trim().is_empty() {
            errors.push("nightscout.base_url não pode ser vazio".into());
        } else if !self.nightscout.base_url.starts_with("http://")
            && !self.nightscout.base_url.starts_with("https://")
        {
            errors.push(format!(
                "nightscout.base_url deve começar com http:// ou https://: {}",
                self.nightscout.base_url
            ));
        }
        if self.nightscout.request_timeout_secs == 0 {
            errors.push("nightscout.request_timeout_secs deve ser > 0".into());
        }
        if self.alarm.low >= self.alarm.high {
            errors.push(format!(
                "alarm.low ({}) deve ser menor que alarm.high ({})",
                self.alarm.low, self.alarm.high
            ));
        }
        match self.display.unit {
            Unit::MmolL if self.alarm.high > MAX_MMOL => errors.push(format!(
                "alarm.high ({}) fora da escala mmol/L (máximo {MAX_MMOL:.1})",
                self.alarm.high
            )),
            Unit::MgDl if self.alarm.high <= MAX_MMOL => errors.push(format!(
                "alarm.high ({}) parece estar em mmol/L, mas display.unit é mg/dL",
                self.alarm.high
            )),
            _ => {}
        }
        if self.diagram.time_range == 0 {
            errors.push("diagram.time_range deve ser > 0".into());
        }
        if self.diagram.width < 16 || self.diagram.height < 16 {
            errors.push(format!(
                "Tamanho do gráfico inválido: {}x{} (mínimo 16x16)",
                self.diagram.width, self.diagram.height
            ));
        }

        errors
    }
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
