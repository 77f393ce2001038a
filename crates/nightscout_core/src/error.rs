//! Taxonomia de erros.
//!
//! - [`StartupError`] – recurso obrigatório ausente ou inválido; fatal.
//! - [`FetchError`] – falha de rede/HTTP; recuperável, vira aviso de conectividade.
//! - [`ParseError`] – um registro malformado; a linha é descartada.

use std::path::PathBuf;

/// Erros fatais de inicialização (atlas de glifos, configuração).
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Arquivo não encontrado: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Erro ao ler {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuração inválida: {0}")]
    InvalidConfig(String),

    #[error("Atlas de glifos inválido: {0}")]
    InvalidAtlas(String),

    #[error("Falha ao criar cliente HTTP: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Falhas ao buscar leituras do Nightscout.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Nightscout API: HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Nightscout API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Nightscout API: nenhuma leitura válida na resposta")]
    NoEntries,
}

/// Falha ao interpretar uma linha da resposta.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Linha vazia")]
    Empty,

    #[error("Campo ausente: {0}")]
    MissingField(&'static str),

    #[error("Timestamp inválido: {0:?}")]
    InvalidTimestamp(String),

    #[error("Valor de glicose inválido: {0:?}")]
    InvalidValue(String),
}
