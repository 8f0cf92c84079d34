use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Failed to execute {program}: {message}")]
    ToolSpawn { program: String, message: String },

    #[error("{program} did not finish within {secs}s")]
    ToolTimeout { program: String, secs: u64 },

    #[error("{program} failed: {message}")]
    ToolFailed { program: String, message: String },

    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("Interface '{0}' is in access-point mode")]
    InterfaceIsAccessPoint(String),

    #[error("Template error: {0}")]
    TemplateRender(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
