//! bibhub: bibliography format conversion through the bibutils suite.
//!
//! Wires the workspace crates together: configuration loading, logging
//! setup, and construction of a ready-to-use [`Converter`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = bibhub::bootstrap()?;
//! let ris = converter
//!     .convert_str("bib", "ris", "@article{key, title={A title}}")
//!     .await?;
//! println!("{}", ris.to_string_lossy());
//! # Ok(())
//! # }
//! ```

pub mod logging;

pub use bibhub_converter::{
    ConversionError, ConversionOutput, ConversionPlan, ConversionRequest, Converter,
    ConverterLocation, Platform, ProcessExecutor, ProcessRunner,
};
pub use bibhub_core::config::AppConfig;
pub use bibhub_core::{AppError, AppResult, ErrorKind};
pub use bibhub_formats::{Direction, FormatCode, FormatRegistry};

/// Load configuration for the environment named by `BIBHUB_ENV`
/// (default `development`).
pub fn load_configuration() -> AppResult<AppConfig> {
    let env = std::env::var("BIBHUB_ENV").unwrap_or_else(|_| "development".to_string());

    tracing::info!("Loading config (env: {})", env);

    AppConfig::load(&env)
}

/// Build a converter from an already-loaded configuration.
pub fn converter_from_config(config: &AppConfig) -> AppResult<Converter> {
    let registry = FormatRegistry::standard()?;
    let converter = Converter::new(&config.converter, registry)?;
    Ok(converter)
}

/// Load configuration, install logging, and build the converter.
pub fn bootstrap() -> AppResult<Converter> {
    let config = load_configuration()?;
    logging::init_logging(&config.logging)?;
    tracing::info!("Starting bibhub v{}", env!("CARGO_PKG_VERSION"));
    converter_from_config(&config)
}
