//! Layered configuration: built-in defaults, then an optional
//! `config/default.*` file, then `WSRELAY__SECTION__KEY` environment variables.

mod settings;

use std::path::Path;

use config::{Config, Environment, File};

use crate::utils::Result;

pub use settings::{
    DEFAULT_MAX_MESSAGE_SIZE, HubSettings, PartialSettings, ServerSettings, SessionSettings,
    Settings,
};

pub const ENV_PREFIX: &str = "WSRELAY";

/// Loads the configuration from `config/default` and the environment.
pub fn load_config() -> Result<Settings> {
    load_config_from(Path::new("config/default"))
}

/// Loads the configuration from the given file stem (extension optional)
/// and the environment, merged over the defaults.
pub fn load_config_from(file: &Path) -> Result<Settings> {
    let config = Config::builder()
        .add_source(File::with_name(&file.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins")
                .try_parsing(true),
        )
        .build()?;

    let partial: PartialSettings = config.try_deserialize()?;
    let settings = partial.merge_over(Settings::default());
    settings.validate()?;
    Ok(settings)
}
