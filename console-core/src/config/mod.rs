use crate::error::ConsoleError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load settings from `<config_dir>/base.yaml` overlaid with `APP_` environment
/// variables (`APP_API__BASE_URL` maps to `api.base_url`).
pub fn load_settings<T: DeserializeOwned>(config_dir: &Path) -> Result<T, ConsoleError> {
    dotenvy::dotenv().ok();

    let settings = Cfg::builder()
        .add_source(File::from(config_dir.join("base.yaml")).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("notifications.visible_sections")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}

/// Resolve the configuration directory for a crate, whether the process was
/// started from the workspace root or from the crate directory itself.
pub fn configuration_directory(crate_dir: &str) -> Result<std::path::PathBuf, ConsoleError> {
    let base_path = std::env::current_dir()?;

    if base_path.ends_with(crate_dir) {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join(crate_dir).join("config"))
    }
}
