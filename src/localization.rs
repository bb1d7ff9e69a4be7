use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::sync::OnceLock;
use tracing::{error, warn};
use unic_langid::LanguageIdentifier;

/// Locale of the bundled messages
pub const DEFAULT_LOCALE: &str = "uk";

const UK_MESSAGES: &str = include_str!("../locales/uk/main.ftl");

/// Localization manager for the Medici bot
pub struct LocalizationManager {
    bundle: FluentBundle<FluentResource>,
}

impl LocalizationManager {
    /// Create a manager from the bundled Ukrainian messages
    pub fn new() -> Result<Self> {
        Self::from_source(DEFAULT_LOCALE, UK_MESSAGES)
    }

    /// Create a manager from Fluent source text
    pub fn from_source(locale: &str, source: &str) -> Result<Self> {
        let langid: LanguageIdentifier = locale
            .parse()
            .map_err(|e| anyhow!("invalid locale {}: {}", locale, e))?;

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("failed to parse {} messages: {:?}", locale, errors))?;

        let mut bundle = FluentBundle::new_concurrent(vec![langid]);
        // Plain-text replies, no Unicode isolation marks around placeables
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("duplicate {} messages: {:?}", locale, errors))?;

        Ok(Self { bundle })
    }

    pub fn has_message(&self, key: &str) -> bool {
        self.bundle.has_message(key)
    }

    /// Get a localized message
    pub fn get_message(&self, key: &str, args: Option<&FluentArgs>) -> String {
        let msg = match self.bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut errors = Vec::new();
        let value = self.bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(key = %key, errors = ?errors, "Errors while formatting message");
        }
        value.into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let fluent_args: FluentArgs = args
            .iter()
            .map(|(k, v)| (*k, FluentValue::from(*v)))
            .collect();
        self.get_message(key, Some(&fluent_args))
    }
}

/// Global localization instance, `None` if the bundled messages failed to load
static LOCALIZATION_MANAGER: OnceLock<Option<LocalizationManager>> = OnceLock::new();

fn manager() -> Option<&'static LocalizationManager> {
    LOCALIZATION_MANAGER
        .get_or_init(|| match LocalizationManager::new() {
            Ok(manager) => Some(manager),
            Err(e) => {
                error!(error = %e, "Failed to load localization");
                None
            }
        })
        .as_ref()
}

/// Load the global localization manager, failing if the messages are broken
pub fn init_localization() -> Result<()> {
    manager()
        .map(|_| ())
        .ok_or_else(|| anyhow!("localization messages could not be loaded"))
}

/// Convenience function to get a localized message
pub fn t(key: &str) -> String {
    match manager() {
        Some(manager) => manager.get_message(key, None),
        None => format!("Missing translation: {}", key),
    }
}

/// Convenience function to get a localized message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    match manager() {
        Some(manager) => manager.get_message_with_args(key, args),
        None => format!("Missing translation: {}", key),
    }
}
