use std::collections::HashMap;
use tracing::{debug, info};

use super::renderer::{ConfigFormat, Rendered, Renderer, RendererFactory};
use super::{bird, quagga, racoon, strongswan};
use crate::descriptor::VpnConnection;
use crate::error::ConfgenResult;

/// Format registry - maps each supported format to its renderer
///
/// Assembled once at process start and read-only afterwards. This is the
/// single dispatch point between a format identifier and the renderer that
/// encodes that daemon's syntax.
pub struct FormatRegistry {
    renderers: HashMap<ConfigFormat, RendererFactory>,
}

impl FormatRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Create a registry with every supported renderer registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ConfigFormat::Strongswan, strongswan::create_renderer);
        registry.register(ConfigFormat::Racoon, racoon::create_renderer);
        registry.register(ConfigFormat::Quagga, quagga::create_renderer);
        registry.register(ConfigFormat::Bird, bird::create_renderer);
        registry
    }

    /// Register a renderer factory for a format
    pub fn register(&mut self, format: ConfigFormat, factory: RendererFactory) {
        debug!("Registering renderer: {}", format);
        self.renderers.insert(format, factory);
    }

    /// Formats currently registered, in declaration order
    pub fn available_formats(&self) -> Vec<ConfigFormat> {
        ConfigFormat::ALL
            .iter()
            .copied()
            .filter(|f| self.renderers.contains_key(f))
            .collect()
    }

    pub fn has_format(&self, format: ConfigFormat) -> bool {
        self.renderers.contains_key(&format)
    }

    /// Look up the renderer for a format identifier
    ///
    /// The identifier is matched case-insensitively; an unrecognized one
    /// fails with `UnknownFormat` listing every valid identifier.
    pub fn lookup(&self, format_name: &str) -> ConfgenResult<Box<dyn Renderer>> {
        let format: ConfigFormat = format_name.parse()?;
        self.lookup_format(format)
    }

    /// Look up the renderer for an already-parsed format tag
    pub fn lookup_format(&self, format: ConfigFormat) -> ConfgenResult<Box<dyn Renderer>> {
        let factory = self.renderers.get(&format).ok_or_else(|| {
            crate::error::ConfgenError::UnknownFormat {
                requested: format.to_string(),
                known: ConfigFormat::known_names(),
            }
        })?;

        Ok(factory())
    }

    /// Generator facade: resolve the renderer for `format_name` and run it
    ///
    /// Renderer errors propagate unchanged so the caller can map them to
    /// exit codes. Descriptor contents are never logged.
    pub fn generate(&self, format_name: &str, conn: &VpnConnection) -> ConfgenResult<Rendered> {
        let renderer = self.lookup(format_name)?;
        info!("Rendering {} configuration for {}", renderer.format(), conn.name());
        renderer.render(conn)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
