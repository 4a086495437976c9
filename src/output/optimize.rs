//! Optimizer capabilities
//!
//! Image, script and style sheet optimization are external capabilities.
//! The registry routes resources to a registered backend when the matching
//! flag is enabled and passes them through unchanged otherwise.

use crate::config::OptimizeConfig;
use crate::output::OutputError;
use crate::state::{ContentKind, FetchedResource};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;

/// Content an optimizer can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Images,
    Scripts,
    Stylesheets,
}

impl Capability {
    pub fn for_kind(kind: ContentKind) -> Option<Self> {
        match kind {
            ContentKind::Image => Some(Self::Images),
            ContentKind::Script => Some(Self::Scripts),
            ContentKind::Css => Some(Self::Stylesheets),
            _ => None,
        }
    }

    /// Configuration flag that enables this capability
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Images => "OPTIMIZE_IMAGES",
            Self::Scripts => "MINIFY_JS",
            Self::Stylesheets => "MINIFY_CSS",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Images => write!(f, "images"),
            Self::Scripts => write!(f, "scripts"),
            Self::Stylesheets => write!(f, "style sheets"),
        }
    }
}

/// A backend that shrinks one kind of content
pub trait Optimizer: Send + Sync {
    /// Human-readable backend name, used in logs
    fn name(&self) -> &str;

    /// Returns the optimized bytes of `resource`
    fn optimize(&self, resource: &FetchedResource, bytes: &[u8]) -> Result<Vec<u8>, OutputError>;
}

/// Optimizer backends by capability
pub struct OptimizerRegistry {
    settings: OptimizeConfig,
    backends: HashMap<Capability, Box<dyn Optimizer>>,
    /// Capabilities already reported as having no backend
    warned: Mutex<HashSet<Capability>>,
}

impl OptimizerRegistry {
    pub fn new(settings: OptimizeConfig) -> Self {
        Self {
            settings,
            backends: HashMap::new(),
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn register(&mut self, capability: Capability, optimizer: Box<dyn Optimizer>) {
        self.backends.insert(capability, optimizer);
    }

    fn enabled(&self, capability: Capability) -> bool {
        match capability {
            Capability::Images => self.settings.images,
            Capability::Scripts => self.settings.js,
            Capability::Stylesheets => self.settings.css,
        }
    }

    /// Runs the matching backend over `bytes`
    ///
    /// Returns `bytes` unchanged when the capability is disabled, has no
    /// backend, or the backend fails.
    pub fn process(&self, resource: &FetchedResource, bytes: Vec<u8>) -> Vec<u8> {
        let Some(capability) = Capability::for_kind(resource.kind) else {
            return bytes;
        };
        if !self.enabled(capability) {
            return bytes;
        }

        let Some(backend) = self.backends.get(&capability) else {
            self.warn_once(capability);
            return bytes;
        };

        match backend.optimize(resource, &bytes) {
            Ok(optimized) => {
                tracing::debug!(
                    "{} optimized {} ({} -> {} bytes)",
                    backend.name(),
                    resource.url,
                    bytes.len(),
                    optimized.len()
                );
                optimized
            }
            Err(e) => {
                tracing::warn!("{} failed on {}: {}", backend.name(), resource.url, e);
                bytes
            }
        }
    }

    fn warn_once(&self, capability: Capability) {
        if let Ok(mut warned) = self.warned.lock() {
            if warned.insert(capability) {
                tracing::warn!(
                    "{} is set but no optimizer for {} is available; writing them unchanged",
                    capability.flag(),
                    capability
                );
            }
        }
    }
}
