//! Registry of element types: name → factory.
//!
//! The embedding firmware registers every element type it ships with, then
//! the board creates instances from the configuration by type name. The
//! registry is an ordinary owned object constructed once at startup; there
//! is no static registration phase.

use crate::element::Element;

/// Factory creating a fresh, unconfigured element instance.
pub type ElementFactory = fn() -> Box<dyn Element>;

/// Maximum number of registered element types.
pub const REGISTRY_CAPACITY: usize = 32;

/// Name → factory mapping with stable registration order.
#[derive(Default)]
pub struct ElementRegistry {
    entries: Vec<(&'static str, ElementFactory)>,
}

impl ElementRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in element types.
    ///
    /// Elements that need an external collaborator (a sensor probe, a network
    /// transport) have no parameterless factory; they are constructed
    /// directly and added to the board with [`Board::add`](crate::Board::add).
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register("value", crate::elements::value::ValueElement::create);
        reg.register("timer", crate::elements::timer::TimerElement::create);
        reg.register("scene", crate::elements::scene::SceneElement::create);
        reg.register(
            "threshold",
            crate::elements::threshold::ThresholdElement::create,
        );
        reg.register("logic", crate::elements::logic::LogicElement::create);
        reg.register("pulse", crate::elements::pulse::PulseElement::create);
        reg
    }

    /// Register a factory under a lowercase type name.
    ///
    /// Returns `false` (and logs) when the registry is full or the name is
    /// already taken; the caller must not treat this as fatal.
    pub fn register(&mut self, type_name: &'static str, factory: ElementFactory) -> bool {
        if self.entries.len() >= REGISTRY_CAPACITY {
            tracing::warn!(type_name, "element registry is full");
            return false;
        }
        if self.find(type_name).is_some() {
            tracing::warn!(type_name, "element type already registered");
            return false;
        }
        self.entries.push((type_name, factory));
        true
    }

    /// Create a new element of the given type, or `None` for unknown types.
    /// Type matching is case-insensitive.
    pub fn create(&self, type_name: &str) -> Option<Box<dyn Element>> {
        self.find(type_name).map(|factory| factory())
    }

    /// Registered type names in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    fn find(&self, type_name: &str) -> Option<ElementFactory> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(type_name))
            .map(|(_, factory)| *factory)
    }
}
