//! Templates and the loader collaborator.
//!
//! A [`Template`] is a reusable blueprint from which a live instance can be
//! produced; the [`TemplateLoader`] resolves a logical, slash-separated path
//! to a template or fails. Loading is synchronous from the registry's point
//! of view: by the time resolution returns, the loader has either produced a
//! template or reported it missing.
//!
//! [`MemoryTemplates`] is the in-process loader implementation. Hosts backed
//! by an asset pipeline implement [`TemplateLoader`] over their own storage.

use std::{any::Any, collections::HashMap};

/// A blueprint that produces a fresh value each time it is instantiated.
///
/// The produced value is type-erased; resolution downcasts it to the
/// requested singleton type and treats a mismatch as a missing template.
pub struct Template {
    produce: Box<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>,
}

impl Template {
    /// Construct a template from a producer closure.
    pub fn new<T, F>(produce: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            produce: Box::new(move || Box::new(produce())),
        }
    }

    /// Construct a template that clones a prototype value. This is the
    /// common case of a template carrying authored field values.
    pub fn of_value<T>(prototype: T) -> Self
    where
        T: Any + Send + Sync + Clone,
    {
        Self::new(move || prototype.clone())
    }

    /// Produce a fresh, type-erased value from this template.
    pub fn instantiate(&self) -> Box<dyn Any + Send + Sync> {
        (self.produce)()
    }
}

/// Resolves a logical template path to a loadable template.
pub trait TemplateLoader {
    /// Load the template at `path`, or `None` if nothing exists there.
    fn load(&self, path: &str) -> Option<&Template>;
}

/// An in-process template store keyed by logical path.
#[derive(Default)]
pub struct MemoryTemplates {
    templates: HashMap<String, Template>,
}

impl MemoryTemplates {
    /// Create an empty template store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under a logical path, replacing any previous one.
    pub fn insert(&mut self, path: impl Into<String>, template: Template) {
        self.templates.insert(path.into(), template);
    }

    /// Builder-style variant of [`insert`](MemoryTemplates::insert).
    pub fn with(mut self, path: impl Into<String>, template: Template) -> Self {
        self.insert(path, template);
        self
    }
}

impl TemplateLoader for MemoryTemplates {
    fn load(&self, path: &str) -> Option<&Template> {
        self.templates.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct SpawnPoint {
        x: f32,
        y: f32,
    }

    #[test]
    fn template_produces_fresh_values() {
        // Given
        let template = Template::of_value(SpawnPoint { x: 1.0, y: 2.0 });

        // When
        let first = template.instantiate().downcast::<SpawnPoint>().unwrap();
        let second = template.instantiate().downcast::<SpawnPoint>().unwrap();

        // Then
        assert_eq!(*first, SpawnPoint { x: 1.0, y: 2.0 });
        assert_eq!(*first, *second);
    }

    #[test]
    fn producer_closure_controls_the_value() {
        let template = Template::new(|| SpawnPoint { x: 0.0, y: -1.0 });

        let value = template.instantiate().downcast::<SpawnPoint>().unwrap();

        assert_eq!(value.y, -1.0);
    }

    #[test]
    fn loader_misses_on_unknown_path() {
        let templates = MemoryTemplates::new();

        assert!(templates.load("Singletons/Nothing").is_none());
    }

    #[test]
    fn loader_resolves_registered_path() {
        let templates = MemoryTemplates::new()
            .with("Spawns/Default", Template::of_value(SpawnPoint { x: 3.0, y: 4.0 }));

        let template = templates.load("Spawns/Default").unwrap();
        let value = template.instantiate().downcast::<SpawnPoint>().unwrap();

        assert_eq!(value.x, 3.0);
    }

    #[test]
    fn insert_replaces_previous_template() {
        let mut templates = MemoryTemplates::new();
        templates.insert("Spawns/Default", Template::of_value(SpawnPoint { x: 0.0, y: 0.0 }));
        templates.insert("Spawns/Default", Template::of_value(SpawnPoint { x: 9.0, y: 9.0 }));

        let value = templates
            .load("Spawns/Default")
            .unwrap()
            .instantiate()
            .downcast::<SpawnPoint>()
            .unwrap();

        assert_eq!(value.x, 9.0);
    }
}
