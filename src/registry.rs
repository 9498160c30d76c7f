//! Extension tag registry.
//!
//! Maps each extension tag to the concrete type that owns it, so that
//! extensions can be instantiated while decoding into a [`crate::Value`].
//! A tag belongs to one type for the lifetime of the registry.

use crate::ext::{Corker, Selfer};
use crate::{CorkError, Result};
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

#[derive(Clone, Copy)]
enum Factory {
    Corker(fn() -> Box<dyn Corker>),
    Selfer(fn() -> Box<dyn Selfer>),
}

#[derive(Clone, Copy)]
struct Entry {
    type_id: TypeId,
    type_name: &'static str,
    factory: Factory,
}

fn make_corker<T: Corker + Default + 'static>() -> Box<dyn Corker> {
    Box::new(T::default())
}

fn make_selfer<T: Selfer + Default + 'static>() -> Box<dyn Selfer> {
    Box::new(T::default())
}

/// Thread-safe tag → type table.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<u8, Entry>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        let mut map = f.debug_map();
        for (tag, entry) in entries.iter() {
            map.entry(tag, &entry.type_name);
        }
        map.finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by readers unless another is injected.
    pub fn global() -> Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Registry::new())).clone()
    }

    /// Registers `T` under the tag reported by `sample`.
    ///
    /// # Errors
    /// `DuplicateExtension` if a different type already owns the tag.
    /// Registering the same type twice is a no-op.
    pub fn register_corker<T: Corker + Default + 'static>(&self, sample: &T) -> Result<()> {
        self.insert(
            sample.ext_tag(),
            Entry {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                factory: Factory::Corker(make_corker::<T>),
            },
        )
    }

    /// Registers the stream-protocol type `T` under the tag reported by `sample`.
    pub fn register_selfer<T: Selfer + Default + 'static>(&self, sample: &T) -> Result<()> {
        self.insert(
            sample.ext_tag(),
            Entry {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                factory: Factory::Selfer(make_selfer::<T>),
            },
        )
    }

    fn insert(&self, tag: u8, entry: Entry) -> Result<()> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&tag) {
            if existing.type_id == entry.type_id {
                return Ok(());
            }
            tracing::debug!(
                tag,
                existing = existing.type_name,
                incoming = entry.type_name,
                "rejected conflicting extension registration"
            );
            return Err(CorkError::DuplicateExtension {
                tag,
                existing: existing.type_name,
                incoming: entry.type_name,
            });
        }
        tracing::debug!(tag, type_name = entry.type_name, "registered extension");
        entries.insert(tag, entry);
        Ok(())
    }

    pub fn contains(&self, tag: u8) -> bool {
        self.entries.read().contains_key(&tag)
    }

    /// Name of the type registered under `tag`.
    pub fn type_name(&self, tag: u8) -> Option<&'static str> {
        self.entries.read().get(&tag).map(|e| e.type_name)
    }

    fn lookup(&self, tag: u8) -> Result<Entry> {
        self.entries
            .read()
            .get(&tag)
            .copied()
            .ok_or(CorkError::UnregisteredExtension(tag))
    }

    /// A fresh default instance of the buffer-protocol type owning `tag`.
    pub fn new_corker(&self, tag: u8) -> Result<Box<dyn Corker>> {
        match self.lookup(tag)?.factory {
            Factory::Corker(make) => Ok(make()),
            Factory::Selfer(_) => Err(CorkError::mismatch("buffer extension", tag)),
        }
    }

    /// A fresh default instance of the stream-protocol type owning `tag`.
    pub fn new_selfer(&self, tag: u8) -> Result<Box<dyn Selfer>> {
        match self.lookup(tag)?.factory {
            Factory::Selfer(make) => Ok(make()),
            Factory::Corker(_) => Err(CorkError::mismatch("stream extension", tag)),
        }
    }
}

/// Registers a buffer-protocol type with the global registry.
pub fn register<T: Corker + Default + 'static>(sample: &T) -> Result<()> {
    Registry::global().register_corker(sample)
}

/// Registers a stream-protocol type with the global registry.
pub fn register_selfer<T: Selfer + Default + 'static>(sample: &T) -> Result<()> {
    Registry::global().register_selfer(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::ExtError;

    #[derive(Debug, Default)]
    struct Celsius(i8);

    impl Corker for Celsius {
        fn ext_tag(&self) -> u8 {
            9
        }
        fn marshal_cork(&self) -> std::result::Result<Vec<u8>, ExtError> {
            Ok(vec![self.0 as u8])
        }
        fn unmarshal_cork(&mut self, data: &[u8]) -> std::result::Result<(), ExtError> {
            self.0 = *data.first().ok_or("empty payload")? as i8;
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Fahrenheit(i8);

    impl Corker for Fahrenheit {
        fn ext_tag(&self) -> u8 {
            9
        }
        fn marshal_cork(&self) -> std::result::Result<Vec<u8>, ExtError> {
            Ok(vec![self.0 as u8])
        }
        fn unmarshal_cork(&mut self, _: &[u8]) -> std::result::Result<(), ExtError> {
            Ok(())
        }
    }

    #[test]
    fn same_type_twice_is_noop() {
        let registry = Registry::new();
        registry.register_corker(&Celsius(1)).unwrap();
        registry.register_corker(&Celsius(2)).unwrap();
        assert!(registry.contains(9));
        assert!(registry.type_name(9).unwrap().ends_with("Celsius"));
    }

    #[test]
    fn conflicting_type_is_rejected() {
        let registry = Registry::new();
        registry.register_corker(&Celsius(1)).unwrap();
        let err = registry.register_corker(&Fahrenheit(1)).unwrap_err();
        assert!(matches!(err, CorkError::DuplicateExtension { tag: 9, .. }));
    }

    #[test]
    fn unknown_tag() {
        let registry = Registry::new();
        assert!(matches!(
            registry.new_corker(3),
            Err(CorkError::UnregisteredExtension(3))
        ));
        registry.register_corker(&Celsius::default()).unwrap();
        assert!(matches!(
            registry.new_selfer(9),
            Err(CorkError::TypeMismatch { .. })
        ));
    }
}
