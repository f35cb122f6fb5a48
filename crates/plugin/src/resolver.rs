//! Resolution of raw extension references into descriptors.

use crate::boundary::guarded;
use crate::extension::{Extension, ExtensionRef};

/// Turns a reference into a usable extension.
///
/// Descriptors are returned unchanged. Factories are invoked inside a
/// failure boundary; an error or panic yields `None`. The failure is logged
/// here because the caller has no extension identity to report it against.
pub fn resolve(reference: ExtensionRef) -> Option<Box<dyn Extension>> {
    match reference {
        ExtensionRef::Descriptor(extension) => Some(extension),
        ExtensionRef::Factory(factory) => match guarded(factory) {
            Ok(extension) => Some(extension),
            Err(e) => {
                tracing::warn!(error = %e, "extension factory failed");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;
    use crate::extension::ExtensionDescriptor;

    #[test]
    fn test_descriptor_passes_through() {
        let reference = ExtensionRef::descriptor(ExtensionDescriptor::new("mod.a", |_| Ok(())));
        let extension = resolve(reference).unwrap();
        assert_eq!(extension.id(), "mod.a");
    }

    #[test]
    fn test_factory_is_invoked() {
        let reference = ExtensionRef::factory(|| {
            Ok(ExtensionDescriptor::new("mod.b", |_| Ok(())).with_version("2.0.0"))
        });
        let extension = resolve(reference).unwrap();
        assert_eq!(extension.id(), "mod.b");
        assert_eq!(extension.version(), Some("2.0.0"));
    }

    #[test]
    fn test_failing_factory_resolves_to_none() {
        let reference = ExtensionRef::factory::<ExtensionDescriptor, _>(|| {
            Err(PluginError::extension("missing asset pack"))
        });
        assert!(resolve(reference).is_none());
    }

    #[test]
    fn test_panicking_factory_resolves_to_none() {
        let reference =
            ExtensionRef::factory::<ExtensionDescriptor, _>(|| panic!("constructor exploded"));
        assert!(resolve(reference).is_none());
    }
}
