//! Descriptor equivalence
//!
//! Decides whether a freshly built descriptor matches one that was persisted
//! earlier, so unchanged descriptor files are not rewritten.

use crate::model::Descriptor;
use crate::xml::{XmlAdapter, XmlError};

/// Structural equality plus the "is set" state of the lifecycle methods.
///
/// An unset activate method and an activate method set to `""` render
/// differently, so they never compare equal.
pub fn descriptors_equal(a: &Descriptor, b: &Descriptor) -> bool {
    a.activate.is_some() == b.activate.is_some()
        && a.deactivate.is_some() == b.deactivate.is_some()
        && a == b
}

/// Compare a descriptor against persisted XML text.
pub fn matches_persisted(
    adapter: &XmlAdapter,
    descriptor: &Descriptor,
    persisted: &str,
) -> Result<bool, XmlError> {
    let previous = adapter.from_xml(persisted)?;
    Ok(descriptors_equal(descriptor, &previous))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Reference, Service};

    fn descriptor() -> Descriptor {
        let mut d = Descriptor::new();
        d.implementation_class = Some("a.Impl".to_string());
        d.name = Some("a.Impl".to_string());
        d.service = Some(Service {
            service_factory: None,
            provide: vec!["a.Api".to_string()],
        });
        d.references.push(Reference::new("Log", "org.Log", "setLog"));
        d
    }

    #[test]
    fn test_equal_descriptors() {
        assert!(descriptors_equal(&descriptor(), &descriptor()));
    }

    #[test]
    fn test_unset_and_empty_activate_differ() {
        let a = descriptor();
        let mut b = descriptor();
        b.activate = Some(String::new());
        assert!(!descriptors_equal(&a, &b));
        assert!(!descriptors_equal(&b, &a));

        let mut c = descriptor();
        c.deactivate = Some(String::new());
        assert!(!descriptors_equal(&a, &c));
    }

    #[test]
    fn test_reference_order_matters() {
        let mut a = descriptor();
        a.references.push(Reference::new("Other", "org.Other", "setOther"));
        let mut b = descriptor();
        b.references.insert(0, Reference::new("Other", "org.Other", "setOther"));
        assert!(!descriptors_equal(&a, &b));
    }

    #[test]
    fn test_matches_persisted_ignores_header() {
        let adapter = XmlAdapter::default();
        let d = descriptor();
        let with_header = adapter.to_xml(&d, Some("src/a/Impl.java")).unwrap();
        assert!(matches_persisted(&adapter, &d, &with_header).unwrap());

        let mut changed = descriptor();
        changed.immediate = Some(true);
        assert!(!matches_persisted(&adapter, &changed, &with_header).unwrap());
        assert!(matches_persisted(&adapter, &d, "not xml <").is_err());
    }
}
