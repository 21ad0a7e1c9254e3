use super::XmlError;
use crate::model::*;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

type XmlReader<'a> = Reader<&'a [u8]>;

pub(super) fn read_descriptor(xml: &str) -> Result<Descriptor, XmlError> {
    let mut reader = Reader::from_str(xml);

    loop {
        let (element, has_body) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::Eof => return Err(XmlError::MissingRoot),
            _ => continue,
        };

        if element.local_name().as_ref() != b"component" {
            return Err(XmlError::UnexpectedRoot(element_name(&element)));
        }

        let mut descriptor = read_component_attributes(&element)?;
        if has_body {
            read_component_body(&mut reader, &mut descriptor)?;
        }
        return Ok(descriptor);
    }
}

fn read_component_attributes(element: &BytesStart<'_>) -> Result<Descriptor, XmlError> {
    let mut attrs = Attributes::read(element)?;
    let mut descriptor = Descriptor::new();

    descriptor.name = attrs.take("name");
    descriptor.enabled = attrs.take_bool("component", "enabled")?;
    descriptor.immediate = attrs.take_bool("component", "immediate")?;
    descriptor.factory = attrs.take("factory");
    descriptor.configuration_policy = attrs.take_enum(
        "component",
        "configuration-policy",
        ConfigurationPolicy::from_value,
    )?;
    descriptor.activate = attrs.take("activate");
    descriptor.deactivate = attrs.take("deactivate");
    descriptor.modified = attrs.take("modified");
    Ok(descriptor)
}

fn read_component_body(reader: &mut XmlReader<'_>, descriptor: &mut Descriptor) -> Result<(), XmlError> {
    loop {
        let (element, has_body) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(unexpected_eof("component")),
            _ => continue,
        };

        match element.local_name().as_ref() {
            b"implementation" => {
                let mut attrs = Attributes::read(&element)?;
                descriptor.implementation_class = Some(attrs.require("implementation", "class")?);
                skip_body(reader, &element, has_body)?;
            }
            b"property" => {
                let property = read_property(reader, &element, has_body)?;
                descriptor.properties.push(PropertyEntry::Property(property));
            }
            b"properties" => {
                let mut attrs = Attributes::read(&element)?;
                let entry = attrs.require("properties", "entry")?;
                descriptor.properties.push(PropertyEntry::Properties { entry });
                skip_body(reader, &element, has_body)?;
            }
            b"service" => {
                descriptor.service = Some(read_service(reader, &element, has_body)?);
            }
            b"reference" => {
                descriptor.references.push(read_reference(&element)?);
                skip_body(reader, &element, has_body)?;
            }
            _ => {
                debug!(element = %element_name(&element), "ignoring unknown descriptor element");
                skip_body(reader, &element, has_body)?;
            }
        }
    }
}

fn read_property(
    reader: &mut XmlReader<'_>,
    element: &BytesStart<'_>,
    has_body: bool,
) -> Result<Property, XmlError> {
    let mut attrs = Attributes::read(element)?;
    let name = attrs.require("property", "name")?;
    let kind = attrs.take_enum("property", "type", JavaType::from_value)?;

    if let Some(value) = attrs.take("value") {
        skip_body(reader, element, has_body)?;
        return Ok(Property {
            name,
            kind,
            value: PropertyValue::Single(value),
        });
    }

    let mut body = String::new();
    if has_body {
        loop {
            match reader.read_event()? {
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| XmlError::Malformed(e.to_string()))?;
                    body.push_str(&text);
                }
                Event::CData(cdata) => body.push_str(&String::from_utf8_lossy(&cdata.into_inner())),
                Event::Start(nested) => reader.read_to_end(nested.name()).map(|_| ())?,
                Event::End(_) => break,
                Event::Eof => return Err(unexpected_eof("property")),
                _ => {}
            }
        }
    }

    Ok(Property {
        name,
        kind,
        value: PropertyValue::Multi(body),
    })
}

fn read_service(
    reader: &mut XmlReader<'_>,
    element: &BytesStart<'_>,
    has_body: bool,
) -> Result<Service, XmlError> {
    let mut attrs = Attributes::read(element)?;
    let mut service = Service {
        service_factory: attrs.take_bool("service", "servicefactory")?,
        provide: Vec::new(),
    };
    if !has_body {
        return Ok(service);
    }

    loop {
        let (child, child_body) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(_) => return Ok(service),
            Event::Eof => return Err(unexpected_eof("service")),
            _ => continue,
        };
        if child.local_name().as_ref() == b"provide" {
            let mut attrs = Attributes::read(&child)?;
            service.provide.push(attrs.require("provide", "interface")?);
        }
        skip_body(reader, &child, child_body)?;
    }
}

fn read_reference(element: &BytesStart<'_>) -> Result<Reference, XmlError> {
    let mut attrs = Attributes::read(element)?;
    let name = attrs.require("reference", "name")?;
    let interface = attrs.require("reference", "interface")?;
    let bind = attrs.require("reference", "bind")?;

    let mut reference = Reference::new(name, interface, bind);
    reference.unbind = attrs.take("unbind");
    reference.updated = attrs.take("updated");
    reference.target = attrs.take("target");
    reference.cardinality = attrs.take_enum("reference", "cardinality", Cardinality::from_value)?;
    reference.policy = attrs.take_enum("reference", "policy", Policy::from_value)?;
    reference.policy_option =
        attrs.take_enum("reference", "policy-option", PolicyOption::from_value)?;
    Ok(reference)
}

fn skip_body(reader: &mut XmlReader<'_>, element: &BytesStart<'_>, has_body: bool) -> Result<(), XmlError> {
    if has_body {
        reader.read_to_end(element.name())?;
    }
    Ok(())
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

fn unexpected_eof(element: &str) -> XmlError {
    XmlError::Malformed(format!("document ends inside <{}>", element))
}

// ── Attributes ──

/// Unescaped attributes of one element, keyed by local name.
struct Attributes(Vec<(String, String)>);

impl Attributes {
    fn read(element: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut values = Vec::new();
        for attr in element.attributes() {
            let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
            let key = attr.key.local_name();
            let key = String::from_utf8_lossy(key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| XmlError::Malformed(e.to_string()))?
                .into_owned();
            values.push((key, value));
        }
        Ok(Self(values))
    }

    fn take(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.swap_remove(index).1)
    }

    fn require(&mut self, element: &'static str, key: &'static str) -> Result<String, XmlError> {
        self.take(key).ok_or(XmlError::MissingAttribute {
            element,
            attribute: key,
        })
    }

    fn take_bool(&mut self, element: &'static str, key: &'static str) -> Result<Option<bool>, XmlError> {
        self.take_enum(element, key, |value| match value {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }

    fn take_enum<T>(
        &mut self,
        element: &'static str,
        key: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Option<T>, XmlError> {
        match self.take(key) {
            None => Ok(None),
            Some(value) => match parse(&value) {
                Some(parsed) => Ok(Some(parsed)),
                None => Err(XmlError::InvalidValue {
                    element,
                    attribute: key,
                    value,
                }),
            },
        }
    }
}
