use super::{SchemaDefinition, XmlError, GENERATOR};
use crate::model::*;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Render the document. Children are written in schema order:
/// implementation, properties, service, references.
pub(super) fn write_descriptor(
    schema: &SchemaDefinition,
    descriptor: &Descriptor,
    source: Option<&str>,
) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    if let Some(source) = source {
        let comment = format!(" Generated by {} from {} ", GENERATOR, comment_safe(source));
        writer.write_event(Event::Comment(BytesText::from_escaped(comment)))?;
    }

    let root_name = format!("{}:component", schema.prefix);
    let xmlns = format!("xmlns:{}", schema.prefix);
    let mut root = BytesStart::new(root_name.as_str());
    root.push_attribute((xmlns.as_str(), schema.namespace.as_str()));
    push_opt(&mut root, "name", descriptor.name.as_deref());
    push_opt(&mut root, "enabled", descriptor.enabled.map(bool_str));
    push_opt(&mut root, "immediate", descriptor.immediate.map(bool_str));
    push_opt(&mut root, "factory", descriptor.factory.as_deref());
    push_opt(
        &mut root,
        "configuration-policy",
        descriptor.configuration_policy.map(|p| p.as_str()),
    );
    push_opt(&mut root, "activate", descriptor.activate.as_deref());
    push_opt(&mut root, "deactivate", descriptor.deactivate.as_deref());
    push_opt(&mut root, "modified", descriptor.modified.as_deref());
    writer.write_event(Event::Start(root))?;

    if let Some(class) = descriptor.implementation_class.as_deref() {
        let mut implementation = BytesStart::new("implementation");
        implementation.push_attribute(("class", class));
        writer.write_event(Event::Empty(implementation))?;
    }

    for entry in &descriptor.properties {
        write_property_entry(&mut writer, entry)?;
    }

    if let Some(service) = &descriptor.service {
        write_service(&mut writer, service)?;
    }

    for reference in &descriptor.references {
        writer.write_event(Event::Empty(reference_element(reference)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(root_name.as_str())))?;

    let bytes = writer.into_inner().into_inner();
    let mut xml = String::from_utf8(bytes)?;
    if !xml.ends_with('\n') {
        xml.push('\n');
    }
    Ok(xml)
}

fn write_property_entry(writer: &mut XmlWriter, entry: &PropertyEntry) -> Result<(), XmlError> {
    match entry {
        PropertyEntry::Properties { entry } => {
            let mut element = BytesStart::new("properties");
            element.push_attribute(("entry", entry.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        PropertyEntry::Property(property) => {
            let mut element = BytesStart::new("property");
            element.push_attribute(("name", property.name.as_str()));
            push_opt(&mut element, "type", property.kind.map(|k| k.as_str()));
            match &property.value {
                PropertyValue::Single(value) => {
                    element.push_attribute(("value", value.as_str()));
                    writer.write_event(Event::Empty(element))?;
                }
                // Multi-valued properties carry their values as element text.
                PropertyValue::Multi(body) => {
                    writer.write_event(Event::Start(element))?;
                    writer.write_event(Event::Text(BytesText::new(body)))?;
                    writer.write_event(Event::End(BytesEnd::new("property")))?;
                }
            }
        }
    }
    Ok(())
}

fn write_service(writer: &mut XmlWriter, service: &Service) -> Result<(), XmlError> {
    let mut element = BytesStart::new("service");
    push_opt(&mut element, "servicefactory", service.service_factory.map(bool_str));

    if service.provide.is_empty() {
        writer.write_event(Event::Empty(element))?;
        return Ok(());
    }

    writer.write_event(Event::Start(element))?;
    for interface in &service.provide {
        let mut provide = BytesStart::new("provide");
        provide.push_attribute(("interface", interface.as_str()));
        writer.write_event(Event::Empty(provide))?;
    }
    writer.write_event(Event::End(BytesEnd::new("service")))?;
    Ok(())
}

fn reference_element(reference: &Reference) -> BytesStart<'_> {
    let mut element = BytesStart::new("reference");
    element.push_attribute(("name", reference.name.as_str()));
    element.push_attribute(("interface", reference.interface.as_str()));
    push_opt(&mut element, "cardinality", reference.cardinality.map(|c| c.as_str()));
    push_opt(&mut element, "policy", reference.policy.map(|p| p.as_str()));
    push_opt(
        &mut element,
        "policy-option",
        reference.policy_option.map(|p| p.as_str()),
    );
    push_opt(&mut element, "target", reference.target.as_deref());
    element.push_attribute(("bind", reference.bind.as_str()));
    push_opt(&mut element, "unbind", reference.unbind.as_deref());
    push_opt(&mut element, "updated", reference.updated.as_deref());
    element
}

fn push_opt(element: &mut BytesStart<'_>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        element.push_attribute((key, value));
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// `--` is not allowed inside an XML comment, nor is a trailing `-`.
fn comment_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '-' && out.ends_with('-') {
            out.push(' ');
        }
        out.push(ch);
    }
    if out.ends_with('-') {
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_safe_separates_every_dash_pair() {
        assert_eq!(comment_safe("src/a---b/Impl.java"), "src/a- - -b/Impl.java");
        assert_eq!(comment_safe("src/a-b/Impl.java"), "src/a-b/Impl.java");
        assert_eq!(comment_safe("out-"), "out- ");
        for path in ["--", "----x", "a--b---c-"] {
            let safe = comment_safe(path);
            assert!(!safe.contains("--"), "{:?} -> {:?}", path, safe);
            assert!(!safe.ends_with('-'));
        }
    }
}
