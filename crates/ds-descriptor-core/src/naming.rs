//! Name inference for references and their lifecycle methods.

/// Prefixes stripped from a bind method to obtain a reference name, in
/// priority order. Only the first match is stripped.
const REFERENCE_NAME_PREFIXES: [&str; 3] = ["add", "set", "bind"];

/// Explicit unbind/updated value meaning "there is no such method".
pub const NO_METHOD: &str = "-";

/// Reference name derived from a bind method name.
///
/// Returns `None` when nothing remains after stripping (`bind="set"`).
pub fn derive_reference_name(bind: &str) -> Option<&str> {
    let name = REFERENCE_NAME_PREFIXES
        .iter()
        .find_map(|prefix| bind.strip_prefix(prefix))
        .unwrap_or(bind);
    (!name.is_empty()).then_some(name)
}

/// Conventional unbind method for a bind method.
///
/// `setFoo` → `unsetFoo`, `addFoo` → `removeFoo`, anything else gets `un`.
pub fn derive_unbind_name(bind: &str) -> String {
    if let Some(rest) = bind.strip_prefix("set") {
        format!("unset{}", rest)
    } else if let Some(rest) = bind.strip_prefix("add") {
        format!("remove{}", rest)
    } else {
        format!("un{}", bind)
    }
}

/// Conventional updated method for a bind method.
///
/// `set`, `add` and `bind` prefixes are replaced by `updated`; otherwise
/// `updated` is prepended to the whole name.
pub fn derive_updated_name(bind: &str) -> String {
    let rest = ["set", "add", "bind"]
        .iter()
        .find_map(|prefix| bind.strip_prefix(prefix))
        .unwrap_or(bind);
    format!("updated{}", rest)
}

/// True if the value is absent or whitespace only.
pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
