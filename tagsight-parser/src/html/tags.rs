//! Element classification tables used by the scanner and parser.

use once_cell::sync::Lazy;
use std::collections::HashSet;

static VOID_ELEMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "menuitem",
        "meta", "param", "source", "track", "wbr",
    ]
    .into_iter()
    .collect()
});

/// Whether `name` is a void element, one whose start tag never has a matching
/// end tag. Case-insensitive.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(name.to_ascii_lowercase().as_str())
}

/// Whether `name` is an element whose content the scanner treats as an opaque
/// span rather than markup. Case-insensitive.
pub fn is_raw_text_element(name: &str) -> bool {
    name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style")
}
