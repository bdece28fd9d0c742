//! Reference metadata for tags, attributes, and values: the provider
//! contract, an in-memory provider over the customData JSON format, the
//! ordered provider registry, and documentation rendering.

use std::collections::HashMap;

use lsp_types::{MarkupContent, MarkupKind};
use serde::{Deserialize, Serialize};

/// A documentation string, either plain or already formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Plain(String),
    Markup(MarkupContent),
}

impl Description {
    pub fn value(&self) -> &str {
        match self {
            Description::Plain(value) => value,
            Description::Markup(content) => &content.value,
        }
    }
}

/// A named link to external documentation (specifications, MDN, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    /// Name of a shared value set declared on the containing data document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ValueData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSet {
    pub name: String,
    pub values: Vec<ValueData>,
}

/// The customData document format: tag/attribute/value metadata with shared
/// value sets, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlDataV1 {
    pub version: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_attributes: Vec<AttributeData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_sets: Vec<ValueSet>,
}

/// Anything that carries a description and references; lets the
/// documentation renderer treat tags, attributes, and values uniformly.
pub trait Documented {
    fn description(&self) -> Option<&Description>;
    fn references(&self) -> &[Reference];
}

macro_rules! impl_documented {
    ($($ty:ty),*) => {
        $(impl Documented for $ty {
            fn description(&self) -> Option<&Description> {
                self.description.as_ref()
            }
            fn references(&self) -> &[Reference] {
                &self.references
            }
        })*
    };
}

impl_documented!(TagData, AttributeData, ValueData);

/// Switches for the two parts of a rendered documentation block. A field set
/// to `Some(false)` disables that part; anything else leaves it on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentationSettings {
    pub documentation: Option<bool>,
    pub references: Option<bool>,
}

/// Render a datum's documentation in the negotiated content format.
/// Returns `None` when nothing would be shown.
pub fn generate_documentation(
    item: &dyn Documented,
    settings: &DocumentationSettings,
    supports_markdown: bool,
) -> Option<MarkupContent> {
    let mut value = String::new();
    if settings.documentation != Some(false) {
        if let Some(description) = item.description() {
            value.push_str(description.value());
        }
    }
    let references = item.references();
    if !references.is_empty() && settings.references != Some(false) {
        if !value.is_empty() {
            value.push_str("\n\n");
        }
        let rendered: Vec<String> = if supports_markdown {
            references
                .iter()
                .map(|r| format!("[{}]({})", r.name, r.url))
                .collect()
        } else {
            references
                .iter()
                .map(|r| format!("{}: {}", r.name, r.url))
                .collect()
        };
        value.push_str(&rendered.join(if supports_markdown { " | " } else { "\n" }));
    }
    if value.is_empty() {
        None
    } else {
        Some(MarkupContent {
            kind: if supports_markdown {
                MarkupKind::Markdown
            } else {
                MarkupKind::PlainText
            },
            value,
        })
    }
}

/// A pluggable source of tag/attribute/value metadata.
pub trait HtmlDataProvider: Send + Sync {
    fn id(&self) -> &str;
    /// Whether this provider applies to documents with the given language tag.
    fn is_applicable(&self, language_id: &str) -> bool;
    fn provide_tags(&self) -> &[TagData];
    /// Attributes valid on `tag`, including global attributes.
    fn provide_attributes(&self, tag: &str) -> Vec<AttributeData>;
    /// Values valid for `attribute` on `tag`, with value-set names resolved.
    fn provide_values(&self, tag: &str, attribute: &str) -> Vec<ValueData>;
}

/// A provider backed by one [`HtmlDataV1`] document.
pub struct StaticDataProvider {
    id: String,
    tags: Vec<TagData>,
    tags_by_name: HashMap<String, usize>,
    global_attributes: Vec<AttributeData>,
    value_sets: HashMap<String, Vec<ValueData>>,
}

impl StaticDataProvider {
    pub fn new(id: impl Into<String>, data: HtmlDataV1) -> Self {
        let tags_by_name = data
            .tags
            .iter()
            .enumerate()
            .map(|(index, tag)| (tag.name.to_ascii_lowercase(), index))
            .collect();
        let value_sets = data
            .value_sets
            .into_iter()
            .map(|set| (set.name, set.values))
            .collect();
        Self {
            id: id.into(),
            tags: data.tags,
            tags_by_name,
            global_attributes: data.global_attributes,
            value_sets,
        }
    }

    pub fn from_json(id: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(id, serde_json::from_str(json)?))
    }

    fn collect_values(&self, attributes: &[AttributeData], attribute: &str, out: &mut Vec<ValueData>) {
        for candidate in attributes {
            if candidate.name.eq_ignore_ascii_case(attribute) {
                out.extend(candidate.values.iter().cloned());
                if let Some(set) = candidate
                    .value_set
                    .as_ref()
                    .and_then(|name| self.value_sets.get(name))
                {
                    out.extend(set.iter().cloned());
                }
            }
        }
    }
}

impl HtmlDataProvider for StaticDataProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_applicable(&self, _language_id: &str) -> bool {
        true
    }

    fn provide_tags(&self) -> &[TagData] {
        &self.tags
    }

    fn provide_attributes(&self, tag: &str) -> Vec<AttributeData> {
        let mut attributes = Vec::new();
        if let Some(&index) = self.tags_by_name.get(&tag.to_ascii_lowercase()) {
            attributes.extend(self.tags[index].attributes.iter().cloned());
        }
        attributes.extend(self.global_attributes.iter().cloned());
        attributes
    }

    fn provide_values(&self, tag: &str, attribute: &str) -> Vec<ValueData> {
        let mut values = Vec::new();
        if let Some(&index) = self.tags_by_name.get(&tag.to_ascii_lowercase()) {
            self.collect_values(&self.tags[index].attributes, attribute, &mut values);
        }
        self.collect_values(&self.global_attributes, attribute, &mut values);
        values
    }
}

/// Ordered registry of data providers. Queries walk providers in
/// registration order; the first non-empty answer wins, so order is
/// precedence.
#[derive(Default)]
pub struct HtmlDataManager {
    providers: Vec<Box<dyn HtmlDataProvider>>,
}

impl HtmlDataManager {
    pub fn new(providers: Vec<Box<dyn HtmlDataProvider>>) -> Self {
        Self { providers }
    }

    pub fn set_data_providers(&mut self, providers: Vec<Box<dyn HtmlDataProvider>>) {
        self.providers = providers;
    }

    pub fn add_data_provider(&mut self, provider: Box<dyn HtmlDataProvider>) {
        self.providers.push(provider);
    }

    pub fn get_data_providers(&self) -> &[Box<dyn HtmlDataProvider>] {
        &self.providers
    }

    /// Providers applicable to the given language tag, in registration order.
    pub fn providers_for<'a>(
        &'a self,
        language_id: &'a str,
    ) -> impl Iterator<Item = &'a dyn HtmlDataProvider> {
        self.providers
            .iter()
            .filter(move |provider| provider.is_applicable(language_id))
            .map(|provider| provider.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM_DATA: &str = r#"{
        "version": 1.1,
        "tags": [
            {
                "name": "foo",
                "description": "The foo element",
                "attributes": [
                    {
                        "name": "bar",
                        "description": { "kind": "markdown", "value": "The **bar** attribute" },
                        "valueSet": "v"
                    }
                ],
                "references": [
                    { "name": "Spec", "url": "https://example.test/foo" }
                ]
            }
        ],
        "globalAttributes": [
            { "name": "id", "description": "Unique identifier" }
        ],
        "valueSets": [
            {
                "name": "v",
                "values": [
                    { "name": "baz", "description": "The baz value" }
                ]
            }
        ]
    }"#;

    fn provider() -> StaticDataProvider {
        StaticDataProvider::from_json("test", CUSTOM_DATA).expect("valid custom data")
    }

    #[test]
    fn parses_custom_data_json() {
        let provider = provider();
        assert_eq!(provider.id(), "test");
        assert_eq!(provider.provide_tags().len(), 1);
        let tag = &provider.provide_tags()[0];
        assert_eq!(tag.name, "foo");
        assert_eq!(
            tag.description.as_ref().map(|d| d.value()),
            Some("The foo element")
        );
    }

    #[test]
    fn attributes_include_globals() {
        let provider = provider();
        let names: Vec<_> = provider
            .provide_attributes("foo")
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, ["bar", "id"]);
        // Unknown tags still get the globals.
        let names: Vec<_> = provider
            .provide_attributes("nope")
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, ["id"]);
    }

    #[test]
    fn values_resolve_value_sets() {
        let provider = provider();
        let values = provider.provide_values("foo", "bar");
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].name, "baz");
        assert!(provider.provide_values("foo", "other").is_empty());
    }

    #[test]
    fn documentation_renders_markdown_references() {
        let provider = provider();
        let tag = &provider.provide_tags()[0];
        let content =
            generate_documentation(tag, &DocumentationSettings::default(), true).unwrap();
        assert_eq!(content.kind, MarkupKind::Markdown);
        assert_eq!(
            content.value,
            "The foo element\n\n[Spec](https://example.test/foo)"
        );
    }

    #[test]
    fn documentation_demotes_to_plain_text() {
        let provider = provider();
        let tag = &provider.provide_tags()[0];
        let content =
            generate_documentation(tag, &DocumentationSettings::default(), false).unwrap();
        assert_eq!(content.kind, MarkupKind::PlainText);
        assert_eq!(
            content.value,
            "The foo element\n\nSpec: https://example.test/foo"
        );
    }

    #[test]
    fn documentation_settings_disable_parts() {
        let provider = provider();
        let tag = &provider.provide_tags()[0];
        let no_references = DocumentationSettings {
            references: Some(false),
            ..Default::default()
        };
        let content = generate_documentation(tag, &no_references, true).unwrap();
        assert_eq!(content.value, "The foo element");

        let nothing = DocumentationSettings {
            documentation: Some(false),
            references: Some(false),
        };
        assert_eq!(generate_documentation(tag, &nothing, true), None);
    }

    #[test]
    fn documentation_is_none_without_description() {
        let value = ValueData {
            name: "empty".to_string(),
            description: None,
            references: Vec::new(),
        };
        assert_eq!(
            generate_documentation(&value, &DocumentationSettings::default(), true),
            None
        );
    }

    #[test]
    fn registry_preserves_registration_order() {
        let mut manager = HtmlDataManager::default();
        manager.add_data_provider(Box::new(StaticDataProvider::new(
            "first",
            HtmlDataV1 {
                version: 1.0,
                tags: Vec::new(),
                global_attributes: Vec::new(),
                value_sets: Vec::new(),
            },
        )));
        manager.add_data_provider(Box::new(provider()));
        let ids: Vec<_> = manager.providers_for("html").map(|p| p.id().to_string()).collect();
        assert_eq!(ids, ["first", "test"]);
    }
}
