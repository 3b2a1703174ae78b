//! Attribute model - types, values and translations
//!
//! An [`AttributeType`] describes one named attribute of an owner class. Types
//! are either class-wide ([`TypeScope::Class`]) or bound to one owner instance
//! ([`TypeScope::Instance`]); an instance-scoped type overrides the class-wide
//! one of the same name for that instance only.
//!
//! Values come in four shapes, see [`AttributeValue`].

use crate::datatype::{DataType, DataTypeRegistry, Value};
use crate::locale::{Locale, LocaleResolver, Localized};
use crate::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Which owners a type applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeScope {
    /// Every instance of the owner class
    #[default]
    Class,
    /// One owner instance, overriding the class-wide type
    Instance(String),
}

impl TypeScope {
    /// `None` and `Some("")` both mean class scope
    pub fn from_owner_id(owner_id: Option<&str>) -> Self {
        match owner_id {
            Some(id) if !id.is_empty() => TypeScope::Instance(id.to_string()),
            _ => TypeScope::Class,
        }
    }

    /// Storage form: `NULL` for class scope
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            TypeScope::Class => None,
            TypeScope::Instance(id) => Some(id),
        }
    }
}

impl std::fmt::Display for TypeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeScope::Class => write!(f, "*"),
            TypeScope::Instance(id) => write!(f, "{}", id),
        }
    }
}

/// Description of one named attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeType {
    /// Attribute name, unique per owner class and scope
    pub name: String,
    /// Co-sort key
    pub group: String,
    /// Ordinal within the group
    pub index: Option<i64>,
    /// Coercion strategy between stored text and typed values
    pub data_type: DataType,
    pub required: bool,
    pub multi_valued: bool,
    pub multi_lingual: bool,
    /// Scope the type was declared in (set by the store on load)
    pub scope: TypeScope,
}

impl AttributeType {
    /// Create a scalar, optional, single-language type
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            group: String::new(),
            index: None,
            data_type,
            required: false,
            multi_valued: false,
            multi_lingual: false,
            scope: TypeScope::Class,
        }
    }

    /// Set the group and ordinal
    pub fn in_group(mut self, group: impl Into<String>, index: Option<i64>) -> Self {
        self.group = group.into();
        self.index = index;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    pub fn multi_lingual(mut self) -> Self {
        self.multi_lingual = true;
        self
    }
}

/// Serializable type definition; the data type is kept as identifier + parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub index: Option<i64>,
    pub data_type: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multi_valued: bool,
    #[serde(default)]
    pub multi_lingual: bool,
}

impl TypeDefinition {
    /// Resolve the data type through the registry
    pub fn resolve(&self, registry: &DataTypeRegistry) -> Result<AttributeType> {
        Ok(AttributeType {
            name: self.name.clone(),
            group: self.group.clone(),
            index: self.index,
            data_type: registry.resolve(&self.data_type, &self.parameters)?,
            required: self.required,
            multi_valued: self.multi_valued,
            multi_lingual: self.multi_lingual,
            scope: TypeScope::Class,
        })
    }
}

impl From<&AttributeType> for TypeDefinition {
    fn from(ty: &AttributeType) -> Self {
        Self {
            name: ty.name.clone(),
            group: ty.group.clone(),
            index: ty.index,
            data_type: ty.data_type.name().to_string(),
            parameters: ty.data_type.parameters(),
            required: ty.required,
            multi_valued: ty.multi_valued,
            multi_lingual: ty.multi_lingual,
        }
    }
}

/// Effective types for one owner, keyed by attribute name, in (group, index) order.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    types: Vec<AttributeType>,
    by_name: HashMap<String, usize>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a type; a type with the same name is replaced in place
    pub fn insert(&mut self, ty: AttributeType) {
        let existing = self.by_name.get(&ty.name).copied();
        match existing {
            Some(i) => self.types[i] = ty,
            None => {
                self.by_name.insert(ty.name.clone(), self.types.len());
                self.types.push(ty);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeType> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names of required types with no value in `attrs`
    pub fn missing_required<'a>(&'a self, attrs: &AttributeMap) -> Vec<&'a str> {
        self.types
            .iter()
            .filter(|ty| ty.required && !attrs.contains_key(&ty.name))
            .map(|ty| ty.name.as_str())
            .collect()
    }
}

impl FromIterator<AttributeType> for TypeMap {
    fn from_iter<I: IntoIterator<Item = AttributeType>>(iter: I) -> Self {
        let mut map = TypeMap::new();
        for ty in iter {
            map.insert(ty);
        }
        map
    }
}

impl<'a> IntoIterator for &'a TypeMap {
    type Item = &'a AttributeType;
    type IntoIter = std::slice::Iter<'a, AttributeType>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TranslationEntry {
    value: Value,
    /// Fallback derived from a country-specific entry rather than recorded directly
    inherited: bool,
}

/// A value translated into several locales.
///
/// A language-only entry is the fallback for its language. Recording a
/// country-specific entry for a language with no fallback also installs an
/// inherited fallback with the same value; an explicit fallback recorded later
/// replaces it. Once an explicit fallback exists, further fallbacks for the same
/// language are ignored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Translation {
    entries: BTreeMap<Locale, TranslationEntry>,
}

/// Borrowed view of one translation entry, usable as a resolver candidate.
#[derive(Debug, Clone, Copy)]
pub struct TranslationCandidate<'a> {
    pub locale: &'a Locale,
    pub value: &'a Value,
}

impl Localized for TranslationCandidate<'_> {
    fn locale(&self) -> &Locale {
        self.locale
    }
}

impl Translation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Translation::insert`]
    pub fn with(mut self, locale: Locale, value: impl Into<Value>) -> Self {
        self.insert(locale, value.into());
        self
    }

    /// Record a value for a locale, applying fallback precedence
    pub fn insert(&mut self, locale: Locale, value: Value) {
        if locale.is_language_only() {
            let recorded = self.entries.get(&locale).is_some_and(|e| !e.inherited);
            if recorded {
                tracing::debug!("Skipping duplicate fallback for language {}", locale.language);
            } else {
                self.entries.insert(locale, TranslationEntry { value, inherited: false });
            }
            return;
        }

        let fallback = locale.language_only();
        if !self.entries.contains_key(&fallback) {
            self.entries.insert(
                fallback,
                TranslationEntry {
                    value: value.clone(),
                    inherited: true,
                },
            );
        }
        self.entries.insert(locale, TranslationEntry { value, inherited: false });
    }

    /// Value recorded for exactly this locale (inherited fallbacks included)
    pub fn get(&self, locale: &Locale) -> Option<&Value> {
        self.entries.get(locale).map(|e| &e.value)
    }

    /// Best value for the preferred locales
    pub fn resolve(&self, preferred: &[Locale], resolver: &LocaleResolver) -> Option<&Value> {
        let candidates = self.candidates();
        resolver.resolve(&candidates, preferred).map(|c| c.value)
    }

    /// All entries, inherited fallbacks included
    pub fn candidates(&self) -> Vec<TranslationCandidate<'_>> {
        self.entries
            .iter()
            .map(|(locale, entry)| TranslationCandidate { locale, value: &entry.value })
            .collect()
    }

    /// Entries that were recorded directly; these are what gets persisted
    pub fn explicit(&self) -> impl Iterator<Item = (&Locale, &Value)> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.inherited)
            .map(|(locale, entry)| (locale, &entry.value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Serialize for Translation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let explicit: Vec<_> = self.explicit().collect();
        let mut map = serializer.serialize_map(Some(explicit.len()))?;
        for (locale, value) in explicit {
            map.serialize_entry(&locale.to_locale_string(), value)?;
        }
        map.end()
    }
}

/// The value of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Scalar value
    Single(Value),
    /// Ordered values; `None` elements are skipped on write
    List(Vec<Option<Value>>),
    /// Scalar value per locale
    Translated(Translation),
    /// Ordered translated values; `None` elements are skipped on write
    TranslatedList(Vec<Option<Translation>>),
}

impl AttributeValue {
    /// Build a list without gaps
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        AttributeValue::List(values.into_iter().map(|v| Some(v.into())).collect())
    }

    pub fn as_translation(&self) -> Option<&Translation> {
        match self {
            AttributeValue::Translated(t) => Some(t),
            _ => None,
        }
    }

    /// Collapse translations to the best value for `preferred`
    pub fn localize(&self, preferred: &[Locale], resolver: &LocaleResolver) -> LocalizedValue {
        match self {
            AttributeValue::Single(v) => LocalizedValue::Single(Some(v.clone())),
            AttributeValue::List(values) => LocalizedValue::List(values.clone()),
            AttributeValue::Translated(t) => {
                LocalizedValue::Single(t.resolve(preferred, resolver).cloned())
            }
            AttributeValue::TranslatedList(list) => LocalizedValue::List(
                list.iter()
                    .map(|t| t.as_ref().and_then(|t| t.resolve(preferred, resolver).cloned()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for AttributeValue {
    fn from(v: Value) -> Self {
        AttributeValue::Single(v)
    }
}

impl From<Translation> for AttributeValue {
    fn from(t: Translation) -> Self {
        AttributeValue::Translated(t)
    }
}

/// An attribute value with translations collapsed for one reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocalizedValue {
    Single(Option<Value>),
    List(Vec<Option<Value>>),
}

/// Attribute values keyed by attribute name
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// Free-standing translations keyed by attribute name
pub type TranslationMap = BTreeMap<String, Translation>;

/// Check a value's shape against its type before it is written
pub(crate) fn check_shape(ty: &AttributeType, value: &AttributeValue) -> Result<()> {
    let ok = match value {
        AttributeValue::Single(_) => !ty.multi_lingual,
        AttributeValue::List(_) => ty.multi_valued && !ty.multi_lingual,
        AttributeValue::Translated(_) => ty.multi_lingual && !ty.multi_valued,
        AttributeValue::TranslatedList(_) => ty.multi_lingual && ty.multi_valued,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::Coercion(format!(
            "value shape does not match type of attribute '{}' (multi_valued={}, multi_lingual={})",
            ty.name, ty.multi_valued, ty.multi_lingual
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale::new("en")
    }

    fn en_gb() -> Locale {
        Locale::new("en").with_country("GB")
    }

    #[test]
    fn test_scope_normalization() {
        assert_eq!(TypeScope::from_owner_id(None), TypeScope::Class);
        assert_eq!(TypeScope::from_owner_id(Some("")), TypeScope::Class);
        assert_eq!(TypeScope::from_owner_id(Some("42")), TypeScope::Instance("42".into()));
        assert_eq!(TypeScope::Class.owner_id(), None);
    }

    #[test]
    fn test_country_entry_installs_inherited_fallback() {
        let t = Translation::new().with(en_gb(), "Hiya");
        assert_eq!(t.get(&en()), Some(&Value::text("Hiya")));
        assert_eq!(t.explicit().count(), 1);
    }

    #[test]
    fn test_explicit_fallback_replaces_inherited() {
        let t = Translation::new().with(en_gb(), "Hiya").with(en(), "Hello");
        assert_eq!(t.get(&en()), Some(&Value::text("Hello")));
        assert_eq!(t.explicit().count(), 2);
    }

    #[test]
    fn test_duplicate_fallback_is_skipped() {
        let t = Translation::new().with(en(), "Hello").with(en(), "Howdy");
        assert_eq!(t.get(&en()), Some(&Value::text("Hello")));
    }

    #[test]
    fn test_fallback_survives_later_country_entry() {
        let t = Translation::new().with(en(), "Hello").with(en_gb(), "Hiya");
        assert_eq!(t.get(&en()), Some(&Value::text("Hello")));
        assert_eq!(t.get(&en_gb()), Some(&Value::text("Hiya")));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = Translation::new().with(en(), "Hello").with(en_gb(), "Hiya");
        let b = Translation::new().with(en_gb(), "Hiya").with(en(), "Hello");
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_translation() {
        let t = Translation::new()
            .with(en(), "Hello")
            .with(en_gb(), "Hiya")
            .with(Locale::new("fr"), "Bonjour");
        let resolver = LocaleResolver::new(en());
        let preferred = [Locale::new("fr").with_country("CA"), en_gb()];
        assert_eq!(t.resolve(&preferred, &resolver), Some(&Value::text("Bonjour")));
    }

    #[test]
    fn test_check_shape() {
        let scalar = AttributeType::new("a", DataType::text());
        let multi = AttributeType::new("b", DataType::text()).multi_valued();
        let lingual = AttributeType::new("c", DataType::text()).multi_lingual();

        assert!(check_shape(&scalar, &Value::text("x").into()).is_ok());
        assert!(check_shape(&multi, &Value::text("x").into()).is_ok());
        assert!(check_shape(&scalar, &AttributeValue::list(["x"])).is_err());
        assert!(check_shape(&lingual, &Value::text("x").into()).is_err());
        assert!(check_shape(&lingual, &Translation::new().with(en(), "x").into()).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let types: TypeMap = [
            AttributeType::new("title", DataType::text()).required(),
            AttributeType::new("note", DataType::text()),
        ]
        .into_iter()
        .collect();
        let attrs = AttributeMap::new();
        assert_eq!(types.missing_required(&attrs), vec!["title"]);
    }

    #[test]
    fn test_type_definition_roundtrip() {
        let registry = crate::datatype::default_registry();
        let ty = AttributeType::new("size", DataType::Integer { min: Some(0), max: None })
            .in_group("dims", Some(2))
            .multi_valued();
        let def = TypeDefinition::from(&ty);
        let json = serde_json::to_string(&def).unwrap();
        let back: TypeDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.resolve(&registry).unwrap(), ty);
    }
}
