use std::collections::BTreeMap;

use super::service_type::ServiceType;

/// One extraction rule: copy the text found at the first matching source
/// path into the record as `output`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub output: String,
    /// `/`-separated paths of child elements, relative to the `<service>`
    /// entry, tried in order
    pub sources: Vec<String>,
}

impl FieldRule {
    pub fn new(output: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            sources: vec![source.into()],
        }
    }

    pub fn with_fallback(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Primary source path
    pub fn source(&self) -> &str {
        self.sources.first().map(String::as_str).unwrap_or_default()
    }
}

/// Extraction rules and output category for one service type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Tag suffix, e.g. `global`, `disk`, `process`
    pub category: String,
    pub fields: Vec<FieldRule>,
}

impl TypeMapping {
    pub fn new(category: impl Into<String>, fields: Vec<FieldRule>) -> Self {
        Self {
            category: category.into(),
            fields,
        }
    }

    /// Built-in rules also accept a flat element named after the output
    /// field (`<memory-percent>` next to `<memory><percent>`)
    fn from_pairs(category: &str, pairs: &[(&str, &str)]) -> Self {
        Self::new(
            category,
            pairs
                .iter()
                .map(|(output, source)| {
                    let rule = FieldRule::new(*output, *source);
                    if output == source {
                        rule
                    } else {
                        rule.with_fallback(*output)
                    }
                })
                .collect(),
        )
    }
}

const SYSTEM_FIELDS: &[(&str, &str)] = &[
    ("load-avg-1", "system/load/avg01"),
    ("load-avg-5", "system/load/avg05"),
    ("load-avg-15", "system/load/avg15"),
    ("cpu-user", "system/cpu/user"),
    ("cpu-system", "system/cpu/system"),
    ("cpu-wait", "system/cpu/wait"),
    ("memory-percent", "system/memory/percent"),
    ("memory-kb", "system/memory/kilobyte"),
    ("swap-percent", "system/swap/percent"),
    ("swap-kb", "system/swap/kilobyte"),
];

const FILESYSTEM_FIELDS: &[(&str, &str)] = &[("usage", "block/percent")];

const PROCESS_FIELDS: &[(&str, &str)] = &[
    ("uptime", "uptime"),
    ("memory-percent", "memory/percent"),
    ("cpu-percent", "cpu/percent"),
];

/// Lookup from service type to its mapping
///
/// Built once at startup and never mutated afterwards; share it with
/// `Arc<MappingTable>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    mappings: BTreeMap<ServiceType, TypeMapping>,
}

impl MappingTable {
    pub fn empty() -> Self {
        Self {
            mappings: BTreeMap::new(),
        }
    }

    /// System (`global`), filesystem (`disk`) and process (`process`) mappings
    pub fn builtin() -> Self {
        let mut mappings = BTreeMap::new();
        mappings.insert(
            ServiceType::System,
            TypeMapping::from_pairs("global", SYSTEM_FIELDS),
        );
        mappings.insert(
            ServiceType::Filesystem,
            TypeMapping::from_pairs("disk", FILESYSTEM_FIELDS),
        );
        mappings.insert(
            ServiceType::Process,
            TypeMapping::from_pairs("process", PROCESS_FIELDS),
        );
        Self { mappings }
    }

    /// Replace or add mappings; an override fully replaces the built-in entry
    pub fn with_overrides(
        mut self,
        overrides: impl IntoIterator<Item = (ServiceType, TypeMapping)>,
    ) -> Self {
        for (service_type, mapping) in overrides {
            self.mappings.insert(service_type, mapping);
        }
        self
    }

    pub fn get(&self, service_type: ServiceType) -> Option<&TypeMapping> {
        self.mappings.get(&service_type)
    }

    /// Look up by raw `<type>` code; unknown or unmapped codes yield `None`
    pub fn lookup_code(&self, code: &str) -> Option<&TypeMapping> {
        ServiceType::from_code(code).and_then(|service_type| self.get(service_type))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceType, &TypeMapping)> {
        self.mappings.iter().map(|(service_type, mapping)| (*service_type, mapping))
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::builtin()
    }
}
