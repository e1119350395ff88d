//! Field extractor: maps service entries to tagged output records

use crate::document::{ServiceEntry, StatusDocument};
use crate::mapping::{MappingTable, TypeMapping};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Output field name to extracted text; keys are sorted so identical input
/// always renders identically
pub type Record = BTreeMap<String, String>;

/// Record plus the tag it is emitted under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedRecord {
    pub tag: String,
    pub record: Record,
}

pub struct Transformer {
    table: Arc<MappingTable>,
    base_tag: String,
}

impl Transformer {
    pub fn new(table: Arc<MappingTable>, base_tag: impl Into<String>) -> Self {
        Self {
            table,
            base_tag: base_tag.into(),
        }
    }

    pub fn base_tag(&self) -> &str {
        &self.base_tag
    }

    /// `<base_tag>.<category>`
    pub fn tag_for(&self, category: &str) -> String {
        format!("{}.{}", self.base_tag, category)
    }

    /// Records for every mapped entry, in document order
    pub fn transform(&self, document: &StatusDocument) -> Vec<TaggedRecord> {
        document
            .services()
            .iter()
            .filter_map(|entry| self.transform_entry(entry))
            .collect()
    }

    /// `None` when the entry has no `<type>` or its type is not mapped
    pub fn transform_entry(&self, entry: &ServiceEntry) -> Option<TaggedRecord> {
        let Some(code) = entry.type_code() else {
            warn!(service = ?entry.name(), "Service entry has no <type>, skipping");
            return None;
        };

        let Some(mapping) = self.table.lookup_code(code) else {
            debug!(service = ?entry.name(), code, "No mapping for service type");
            return None;
        };

        Some(TaggedRecord {
            tag: self.tag_for(&mapping.category),
            record: extract(entry, mapping),
        })
    }
}

fn extract(entry: &ServiceEntry, mapping: &TypeMapping) -> Record {
    let name = entry.name().unwrap_or_else(|| {
        warn!(category = %mapping.category, "Service entry has no name attribute");
        ""
    });

    let mut record = Record::new();
    record.insert("name".to_string(), name.to_string());

    for rule in &mapping.fields {
        match rule.sources.iter().find_map(|source| entry.lookup(source)) {
            Some(value) => {
                record.insert(rule.output.clone(), value.to_string());
            }
            None => warn!(
                service = name,
                field = %rule.output,
                path = rule.source(),
                "Mapped field missing from service entry"
            ),
        }
    }

    record
}
