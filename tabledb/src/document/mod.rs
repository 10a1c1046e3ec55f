// Document codec - table name -> array of raw values, to and from JSON text

use crate::error::{Result, TableDbError};
use crate::schema::{Conversion, TableDescriptor, Tables};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// The on-disk form: every table's elements as raw JSON values, keyed by
/// table name. `None` stands for a `null` entry.
pub type Document = BTreeMap<String, Option<Vec<Value>>>;

/// What a single load did to each table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// False when there was no file to load; nothing else is populated then.
    pub file_found: bool,
    pub tables: Vec<TableLoad>,
    /// Document keys that did not match any table.
    pub unmapped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLoad {
    pub name: String,
    pub loaded: usize,
    pub dropped: usize,
}

impl LoadReport {
    pub(crate) fn missing_file() -> Self {
        LoadReport::default()
    }

    /// Total number of elements dropped across all tables.
    pub fn dropped(&self) -> usize {
        self.tables.iter().map(|t| t.dropped).sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableLoad> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Parse document bytes. A bare `null` is an empty document.
pub fn parse_document(bytes: &[u8], path: &Path) -> Result<Document> {
    let parsed: Option<Document> =
        serde_json::from_slice(bytes).map_err(|source| TableDbError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parsed.unwrap_or_default())
}

/// Collect every described table's current contents into a document.
pub fn encode_document<H: Tables>(host: &H, descriptors: &[TableDescriptor]) -> Result<Document> {
    let mut document = Document::new();
    for descriptor in descriptors {
        let Some(table) = host.table(descriptor.name()) else {
            log::warn!(
                "Table '{}' is described but not reachable on the host, skipping",
                descriptor.name()
            );
            continue;
        };
        let values = table
            .encode_values()
            .map_err(|source| TableDbError::Encode {
                table: descriptor.name().to_string(),
                source,
            })?;
        document.insert(descriptor.name().to_string(), Some(values));
    }
    Ok(document)
}

/// Serialize a document to JSON text.
pub fn render_document(document: &Document, pretty: bool) -> Result<Vec<u8>> {
    let rendered = if pretty {
        serde_json::to_vec_pretty(document)
    } else {
        serde_json::to_vec(document)
    };
    rendered.map_err(TableDbError::Render)
}

/// Apply a parsed document to the host.
///
/// Each entry whose key matches a descriptor replaces that table wholesale;
/// elements that do not convert are dropped, and keys with no descriptor are
/// ignored. Tables with no entry keep their current contents.
pub fn apply_document<H: Tables>(
    host: &mut H,
    descriptors: &[TableDescriptor],
    document: Document,
) -> LoadReport {
    let mut report = LoadReport {
        file_found: true,
        ..LoadReport::default()
    };

    for (key, raw) in document {
        let table = match descriptors.iter().find(|d| d.name() == key) {
            Some(descriptor) => host.table_mut(descriptor.name()),
            None => None,
        };
        let Some(table) = table else {
            log::warn!("Ignoring document entry '{key}' with no matching table");
            report.unmapped.push(key);
            continue;
        };

        let Conversion { kept, dropped } = table.replace_from_values(raw.unwrap_or_default());
        if dropped > 0 {
            log::warn!(
                "Table '{key}': dropped {dropped} element(s) not convertible to {}",
                table.element_type()
            );
        }
        log::debug!("Table '{key}': loaded {kept} element(s)");
        report.tables.push(TableLoad {
            name: key,
            loaded: kept,
            dropped,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ErasedTable;
    use crate::Table;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: i64,
    }

    #[derive(Default)]
    struct Host {
        numbers: Table<i64>,
        people: Table<Person>,
    }

    impl Tables for Host {
        fn descriptors() -> Vec<TableDescriptor> {
            vec![
                TableDescriptor::new::<i64>("Numbers"),
                TableDescriptor::new::<Person>("People"),
            ]
        }

        fn table(&self, name: &str) -> Option<&dyn ErasedTable> {
            match name {
                "Numbers" => Some(&self.numbers),
                "People" => Some(&self.people),
                _ => None,
            }
        }

        fn table_mut(&mut self, name: &str) -> Option<&mut dyn ErasedTable> {
            match name {
                "Numbers" => Some(&mut self.numbers),
                "People" => Some(&mut self.people),
                _ => None,
            }
        }
    }

    fn ada() -> Person {
        Person {
            name: "Ada".into(),
            age: 30,
        }
    }

    fn parse(text: &str) -> Document {
        parse_document(text.as_bytes(), Path::new("test.json")).unwrap()
    }

    #[test]
    fn test_encode_matches_documented_layout() {
        let host = Host {
            numbers: Table::from(vec![1, 2, 3]),
            people: Table::from(vec![ada()]),
        };
        let document = encode_document(&host, &Host::descriptors()).unwrap();
        let rendered: Value = serde_json::from_slice(&render_document(&document, false).unwrap()).unwrap();
        assert_eq!(
            rendered,
            json!({
                "Numbers": [1, 2, 3],
                "People": [{"name": "Ada", "age": 30}]
            })
        );
    }

    #[test]
    fn test_pretty_output_is_indented() {
        let host = Host::default();
        let document = encode_document(&host, &Host::descriptors()).unwrap();
        let text = String::from_utf8(render_document(&document, true).unwrap()).unwrap();
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_tolerant_decode_keeps_relative_order() {
        let mut host = Host::default();
        let document = parse(
            r#"{"People": [{"name": "Ada", "age": 30}, "oops", {"name": "Bob", "age": 41}]}"#,
        );
        let report = apply_document(&mut host, &Host::descriptors(), document);

        let names: Vec<&str> = host.people.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Bob"]);
        assert_eq!(
            report.table("People"),
            Some(&TableLoad {
                name: "People".into(),
                loaded: 2,
                dropped: 1
            })
        );
    }

    #[test]
    fn test_type_mismatch_yields_empty_table() {
        let mut host = Host {
            people: Table::from(vec![ada()]),
            ..Host::default()
        };
        let document = parse(r#"{"People": [1, 2, 3]}"#);
        let report = apply_document(&mut host, &Host::descriptors(), document);
        assert!(host.people.is_empty());
        assert_eq!(report.dropped(), 3);
    }

    #[test]
    fn test_load_replaces_instead_of_merging() {
        let mut host = Host {
            numbers: Table::from(vec![7, 8, 9]),
            ..Host::default()
        };
        apply_document(&mut host, &Host::descriptors(), parse(r#"{"Numbers": [1, 2]}"#));
        assert_eq!(host.numbers.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_null_entry_empties_table() {
        let mut host = Host {
            numbers: Table::from(vec![7, 8, 9]),
            ..Host::default()
        };
        apply_document(&mut host, &Host::descriptors(), parse(r#"{"Numbers": null}"#));
        assert!(host.numbers.is_empty());
    }

    #[test]
    fn test_missing_entry_keeps_current_contents() {
        let mut host = Host {
            numbers: Table::from(vec![7, 8, 9]),
            ..Host::default()
        };
        apply_document(&mut host, &Host::descriptors(), parse(r#"{"People": []}"#));
        assert_eq!(host.numbers.as_slice(), &[7, 8, 9]);
    }

    #[test]
    fn test_unmapped_and_case_mismatched_keys_are_ignored() {
        let mut host = Host::default();
        let document = parse(r#"{"Extra": [1], "numbers": [5], "Numbers": [6]}"#);
        let report = apply_document(&mut host, &Host::descriptors(), document);
        assert_eq!(host.numbers.as_slice(), &[6]);
        assert_eq!(report.unmapped, vec!["Extra".to_string(), "numbers".to_string()]);
    }

    #[test]
    fn test_top_level_null_is_empty_document() {
        assert!(parse("null").is_empty());
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        for text in ["not json", "[1, 2]", r#"{"Numbers": 5}"#, r#"{"Numbers": [1"#] {
            let err = parse_document(text.as_bytes(), Path::new("bad.json")).unwrap_err();
            assert!(matches!(err, TableDbError::Decode { .. }), "accepted {text}");
        }
    }
}
