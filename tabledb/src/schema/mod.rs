// Schema discovery - descriptors derived from a host's declared Table fields

use crate::table::Table;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;
use std::fmt;

/// Type tag for the element type of a table.
#[derive(Debug, Clone, Copy)]
pub struct ElementType {
    id: TypeId,
    name: &'static str,
}

impl ElementType {
    pub fn of<T: 'static>() -> Self {
        ElementType {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified Rust type name, for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ElementType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ElementType {}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One table on a host: its persisted name and its element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: &'static str,
    element_type: ElementType,
}

impl TableDescriptor {
    pub fn new<T: 'static>(name: &'static str) -> Self {
        TableDescriptor {
            name,
            element_type: ElementType::of::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }
}

/// A host object that declares one or more tables as fields.
///
/// Normally implemented with `#[derive(Tables)]`, which lists every field
/// typed `Table<E>` in declaration order.
pub trait Tables {
    /// The static shape of the host. Computed once per database.
    fn descriptors() -> Vec<TableDescriptor>;

    /// Borrow the table stored under a descriptor name.
    fn table(&self, name: &str) -> Option<&dyn ErasedTable>;

    /// Mutably borrow the table stored under a descriptor name.
    fn table_mut(&mut self, name: &str) -> Option<&mut dyn ErasedTable>;
}

/// Outcome of converting raw values into a table's element type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conversion {
    pub kept: usize,
    pub dropped: usize,
}

/// Type-erased view of a `Table<T>`, letting the engine move raw JSON values
/// in and out without knowing `T`.
pub trait ErasedTable {
    fn element_type(&self) -> ElementType;

    /// Encode every element, in order, to its JSON form.
    fn encode_values(&self) -> serde_json::Result<Vec<Value>>;

    /// Replace the whole table with the values that convert to the element
    /// type. Values that fail to convert are skipped.
    fn replace_from_values(&mut self, raw: Vec<Value>) -> Conversion;
}

impl<T> ErasedTable for Table<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn element_type(&self) -> ElementType {
        ElementType::of::<T>()
    }

    fn encode_values(&self) -> serde_json::Result<Vec<Value>> {
        self.iter().map(serde_json::to_value).collect()
    }

    fn replace_from_values(&mut self, raw: Vec<Value>) -> Conversion {
        let total = raw.len();
        let converted: Table<T> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<T>(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::debug!(
                        "Dropping element not convertible to {}: {e}",
                        std::any::type_name::<T>()
                    );
                    None
                }
            })
            .collect();
        let kept = converted.count();
        *self = converted;
        Conversion {
            kept,
            dropped: total - kept,
        }
    }
}
