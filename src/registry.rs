// src/registry.rs

use std::collections::HashSet;
use thiserror::Error;

use crate::table::Table;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("sheet name must not be empty")]
    EmptyName,

    #[error("sheet `{0}` is already registered")]
    DuplicateName(String),
}

/// One unit of publication: a sheet title and the table written to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetEntry {
    pub name: String,
    pub table: Table,
}

/// Sheet entries in publish order. Names are non-empty and unique.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    entries: Vec<SheetEntry>,
    names: HashSet<String>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: Table) -> Result<(), RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if !self.names.insert(name.clone()) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.entries.push(SheetEntry { name, table });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SheetEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a TableRegistry {
    type Item = &'a SheetEntry;
    type IntoIter = std::slice::Iter<'a, SheetEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
