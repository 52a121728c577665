//! Drawer data model
//!
//! The cabinet is an 8x4 grid of drawers addressed as `"{row}-{col}"`.
//! Rows 1-7 carry locator LEDs; row 8 is storage only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of drawer rows in the cabinet
pub const ROWS: u8 = 8;
/// Number of drawer columns in the cabinet
pub const COLS: u8 = 4;
/// Rows that have a locator LED wired (rows 1..=LIT_ROWS)
pub const LIT_ROWS: u8 = 7;
/// Total drawer count
pub const DRAWER_COUNT: usize = (ROWS as usize) * (COLS as usize);

/// Error for a drawer id that is not of the form `"{row}-{col}"` within the grid
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid drawer id: {0}")]
pub struct InvalidDrawerId(pub String);

/// A drawer position in the grid (row 1..=8, col 1..=4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawerId {
    pub row: u8,
    pub col: u8,
}

impl DrawerId {
    /// Build an id, rejecting positions outside the grid
    pub fn new(row: u8, col: u8) -> Result<Self, InvalidDrawerId> {
        if (1..=ROWS).contains(&row) && (1..=COLS).contains(&col) {
            Ok(Self { row, col })
        } else {
            Err(InvalidDrawerId(format!("{}-{}", row, col)))
        }
    }

    /// Whether this drawer is in a row with LEDs wired
    pub fn has_led_row(&self) -> bool {
        self.row <= LIT_ROWS
    }

    /// All 32 drawers in canonical row-major order
    pub fn all() -> impl Iterator<Item = DrawerId> {
        (1..=ROWS).flat_map(|row| (1..=COLS).map(move |col| DrawerId { row, col }))
    }

    /// The 28 drawers in LED-wired rows, canonical row-major order
    pub fn lit() -> impl Iterator<Item = DrawerId> {
        Self::all().filter(|id| id.has_led_row())
    }
}

impl fmt::Display for DrawerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

impl FromStr for DrawerId {
    type Err = InvalidDrawerId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || InvalidDrawerId(s.to_string());
        let (row, col) = s.split_once('-').ok_or_else(bad)?;
        let row: u8 = row.parse().map_err(|_| bad())?;
        let col: u8 = col.parse().map_err(|_| bad())?;
        Self::new(row, col).map_err(|_| bad())
    }
}

/// Content of one drawer as persisted and exchanged with the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerRecord {
    pub id: String,
    pub name: String,
    pub items: Vec<String>,
    pub notes: String,
    pub row: u8,
    pub col: u8,
}

impl DrawerRecord {
    /// Empty record for a drawer position
    pub fn empty(id: DrawerId) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            items: Vec::new(),
            notes: String::new(),
            row: id.row,
            col: id.col,
        }
    }
}

/// Validation error for a drawer document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document has {0} drawers, expected 32")]
    WrongDrawerCount(usize),
    #[error("unexpected drawer key: {0}")]
    UnknownKey(String),
    #[error("drawer {key} record disagrees with its key (id={id}, row={row}, col={col})")]
    InconsistentRecord {
        key: String,
        id: String,
        row: u8,
        col: u8,
    },
}

/// The full persisted document: one record per drawer, keyed by canonical id.
///
/// `BTreeMap` keeps the on-disk key order stable across saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawerDocument(pub BTreeMap<String, DrawerRecord>);

impl DrawerDocument {
    /// Look up a record by drawer id
    pub fn get(&self, id: DrawerId) -> Option<&DrawerRecord> {
        self.0.get(&id.to_string())
    }

    /// Number of drawers in the document
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that the key set is exactly the 32 canonical ids and that each
    /// record's `id`/`row`/`col` matches its key.
    ///
    /// Saves go through this so a buggy client cannot shrink or pollute the
    /// document on disk.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.0.len() != DRAWER_COUNT {
            return Err(DocumentError::WrongDrawerCount(self.0.len()));
        }
        for (key, record) in &self.0 {
            let id: DrawerId = key
                .parse()
                .map_err(|_| DocumentError::UnknownKey(key.clone()))?;
            if record.id != *key || record.row != id.row || record.col != id.col {
                return Err(DocumentError::InconsistentRecord {
                    key: key.clone(),
                    id: record.id.clone(),
                    row: record.row,
                    col: record.col,
                });
            }
        }
        Ok(())
    }
}

impl Default for DrawerDocument {
    /// Fresh document: all 32 drawers present and empty
    fn default() -> Self {
        Self(
            DrawerId::all()
                .map(|id| (id.to_string(), DrawerRecord::empty(id)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        for id in DrawerId::all() {
            let parsed: DrawerId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }
    }

    #[test]
    fn test_id_rejects_out_of_grid() {
        assert!("0-1".parse::<DrawerId>().is_err());
        assert!("9-1".parse::<DrawerId>().is_err());
        assert!("1-5".parse::<DrawerId>().is_err());
        assert!("1-0".parse::<DrawerId>().is_err());
        assert!("banana".parse::<DrawerId>().is_err());
        assert!("1-".parse::<DrawerId>().is_err());
        assert!("-1".parse::<DrawerId>().is_err());
        assert!("1-1-1".parse::<DrawerId>().is_err());
    }

    #[test]
    fn test_canonical_order() {
        let all: Vec<_> = DrawerId::all().collect();
        assert_eq!(all.len(), DRAWER_COUNT);
        assert_eq!(all[0].to_string(), "1-1");
        assert_eq!(all[3].to_string(), "1-4");
        assert_eq!(all[4].to_string(), "2-1");
        assert_eq!(all[31].to_string(), "8-4");

        let lit: Vec<_> = DrawerId::lit().collect();
        assert_eq!(lit.len(), 28);
        assert!(lit.iter().all(|id| id.row <= 7));
    }

    #[test]
    fn test_default_document_shape() {
        let doc = DrawerDocument::default();
        assert_eq!(doc.len(), 32);
        for id in DrawerId::all() {
            let record = doc.get(id).unwrap();
            assert_eq!(record.id, id.to_string());
            assert_eq!(record.row, id.row);
            assert_eq!(record.col, id.col);
            assert!(record.name.is_empty());
            assert!(record.items.is_empty());
            assert!(record.notes.is_empty());
        }
    }

    #[test]
    fn test_validate_accepts_default() {
        assert_eq!(DrawerDocument::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_missing_key() {
        let mut doc = DrawerDocument::default();
        doc.0.remove("3-2");
        assert!(matches!(
            doc.validate(),
            Err(DocumentError::WrongDrawerCount(31))
        ));
    }

    #[test]
    fn test_validate_rejects_alien_key() {
        let mut doc = DrawerDocument::default();
        let record = doc.0.remove("3-2").unwrap();
        doc.0.insert("9-9".to_string(), record);
        assert!(matches!(doc.validate(), Err(DocumentError::UnknownKey(_))));
    }

    #[test]
    fn test_validate_rejects_inconsistent_record() {
        let mut doc = DrawerDocument::default();
        doc.0.get_mut("3-2").unwrap().row = 4;
        assert!(matches!(
            doc.validate(),
            Err(DocumentError::InconsistentRecord { .. })
        ));
    }

    #[test]
    fn test_document_serde_roundtrip() {
        let mut doc = DrawerDocument::default();
        let record = doc.0.get_mut("1-1").unwrap();
        record.name = "LED-ek".to_string();
        record.items = vec!["LED piros 5mm (x20)".to_string()];
        record.notes = "fiókonként rendezve".to_string();

        let json = serde_json::to_string(&doc).unwrap();
        let back: DrawerDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
