use std::collections::BTreeMap;
use std::io::Read;

/// Cells per valid row: old type, new type and the empty cell left by the line terminator.
pub const VALID_ROW_LENGTH: usize = 3;

/// Old type value to new type value, built once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    entries: BTreeMap<String, String>,
}

impl TypeMapping {
    /// Builds the mapping from raw rows. Rows without exactly three cells are skipped;
    /// a repeated old type keeps the last new type seen.
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let mut entries = BTreeMap::new();
        for row in rows {
            let row = row.as_ref();
            if row.len() == VALID_ROW_LENGTH {
                tracing::debug!("Adding type translation [ {} ] ~> [ {} ]", row[0], row[1]);
                entries.insert(row[0].clone(), row[1].clone());
            } else {
                tracing::warn!("Row {:?} is malformed", row);
            }
        }
        Self { entries }
    }

    pub fn get(&self, old_type: &str) -> Option<&str> {
        self.entries.get(old_type).map(String::as_str)
    }

    pub fn old_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for TypeMapping {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(old, new)| (old.to_string(), new.to_string()))
                .collect(),
        }
    }
}

/// Lazily yields the cells of each CSV row. Rows the reader cannot decode are logged
/// and dropped, the same as malformed rows.
pub fn csv_rows<R: Read>(reader: R) -> impl Iterator<Item = Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
        .into_records()
        .enumerate()
        .filter_map(|(index, record)| match record {
            Ok(record) => Some(record.iter().map(str::to_string).collect()),
            Err(e) => {
                tracing::warn!("Row {} could not be read: {}", index + 1, e);
                None
            }
        })
}
