use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::region::Region;

use super::error::{CoreError, CoreErrorCode};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CarNames {
    eu: String,
    us: String,
    jp: String,
}

/// Car code to display-name table. Rows are `code,nameEU,nameUS,nameJP`
/// where `code` is the record's first four bytes as hex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarCatalog {
    entries: BTreeMap<String, CarNames>,
}

impl CarCatalog {
    pub fn load_from_path(path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        let text = String::from_utf8_lossy(&raw);
        Self::from_csv_str(&text).map_err(|e| {
            CoreError::new(e.code, format!("{}: {}", path.display(), e.message))
        })
    }

    pub fn from_csv_str(text: &str) -> Result<Self, CoreError> {
        let mut entries = BTreeMap::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let columns = split_csv_line(line);
            let [code, eu, us, jp, ..] = columns.as_slice() else {
                debug!(line = line_no + 1, "skipping car catalog row with fewer than 4 columns");
                continue;
            };
            let code = code.trim();
            if code.is_empty() || hex::decode(code).is_err() {
                debug!(line = line_no + 1, "skipping car catalog row without a hex code");
                continue;
            }
            entries.insert(
                code.to_ascii_uppercase(),
                CarNames {
                    eu: eu.clone(),
                    us: us.clone(),
                    jp: jp.clone(),
                },
            );
        }

        if entries.is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::Parse,
                "no car entries found in catalog",
            ));
        }

        Ok(Self { entries })
    }

    pub fn name(&self, code: &str, region: Region) -> Option<&str> {
        let names = self.entries.get(&code.to_ascii_uppercase())?;
        match region {
            Region::Eu => Some(names.eu.as_str()),
            Region::Us => Some(names.us.as_str()),
            Region::Jp => Some(names.jp.as_str()),
            Region::Unknown => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    out.push(current);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_looks_up_by_region() {
        let catalog = CarCatalog::from_csv_str(
            "0a1b2c3d,Skyline GT-R (EU),Skyline GT-R (US),スカイライン\r\n\n\
             11223344,\"Mazda, RX-7\",RX-7,RX-7\n",
        )
        .expect("catalog should parse");

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.name("0A1B2C3D", Region::Us),
            Some("Skyline GT-R (US)")
        );
        assert_eq!(catalog.name("0a1b2c3d", Region::Jp), Some("スカイライン"));
        assert_eq!(catalog.name("11223344", Region::Eu), Some("Mazda, RX-7"));
        assert_eq!(catalog.name("11223344", Region::Unknown), None);
        assert_eq!(catalog.name("DEADBEEF", Region::Eu), None);
    }

    #[test]
    fn skips_malformed_rows() {
        let catalog = CarCatalog::from_csv_str("code,eu,us,jp\nshort,row\n01020304,a,b,c\n")
            .expect("catalog should parse");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn empty_catalog_is_a_parse_error() {
        let err = CarCatalog::from_csv_str("\n").expect_err("empty catalog");
        assert_eq!(err.code, CoreErrorCode::Parse);
    }

    #[test]
    fn split_handles_escaped_quotes() {
        assert_eq!(
            split_csv_line(r#"a,"b ""c"", d",e"#),
            vec!["a", r#"b "c", d"#, "e"]
        );
    }
}
