//! Incremental parsing of a report response's `results` array.
//!
//! The site breakdown can return arbitrarily large documents; this reader
//! pulls rows out of the array one at a time and aborts the deserializer
//! the moment the row cap is hit, so the rest of the body is never parsed
//! or buffered. Dropping the underlying reader afterwards tears down the
//! transport instead of draining it.

use std::fmt;
use std::io::Read;

use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};

use crate::error::{RealizeError, Result};

/// Sentinel message used to abort the deserializer once the cap is hit.
/// Matched by the caller to tell "stopped on purpose" from a parse error.
const CAP_SENTINEL: &str = "__row_cap_reached__";

pub(crate) struct CappedResults {
    pub rows: Vec<Map<String, Value>>,
    /// True when parsing was cut at the cap (more rows were available).
    pub capped: bool,
}

/// Read at most `cap` rows from the document's `results` array.
pub(crate) fn read_capped_results<R: Read>(reader: R, cap: usize) -> Result<CappedResults> {
    let mut rows = Vec::new();
    let mut deserializer = serde_json::Deserializer::from_reader(reader);

    let outcome = DocumentSeed {
        rows: &mut rows,
        cap,
    }
    .deserialize(&mut deserializer);

    match outcome {
        Ok(()) => Ok(CappedResults {
            rows,
            capped: false,
        }),
        Err(err) if err.to_string().contains(CAP_SENTINEL) => {
            Ok(CappedResults { rows, capped: true })
        }
        Err(err) => Err(RealizeError::Json(err)),
    }
}

/// Walks the top-level response object, streaming only the `results` key
/// and discarding everything else.
struct DocumentSeed<'a> {
    rows: &'a mut Vec<Map<String, Value>>,
    cap: usize,
}

impl<'de, 'a> DeserializeSeed<'de> for DocumentSeed<'a> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'a> Visitor<'de> for DocumentSeed<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a report response object")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(key) = map.next_key::<String>()? {
            if key == "results" {
                map.next_value_seed(ResultsSeed {
                    rows: self.rows,
                    cap: self.cap,
                })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct ResultsSeed<'a> {
    rows: &'a mut Vec<Map<String, Value>>,
    cap: usize,
}

impl<'de, 'a> DeserializeSeed<'de> for ResultsSeed<'a> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, 'a> Visitor<'de> for ResultsSeed<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of report rows")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while self.rows.len() < self.cap {
            match seq.next_element::<Map<String, Value>>()? {
                Some(row) => self.rows.push(row),
                None => return Ok(()),
            }
        }
        // Cap hit: abort the whole parse rather than draining the array.
        Err(de::Error::custom(CAP_SENTINEL))
    }
}
