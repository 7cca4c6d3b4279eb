//! Input table parsing: hex literals and the segment and symbol CSV files.
//!
//! Both tables are headered CSV. Columns are positional; the header row only
//! fixes the column count. Addresses and sizes are hex with an optional `$`
//! or `0x` prefix, capability columns are any combination of the letters
//! `r`, `w`, and `x` with other characters ignored.

use std::io::Read;

use serde::Deserialize;
use thiserror::Error;

use crate::{Address, AddressBlock, Caps, Segment};
use crate::symbol::Symbol;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("bad hex string {0:?}")]
    Hex(String),

    #[error("value {0:?} does not fit in 16 bits")]
    Range(String),

    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Parse a hex literal with an optional `$` or `0x` prefix.
pub fn parse_hex(text: &str) -> Result<u64, TableError> {
    let digits = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .unwrap_or(text);

    if digits.is_empty() {
        return Err(TableError::Hex(text.to_string()));
    }

    u64::from_str_radix(digits, 16).map_err(|_| TableError::Hex(text.to_string()))
}

/// Parse a hex literal that must fit in an address.
pub fn parse_hex_u16(text: &str) -> Result<u16, TableError> {
    let value = parse_hex(text)?;

    u16::try_from(value).map_err(|_| TableError::Range(text.to_string()))
}

/// Capability set from a string of `r`, `w`, and `x` letters.
pub fn caps_from_letters(text: &str) -> Caps {
    let mut caps = Caps::NONE;

    for c in text.chars() {
        match c {
            'r' => caps |= Caps::READ,
            'w' => caps |= Caps::WRITE,
            'x' => caps |= Caps::EXEC,
            _ => {}
        }
    }

    caps
}

// Rows deserialize positionally (headers are passed as `None`), so the
// header row fixes the column count but its names carry no meaning.
#[derive(Debug, Deserialize)]
struct SegmentRow {
    name: String,
    start: String,
    size: String,
    caps: String,
}

#[derive(Debug, Deserialize)]
struct SymbolRow {
    name: String,
    value: String,
    caps: String,
}

fn check_columns<R: Read>(reader: &mut csv::Reader<R>, expected: usize) -> Result<(), TableError> {
    let found = reader.headers()?.len();

    if found != expected {
        return Err(TableError::ColumnCount { expected, found });
    }

    Ok(())
}

/// Read a segment table: `name,start,size,caps`.
pub fn read_segments<R: Read>(input: R) -> Result<Vec<Segment>, TableError> {
    let mut reader = csv::Reader::from_reader(input);
    check_columns(&mut reader, 4)?;

    let mut result = Vec::new();

    for record in reader.records() {
        let row: SegmentRow = record?.deserialize(None)?;

        result.push(Segment {
            name: row.name,
            range: AddressBlock::new(parse_hex_u16(&row.start)?, parse_hex_u16(&row.size)?),
            caps: caps_from_letters(&row.caps),
        });
    }

    Ok(result)
}

/// Read a symbol table: `name,value,caps`.
pub fn read_symbols<R: Read>(input: R) -> Result<Vec<Symbol>, TableError> {
    let mut reader = csv::Reader::from_reader(input);
    check_columns(&mut reader, 3)?;

    let mut result = Vec::new();

    for record in reader.records() {
        let row: SymbolRow = record?.deserialize(None)?;

        result.push(Symbol {
            name: row.name,
            value: parse_hex_u16(&row.value)? as Address,
            caps: caps_from_letters(&row.caps),
        });
    }

    Ok(result)
}
