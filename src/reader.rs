//! Coverage dump parser.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::block::CoverageEntry;
use crate::{consts, CoverageDump, Error, Result};

/// Parses a coverage dump from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CoverageDump> {
    from_reader(File::open(path)?)
}

/// Parses a coverage dump from any reader.
///
/// Accepts `0x`-prefixed hexadecimal or plain decimal addresses, each
/// optionally followed by a decimal instruction count. Blank lines are
/// skipped. The result is validated: addresses must be strictly ascending.
pub fn from_reader<R: Read>(reader: R) -> Result<CoverageDump> {
    let reader = BufReader::new(reader);
    let mut entries = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        entries.push(parse_entry(line, index + 1)?);
    }

    let dump = CoverageDump { entries };
    dump.validate()?;
    Ok(dump)
}

fn parse_entry(line: &str, line_no: usize) -> Result<CoverageEntry> {
    let mut fields = line.split_whitespace();
    let address = fields
        .next()
        .ok_or_else(|| Error::InvalidFormat(format!("line {line_no}: missing address")))
        .and_then(|field| {
            parse_address(field).ok_or_else(|| {
                Error::InvalidFormat(format!("line {line_no}: invalid address '{field}'"))
            })
        })?;

    let instruction_count = match fields.next() {
        Some(field) => Some(parse_count(field).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "line {line_no}: invalid instruction count '{field}'"
            ))
        })?),
        None => None,
    };

    if fields.next().is_some() {
        return Err(Error::InvalidFormat(format!(
            "line {line_no}: unexpected trailing fields"
        )));
    }

    Ok(CoverageEntry {
        address,
        instruction_count,
    })
}

/// Parses an address in either `0x`-prefixed hex or decimal.
///
/// Signs are rejected: dumps only ever contain bare digits.
pub fn parse_address(field: &str) -> Option<u64> {
    let (digits, radix) = match field
        .strip_prefix(consts::HEX_PREFIX)
        .or_else(|| field.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (field, 10),
    };
    if !digits.starts_with(|c: char| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// Parses a decimal instruction count, rejecting signs.
pub(crate) fn parse_count(field: &str) -> Option<u32> {
    if !field.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
