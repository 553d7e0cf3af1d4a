use std::io::{BufRead, Cursor};

use crate::extraction::{DocumentFormat, ExtractError};

const LINE_SEPARATOR: &str = "\n";

/// Decodes UTF-8 line by line and re-joins every line with `\n`, so `\r\n`
/// and lone `\r` endings are normalized and the output always ends with a
/// separator when the input is non-empty.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut reader = Cursor::new(bytes);
    let mut out = String::with_capacity(bytes.len() + 1);
    let mut raw = Vec::new();

    loop {
        raw.clear();
        let read = reader
            .read_until(b'\n', &mut raw)
            .map_err(|e| ExtractError::failed(DocumentFormat::Txt, e.to_string()))?;
        if read == 0 {
            break;
        }
        if raw.last() == Some(&b'\n') {
            raw.pop();
        }

        let line = std::str::from_utf8(&raw).map_err(|e| {
            ExtractError::failed(DocumentFormat::Txt, format!("invalid UTF-8: {e}"))
        })?;

        // `\r` is a terminator on its own too; a trailing one belongs to `\r\n`
        let line = line.strip_suffix('\r').unwrap_or(line);
        for part in line.split('\r') {
            out.push_str(part);
            out.push_str(LINE_SEPARATOR);
        }
    }

    Ok(out)
}
