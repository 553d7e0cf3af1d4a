//! Legacy Word 97-2003 (`.doc`) text extraction.
//!
//! A `.doc` is an OLE2 compound file. The `WordDocument` stream starts with
//! the FIB, which points at the CLX in the table stream (`0Table` or
//! `1Table`). The CLX piece table maps character positions to byte ranges in
//! `WordDocument`, each piece stored as either cp1252 bytes ("compressed") or
//! UTF-16LE. Only the main document story (`ccpText` characters) is read, so
//! headers, footnotes and embedded object payloads never reach the output.

use std::io::{Cursor, Read};

use thiserror::Error;

use crate::extraction::{DocumentFormat, ExtractError};

const WORD_IDENT: u16 = 0xA5EC;
const FLAG_WHICH_TABLE_STREAM: u16 = 0x0200;
const FLAG_ENCRYPTED: u16 = 0x0100;
/// Index of the fcClx/lcbClx pair inside FibRgFcLcb97.
const CLX_PAIR_INDEX: usize = 33;
const FC_COMPRESSED: u32 = 0x4000_0000;
const FC_MASK: u32 = 0x3FFF_FFFF;

#[derive(Debug, Error)]
enum DocError {
    #[error("not a compound file: {0}")]
    Container(#[from] std::io::Error),

    #[error("missing WordDocument stream")]
    NotWord,

    #[error("unrecognized FIB identifier {0:#06x}")]
    BadIdent(u16),

    #[error("encrypted documents are not supported")]
    Encrypted,

    #[error("malformed document: {0}")]
    Malformed(&'static str),
}

pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    read_document(bytes).map_err(|e| ExtractError::failed(DocumentFormat::Doc, e.to_string()))
}

fn read_document(bytes: &[u8]) -> Result<String, DocError> {
    let mut compound = cfb::CompoundFile::open(Cursor::new(bytes))?;

    if !compound.is_stream("/WordDocument") {
        return Err(DocError::NotWord);
    }
    let word = read_stream(&mut compound, "/WordDocument")?;

    let fib = Fib::parse(&word)?;
    let table_name = if fib.flags & FLAG_WHICH_TABLE_STREAM != 0 {
        "/1Table"
    } else {
        "/0Table"
    };
    if !compound.is_stream(table_name) {
        return Err(DocError::Malformed("table stream not found"));
    }
    let table = read_stream(&mut compound, table_name)?;

    let clx = slice(&table, fib.fc_clx as usize, fib.lcb_clx as usize)
        .ok_or(DocError::Malformed("CLX out of bounds"))?;
    let pieces = parse_piece_table(clx)?;

    let mut raw = String::new();
    for piece in pieces {
        if piece.cp_start >= fib.ccp_text {
            break;
        }
        let chars = (piece.cp_end.min(fib.ccp_text) - piece.cp_start) as usize;
        decode_piece(&word, &piece, chars, &mut raw)?;
    }

    Ok(clean_text(&raw))
}

fn read_stream(
    compound: &mut cfb::CompoundFile<Cursor<&[u8]>>,
    path: &str,
) -> Result<Vec<u8>, DocError> {
    let mut stream = compound.open_stream(path)?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    Ok(buf)
}

struct Fib {
    flags: u16,
    ccp_text: u32,
    fc_clx: u32,
    lcb_clx: u32,
}

impl Fib {
    fn parse(word: &[u8]) -> Result<Self, DocError> {
        let ident = read_u16(word, 0).ok_or(DocError::Malformed("FIB truncated"))?;
        if ident != WORD_IDENT {
            return Err(DocError::BadIdent(ident));
        }
        let flags = read_u16(word, 0x0A).ok_or(DocError::Malformed("FIB truncated"))?;
        if flags & FLAG_ENCRYPTED != 0 {
            return Err(DocError::Encrypted);
        }

        // FibBase is 32 bytes, then csw + fibRgW, cslw + fibRgLw, cbRgFcLcb + blob
        let csw = read_u16(word, 0x20).ok_or(DocError::Malformed("FIB truncated"))? as usize;
        let rg_lw_count_at = 0x22 + csw * 2;
        let cslw = read_u16(word, rg_lw_count_at).ok_or(DocError::Malformed("FIB truncated"))?
            as usize;
        let rg_lw_at = rg_lw_count_at + 2;
        let ccp_text = read_u32(word, rg_lw_at + 3 * 4).ok_or(DocError::Malformed("FIB truncated"))?;

        let fc_lcb_count_at = rg_lw_at + cslw * 4;
        let fc_lcb_count =
            read_u16(word, fc_lcb_count_at).ok_or(DocError::Malformed("FIB truncated"))? as usize;
        if fc_lcb_count <= CLX_PAIR_INDEX {
            return Err(DocError::Malformed("FIB has no CLX entry"));
        }
        let clx_at = fc_lcb_count_at + 2 + CLX_PAIR_INDEX * 8;
        let fc_clx = read_u32(word, clx_at).ok_or(DocError::Malformed("FIB truncated"))?;
        let lcb_clx = read_u32(word, clx_at + 4).ok_or(DocError::Malformed("FIB truncated"))?;

        Ok(Self {
            flags,
            ccp_text,
            fc_clx,
            lcb_clx,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    cp_start: u32,
    cp_end: u32,
    fc: u32,
}

/// Skips any Prc entries and reads the PlcPcd out of the Pcdt.
fn parse_piece_table(clx: &[u8]) -> Result<Vec<Piece>, DocError> {
    let mut pos = 0;
    loop {
        match clx.get(pos) {
            Some(0x01) => {
                let cb = read_u16(clx, pos + 1).ok_or(DocError::Malformed("Prc truncated"))?;
                pos += 3 + cb as usize;
            }
            Some(0x02) => {
                let lcb = read_u32(clx, pos + 1).ok_or(DocError::Malformed("Pcdt truncated"))?;
                let plc = slice(clx, pos + 5, lcb as usize)
                    .ok_or(DocError::Malformed("PlcPcd out of bounds"))?;
                return pieces_from_plc(plc);
            }
            _ => return Err(DocError::Malformed("CLX has no piece table")),
        }
    }
}

fn pieces_from_plc(plc: &[u8]) -> Result<Vec<Piece>, DocError> {
    // (n + 1) 4-byte CPs followed by n 8-byte PCDs
    if plc.len() < 4 || (plc.len() - 4) % 12 != 0 {
        return Err(DocError::Malformed("PlcPcd has an invalid length"));
    }
    let count = (plc.len() - 4) / 12;
    let pcd_base = (count + 1) * 4;

    (0..count)
        .map(|i| {
            let cp_start = read_u32(plc, i * 4).ok_or(DocError::Malformed("CP truncated"))?;
            let cp_end = read_u32(plc, (i + 1) * 4).ok_or(DocError::Malformed("CP truncated"))?;
            let fc = read_u32(plc, pcd_base + i * 8 + 2).ok_or(DocError::Malformed("PCD truncated"))?;
            if cp_end < cp_start {
                return Err(DocError::Malformed("piece table is not ascending"));
            }
            Ok(Piece {
                cp_start,
                cp_end,
                fc,
            })
        })
        .collect()
}

fn decode_piece(word: &[u8], piece: &Piece, chars: usize, out: &mut String) -> Result<(), DocError> {
    let fc = piece.fc & FC_MASK;
    if piece.fc & FC_COMPRESSED != 0 {
        let bytes = slice(word, (fc / 2) as usize, chars)
            .ok_or(DocError::Malformed("text piece out of bounds"))?;
        out.extend(bytes.iter().map(|&b| cp1252_char(b)));
    } else {
        let bytes = slice(word, fc as usize, chars * 2)
            .ok_or(DocError::Malformed("text piece out of bounds"))?;
        let units = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
        out.extend(char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)));
    }
    Ok(())
}

/// Turns Word's in-band control characters into plain text. Field codes
/// (between 0x13 and 0x14) are dropped while field results are kept;
/// object anchors and other control marks are removed.
fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    // one entry per open field: true while still inside its code part
    let mut fields: Vec<bool> = Vec::new();

    for c in raw.chars() {
        match c {
            '\u{13}' => {
                fields.push(true);
                continue;
            }
            '\u{14}' => {
                if let Some(in_code) = fields.last_mut() {
                    *in_code = false;
                }
                continue;
            }
            '\u{15}' => {
                fields.pop();
                continue;
            }
            _ => {}
        }
        if fields.iter().any(|&in_code| in_code) {
            continue;
        }

        match c {
            '\r' | '\u{0B}' | '\u{0C}' => out.push('\n'),
            '\u{07}' => out.push('\t'),
            '\u{1E}' => out.push('-'),
            '\t' | '\n' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out
}

const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

fn cp1252_char(b: u8) -> char {
    match b {
        0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
        _ => b as char,
    }
}

fn slice(buf: &[u8], start: usize, len: usize) -> Option<&[u8]> {
    buf.get(start..start.checked_add(len)?)
}

fn read_u16(buf: &[u8], at: usize) -> Option<u16> {
    slice(buf, at, 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    slice(buf, at, 4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const TEXT_OFFSET: usize = 0x400;

    /// Builds a minimal Word 97 compound file whose main story is `pieces`,
    /// each piece either cp1252 (`true`) or UTF-16LE.
    fn build_doc(pieces: &[(&str, bool)]) -> Vec<u8> {
        let mut word = vec![0u8; TEXT_OFFSET];
        word[0..2].copy_from_slice(&WORD_IDENT.to_le_bytes());
        word[2..4].copy_from_slice(&0x00C1u16.to_le_bytes());
        word[0x0A..0x0C].copy_from_slice(&FLAG_WHICH_TABLE_STREAM.to_le_bytes());
        word[0x20..0x22].copy_from_slice(&14u16.to_le_bytes());
        word[0x3E..0x40].copy_from_slice(&22u16.to_le_bytes());
        word[0x98..0x9A].copy_from_slice(&0x5Du16.to_le_bytes());

        let mut cps = vec![0u32];
        let mut fcs = Vec::new();
        for (text, compressed) in pieces {
            let offset = word.len() as u32;
            let char_count = if *compressed {
                word.extend(text.chars().map(|c| c as u8));
                fcs.push((offset * 2) | FC_COMPRESSED);
                text.chars().count()
            } else {
                let units: Vec<u16> = text.encode_utf16().collect();
                for unit in &units {
                    word.extend_from_slice(&unit.to_le_bytes());
                }
                fcs.push(offset);
                units.len()
            };
            let last = *cps.last().unwrap();
            cps.push(last + char_count as u32);
        }
        let ccp_text = *cps.last().unwrap();
        word[0x4C..0x50].copy_from_slice(&ccp_text.to_le_bytes());

        let mut plc = Vec::new();
        for cp in &cps {
            plc.extend_from_slice(&cp.to_le_bytes());
        }
        for fc in &fcs {
            plc.extend_from_slice(&[0, 0]);
            plc.extend_from_slice(&fc.to_le_bytes());
            plc.extend_from_slice(&[0, 0]);
        }

        // one Prc first so the parser has to skip it
        let mut clx = vec![0x01, 0x02, 0x00, 0xAA, 0xBB, 0x02];
        clx.extend_from_slice(&(plc.len() as u32).to_le_bytes());
        clx.extend_from_slice(&plc);

        let clx_at = 0x9A + CLX_PAIR_INDEX * 8;
        word[clx_at..clx_at + 4].copy_from_slice(&0u32.to_le_bytes());
        word[clx_at + 4..clx_at + 8].copy_from_slice(&(clx.len() as u32).to_le_bytes());

        let mut compound = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        {
            let mut stream = compound.create_stream("/WordDocument").unwrap();
            stream.write_all(&word).unwrap();
            stream.flush().unwrap();
        }
        {
            let mut stream = compound.create_stream("/1Table").unwrap();
            stream.write_all(&clx).unwrap();
            stream.flush().unwrap();
        }
        compound.flush().unwrap();
        compound.into_inner().into_inner()
    }

    #[test]
    fn test_compressed_piece() {
        let bytes = build_doc(&[("Jane Roe\rSkills: Rust, Go\r", true)]);
        assert_eq!(extract(&bytes).unwrap(), "Jane Roe\nSkills: Rust, Go\n");
    }

    #[test]
    fn test_mixed_pieces_and_unicode() {
        let bytes = build_doc(&[("Education\r", true), ("Université de Genève – MSc\r", false)]);
        let text = extract(&bytes).unwrap();
        assert_eq!(text, "Education\nUniversité de Genève – MSc\n");
    }

    #[test]
    fn test_cp1252_high_range() {
        let bytes = build_doc(&[("\u{93}quoted\u{94} \u{80}5\r", true)]);
        assert_eq!(extract(&bytes).unwrap(), "\u{201C}quoted\u{201D} \u{20AC}5\n");
    }

    #[test]
    fn test_field_codes_and_objects_dropped() {
        let bytes = build_doc(&[(
            "See \u{13} HYPERLINK \"https://example.com\" \u{14}my site\u{15}\u{1}\r",
            true,
        )]);
        let text = extract(&bytes).unwrap();
        assert_eq!(text, "See my site\n");
    }

    #[test]
    fn test_cell_marks_become_tabs() {
        let bytes = build_doc(&[("2019\u{7}Acme\u{7}\u{7}\r", true)]);
        assert_eq!(extract(&bytes).unwrap(), "2019\tAcme\t\t\n");
    }

    #[test]
    fn test_compound_file_without_word_stream() {
        let mut compound = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        {
            let mut stream = compound.create_stream("/Other").unwrap();
            stream.write_all(b"data").unwrap();
            stream.flush().unwrap();
        }
        compound.flush().unwrap();
        let bytes = compound.into_inner().into_inner();

        let err = extract(&bytes).unwrap_err();
        assert!(err.to_string().contains("WordDocument"));
    }

    #[test]
    fn test_not_a_compound_file() {
        assert!(extract(b"{\\rtf1 not a doc}").is_err());
    }

    #[test]
    fn test_nested_field_results_kept() {
        let raw = "a\u{13}OUTER \u{13}INNER\u{14}x\u{15}\u{14}result\u{15}b";
        assert_eq!(clean_text(raw), "aresultb");
    }
}
