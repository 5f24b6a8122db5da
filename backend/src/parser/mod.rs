//! Raw CSV parsing with encoding and delimiter auto-detection.
//!
//! Produces a [`RawTable`] of untyped string cells; no report-specific
//! logic here. Typing (number cleaning, placeholders, row admission)
//! happens in the normalizer.
//!
//! Source exports are semicolon-delimited UTF-8 with an optional byte-order
//! mark, but re-exports through spreadsheet tools show up in other
//! encodings and delimiters often enough that both are auto-detected.

use csv::ReaderBuilder;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// Result of parsing a raw table, with detection metadata.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Column headers, trimmed, BOM stripped.
    pub headers: Vec<String>,
    /// Data rows; may be shorter than `headers` when trailing cells are absent.
    pub rows: Vec<Vec<String>>,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used delimiter.
    pub delimiter: char,
}

impl RawTable {
    /// Index of a column by its exact header.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell text at (row, column), empty string when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    // UTF-8 BOM is unambiguous; chardet sometimes mislabels short
    // BOM-prefixed files.
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "windows-1251" | "cp1251" => "windows-1251".to_string(),
        "koi8-r" => "koi8-r".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding, stripping any
/// leading byte-order mark.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).to_string()),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        "windows-1251" | "cp1251" => encoding_rs::WINDOWS_1251.decode(bytes).0.to_string(),
        "koi8-r" => encoding_rs::KOI8_R.decode(bytes).0.to_string(),
        // Fallback: UTF-8 with lossy conversion
        _ => String::from_utf8_lossy(bytes).to_string(),
    };

    Ok(strip_bom(&decoded).to_string())
}

/// Strip a leading byte-order mark, if any.
fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// let table = parse_str("Менеджер;ОП\nИванов;100,5", ';')?;
/// assert_eq!(table.headers, vec!["Менеджер", "ОП"]);
/// assert_eq!(table.cell(0, 1), "100,5");
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<RawTable> {
    parse_with_metadata(content, delimiter, "utf-8".to_string())
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<RawTable> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_with_metadata(&content, delimiter, encoding)
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<RawTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse decoded CSV text into a table, keeping detection metadata.
fn parse_with_metadata(content: &str, delimiter: char, encoding: String) -> CsvResult<RawTable> {
    let content = strip_bom(content);
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header_record = records
        .next()
        .ok_or(CsvError::EmptyFile)?
        .map_err(|e| CsvError::ParseError(e.to_string()))?;

    let headers: Vec<String> = header_record
        .iter()
        .map(|h| strip_bom(h.trim()).to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| CsvError::ParseError(e.to_string()))?;

        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(cells);
    }

    Ok(RawTable {
        headers,
        rows,
        encoding,
        delimiter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_semicolon_csv() {
        let table = parse_str("Менеджер;ОП\nИванов;100\nПетров;200", ';').unwrap();
        assert_eq!(table.headers, vec!["Менеджер", "ОП"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 0), "Иванов");
        assert_eq!(table.cell(1, 1), "200");
    }

    #[test]
    fn test_bom_stripped_from_first_header() {
        let bytes = b"\xEF\xBB\xBF\xD0\x9A\xD0\xBE\xD0\xB4;B\n1;2";
        let table = parse_bytes_auto(bytes).unwrap();
        assert_eq!(table.headers[0], "Код");
        assert_eq!(table.encoding, "utf-8");
    }

    #[test]
    fn test_header_whitespace_trimmed() {
        let table = parse_str("  ОП ; ОП План \n1;2", ';').unwrap();
        assert_eq!(table.headers, vec!["ОП", "ОП План"]);
    }

    #[test]
    fn test_quoted_values() {
        let table = parse_str("name;value\n\"Иванов; ИП\";\"100\"", ';').unwrap();
        assert_eq!(table.cell(0, 0), "Иванов; ИП");
        assert_eq!(table.cell(0, 1), "100");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_str("a;b\n1;2\n\n3;4\n", ';').unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_short_row_reads_as_empty_cells() {
        let table = parse_str("a;b;c\n1;2", ';').unwrap();
        assert_eq!(table.cell(0, 1), "2");
        assert_eq!(table.cell(0, 2), "");
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(parse_bytes_auto(b""), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_str("   \n  ", ';'), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_prefers_majority() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        // No delimiter at all falls back to the semicolon default.
        assert_eq!(detect_delimiter("justone"), ';');
    }

    #[test]
    fn test_windows_1251_decoding() {
        // "Регион" in windows-1251
        let bytes: &[u8] = &[0xD0, 0xE5, 0xE3, 0xE8, 0xEE, 0xED];
        let decoded = decode_content(bytes, "windows-1251").unwrap();
        assert_eq!(decoded, "Регион");
    }

    #[test]
    fn test_column_index() {
        let table = parse_str("Регион;ОП;ОП План\nА;1;2", ';').unwrap();
        assert_eq!(table.column_index("ОП План"), Some(2));
        assert_eq!(table.column_index("ВП"), None);
    }
}
