//! Metadata extraction for exposure files
//!
//! This module provides the MetadataExtractor trait, the boundary to whatever
//! library knows how to derive tags from an exposure file, and a reference
//! implementation that reads keyword cards from a FITS primary header.

use crate::core::error::{ExtractionError, Result, TreeError};
use crate::core::models::{ExposureMetadata, ExposureRecord, HeaderKeywords};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

/// FITS logical record size
const BLOCK_SIZE: usize = 2880;
/// FITS header card width
const CARD_SIZE: usize = 80;
/// Upper bound on header blocks read before giving up on finding `END`
const MAX_HEADER_BLOCKS: usize = 64;

lazy_static! {
    static ref STRING_VALUE: Regex = Regex::new(r"^\s*'((?:[^']|'')*)'").unwrap();
}

/// Trait for deriving exposure metadata from a file
///
/// This trait allows for mocking in tests and alternative implementations
/// backed by richer instrument libraries.
#[cfg_attr(test, automock)]
pub trait MetadataExtractor {
    /// Extract the metadata of one file
    fn extract(&self, path: &Path) -> std::result::Result<ExposureMetadata, ExtractionError>;
}

/// Apply `extractor` to every path, in order
///
/// The first failure is returned as [`TreeError::RecordExtraction`] naming the
/// offending file.
pub fn extract_records<E>(paths: &[impl AsRef<Path>], extractor: &E) -> Result<Vec<ExposureRecord>>
where
    E: MetadataExtractor + ?Sized,
{
    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let meta = extractor
            .extract(path)
            .map_err(|source| TreeError::RecordExtraction {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(file = %meta.filename, tags = meta.tags.len(), "extracted metadata");
        records.push(ExposureRecord::from_metadata(meta));
    }
    info!(count = records.len(), "extracted exposure records");
    Ok(records)
}

/// Reads identity, exposure time and tags from FITS primary header keywords
#[derive(Debug, Clone, Default)]
pub struct HeaderExtractor {
    keywords: HeaderKeywords,
}

impl HeaderExtractor {
    pub fn new(keywords: HeaderKeywords) -> Self {
        Self { keywords }
    }

    fn required<'a>(
        cards: &'a HashMap<String, String>,
        keyword: &str,
    ) -> std::result::Result<&'a str, ExtractionError> {
        cards
            .get(keyword)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ExtractionError::MissingKeyword {
                keyword: keyword.to_string(),
            })
    }
}

impl MetadataExtractor for HeaderExtractor {
    fn extract(&self, path: &Path) -> std::result::Result<ExposureMetadata, ExtractionError> {
        let file = File::open(path)?;
        let cards = read_primary_header(BufReader::new(file))?;

        let observation_id = Self::required(&cards, &self.keywords.observation_id)?;
        let object = cards
            .get(&self.keywords.object)
            .cloned()
            .unwrap_or_default();

        let raw_exptime = Self::required(&cards, &self.keywords.exposure_time)?;
        let exposure_time: f64 = raw_exptime
            .parse()
            .map_err(|_| ExtractionError::InvalidValue {
                keyword: self.keywords.exposure_time.clone(),
                value: raw_exptime.to_string(),
            })?;

        let tags: BTreeSet<String> = self
            .keywords
            .tag_keywords
            .iter()
            .filter_map(|k| cards.get(k))
            .filter(|v| !v.is_empty())
            .map(|v| normalize_tag(v))
            .collect();

        Ok(ExposureMetadata {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            observation_id: observation_id.to_string(),
            object,
            tags,
            exposure_time,
        })
    }
}

fn normalize_tag(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// Read the keyword cards of a FITS primary header up to `END`
///
/// Only `KEYWORD = value` cards are kept; commentary cards are skipped and
/// the data unit is never touched.
pub fn read_primary_header<R: Read>(
    mut reader: R,
) -> std::result::Result<HashMap<String, String>, ExtractionError> {
    let mut cards = HashMap::new();
    let mut block = [0u8; BLOCK_SIZE];

    for index in 0..MAX_HEADER_BLOCKS {
        if let Err(e) = reader.read_exact(&mut block) {
            return Err(if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ExtractionError::NotFits {
                    reason: "header ends before END card".to_string(),
                }
            } else {
                ExtractionError::Io(e)
            });
        }
        if index == 0 && !block.starts_with(b"SIMPLE  =") {
            return Err(ExtractionError::NotFits {
                reason: "missing SIMPLE card".to_string(),
            });
        }

        for card in block.chunks(CARD_SIZE) {
            let card = String::from_utf8_lossy(card);
            let keyword = card.get(..8).unwrap_or(&*card).trim_end();
            if keyword == "END" {
                return Ok(cards);
            }
            if card.get(8..10) != Some("= ") {
                continue;
            }
            if let Some(value) = card.get(10..).map(parse_value) {
                cards.insert(keyword.to_string(), value);
            }
        }
    }

    Err(ExtractionError::NotFits {
        reason: format!("no END card in the first {} blocks", MAX_HEADER_BLOCKS),
    })
}

/// Parse a card's value field, dropping any trailing `/ comment`
fn parse_value(field: &str) -> String {
    if let Some(caps) = STRING_VALUE.captures(field) {
        return caps[1].replace("''", "'").trim_end().to_string();
    }
    field
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn header(cards: &[&str]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for card in cards.iter().chain(std::iter::once(&"END")) {
            bytes.extend(format!("{:<80}", card).bytes());
        }
        let padded = bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        bytes.resize(padded, b' ');
        bytes
    }

    fn igrins_cards() -> Vec<&'static str> {
        vec![
            "SIMPLE  =                    T / conforms to FITS standard",
            "BITPIX  =                   16",
            "NAXIS   =                    0",
            "INSTRUME= 'IGRINS-2'           / instrument",
            "OBSID   = 'GN-2024A-Q-101-7'",
            "OBJECT  = 'HD 1234 '",
            "OBSTYPE = 'OBJECT  '",
            "OBSCLASS= 'science '",
            "EXPTIME =                300.0 / seconds",
            "COMMENT this card is ignored",
        ]
    }

    #[test]
    fn test_read_primary_header_parses_cards() {
        let cards = read_primary_header(&header(&igrins_cards())[..]).unwrap();
        assert_eq!(cards["OBSID"], "GN-2024A-Q-101-7");
        assert_eq!(cards["OBJECT"], "HD 1234");
        assert_eq!(cards["EXPTIME"], "300.0");
        assert_eq!(cards["SIMPLE"], "T");
        assert!(!cards.contains_key("COMMENT"));
    }

    #[test]
    fn test_parse_value_unescapes_quotes() {
        assert_eq!(parse_value("'O''Brien'  / name"), "O'Brien");
        assert_eq!(parse_value("   42 / answer"), "42");
    }

    #[test]
    fn test_read_primary_header_rejects_non_fits() {
        let err = read_primary_header(&vec![b'x'; BLOCK_SIZE][..]).unwrap_err();
        assert!(matches!(err, ExtractionError::NotFits { .. }));
    }

    #[test]
    fn test_read_primary_header_requires_end() {
        let mut bytes = header(&["SIMPLE  =                    T"]);
        // Blank out the END card
        bytes[CARD_SIZE..CARD_SIZE + 3].copy_from_slice(b"   ");
        let err = read_primary_header(&bytes[..]).unwrap_err();
        assert!(matches!(err, ExtractionError::NotFits { .. }));
    }

    #[test]
    fn test_header_extractor_builds_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("SDCH_0001.fits");
        std::fs::write(&path, header(&igrins_cards())).unwrap();

        let meta = HeaderExtractor::default().extract(&path).unwrap();
        assert_eq!(meta.filename, "SDCH_0001.fits");
        assert_eq!(meta.observation_id, "GN-2024A-Q-101-7");
        assert_eq!(meta.object, "HD 1234");
        assert_eq!(meta.exposure_time, 300.0);
        let expected: BTreeSet<String> = ["IGRINS-2", "OBJECT", "SCIENCE"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(meta.tags, expected);
    }

    #[test]
    fn test_header_extractor_missing_keyword() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.fits");
        std::fs::write(&path, header(&["SIMPLE  =                    T"])).unwrap();

        let err = HeaderExtractor::default().extract(&path).unwrap_err();
        match err {
            ExtractionError::MissingKeyword { keyword } => assert_eq!(keyword, "OBSID"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_extractor_invalid_exptime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.fits");
        let cards = [
            "SIMPLE  =                    T",
            "OBSID   = 'X'",
            "EXPTIME = 'long'",
        ];
        std::fs::write(&path, header(&cards)).unwrap();

        let err = HeaderExtractor::default().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidValue { .. }));
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("partner cal"), "PARTNER_CAL");
        assert_eq!(normalize_tag("flat"), "FLAT");
    }

    #[test]
    fn test_extract_records_wraps_failures_with_path() {
        let mut mock = MockMetadataExtractor::new();
        mock.expect_extract().returning(|path| {
            if path.ends_with("b.fits") {
                Err(ExtractionError::MissingKeyword {
                    keyword: "EXPTIME".to_string(),
                })
            } else {
                Ok(ExposureMetadata {
                    filename: "a.fits".to_string(),
                    observation_id: "OBS".to_string(),
                    object: "Vega".to_string(),
                    tags: BTreeSet::new(),
                    exposure_time: 1.5,
                })
            }
        });

        let ok = extract_records(&[Path::new("a.fits")], &mock).unwrap();
        assert_eq!(ok[0].identity, "OBS - Vega");
        assert_eq!(ok[0].exposure_time, "1.5s");

        let paths = [Path::new("a.fits"), Path::new("b.fits")];
        let err = extract_records(&paths, &mock).unwrap_err();
        match err {
            TreeError::RecordExtraction { path, source } => {
                assert_eq!(path, Path::new("b.fits"));
                assert!(matches!(source, ExtractionError::MissingKeyword { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
