//! Audio Tag Extraction
//!
//! Extracts track metadata from partial file data using the `lofty` crate.
//! Extraction runs against the leading byte range of a file, never the
//! whole object, so a parse failure is an expected outcome: every failure
//! path degrades to fallback metadata derived from the file name.

use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::io::Cursor;
use tracing::debug;

use crate::error::{MetadataError, Result};
use core_library::{TrackMetadata, UNKNOWN_ARTIST};

/// File extensions recognized as playable audio (lowercase).
const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "flac", "wav", "m4a", "ogg", "aac"];

/// Whether an object key names a supported audio file.
pub fn is_audio_file(key: &str) -> bool {
    extension(key)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// MIME type for a file name, defaulting to `audio/mpeg`.
pub fn mime_type(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("flac") => "audio/flac",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("aac") => "audio/aac",
        _ => "audio/mpeg",
    }
}

fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Extracts metadata from audio byte ranges using `lofty`.
pub struct MetadataExtractor {
    parse_options: ParseOptions,
}

impl MetadataExtractor {
    /// Create a new metadata extractor with default settings
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    /// Create extractor with custom parse options
    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    /// Extracts metadata from partial file data.
    ///
    /// Never fails: when the bytes cannot be parsed (truncated range,
    /// unsupported tag layout, corrupt header) the result falls back to
    /// a title derived from the file name with zeroed properties.
    pub fn extract(&self, data: &[u8], file_name: &str) -> TrackMetadata {
        match self.try_extract(data, file_name) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(file = file_name, error = %e, "Tag parse failed, using fallback");
                Self::fallback(file_name)
            }
        }
    }

    fn try_extract(&self, data: &[u8], file_name: &str) -> Result<TrackMetadata> {
        let tagged_file = Probe::new(Cursor::new(data))
            .options(self.parse_options)
            .guess_file_type()
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to probe: {}", e)))?
            .read()
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to parse: {}", e)))?;

        let properties = tagged_file.properties();
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

        let title = tag
            .and_then(|t| t.title().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| title_from_file_name(file_name));

        let artist = tag
            .and_then(|t| t.artist().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

        Ok(TrackMetadata {
            title,
            artist,
            duration: properties.duration().as_secs_f64(),
            // lofty reports kbps
            bitrate: properties.audio_bitrate().map(|k| k * 1000).unwrap_or(0),
        })
    }

    /// Fallback metadata when no tag can be read.
    pub fn fallback(file_name: &str) -> TrackMetadata {
        TrackMetadata {
            title: title_from_file_name(file_name),
            artist: UNKNOWN_ARTIST.to_string(),
            duration: 0.0,
            bitrate: 0,
        }
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives a display title from a file name: drops the extension, leading
/// track numbers with their separators, and one leading bracketed tag.
pub fn title_from_file_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };

    let mut rest = stem;
    loop {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            break;
        }
        let after = &rest[digits..];
        let seps = after
            .chars()
            .take_while(|c| matches!(c, ' ' | '\t' | '.' | '-'))
            .count();
        if seps == 0 {
            break;
        }
        rest = &after[seps..];
    }

    if let Some(inner) = rest.strip_prefix('[') {
        if let Some(end) = inner.find(']') {
            rest = &inner[end + 1..];
        }
    }

    let cleaned = rest.trim();
    if cleaned.is_empty() {
        stem.trim().to_string()
    } else {
        cleaned.to_string()
    }
}
