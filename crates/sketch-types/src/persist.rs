use serde::{Deserialize, Serialize};

use crate::sketch::Sketch;

/// Format identifier stored in saved files.
pub const FORMAT_NAME: &str = "sketch-solver";

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// Errors during sketch file loading.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse file: {0}")]
    ParseError(String),

    #[error("unknown file format: {0}")]
    UnknownFormat(String),

    #[error("file version {file_version} is newer than supported version {supported_version}")]
    FutureVersion {
        file_version: u32,
        supported_version: u32,
    },
}

/// The top-level file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchFile {
    /// Format identifier.
    pub format: String,
    /// Format version number.
    pub version: u32,
    /// The sketch: entity records and constraint records.
    pub sketch: Sketch,
}

/// Serialize a sketch to a pretty-printed JSON string.
pub fn save_sketch(sketch: &Sketch) -> String {
    let file = SketchFile {
        format: FORMAT_NAME.to_string(),
        version: FORMAT_VERSION,
        sketch: sketch.clone(),
    };
    serde_json::to_string_pretty(&file).expect("Sketch serialization should never fail")
}

/// Deserialize a sketch from a JSON string.
///
/// Validates the format identifier and version.
pub fn load_sketch(json: &str) -> Result<Sketch, LoadError> {
    let raw: SketchFile =
        serde_json::from_str(json).map_err(|e| LoadError::ParseError(e.to_string()))?;

    if raw.format != FORMAT_NAME {
        return Err(LoadError::UnknownFormat(raw.format));
    }

    if raw.version > FORMAT_VERSION {
        return Err(LoadError::FutureVersion {
            file_version: raw.version,
            supported_version: FORMAT_VERSION,
        });
    }

    Ok(raw.sketch)
}
