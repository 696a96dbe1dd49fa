//! Score document loading.
//!
//! Resolves the score XML source from either a plain MusicXML file or a
//! compressed `.mxl` container. The container case follows the standard
//! packaging rules: `META-INF/container.xml` names the root document via
//! the first `rootfile` element carrying a usable `full-path` attribute.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use roxmltree::Document;
use zip::ZipArchive;

use super::{Result, ScoreError};

const CONTAINER_MANIFEST: &str = "META-INF/container.xml";

/// Declared on-disk format of a score file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFormat {
    /// Plain MusicXML text.
    MusicXml,
    /// Zip container with a manifest pointing at the root document.
    Mxl,
}

impl ScoreFormat {
    /// Infer the format from the file extension; `.mxl` means container.
    pub fn from_path(path: &Path) -> ScoreFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mxl") => ScoreFormat::Mxl,
            _ => ScoreFormat::MusicXml,
        }
    }
}

/// Read the score XML source for the given path and declared format.
///
/// The file handle (and archive entry reader) is released before this
/// returns; later pipeline stages only see the owned string.
pub fn read_score_source(path: &Path, format: ScoreFormat) -> Result<String> {
    match format {
        ScoreFormat::MusicXml => Ok(std::fs::read_to_string(path)?),
        ScoreFormat::Mxl => read_mxl_archive(path),
    }
}

fn read_mxl_archive(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| ScoreError::Container(e.to_string()))?;

    let manifest = read_archive_entry(&mut archive, CONTAINER_MANIFEST)?;
    let container = Document::parse(&manifest)
        .map_err(|e| ScoreError::Container(format!("bad container manifest: {}", e)))?;

    let root_path = container
        .descendants()
        .filter(|n| n.has_tag_name("rootfile"))
        .find_map(|n| n.attribute("full-path").filter(|p| !p.is_empty()))
        .ok_or_else(|| ScoreError::Container("manifest names no root file".to_string()))?
        .to_string();

    read_archive_entry(&mut archive, &root_path)
}

fn read_archive_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| ScoreError::Container(format!("{}: {}", name, e)))?;
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}
