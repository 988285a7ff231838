//! Mesh asset loading: JSON `{ "cells": [[i,j,k], ...], "positions": [[x,y,z], ...] }`.

use std::path::{Path, PathBuf};

use crate::MeshSource;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed mesh json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid mesh: {0}")]
    Invalid(String),
}

/// Parse and validate a mesh source from JSON text.
pub fn parse_mesh_source(text: &str) -> Result<MeshSource, AssetError> {
    let source: MeshSource = serde_json::from_str(text)?;
    source.validate().map_err(AssetError::Invalid)?;
    Ok(source)
}

/// Read a mesh source from disk. Any failure here is fatal for the host: nothing is
/// rendered with a partial scene.
pub fn load_mesh_source(path: impl AsRef<Path>) -> Result<MeshSource, AssetError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = parse_mesh_source(&text)?;
    log::info!(
        "loaded mesh {}: {} vertices, {} triangles",
        path.display(),
        source.positions.len(),
        source.cells.len()
    );
    Ok(source)
}
