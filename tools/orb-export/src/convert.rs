//! Full conversion pipeline: FBX inputs -> one Orb container.

use std::path::Path;

use anyhow::{Context, Result};

use crate::fbx;
use crate::formats::write_orb;
use crate::mesh::{bake_document, BakeOptions, OrbDocument};
use crate::scene;

/// Convert FBX files, in argument order, into one Orb container.
///
/// All inputs merge into a single accumulating document; sections
/// deduplicate by name, first writer wins.
pub fn convert_files<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<()> {
    let mut doc = OrbDocument::default();
    let options = BakeOptions::default();

    for input in inputs {
        let input = input.as_ref();
        convert_into(&mut doc, input, &options)
            .with_context(|| format!("failed to convert {}", input.display()))?;
    }

    // Encode fully in memory so a failed write never leaves a partial
    // file behind.
    let mut buffer = Vec::new();
    write_orb(&mut buffer, &doc)?;
    std::fs::write(output, &buffer)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        output = %output.display(),
        bytes = buffer.len(),
        "wrote Orb container"
    );
    Ok(())
}

/// Run one input file through decode, extract, resolve and bake,
/// appending into the accumulating document.
pub fn convert_into(out: &mut OrbDocument, input: &Path, options: &BakeOptions) -> Result<()> {
    let data =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let tree = fbx::decode_tree(&data)?;
    let mut document = fbx::extract(&tree)?;
    let graph = scene::resolve(&mut document);
    bake_document(&document, &graph, out, options)?;
    Ok(())
}
