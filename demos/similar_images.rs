//! Index every image in a directory and list the closest matches for a query.
//!
//! Usage: `cargo run --example similar_images -- <image-dir> [query-image] [k]`
//!
//! Without a query, each indexed image is matched against the rest.

use imgsig::{ExtractorConfig, Signature, SignaturePipeline, SignatureTree, TreeConfig};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let dir = PathBuf::from(args.next().ok_or("missing image directory")?);
    let query = args.next().map(PathBuf::from);
    let k: usize = match args.next() {
        Some(k) => k.parse()?,
        None => 5,
    };

    let pipeline = SignaturePipeline::new(ExtractorConfig {
        shuffle: true,
        ..ExtractorConfig::default()
    });
    let mut tree = SignatureTree::new(TreeConfig::with_max_entries(16));
    let mut paths = Vec::new();

    let start_time = Instant::now();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match pipeline.pattern_from_file(&path) {
            Ok(pattern) => {
                let id = tree.insert(Signature::from_pattern(&pattern))?;
                debug_assert_eq!(id, paths.len());
                paths.push(path);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    info!(
        "Indexed {} images in {:?}, tree depth {}",
        tree.len(),
        start_time.elapsed(),
        tree.depth()
    );

    let queries: Vec<(PathBuf, Signature)> = match query {
        Some(path) => {
            let pattern = pipeline.pattern_from_file(&path)?;
            vec![(path, Signature::from_pattern(&pattern))]
        }
        None => paths
            .iter()
            .enumerate()
            .filter_map(|(id, path)| tree.get(id).map(|signature| (path.clone(), *signature)))
            .collect(),
    };

    for (path, signature) in &queries {
        println!("{}", path.display());
        for neighbor in tree.nearest(signature, k) {
            println!("  {:>10.4}  {}", neighbor.distance, paths[neighbor.id].display());
        }
    }

    Ok(())
}
