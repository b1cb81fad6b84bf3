use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    time::Instant,
};

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

use common::progress::Progress;
use support::{mesh::load_mesh, supports::SupportGenerator};

mod args;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target("support", level)
        .with_target("common", level);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.support_config()?;
    if let Some(path) = &args.save_config {
        config.save(path)?;
    }

    let ext = (args.mesh.extension())
        .context("Mesh file has no extension")?
        .to_string_lossy();
    let mut buf = BufReader::new(
        File::open(&args.mesh)
            .with_context(|| format!("Failed to open `{}`", args.mesh.display()))?,
    );

    let mut mesh = load_mesh(&mut buf, &ext)?;
    if let Some(offset) = args.offset {
        mesh = mesh.translate(offset);
    }

    println!(
        "Loaded `{}`. {{ vert: {}, face: {} }}",
        args.mesh.file_name().unwrap_or_default().to_string_lossy(),
        mesh.vertex_count(),
        mesh.face_count()
    );

    let (min, _max) = mesh.bounds();
    if min.z < 0.0 {
        warn!("Model extends below the build plate, the support volume will be wrong.");
    }

    if args.check_manifold && !mesh.is_manifold(Progress::new()) {
        warn!("Model is not manifold, the support boundary may be incomplete.");
    }

    let now = Instant::now();
    let support = SupportGenerator::new(&config).generate(&mesh)?;

    println!(
        "Supported faces: {}, boundary edges: {}, triangles: {}",
        support.face_count(),
        support.boundary_count(),
        support.triangle_count()
    );
    println!(
        "Support volume: {:.3}, footprint: {:.3}",
        support.volume,
        support.footprint()
    );

    let closed = || support.to_mesh().is_manifold(Progress::new());
    if args.check_manifold && !support.is_empty() && !closed() {
        warn!("Support solid is not a closed surface, overhangs may overlap or the model has open faces.");
    }

    if let Some(output) = &args.output {
        let mut file = BufWriter::new(
            File::create(output)
                .with_context(|| format!("Failed to create `{}`", output.display()))?,
        );
        support.write_stl(&mut file)?;
        file.flush()?;
    }

    println!("Done. Elapsed: {:.1}s", now.elapsed().as_secs_f32());
    Ok(())
}
