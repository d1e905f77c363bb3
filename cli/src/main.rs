//! `gltf-inspect`: load a glTF asset and print what it resolves to.

mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lazy_gltf_core::gltf::{GltfAsset, GltfLoader};
use lazy_gltf_vfs::{FileSystemProvider, LoadingManager, Vfs};

use args::Args;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::debug!("{args:?}");

    let manager = Arc::new(
        LoadingManager::new()
            .on_progress(|url, loaded, total| log::debug!("[{loaded}/{total}] {url}"))
            .on_error(|url| log::warn!("could not load {url}")),
    );

    let mut vfs = Vfs::new();
    vfs.mount("file", FileSystemProvider::new(&args.root));
    vfs.set_default("file");
    let loader = GltfLoader::new(vfs).with_manager(manager.clone());

    let asset = match args.files.as_slice() {
        [document] => pollster::block_on(loader.load(document, None))
            .with_context(|| format!("failed to load {document}"))?,
        files => {
            let mut dropped = Vec::with_capacity(files.len());
            for name in files {
                let path = args.root.join(name);
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                dropped.push((name.clone(), bytes));
            }
            pollster::block_on(loader.load_from_files(dropped))?
        }
    };

    print_summary(&asset);

    if args.prefetch {
        pollster::block_on(asset.prefetch_all()).context("prefetch failed")?;
        print_buffers(&asset);
    }

    for &index in &args.accessor {
        let data = pollster::block_on(asset.accessor_data(index))
            .with_context(|| format!("accessor {index}"))?;
        let values = data.to_f32_vec();
        let shown = values.len().min(args.preview);
        println!(
            "accessor {index}: {} x {} ({:?}{}), {} bytes",
            data.count(),
            data.accessor_type(),
            data.component_type(),
            if data.normalized() { ", normalized" } else { "" },
            data.bytes().len()
        );
        println!(
            "  {:?}{}",
            &values[..shown],
            if shown < values.len() { " ..." } else { "" }
        );
    }

    for &index in &args.image {
        let image = pollster::block_on(asset.image_data(index))
            .with_context(|| format!("image {index}"))?;
        println!("image {index}: {}x{} RGBA8", image.width, image.height);
    }

    log::info!(
        "{} of {} item(s) loaded",
        manager.items_loaded(),
        manager.items_total()
    );
    Ok(())
}

fn print_summary(asset: &GltfAsset) {
    let doc = asset.document();
    if let Some(info) = &doc.asset {
        println!("glTF {}", info.version);
        if let Some(generator) = &info.generator {
            println!("generator: {generator}");
        }
    }
    println!("buffers:     {}", doc.buffers.as_ref().map_or(0, Vec::len));
    println!("bufferViews: {}", doc.buffer_views.as_ref().map_or(0, Vec::len));
    println!("accessors:   {}", doc.accessors.as_ref().map_or(0, Vec::len));
    println!("images:      {}", doc.images.as_ref().map_or(0, Vec::len));
    println!("meshes:      {}", doc.meshes().len());
    println!("materials:   {}", doc.materials().len());
    println!("nodes:       {}", doc.nodes().len());
    println!("scenes:      {}", doc.scenes().len());
    if let Some(chunk) = asset.binary_chunk() {
        println!("binary chunk: {} bytes", chunk.len());
    }
    if !doc.extensions_required.is_empty() {
        println!("extensions required: {}", doc.extensions_required.join(", "));
    }
}

fn print_buffers(asset: &GltfAsset) {
    let count = asset.document().buffers.as_ref().map_or(0, Vec::len);
    for index in 0..count {
        if let Some(buffer) = asset.cached_buffer(index) {
            println!("buffer {index}: {} bytes", buffer.len());
        }
    }
}
