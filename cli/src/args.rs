//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Inspect a glTF 2.0 / GLB asset and the data it references.
#[derive(Parser, Debug)]
#[command(
    name = "gltf-inspect",
    about = "Inspect a glTF 2.0 / GLB asset",
    long_about = "Loads a .gltf or .glb file and prints what its buffers, accessors and \
        images resolve to. Only the document is read up front; everything else is \
        fetched when asked for.\n\
        \n\
        Passing several files loads them the way a drag-and-drop would: the first \
        .gltf/.glb is the document and the rest are served from memory.\n\
        \n\
        EXAMPLES:\n\
          gltf-inspect models/ToyCar.glb --prefetch\n\
          gltf-inspect scene.gltf scene.bin albedo.png --accessor 0 1 --image 0\n\
        \n\
        Set RUST_LOG=debug to see every fetch and cache hit.",
    version
)]
pub struct Args {
    /// The document, optionally followed by the files it references.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Directory relative paths are read from.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Fetch every buffer and image before printing.
    #[arg(long)]
    pub prefetch: bool,

    /// Accessors to resolve and print.
    #[arg(long, num_args = 1..)]
    pub accessor: Vec<usize>,

    /// Images to resolve and print.
    #[arg(long, num_args = 1..)]
    pub image: Vec<usize>,

    /// Number of values to print per accessor.
    #[arg(long, default_value = "12")]
    pub preview: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lists() {
        let args = Args::parse_from([
            "gltf-inspect",
            "a.gltf",
            "a.bin",
            "--accessor",
            "0",
            "2",
            "--image",
            "1",
            "--prefetch",
        ]);
        assert_eq!(args.files, ["a.gltf", "a.bin"]);
        assert_eq!(args.accessor, [0, 2]);
        assert_eq!(args.image, [1]);
        assert!(args.prefetch);
        assert_eq!(args.root, PathBuf::from("."));
    }

    #[test]
    fn requires_a_file() {
        assert!(Args::try_parse_from(["gltf-inspect"]).is_err());
    }
}
