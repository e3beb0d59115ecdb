//! Model editor
//!
//! ```text
//! trellis-editor [--scale <factor>] [--plane <diffuse> <normal>] <model>...
//! ```

use std::path::PathBuf;

use clap::Parser;
use trellis::prelude::*;

/// Trellis model editor arguments
#[derive(Parser, Debug)]
#[command(name = "trellis-editor", about = "Hierarchical model editor", version)]
struct Args {
    /// Uniform scale applied to imported vertex positions
    #[arg(long)]
    scale: Option<f32>,

    /// Show a normal-mapped test plane using these diffuse and normal maps
    #[arg(long, num_args = 2, value_names = ["DIFFUSE", "NORMAL"])]
    plane: Option<Vec<PathBuf>>,

    /// Model files to import on startup (OBJ or glTF)
    models: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = EditorConfig::default();
    if let Some(scale) = args.scale {
        config.import = config.import.with_mesh_scale(scale);
    }
    if let Some([diffuse, normal]) = args.plane.as_deref() {
        config = config.with_test_plane(diffuse, normal);
    }

    let mut app = EditorApp::new(config)?;
    for model in args.models {
        app.add_model(model);
    }
    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_takes_two_paths() {
        let args = Args::try_parse_from(["trellis-editor", "--plane", "d.png", "n.png", "--scale", "0.5", "a.obj"]).unwrap();
        assert_eq!(args.scale, Some(0.5));
        assert_eq!(args.plane, Some(vec![PathBuf::from("d.png"), PathBuf::from("n.png")]));
        assert_eq!(args.models, [PathBuf::from("a.obj")]);

        assert!(Args::try_parse_from(["trellis-editor", "--plane", "d.png"]).is_err());
    }
}
