use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Enumerate the modules and precompiled artifacts under a store root.
    InspectStore {
        /// Store root directory (one subdirectory per module).
        #[arg(long, value_name = "DIR")]
        root: PathBuf,
    },

    /// Resolve a unit name against a JSON image of modules and IR.
    Resolve {
        /// The unit name to resolve (e.g. `dyn.pkgA.Widget`).
        #[arg(value_name = "NAME")]
        name: String,

        /// JSON image describing modules, member IR, companions, and
        /// pre-staged buffers.
        #[arg(long, value_name = "PATH")]
        image: PathBuf,

        /// Optional store root; image modules flagged `use_store` read
        /// precompiled artifacts from here.
        #[arg(long, value_name = "DIR")]
        store_root: Option<PathBuf>,

        /// Base extension directory for the fallback search path.
        /// Defaults to `<home>/lib/dynload/ext`.
        #[arg(long, value_name = "DIR")]
        ext_dir: Option<PathBuf>,

        /// Platform identifier naming the extension subdirectory searched
        /// after the base directory. Defaults to `<os>-<arch>`.
        #[arg(long, value_name = "ID")]
        platform: Option<String>,

        /// Also print the host's definition log after resolving.
        #[arg(long, default_value_t = false)]
        show_defines: bool,
    },
}
