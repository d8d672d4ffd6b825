use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oxistore::ObjectKind;

#[derive(Parser)]
#[command(about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new, empty repository
    Init {
        /// Root path
        root_path: Option<PathBuf>,
    },

    /// Compute an object id and optionally store the object
    HashObject {
        /// Write the object into the object database
        #[arg(short = 'w')]
        write: bool,

        /// Object type
        #[arg(short = 't', long = "type", default_value = "blob")]
        kind: ObjectKind,

        /// File to read the object content from
        path: PathBuf,
    },

    /// Print the content of a stored object
    CatFile {
        /// Expected object type
        kind: ObjectKind,

        /// Full or abbreviated object id
        object: String,
    },
}
