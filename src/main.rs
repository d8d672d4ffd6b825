use std::{
    env, fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{bail, Context};
use clap::Parser;
use cmd::Commands;
use oxistore::{Object, Repository};
use tracing_subscriber::EnvFilter;

mod cmd;

fn current_dir() -> Result<PathBuf, anyhow::Error> {
    env::current_dir().with_context(|| "Can't get current working directory")
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = cmd::Cli::parse();

    match cli.command {
        Commands::Init { root_path } => {
            let root = match root_path {
                Some(root) => root,
                None => current_dir()?,
            };
            let repo = Repository::init(&root)
                .with_context(|| format!("Can't initialize repository in {}", root.display()))?;
            println!(
                "Initialized empty repository in {}",
                repo.git_dir().display()
            );
        }
        Commands::HashObject { write, kind, path } => {
            let data =
                fs::read(&path).with_context(|| format!("Can't read {}", path.display()))?;
            let object = Object::decode(kind, &data)
                .with_context(|| format!("{} is not a valid {kind} object", path.display()))?;

            let oid = if write {
                Repository::find_root(current_dir()?)?.write_object(&object, true)?
            } else {
                *object.encode_for_storage().oid()
            };
            println!("{oid}");
        }
        Commands::CatFile { kind, object } => {
            let repo = Repository::find_root(current_dir()?)?;
            let oid = repo.find_object(&object)?;
            let found = repo
                .read_object(&oid)
                .with_context(|| format!("Can't read object {oid}"))?;
            if found.kind() != kind {
                bail!("object {oid} is a {}, not a {kind}", found.kind());
            }
            io::stdout().write_all(&found.to_bytes())?;
        }
    }

    Ok(())
}
