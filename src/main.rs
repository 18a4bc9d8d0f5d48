use anyhow::Context;
use clap::{Parser, Subcommand};
use silt::areas::repository::Repository;
use silt::artifacts::merge::engine::MergeStrategy;
use silt::commands::commit::CommitOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "silt", version, about = "Minimal content-addressed version control")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty repository in the current directory
    Init,
    /// Stage files for the next commit
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Unstage files and remove them from the working tree
    Rm {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Record the staged snapshot as a new commit
    Commit {
        #[arg(short, long)]
        message: String,
        /// Author as "Name <email>", overriding the environment identity
        #[arg(long)]
        author: Option<String>,
    },
    /// Create, list, or delete branches
    Branch {
        name: Option<String>,
        #[arg(short, long)]
        delete: bool,
    },
    /// Switch to a branch or commit
    Checkout { target: String },
    /// Show the history of HEAD, optionally restricted to one file
    Log { path: Option<PathBuf> },
    /// Print a file's contents as recorded by a revision
    Show { revision: String, path: PathBuf },
    /// Merge another revision into HEAD
    Merge {
        target: String,
        /// Resolve every conflict in favor of the current branch
        #[arg(long)]
        ours: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let current_dir = std::env::current_dir().context("unable to determine current directory")?;
    let repository = Repository::new(&current_dir, Box::new(std::io::stdout()))
        .context("unable to open repository")?;

    match cli.command {
        Command::Init => repository.init()?,
        Command::Add { paths } => repository.add(&paths)?,
        Command::Rm { paths } => repository.rm(&paths)?,
        Command::Commit { message, author } => {
            repository.commit(&CommitOptions { message, author })?;
        }
        Command::Branch { name, delete } => match (name, delete) {
            (Some(name), true) => repository.delete_branch(&name)?,
            (Some(name), false) => repository.create_branch(&name)?,
            (None, _) => {
                repository.branches()?;
            }
        },
        Command::Checkout { target } => repository.checkout(&target)?,
        Command::Log { path } => {
            repository.log(path.as_deref())?;
        }
        Command::Show { revision, path } => {
            repository.show(&revision, &path)?;
        }
        Command::Merge { target, ours } => {
            let strategy = if ours {
                MergeStrategy::TakeOurs
            } else {
                MergeStrategy::Resolve
            };
            repository.merge(&target, strategy)?;
        }
    }

    Ok(())
}
