#[macro_use]
extern crate tracing;

use std::io::{self, Read as _};
use std::path::PathBuf;
use std::{env, fs};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use panetree::layout::LayoutTree;
use panetree::script::Script;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Parser)]
#[command(about = "Replay a pane layout script and print the resulting tree", version)]
struct Cli {
    /// Script to replay, one command per line. Reads standard input when omitted.
    script: Option<PathBuf>,

    /// Value of the initial pane.
    #[arg(long, default_value = "main", value_name = "VALUE")]
    initial: String,

    /// How to print the tree.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Print the tree after every command rather than only on `print`.
    ///
    /// Without this flag, a script with no `print` command gets the final tree printed.
    #[arg(long)]
    print_each: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON snapshot.
    Json,
    /// Indented outline with the focused pane starred.
    Tree,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directives = env::var("RUST_LOG").unwrap_or_else(|_| "panetree=info".to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(io::stderr)
        .with_env_filter(env_filter)
        .init();

    let text = match &cli.script {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("error reading {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("error reading standard input")?;
            text
        }
    };
    let script = Script::parse(&text)?;

    let mut tree = LayoutTree::new(cli.initial.clone());
    tree.subscribe(|snapshot| {
        debug!("layout changed, {} panes", snapshot.leaves().len());
    });

    let print = |tree: &LayoutTree<String>| -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(tree.snapshot())
                    .context("error serializing snapshot")?;
                println!("{json}");
            }
            OutputFormat::Tree => print!("{}", tree.debug_tree()),
        }
        Ok(())
    };

    script.run(&mut tree, cli.print_each, print)?;
    info!(
        "finished with {} panes, focused on {}",
        tree.leaf_count(),
        tree.focused()
    );

    // Scripts that print on their own are not printed again.
    if !cli.print_each && !script.has_print() {
        print(&tree)?;
    }

    Ok(())
}
