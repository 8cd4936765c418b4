use anyhow::Result;
use clap::Parser;
use pkgfinder::collect::SearchScope;
use pkgfinder::commands::{self, DEFAULT_IMPLEMENTATION, DEFAULT_PYTHON, FinderOptions};

/// Index used when neither --index-url nor --no-index is given.
const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple";

/// pkgfinder - find installable Python distributions
///
/// Scans find-links locations and simple-repository indexes for a project's
/// archives and reports which one an installer would pick for the target
/// interpreter.
///
/// If the PKGFINDER_INDEX_TOKEN environment variable is set, it is sent as a
/// bearer token to every index.
///
/// Examples:
///   pkgfinder find "requests>=2"         # Best candidate from PyPI
///   pkgfinder --no-index -f ./wheels list mypkg
///   pkgfinder tags --python 3.9 --limit 10
#[derive(Parser, Debug)]
#[command(author, version = env!("PKGFINDER_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of a simple-repository index; repeat for several
    #[arg(
        long = "index-url",
        short = 'i',
        env = "PKGFINDER_INDEX_URL",
        value_name = "URL",
        value_delimiter = ' ',
        global = true
    )]
    pub index_urls: Vec<String>,

    /// Ignore every index and use only find-links locations
    #[arg(long = "no-index", global = true)]
    pub no_index: bool,

    /// Directory, HTML file or URL to scan for archives; repeat for several
    #[arg(
        long = "find-links",
        short = 'f',
        env = "PKGFINDER_FIND_LINKS",
        value_name = "LOCATION",
        value_delimiter = ' ',
        global = true
    )]
    pub find_links: Vec<String>,

    /// Log skipped links and source scanning
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl Cli {
    fn scope(&self) -> SearchScope {
        let index_urls = if self.no_index {
            Vec::new()
        } else if self.index_urls.is_empty() {
            vec![DEFAULT_INDEX_URL.to_string()]
        } else {
            self.index_urls.clone()
        };
        SearchScope::new(self.find_links.clone(), index_urls)
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Find the best candidate for a requirement
    Find(FindArgs),

    /// List every usable candidate for a project
    List(ListArgs),

    /// Show the tags supported by the target interpreter
    Tags(TagsArgs),
}

#[derive(clap::Args, Debug)]
pub struct TargetArgs {
    /// Target Python version, e.g. 3.12
    #[arg(long = "python", value_name = "X.Y", default_value = DEFAULT_PYTHON)]
    pub python_version: String,

    /// Interpreter implementation abbreviation (cp, pp, ...)
    #[arg(long, value_name = "IMPL", default_value = DEFAULT_IMPLEMENTATION)]
    pub implementation: String,
}

#[derive(clap::Args, Debug, Default)]
pub struct PolicyArgs {
    /// Include pre-release and development versions
    #[arg(long)]
    pub pre: bool,

    /// Allow yanked releases when the requirement pins their version
    #[arg(long)]
    pub allow_yanked: bool,

    /// Ignore the requires-python metadata of links
    #[arg(long)]
    pub ignore_requires_python: bool,

    /// Never use binary distributions for these projects (:all:, :none:, names)
    #[arg(long, value_name = "NAMES")]
    pub no_binary: Vec<String>,

    /// Only use binary distributions for these projects (:all:, :none:, names)
    #[arg(long, value_name = "NAMES")]
    pub only_binary: Vec<String>,

    /// Accept only archives with this digest, as <algorithm>:<hex>
    #[arg(long = "hash", value_name = "HASH")]
    pub hashes: Vec<String>,
}

fn finder_options(target: TargetArgs, policy: PolicyArgs) -> FinderOptions {
    FinderOptions {
        python_version: target.python_version,
        implementation: target.implementation,
        allow_prereleases: policy.pre,
        allow_yanked: policy.allow_yanked,
        ignore_requires_python: policy.ignore_requires_python,
        no_binary: policy.no_binary,
        only_binary: policy.only_binary,
        hashes: policy.hashes,
    }
}

#[derive(clap::Args, Debug)]
pub struct FindArgs {
    /// Requirement such as "name>=1.0" or "name @ https://host/name-1.0.tar.gz"
    #[arg(value_name = "REQUIREMENT")]
    pub requirement: String,

    /// Version already installed; reported as satisfied if nothing is better
    #[arg(long, value_name = "VERSION")]
    pub installed: Option<String>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print every evaluated link and the ranked candidates
    #[arg(long)]
    pub explain: bool,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Project name
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// Print candidates as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(clap::Args, Debug)]
pub struct TagsArgs {
    /// Show only the first N tags
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Print tags as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = pkgfinder::runtime::RealRuntime;
    let scope = cli.scope();

    match cli.command {
        Commands::Find(args) => {
            let options = finder_options(args.target, args.policy);
            commands::find(
                runtime,
                scope,
                &args.requirement,
                args.installed.as_deref(),
                &options,
                args.json,
                args.explain,
            )
            .await?
        }
        Commands::List(args) => {
            let options = finder_options(args.target, args.policy);
            commands::list(runtime, scope, &args.project, &options, args.json).await?
        }
        Commands::Tags(args) => {
            let options = finder_options(args.target, PolicyArgs::default());
            commands::tags(&options, args.limit, args.json)?
        }
    }
    Ok(())
}
