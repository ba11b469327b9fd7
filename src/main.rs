use anyhow::{bail, Context};
use chessgraph::{
    BuildConfig, CacheConfig, CachedSource, ChessComClient, ClientConfig, Country, FilterSet,
    GraphBuilder, GraphSnapshotManager, JsonCache, MinRating, Period, PlayerGraph, PlayerSource,
};
use chessgraph_api::{DEFAULT_CATEGORY, DEFAULT_CONCURRENCY, DEFAULT_USER_AGENT};
use chessgraph_storage::DEFAULT_CACHE_DIR;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Build opponent graphs from chess.com player data
#[derive(Parser, Debug)]
#[command(name = "chessgraph", version)]
#[command(about = "Crawl chess.com players and build opponent graphs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory for memoized API responses
    #[arg(long, default_value = DEFAULT_CACHE_DIR, global = true)]
    cache_dir: PathBuf,

    /// Data directory; snapshots are kept under `snapshots/`
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Bypass the response cache (set CLOUD_ENV on hosts without a writable disk)
    #[arg(long, env = "CLOUD_ENV", value_parser = clap::builder::FalseyValueParser::new(), global = true)]
    no_cache: bool,

    /// User-Agent sent to chess.com; include contact details
    #[arg(long, env = "USER_AGENT", default_value = DEFAULT_USER_AGENT, global = true)]
    user_agent: String,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(flatten)]
    build: BuildArgs,
}

#[derive(ClapArgs, Debug)]
struct BuildArgs {
    /// Stats category the rating is read from
    #[arg(long, default_value = DEFAULT_CATEGORY, global = true)]
    category: String,

    /// Only count games of this time class (rapid, blitz, bullet, daily)
    #[arg(long, global = true)]
    time_class: Option<String>,

    /// Skip players rated below this
    #[arg(long, global = true)]
    min_rating: Option<u32>,

    /// Skip players not from this country (ISO code)
    #[arg(long, global = true)]
    country: Option<String>,

    /// Opponent lookups in flight at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, global = true)]
    concurrency: usize,

    /// Archive year; all months of it unless --month is given
    #[arg(long, global = true)]
    year: Option<i32>,

    /// Archive month (1-12), requires --year
    #[arg(long, global = true)]
    month: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a graph rooted at a player
    Graph {
        username: String,

        /// Levels of opponents to expand
        #[arg(long, default_value_t = 1)]
        depth: usize,

        /// Save the graph as a snapshot
        #[arg(long)]
        save: bool,

        /// Print the graph as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Add one level of opponents below a player in a saved graph
    Expand {
        username: String,

        /// Snapshot to expand; defaults to the most recent one
        #[arg(long)]
        snapshot: Option<String>,
    },
    /// Show a single player
    Player { username: String },
    /// Print a player's games as PGN
    Pgn { username: String },
    /// List saved graph snapshots
    Snapshots,
    /// Manage the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Delete every cached response
    Clear,
}

impl BuildArgs {
    fn to_config(&self, depth: usize) -> anyhow::Result<BuildConfig> {
        let mut filters = FilterSet::new();
        if let Some(min_rating) = self.min_rating {
            filters.push(MinRating(min_rating));
        }
        if let Some(country) = &self.country {
            filters.push(Country::new(country.as_str()));
        }

        Ok(BuildConfig {
            depth,
            period: Period::from_parts(self.year, self.month)?,
            category: self.category.clone(),
            time_class: self.time_class.clone(),
            filters,
            concurrency: self.concurrency,
        })
    }
}

impl Args {
    /// Response cache settings; `--no-cache` or `CLOUD_ENV` turn it off.
    fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            dir: self.cache_dir.clone(),
            enabled: !self.no_cache,
        }
    }
}

fn open_source(args: &Args) -> anyhow::Result<Box<dyn PlayerSource>> {
    let client = ChessComClient::new(ClientConfig {
        user_agent: args.user_agent.clone(),
        ..ClientConfig::default()
    })?;

    let cache_config = args.cache_config();
    if !cache_config.enabled {
        info!("Response cache disabled");
        return Ok(Box::new(client));
    }

    info!("Response cache: {:?}", cache_config.dir);
    let cache = JsonCache::new(cache_config)?;
    Ok(Box::new(CachedSource::new(client, cache)))
}

fn print_graph(graph: &PlayerGraph, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&graph.to_data())?);
        return Ok(());
    }

    let summary = graph.summary();
    println!("Number of nodes: {}", summary.node_count);
    println!("Number of edges: {}", summary.edge_count);
    println!("Number of games: {}", summary.game_count);
    println!("Average player rating: {:.2}", summary.average_rating);
    println!("Highest player rating: {}", summary.highest_rating);
    println!("Lowest player rating: {}", summary.lowest_rating);

    let data = graph.to_data();
    if !data.edges.is_empty() {
        println!();
        for edge in &data.edges {
            println!(
                "{} - {}  weight {}  games {} ({} {}, {} {})",
                edge.source,
                edge.target,
                edge.weight,
                edge.games.len(),
                edge.source,
                edge.wins_for(&edge.source),
                edge.target,
                edge.wins_for(&edge.target),
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting chessgraph v{}", env!("CARGO_PKG_VERSION"));

    match &args.command {
        Command::Graph { username, depth, save, json } => {
            let builder = GraphBuilder::new(open_source(&args)?, args.build.to_config(*depth)?);
            let graph = builder.initialize(username).await?;

            if *save {
                let snapshots = GraphSnapshotManager::new(args.data_dir.join("snapshots"))?;
                let description = snapshots.save(username, &graph)?;
                info!("Snapshot saved: {}", description.name);
            }
            print_graph(&graph, *json)?;
        }
        Command::Expand { username, snapshot } => {
            let snapshots = GraphSnapshotManager::new(args.data_dir.join("snapshots"))?;
            let (name, loaded) = match snapshot {
                Some(name) => (name.clone(), snapshots.load(name)?),
                None => match snapshots.load_latest()? {
                    Some(latest) => latest,
                    None => bail!("No snapshots in {:?}; run `chessgraph graph <username> --save` first", args.data_dir),
                },
            };
            info!("Expanding {} in snapshot {}", username, name);

            let label = loaded.label.clone();
            let mut graph = loaded.into_graph();
            let builder = GraphBuilder::new(open_source(&args)?, args.build.to_config(1)?);
            let added = builder.expand(&mut graph, username).await?;
            info!("Attached {} opponents of {}", added.len(), username);

            let description = snapshots.save(&label, &graph)?;
            info!("Snapshot saved: {}", description.name);
            print_graph(&graph, false)?;
        }
        Command::Player { username } => {
            let builder = GraphBuilder::new(open_source(&args)?, args.build.to_config(0)?);
            let player = builder.fetch_player(username).await?;
            println!("{}", serde_json::to_string_pretty(&player)?);
        }
        Command::Pgn { username } => {
            let source = open_source(&args)?;
            let period = Period::from_parts(args.build.year, args.build.month)?;
            let pgn = chessgraph_api::fetch_pgn(&source, username, period).await?;
            println!("{}", pgn);
        }
        Command::Snapshots => {
            let snapshots = GraphSnapshotManager::new(args.data_dir.join("snapshots"))?;
            for description in snapshots.list()? {
                println!(
                    "{}  {}  {} bytes",
                    description.name,
                    description.creation_time.as_deref().unwrap_or("-"),
                    description.size
                );
            }
        }
        Command::Cache { action: CacheAction::Clear } => {
            let cache = JsonCache::new(CacheConfig {
                enabled: true,
                ..args.cache_config()
            })
            .with_context(|| format!("opening cache {:?}", args.cache_dir))?;
            let removed = cache.clear()?;
            println!("Removed {} cached responses", removed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    // Reads and writes CLOUD_ENV, so every case lives in one test.
    #[test]
    fn test_cache_switch() {
        std::env::remove_var("CLOUD_ENV");
        let args = parse(&["chessgraph", "graph", "hikaru"]);
        assert!(args.cache_config().enabled);
        assert_eq!(args.cache_config().dir, PathBuf::from(DEFAULT_CACHE_DIR));

        let args = parse(&["chessgraph", "graph", "hikaru", "--no-cache"]);
        assert!(!args.cache_config().enabled);

        std::env::set_var("CLOUD_ENV", "1");
        let args = parse(&["chessgraph", "player", "hikaru", "--cache-dir", "/tmp/c"]);
        assert!(!args.cache_config().enabled);
        assert_eq!(args.cache_config().dir, PathBuf::from("/tmp/c"));

        std::env::set_var("CLOUD_ENV", "false");
        assert!(parse(&["chessgraph", "snapshots"]).cache_config().enabled);

        std::env::remove_var("CLOUD_ENV");
        assert!(parse(&["chessgraph", "cache", "clear"]).cache_config().enabled);
    }

    #[test]
    fn test_build_args() {
        let args = parse(&[
            "chessgraph", "graph", "hikaru", "--depth", "2", "--year", "2024", "--month", "3",
            "--min-rating", "2000", "--country", "us",
        ]);
        let Command::Graph { depth, .. } = args.command else {
            panic!("expected graph command");
        };
        let config = args.build.to_config(depth).unwrap();
        assert_eq!(config.depth, 2);
        assert_eq!(config.period, Period::Month(2024, 3));
        assert_eq!(config.filters.len(), 2);

        let args = parse(&["chessgraph", "graph", "hikaru", "--month", "3"]);
        assert!(args.build.to_config(1).is_err());
    }
}
