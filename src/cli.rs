// src/cli.rs
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::Local;
use clap::{Args, Parser, Subcommand};

use crate::config::{self, consts::CONFIG_FILE, AppOptions};
use crate::core::HttpFetcher;
use crate::identity::LegIdentity;
use crate::locality::classify_aircraft;
use crate::model::AircraftId;
use crate::progress::Progress;
use crate::resolve::{AirportResolver, Chain, LocatorResolver};
use crate::store::{CsvStore, Gateway};
use crate::sync::{sync_aircraft, SyncOutcome, SyncPhase};

/// Incremental flight history and track log scraper.
#[derive(Parser, Debug)]
#[command(name = "tailtrack", version, about)]
pub struct Cli {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Store directory, overrides `[store] dir`.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Log file, defaults to `.store/debug.log`.
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape new legs and their track logs.
    Sync(SyncArgs),
    /// Flag stored legs as local or not.
    Classify(ClassifyArgs),
    /// List stored leg keys.
    Keys {
        tail: String,
    },
    /// Write the effective options to the config file.
    InitConfig,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Tail numbers, e.g. N82145.
    #[arg(required = true)]
    pub tails: Vec<String>,

    /// Only ingest legs from this month (1-12). The checkpoint is left alone.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Ask on stdin for airport codes the page could not name.
    #[arg(long)]
    pub interactive: bool,

    /// Pause between track log requests.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Session cookie sent with every request.
    #[arg(long, env = "TAILTRACK_CREDENTIAL", hide_env_values = true)]
    pub credential: Option<String>,

    /// History rows to request.
    #[arg(long)]
    pub lookback: Option<u32>,

    /// Run the locality pass after syncing.
    #[arg(long)]
    pub classify: bool,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    #[arg(required = true)]
    pub tails: Vec<String>,

    /// Leave legs that already have a flag alone.
    #[arg(long)]
    pub only_unclassified: bool,

    #[arg(long)]
    pub threshold: Option<f64>,
}

pub fn run() -> color_eyre::Result<()> {
    run_with(Cli::parse())
}

pub fn run_with(cli: Cli) -> color_eyre::Result<()> {
    crate::log::init(cli.log.as_deref())?;

    let mut opts = config::file::load(&cli.config)?;
    if let Some(dir) = &cli.store {
        opts.store.dir = dir.clone();
    }

    match cli.command {
        Command::Sync(args) => {
            apply_sync_args(&mut opts, &args);
            opts.validate()?;
            cmd_sync(&opts, &args)
        }
        Command::Classify(args) => {
            if args.only_unclassified {
                opts.locality.only_unclassified = true;
            }
            if let Some(t) = args.threshold {
                opts.locality.threshold_miles = t;
            }
            opts.validate()?;
            cmd_classify(&opts, &args.tails)
        }
        Command::Keys { tail } => cmd_keys(&opts, &tail),
        Command::InitConfig => {
            config::file::save(&cli.config, &opts)?;
            println!("wrote {}", cli.config.display());
            Ok(())
        }
    }
}

fn apply_sync_args(opts: &mut AppOptions, args: &SyncArgs) {
    if args.month.is_some() {
        opts.sync.month = args.month;
    }
    if let Some(ms) = args.delay_ms {
        opts.sync.request_pause_ms = ms;
    }
    if let Some(c) = &args.credential {
        opts.source.credential = Some(c.clone());
    }
    if let Some(n) = args.lookback {
        opts.source.lookback = n;
    }
}

fn cmd_sync(opts: &AppOptions, args: &SyncArgs) -> color_eyre::Result<()> {
    let fetch = HttpFetcher::new(&opts.source)?;
    let mut store = CsvStore::open(&opts.store.dir)?;
    let mut resolver: Box<dyn AirportResolver> = if args.interactive {
        Box::new(Chain(LocatorResolver, PromptResolver))
    } else {
        Box::new(LocatorResolver)
    };
    let today = Local::now().date_naive();

    for tail in &args.tails {
        let aircraft = AircraftId::new(tail)?;
        let mut progress = ConsoleProgress::default();
        let outcome = sync_aircraft(
            &fetch,
            &mut store,
            resolver.as_mut(),
            &aircraft,
            opts,
            today,
            Some(&mut progress),
        )?;
        match outcome {
            SyncOutcome::NoData => println!("{aircraft}: no history data"),
            SyncOutcome::Synced(r) => {
                println!(
                    "{}: {} new legs, {} track sets, {} failed, {} already stored",
                    aircraft,
                    r.delta.len(),
                    r.committed_tracks.len(),
                    r.failed.len(),
                    r.already_present
                );
                for (key, reason) in &r.failed {
                    println!("  failed {key}: {reason}");
                }
            }
        }
        if args.classify {
            let s = classify_aircraft(&mut store, &aircraft, &opts.locality)?;
            println!("{aircraft}: {} local, {} not local", s.local, s.not_local);
        }
    }
    Ok(())
}

fn cmd_classify(opts: &AppOptions, tails: &[String]) -> color_eyre::Result<()> {
    let mut store = CsvStore::open(&opts.store.dir)?;
    for tail in tails {
        let aircraft = AircraftId::new(tail)?;
        let s = classify_aircraft(&mut store, &aircraft, &opts.locality)?;
        println!(
            "{aircraft}: {} legs, {} local, {} not local, {} without track, {} skipped",
            s.examined, s.local, s.not_local, s.without_track, s.skipped
        );
    }
    Ok(())
}

fn cmd_keys(opts: &AppOptions, tail: &str) -> color_eyre::Result<()> {
    let store = CsvStore::open(&opts.store.dir)?;
    let aircraft = AircraftId::new(tail)?;
    let mut keys: Vec<LegIdentity> = store.list_leg_keys(&aircraft)?.into_iter().collect();
    keys.sort();
    for k in keys {
        println!("{k}");
    }
    match store.checkpoint(&aircraft)? {
        Some(cp) => eprintln!("{}: last synced {}", cp.aircraft_id, cp.last_synced_date),
        None => eprintln!("{aircraft}: never synced"),
    }
    Ok(())
}

/// Asks on stderr/stdin. A blank answer declines.
struct PromptResolver;

impl AirportResolver for PromptResolver {
    fn resolve(&mut self, reference_locator: &str, is_origin: bool) -> Option<String> {
        let which = if is_origin { "Origin" } else { "Destination" };
        eprint!("{which} airport for {reference_locator} (blank = unknown): ");
        io::stderr().flush().ok()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        let code = line.trim();
        (!code.is_empty()).then(|| code.to_string())
    }
}

#[derive(Default)]
struct ConsoleProgress {
    total: usize,
    done: usize,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        eprintln!("fetching {total} track logs");
    }

    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }

    fn phase(&mut self, phase: SyncPhase) {
        if phase == SyncPhase::Committed {
            eprintln!("committed");
        }
    }

    fn item_done(&mut self, key: &LegIdentity) {
        self.done += 1;
        eprintln!("[{}/{}] {}", self.done, self.total, key);
    }

    fn item_failed(&mut self, key: &LegIdentity, reason: &str) {
        self.done += 1;
        eprintln!("[{}/{}] {} failed: {}", self.done, self.total, key, reason);
    }
}
