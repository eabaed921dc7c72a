use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use chrono::Utc;
use clap::{
    Args,
    Parser,
    Subcommand,
    ValueEnum,
};
use keiko::{
    core::{
        KeikoError,
        PracticeMode,
        VocabularyItem,
    },
    hierarchy::DictionaryResolver,
    persistence::save_json_to,
    scheduling::source::SnapshotSource,
    session::{
        LoadedSession,
        SessionLoader,
    },
    settings::SessionSettings,
};
use tracing_subscriber::{
    fmt,
    EnvFilter,
};

#[derive(Parser, Debug)]
#[command(name = "keiko")]
#[command(about = "Plans Japanese vocabulary practice sessions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a session from a deck and print what would be practiced
    Plan(PlanArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Meanings,
    Readings,
}

impl From<ModeArg> for PracticeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Meanings => PracticeMode::Meanings,
            ModeArg::Readings => PracticeMode::Readings,
        }
    }
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// JSON array of vocabulary items
    #[arg(long)]
    deck: PathBuf,

    /// Kanji and radical dictionary
    #[arg(long)]
    dictionary: PathBuf,

    /// Schedule export with per-key records and due items
    #[arg(long)]
    schedule: Option<PathBuf>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    flip_vocab: bool,

    #[arg(long)]
    flip_prereq: bool,

    #[arg(long)]
    no_prerequisites: bool,

    #[arg(long)]
    shuffle: bool,

    /// Reviews are scheduled elsewhere, skip interleaving
    #[arg(long)]
    remote_scheduler: bool,

    /// Write the session transport JSON here
    #[arg(long)]
    export: Option<PathBuf>,

    /// Store the resulting settings as the new defaults
    #[arg(long)]
    save_settings: bool,

    /// Presentable cards to list
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

impl PlanArgs {
    fn apply(&self, settings: &mut SessionSettings) {
        if let Some(mode) = self.mode {
            settings.mode = mode.into();
        }
        if let Some(user) = &self.user {
            settings.user_id = user.clone();
        }
        settings.flip_vocab_qa |= self.flip_vocab;
        settings.flip_prereq_qa |= self.flip_prereq;
        settings.shuffle |= self.shuffle;
        if self.no_prerequisites {
            settings.prerequisites_enabled = false;
        }
        if self.remote_scheduler {
            settings.local_scheduler = false;
        }
    }
}

fn load_deck(path: &Path) -> Result<Vec<VocabularyItem>, KeikoError> {
    let content = fs::read_to_string(path)
        .map_err(|e| KeikoError::FailedToLoadFile(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}

fn print_plan(loaded: &LoadedSession, limit: usize) {
    let session = &loaded.session;
    let progress = session.progress();

    println!(
        "{} cards ({} words, {} kanji, {} radicals)",
        progress.total,
        loaded.hierarchy.entries().len(),
        loaded.hierarchy.unique_kanji().len(),
        loaded.hierarchy.unique_radicals().len()
    );
    println!(
        "{} presentable, {} locked, {} disabled",
        progress.presentable, progress.locked, progress.disabled
    );

    let queue = session.presentable_keys();
    if !queue.is_empty() {
        println!("\nUp next:");
    }
    for card in queue.iter().take(limit).filter_map(|key| session.card(key)) {
        println!("  [{}] {} → {}", card.item_type, card.prompt, card.answers.join(" / "));
    }
    if queue.len() > limit {
        println!("  … {} more", queue.len() - limit);
    }

    if !session.interleaved_reviews().is_empty() {
        println!("\nInterleaved reviews: {}", session.interleaved_reviews().len());
    }
    if !loaded.prefetch.characters.is_empty() {
        println!("\nPrefetch: {}", loaded.prefetch.characters.join(""));
    }
}

async fn plan(args: PlanArgs) -> Result<(), KeikoError> {
    let mut settings = SessionSettings::load();
    args.apply(&mut settings);
    if args.save_settings {
        settings.save()?;
    }

    let vocabulary = load_deck(&args.deck)?;
    let resolver = DictionaryResolver::from_json_file(&args.dictionary)?;
    let source = match &args.schedule {
        Some(path) => SnapshotSource::from_json_file(path)?,
        None => SnapshotSource::default(),
    };

    let options = settings.to_options(Utc::now());
    let loaded = SessionLoader::new(&resolver, &source)
        .load(&settings.user_id, &vocabulary, &options)
        .await;

    print_plan(&loaded, args.limit);

    if let Some(path) = &args.export {
        save_json_to(&loaded.session.to_transport(), path)?;
        println!("\nSession written to {}", path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), KeikoError> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keiko=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Plan(args) => plan(args).await,
    }
}
