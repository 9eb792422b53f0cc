use crate::api::server as api_server;
use crate::cli::opts::*;
use crate::config::Config;
use crate::transfer;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use recall_core::{
    filter_by_text, preview, repo::fallback::FallbackRepo, Card, CardId, Quality, RemoteApply, Repository, Session,
};
use recall_gen::{CardGenerator, OpenAiGenerator};
use recall_json::{paths, JsonStore};
use recall_pg::PostgresRepo;
use recall_sqlite::SqliteRepo;
use std::io::{stdin, stdout, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

pub type RemoteFeed = mpsc::Receiver<Vec<Card>>;

/// An opened store, plus the change feed when the store is shared.
pub struct Backend {
    pub repo: Arc<dyn Repository>,
    pub remote: Option<RemoteFeed>,
}

pub async fn run_cli(args: Cli, config: Config) -> Result<()> {
    let backend = open_backend(args.store, args.db_path.clone(), &config).await?;
    let mut session = Session::open(backend.repo).await?;
    let remote = backend.remote;

    match args.cmd {
        Command::Api(api) => {
            let addr: std::net::SocketAddr = api.addr.parse()?;
            let generator = open_generator(&config);
            return api_server::run(session, generator, remote, addr).await;
        }
        Command::Generate(cmd) => generate_cmd(&mut session, &config, cmd).await?,
        Command::Card(cmd) => card_cmd(&mut session, cmd).await?,
        Command::Review(cmd) => review_cmd(&mut session, remote, cmd).await?,
        Command::Stats => stats_cmd(&session),
        Command::Export(cmd) => export_cmd(&session, cmd)?,
        Command::Import(cmd) => import_cmd(&mut session, cmd).await?,
        Command::Tui => bail!("the TUI is started from main"),
    }

    if !session.flush().await {
        eprintln!("warning: changes could not be saved to the {} store", session.backend());
    }
    Ok(())
}

pub async fn open_backend(store: StoreKind, db_path: Option<PathBuf>, config: &Config) -> Result<Backend> {
    match store {
        StoreKind::Json => Ok(Backend {
            repo: Arc::new(JsonStore::open_default(config.max_backups()).await?),
            remote: None,
        }),
        StoreKind::Sqlite => {
            let p = db_path.unwrap_or_else(paths::default_sqlite_file);
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            Ok(Backend {
                repo: Arc::new(SqliteRepo::open_file(&p).await?),
                remote: None,
            })
        }
        StoreKind::Remote => match open_remote(config).await {
            Ok(backend) => Ok(backend),
            Err(e) => {
                warn!(error = %e, "remote store unavailable, using local JSON store");
                Ok(Backend {
                    repo: Arc::new(JsonStore::open_default(config.max_backups()).await?),
                    remote: None,
                })
            }
        },
    }
}

async fn open_remote(config: &Config) -> Result<Backend> {
    let (url, user) = config.remote();
    let url = url.ok_or_else(|| anyhow!("no database URL configured (set RECALL_DATABASE_URL)"))?;
    let repo = PostgresRepo::connect(&url, user).await?;
    let remote = match repo.subscribe().await {
        Ok(rx) => Some(rx),
        Err(e) => {
            warn!(error = %e, "real-time updates unavailable");
            None
        }
    };
    let local = JsonStore::open_default(config.max_backups()).await?;
    Ok(Backend {
        repo: Arc::new(FallbackRepo::new(Arc::new(repo), Arc::new(local))),
        remote,
    })
}

pub fn open_generator(config: &Config) -> Option<Arc<dyn CardGenerator>> {
    match OpenAiGenerator::new(config.generator()) {
        Ok(g) => Some(Arc::new(g)),
        Err(e) => {
            info!(reason = %e, "card generation disabled");
            None
        }
    }
}

/// Applies every pushed snapshot waiting in the feed.
pub fn drain_remote(session: &mut Session, remote: &mut Option<RemoteFeed>) {
    let Some(rx) = remote.as_mut() else { return };
    while let Ok(cards) = rx.try_recv() {
        if session.on_remote_update(cards) == RemoteApply::Deferred {
            info!("remote changes held back until local changes are saved");
        }
    }
}

async fn generate_cmd(session: &mut Session, config: &Config, cmd: GenerateCmd) -> Result<()> {
    let text = match (cmd.text, cmd.file) {
        (Some(t), _) => t,
        (None, Some(path)) => std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?,
        (None, None) => {
            let mut s = String::new();
            stdin().read_to_string(&mut s)?;
            s
        }
    };
    let generator = OpenAiGenerator::new(config.generator())?;
    let pairs = generator.generate(&text).await?;
    let created = session.create(pairs, Utc::now()).await?;
    for c in &created {
        println!("{}\t{}", c.id, c.question);
    }
    println!("generated {} flashcards", created.len());
    Ok(())
}

async fn card_cmd(session: &mut Session, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add { question, answer } => {
            let c = session.add(&question, &answer, Utc::now()).await?;
            println!("{}", c.id);
        }
        CardCmd::List { search, due } => {
            let now = Utc::now();
            let cards: Vec<&Card> = if due {
                session
                    .study_queue(now)
                    .filter_map(|id| session.get(id))
                    .collect()
            } else {
                filter_by_text(session.cards(), search.as_deref().unwrap_or(""))
            };
            for c in cards {
                let idx = session.cards().iter().position(|x| x.id == c.id).unwrap_or(0) + 1;
                println!(
                    "{}\t{}\t{}\t{}\tdue={}\tinterval={}d\t{}",
                    idx,
                    c.id,
                    c.question,
                    c.answer,
                    c.next_review.format("%Y-%m-%d %H:%M"),
                    c.interval,
                    c.difficulty
                );
            }
        }
        CardCmd::Edit(e) => {
            let id = resolve_card(session, &e.card)?;
            let current = session.get(id).cloned().ok_or_else(|| anyhow!("card not found"))?;
            if e.question.is_none() && e.answer.is_none() {
                bail!("nothing to change: pass --question and/or --answer");
            }
            let q = e.question.unwrap_or(current.question);
            let a = e.answer.unwrap_or(current.answer);
            session.edit(id, &q, &a).await?;
            println!("ok");
        }
        CardCmd::Rm { card } => {
            let id = resolve_card(session, &card)?;
            session.delete(id).await?;
            println!("ok");
        }
        CardCmd::Reset { card, yes } => {
            let id = resolve_card(session, &card)?;
            if !yes {
                let question = session.get(id).map(|c| c.question.clone()).unwrap_or_default();
                let line = read_line(&format!("reset progress for \"{question}\"? [y/N] "))?;
                if !matches!(line.trim().to_lowercase().as_str(), "y" | "yes") {
                    println!("cancelled");
                    return Ok(());
                }
            }
            session.reset(id, Utc::now()).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn review_cmd(session: &mut Session, mut remote: Option<RemoteFeed>, cmd: ReviewCmd) -> Result<()> {
    let mut queue = session.study_queue(Utc::now());
    if let Some(max) = cmd.max {
        queue.truncate(max);
    }
    if queue.is_empty() {
        println!("no cards due");
        return Ok(());
    }

    let total = queue.total();
    let mut reviewed = 0usize;
    while let Some(id) = queue.next() {
        drain_remote(session, &mut remote);
        // gone, or already reviewed elsewhere
        let Some(card) = session.get(id).cloned() else { continue };
        if !card.is_due(Utc::now()) {
            continue;
        }

        println!("\n[{}/{}] ({})", total - queue.remaining(), total, card.difficulty);
        println!("Q: {}", card.question);
        prompt_enter("[enter=show]")?;
        println!("A: {}", card.answer);
        let options: Vec<String> = preview(&card)
            .iter()
            .map(|(q, days)| format!("{}={} ({})", q.value(), q.label(), describe_interval(*days)))
            .collect();
        println!("[{}, q=quit]", options.join(", "));

        let quality = loop {
            let line = read_line("rating> ")?;
            let line = line.trim();
            if matches!(line, "q" | "quit") {
                println!("\nreviewed {reviewed}");
                return Ok(());
            }
            match Quality::parse(line) {
                Some(q) => break q,
                None => println!("enter 1/h, 3/g, 5/e, a number, or q"),
            }
        };

        let updated = session.rate(id, quality, Utc::now()).await?;
        reviewed += 1;
        println!("→ next review {}", describe_interval(updated.interval));
    }

    println!("\nreviewed {reviewed}");
    Ok(())
}

fn stats_cmd(session: &Session) {
    let s = session.stats(Utc::now());
    println!("total\t{}", s.total);
    println!("due\t{}", s.due);
    println!("mastered\t{}", s.mastered);
    println!(
        "hard/medium/easy\t{}/{}/{}",
        s.by_difficulty.hard, s.by_difficulty.medium, s.by_difficulty.easy
    );
    println!("store\t{}", session.backend());
}

fn export_cmd(session: &Session, cmd: ExportCmd) -> Result<()> {
    match cmd {
        ExportCmd::Json { path } => {
            let s = transfer::to_json(session.cards(), Utc::now())?;
            std::fs::write(&path, s)?;
            println!("wrote {}", path.display());
        }
        ExportCmd::Csv { path } => {
            let file = std::fs::File::create(&path)?;
            transfer::write_csv(session.cards(), file)?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

async fn import_cmd(session: &mut Session, cmd: ImportCmd) -> Result<()> {
    let cards = match cmd {
        ImportCmd::Json { path } => {
            let data = std::fs::read_to_string(&path)?;
            transfer::from_json(&data)?
        }
        ImportCmd::Csv { path } => {
            let file = std::fs::File::open(&path)?;
            transfer::read_csv(file, Utc::now())?
        }
    };
    let offered = cards.len();
    let added = session.import(cards).await;
    println!("imported {added} of {offered}");
    Ok(())
}

// ===== Helpers =====

/// Accepts a card id or a 1-based position in the collection.
pub fn resolve_card(session: &Session, sel: &str) -> Result<CardId> {
    let sel = sel.trim();
    if let Ok(id) = Uuid::parse_str(sel) {
        if session.get(id).is_some() {
            return Ok(id);
        }
        bail!("card not found: {sel}");
    }
    if let Ok(n) = sel.parse::<usize>() {
        if let Some(c) = n.checked_sub(1).and_then(|i| session.cards().get(i)) {
            return Ok(c.id);
        }
    }
    bail!("card not found: {sel}")
}

pub fn describe_interval(days: u32) -> String {
    match days {
        0 => "again today".to_string(),
        1 => "in 1 day".to_string(),
        n => format!("in {n} days"),
    }
}

fn prompt_enter(label: &str) -> Result<()> {
    read_line(label).map(|_| ())
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    if stdin().read_line(&mut s)? == 0 {
        bail!("input closed");
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::repo::memory::MemoryRepo;

    async fn session_with(questions: &[&str]) -> Session {
        let now = Utc::now();
        let cards = questions.iter().map(|q| Card::new(*q, "a", now)).collect();
        Session::open(Arc::new(MemoryRepo::with_cards(cards))).await.unwrap()
    }

    #[tokio::test]
    async fn cards_resolve_by_index_or_id() {
        let s = session_with(&["one", "two"]).await;
        let second = s.cards()[1].id;
        assert_eq!(resolve_card(&s, "2").unwrap(), second);
        assert_eq!(resolve_card(&s, &second.to_string()).unwrap(), second);
        assert!(resolve_card(&s, "0").is_err());
        assert!(resolve_card(&s, "3").is_err());
        assert!(resolve_card(&s, &Uuid::new_v4().to_string()).is_err());
        assert!(resolve_card(&s, "two").is_err());
    }

    #[tokio::test]
    async fn remote_snapshots_are_drained_into_the_session() {
        let mut s = session_with(&["local"]).await;
        let (tx, rx) = mpsc::channel(4);
        let mut feed = Some(rx);
        let pushed = vec![Card::new("a", "1", Utc::now()), Card::new("b", "2", Utc::now())];
        tx.send(vec![]).await.unwrap();
        tx.send(pushed.clone()).await.unwrap();

        drain_remote(&mut s, &mut feed);
        assert_eq!(s.cards().len(), 2);
        assert_eq!(s.cards()[1].id, pushed[1].id);

        drain_remote(&mut s, &mut None);
    }

    #[test]
    fn intervals_read_naturally() {
        assert_eq!(describe_interval(0), "again today");
        assert_eq!(describe_interval(1), "in 1 day");
        assert_eq!(describe_interval(16), "in 16 days");
    }
}
