use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Json,
    Sqlite,
    Remote,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "recall", version, about = "Recall spaced-repetition flashcards (CLI/TUI/API)")]
pub struct Cli {
    /// Storage backend (applies to CLI/TUI/API)
    #[arg(long, value_enum, default_value_t = StoreKind::Json)]
    pub store: StoreKind,

    /// SQLite DB path when --store sqlite (defaults to app data dir)
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Config file (defaults to recall.toml in the app config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate cards from text with the configured model
    Generate(GenerateCmd),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Review due cards, hardest first
    Review(ReviewCmd),
    /// Show collection statistics
    Stats,
    /// Export data
    #[command(subcommand)]
    Export(ExportCmd),
    /// Import data
    #[command(subcommand)]
    Import(ImportCmd),
    /// Launch Terminal UI
    Tui,
    /// Launch Axum HTTP API
    Api(ApiCmd),
}

#[derive(Debug, Args, Clone)]
pub struct GenerateCmd {
    /// Source text; read from --file or stdin when omitted
    pub text: Option<String>,
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

/// Cards are selected by id or by the 1-based index shown by `card list`.
#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add {
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
    },
    List {
        /// Only cards whose question or answer contains this text
        #[arg(long)]
        search: Option<String>,
        /// Only cards due now, in study order
        #[arg(long)]
        due: bool,
    },
    Edit(CardEdit),
    Rm {
        card: String,
    },
    /// Reset a card's schedule to that of a new card
    Reset {
        card: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CardEdit {
    pub card: String,
    #[arg(long)]
    pub question: Option<String>,
    #[arg(long)]
    pub answer: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewCmd {
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json { path: PathBuf },
    Csv { path: PathBuf },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportCmd {
    /// Export bundle or bare card array
    Json { path: PathBuf },
    Csv { path: PathBuf },
}

#[derive(Debug, Args, Clone)]
pub struct ApiCmd {
    /// Bind address (host:port)
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_and_nested_commands() {
        let cli = Cli::try_parse_from(["recall", "--store", "remote", "card", "reset", "3", "--yes"]).unwrap();
        assert_eq!(cli.store, StoreKind::Remote);
        assert!(matches!(cli.cmd, Command::Card(CardCmd::Reset { ref card, yes: true }) if card == "3"));
    }

    #[test]
    fn generate_text_and_file_conflict() {
        assert!(Cli::try_parse_from(["recall", "generate", "some text", "--file", "notes.txt"]).is_err());
        let cli = Cli::try_parse_from(["recall", "generate", "--file", "notes.txt"]).unwrap();
        assert!(matches!(cli.cmd, Command::Generate(GenerateCmd { text: None, file: Some(_) })));
    }
}
