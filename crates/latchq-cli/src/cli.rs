use clap::{Parser, Subcommand, ValueEnum};
use latchq_pick::{EntryKind, OutOfRange, SortPolicy};

#[derive(Parser)]
#[command(
    name = "latchq",
    about = "Inspect latchq disk queues and preview indexed picks",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Dirs,
    Files,
}

impl From<KindArg> for EntryKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Dirs => EntryKind::Dirs,
            KindArg::Files => EntryKind::Files,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Natural,
    Name,
    NameDesc,
    Mtime,
    MtimeDesc,
}

impl From<SortArg> for SortPolicy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Natural => SortPolicy::Natural,
            SortArg::Name => SortPolicy::Name,
            SortArg::NameDesc => SortPolicy::NameDesc,
            SortArg::Mtime => SortPolicy::Mtime,
            SortArg::MtimeDesc => SortPolicy::MtimeDesc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Wrap,
    Clamp,
    Error,
}

impl From<PolicyArg> for OutOfRange {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Wrap => OutOfRange::Wrap,
            PolicyArg::Clamp => OutOfRange::Clamp,
            PolicyArg::Error => OutOfRange::Error,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show totals, cursor, and unread count for one disk queue
    Status {
        /// Queue name (sanitized the way the nodes sanitize it)
        #[arg(long, default_value = "default")]
        queue: String,

        /// Output root holding the disk queues
        #[arg(long)]
        output_root: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview unread items without touching the cursor
    Peek {
        /// Queue name
        #[arg(long, default_value = "default")]
        queue: String,

        /// Start position (defaults to the stored cursor)
        #[arg(long)]
        from: Option<usize>,

        /// Maximum lines before truncation
        #[arg(long, default_value_t = 20)]
        max: usize,

        /// Output root holding the disk queues
        #[arg(long)]
        output_root: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve one indexed pick against a directory
    Pick {
        /// Directory to list
        root: String,

        /// Which children to list
        #[arg(long, value_enum, default_value = "files")]
        kind: KindArg,

        /// 0-based index into the sorted listing
        #[arg(long, default_value_t = 0)]
        index: i64,

        /// Listing order
        #[arg(long, value_enum, default_value = "natural")]
        sort: SortArg,

        /// Policy when the index misses the listing
        #[arg(long, value_enum, default_value = "wrap")]
        on_out_of_range: PolicyArg,

        /// Names must match this pattern to survive
        #[arg(long)]
        include: Option<String>,

        /// Names matching this pattern are dropped
        #[arg(long)]
        exclude: Option<String>,

        /// Comma-separated extension allowlist (files only)
        #[arg(long)]
        extensions: Option<String>,

        /// Preview window size
        #[arg(long, default_value_t = 20)]
        max_list_items: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the read-only pick preview endpoint
    Serve {
        /// Bind address (host:port)
        #[arg(long)]
        bind: Option<String>,
    },
}
