//! Clap derive structures for the `deskly` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use deskly_core::Entity;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// deskly -- manage website content from the command line
#[derive(Debug, Parser)]
#[command(
    name = "deskly",
    version,
    about = "Manage website content from the command line",
    long_about = "An admin client for deskly content backends.\n\n\
        Every content type supports list/get/create/update/status/delete.\n\
        Lists are searched, filtered, sorted and paginated locally.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "DESKLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "DESKLY_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides every other token source)
    #[arg(long, global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DESKLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "DESKLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "DESKLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage blog posts
    #[command(alias = "blog")]
    Blogs(EntityArgs),

    /// Manage news articles
    News(EntityArgs),

    /// Manage job postings
    #[command(alias = "jobs")]
    Careers(EntityArgs),

    /// Manage job applications
    #[command(alias = "apps")]
    Applications(EntityArgs),

    /// Manage products
    Products(EntityArgs),

    /// Manage services
    Services(EntityArgs),

    /// Manage portfolio projects
    Projects(EntityArgs),

    /// Manage testimonials
    Testimonials(EntityArgs),

    /// Manage FAQs
    Faqs(EntityArgs),

    /// Manage team members
    #[command(alias = "team")]
    Teams(EntityArgs),

    /// Manage newsletter subscribers
    #[command(alias = "subscribers")]
    NewsletterSubscribers(EntityArgs),

    /// Manage newsletter campaigns
    #[command(alias = "campaigns")]
    NewsletterCampaigns(EntityArgs),

    /// Manage contact form submissions
    #[command(alias = "contacts")]
    ContactRequests(EntityArgs),

    /// Manage partnership requests
    #[command(alias = "partnerships")]
    PartnershipRequests(EntityArgs),

    /// Manage project requests
    ProjectRequests(EntityArgs),

    /// Upload images and files
    Upload(UploadArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// The entity a content subcommand targets, with its arguments.
    pub fn into_entity(self) -> Result<(Entity, EntityArgs), Self> {
        Ok(match self {
            Self::Blogs(a) => (Entity::Blogs, a),
            Self::News(a) => (Entity::News, a),
            Self::Careers(a) => (Entity::Careers, a),
            Self::Applications(a) => (Entity::Applications, a),
            Self::Products(a) => (Entity::Products, a),
            Self::Services(a) => (Entity::Services, a),
            Self::Projects(a) => (Entity::Projects, a),
            Self::Testimonials(a) => (Entity::Testimonials, a),
            Self::Faqs(a) => (Entity::Faqs, a),
            Self::Teams(a) => (Entity::Teams, a),
            Self::NewsletterSubscribers(a) => (Entity::NewsletterSubscribers, a),
            Self::NewsletterCampaigns(a) => (Entity::NewsletterCampaigns, a),
            Self::ContactRequests(a) => (Entity::ContactRequests, a),
            Self::PartnershipRequests(a) => (Entity::PartnershipRequests, a),
            Self::ProjectRequests(a) => (Entity::ProjectRequests, a),
            other => return Err(other),
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONTENT ENTITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// List records (searched, filtered, sorted and paged locally)
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record
    Get {
        /// Record ID
        #[arg(required_unless_present = "slug", conflicts_with = "slug")]
        id: Option<String>,

        /// Look up by slug instead of ID
        #[arg(long)]
        slug: Option<String>,
    },

    /// Create a record from a JSON object
    Create(PayloadArgs),

    /// Apply a partial JSON update to a record
    Update {
        /// Record ID
        id: String,

        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Change a record's status
    Status {
        /// Record ID
        id: String,

        /// New status value
        status: String,
    },

    /// Delete one or more records (stops at the first failure)
    #[command(alias = "rm")]
    Delete {
        /// Record IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Case-insensitive substring search over the searchable fields
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter as key=value (repeatable; "all" disables a filter)
    #[arg(long, short = 'f', value_name = "KEY=VALUE")]
    pub filter: Vec<String>,

    /// Sort key (defaults to the entity's default sort)
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Rows per page (defaults to the configured page size)
    #[arg(long, short = 'n')]
    pub page_size: Option<u32>,

    /// Print every matching row, ignoring pagination
    #[arg(long, short = 'a', conflicts_with_all = ["page", "page_size"])]
    pub all: bool,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// Inline JSON object
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Path to a JSON file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  UPLOAD
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Upload endpoint
    pub kind: UploadKind,

    /// Files to upload
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Destination folder on the storage backend
    #[arg(long)]
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UploadKind {
    /// One image
    Image,
    /// Several images
    Images,
    /// One file
    File,
    /// Several files
    Files,
}

impl UploadKind {
    pub fn is_multiple(self) -> bool {
        matches!(self, Self::Images | Self::Files)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Set a profile value
    Set {
        /// Profile key (api_url, token_env, timeout, insecure, ca_cert, fetch_page_size)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a bearer token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
