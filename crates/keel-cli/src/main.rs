#![forbid(unsafe_code)]

mod cmd;
mod context;
mod output;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use context::Ctx;
use output::OutputMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "keel: issue-tracking backend with team-scoped access control",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Acting username (defaults to the KEEL_ACTOR env var).
    #[arg(long, global = true)]
    actor: Option<String>,

    /// Workspace directory (defaults to the current directory).
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    fn actor_flag(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(next_help_heading = "Workspace", about = "Initialize a keel workspace")]
    Init(cmd::init::InitArgs),

    #[command(next_help_heading = "Workspace", about = "Manage users")]
    User {
        #[command(subcommand)]
        command: cmd::user::UserCommand,
    },

    #[command(next_help_heading = "Workspace", about = "Manage projects")]
    Project {
        #[command(subcommand)]
        command: cmd::project::ProjectCommand,
    },

    #[command(next_help_heading = "Workspace", about = "Manage teams")]
    Team {
        #[command(subcommand)]
        command: cmd::team::TeamCommand,
    },

    #[command(
        next_help_heading = "Issues",
        about = "Create a new work item",
        after_help = "EXAMPLES:\n    # A team lead creates a task for their team\n    kl create --title \"Fix login timeout\" --project 1 --team 2 --actor lena\n\n    # Create a story under an epic\n    kl create --title \"Signup flow\" --project 1 --team 2 --type story --parent 4"
    )]
    Create(cmd::create::CreateArgs),

    #[command(next_help_heading = "Issues", about = "Update fields on a work item")]
    Update(cmd::update::UpdateArgs),

    #[command(next_help_heading = "Issues", about = "Delete a work item and its subtree")]
    Delete(cmd::delete::DeleteArgs),

    #[command(next_help_heading = "Read", about = "Show one work item")]
    Show(cmd::show::ShowArgs),

    #[command(next_help_heading = "Read", about = "List visible work items")]
    List(cmd::list::ListArgs),

    #[command(next_help_heading = "Read", about = "List valid parents for an issue type")]
    Parents(cmd::parents::ParentsArgs),

    #[command(next_help_heading = "Read", about = "Show the audit trail for a work item")]
    Activity(cmd::activity::ActivityArgs),

    #[command(next_help_heading = "Read", about = "Issue counts for a project")]
    Stats(cmd::stats::StatsArgs),

    #[command(next_help_heading = "Read", about = "Unread notifications")]
    Inbox(cmd::inbox::InboxArgs),

    #[command(next_help_heading = "Workspace", about = "Generate shell completion scripts")]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("KEEL_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "debug"
        } else {
            "warn"
        })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let root = match &cli.dir {
        Some(dir) => dir.clone(),
        None => env::current_dir()?,
    };
    let output = cli.output_mode();

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &root, output),
        Commands::Completions(args) => cmd::completions::run_completions::<Cli>(args),
        command => {
            let mut ctx = Ctx::open(&root, output)?;
            match command {
                Commands::User { command } => cmd::user::run_user(command, &ctx),
                Commands::Project { command } => {
                    cmd::project::run_project(command, &mut ctx, cli.actor_flag())
                }
                Commands::Team { command } => cmd::team::run_team(command, &ctx),
                Commands::Create(args) => cmd::create::run_create(args, &mut ctx, cli.actor_flag()),
                Commands::Update(args) => cmd::update::run_update(args, &mut ctx, cli.actor_flag()),
                Commands::Delete(args) => cmd::delete::run_delete(args, &mut ctx, cli.actor_flag()),
                Commands::Show(args) => cmd::show::run_show(args, &ctx, cli.actor_flag()),
                Commands::List(args) => cmd::list::run_list(args, &ctx, cli.actor_flag()),
                Commands::Parents(args) => cmd::parents::run_parents(args, &ctx),
                Commands::Activity(args) => cmd::activity::run_activity(args, &ctx),
                Commands::Stats(args) => cmd::stats::run_stats(args, &ctx),
                Commands::Inbox(args) => cmd::inbox::run_inbox(args, &ctx, cli.actor_flag()),
                Commands::Init(_) | Commands::Completions(_) => unreachable!(),
            }
        }
    }
}
