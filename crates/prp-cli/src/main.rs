mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, hook::HookSubcommand, optimize::OptimizeSubcommand,
    scaffold::ScaffoldSubcommand, stack::StackSubcommand, summary::SummaryFormatArg,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "prp",
    about = "Lifecycle hooks, prompt optimization, and PRP scaffolding for AI coding sessions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: hook payload cwd, then auto-detect from .claude/ or .git/)
    #[arg(long, global = true, env = "PRP_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a lifecycle hook (reads the host payload from stdin)
    Hook {
        #[command(subcommand)]
        subcommand: HookSubcommand,
    },

    /// Generate the conversation summary in .claude/logs/
    Summary {
        /// Summary file name inside .claude/logs/
        #[arg(long, short = 'o', default_value = prp_core::paths::SUMMARY_MD)]
        output_file: String,

        /// Which documents to write
        #[arg(long, short = 'f', value_enum, default_value_t = SummaryFormatArg::Markdown)]
        format: SummaryFormatArg,

        /// What triggered this summary
        #[arg(long, default_value = "manual")]
        trigger: String,
    },

    /// Render the current session transcript with token usage
    Transcript {
        /// Base directory of per-project transcripts (default: ~/.claude/projects)
        #[arg(long)]
        projects_path: Option<PathBuf>,

        /// Write the log to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print only the token summary
        #[arg(long)]
        summary: bool,
    },

    /// Compare optimized and baseline prompt logs
    Report {
        /// Days of logs to analyze
        #[arg(long, short = 'd', default_value_t = prp_core::report::DEFAULT_DAYS)]
        days: u32,

        /// Write the report to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Detect the tech stack and manage PRPs/ai_docs
    Stack {
        #[command(subcommand)]
        subcommand: StackSubcommand,
    },

    /// Create project documents and directories
    Scaffold {
        #[command(subcommand)]
        subcommand: ScaffoldSubcommand,
    },

    /// Check a PRP document for required sections
    Validate { file: PathBuf },

    /// Print a PRP document, warning about missing sections
    Show { file: PathBuf },

    /// Switch prompt optimization and result caching on or off
    Optimize {
        #[command(subcommand)]
        subcommand: OptimizeSubcommand,
    },

    /// Inspect or initialize .claude/prp.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    // stdout carries hook payloads, so diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root_path = cli.root.as_deref();

    // Hooks own their exit status: 1 means "cache hit, skip the tool".
    let command = match cli.command {
        Commands::Hook { subcommand } => {
            std::process::exit(cmd::hook::run(root_path, subcommand))
        }
        other => other,
    };

    let root = root::resolve_root(root_path);

    let result = match command {
        Commands::Hook { .. } => unreachable!("hooks exit above"),
        Commands::Summary {
            output_file,
            format,
            trigger,
        } => cmd::summary::run(&root, &output_file, format, &trigger, cli.json),
        Commands::Transcript {
            projects_path,
            output,
            summary,
        } => cmd::transcript::run(
            &root,
            projects_path,
            output.as_deref(),
            summary,
            cli.json,
        ),
        Commands::Report { days, output } => {
            cmd::report::run(&root, days, output.as_deref(), cli.json)
        }
        Commands::Stack { subcommand } => cmd::stack::run(&root, subcommand, cli.json),
        Commands::Scaffold { subcommand } => cmd::scaffold::run(&root, subcommand, cli.json),
        Commands::Validate { file } => cmd::prp::validate(&root, &file, cli.json),
        Commands::Show { file } => cmd::prp::show(&root, &file),
        Commands::Optimize { subcommand } => cmd::optimize::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
