use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use text_patcher::config::{
    check_patches, load_from_path, run_batch, ApplicationError, ApplyMode, PatchOutcome,
    PatchResult,
};
use text_patcher::report::{Report, Summary};
use text_patcher::text::PatchError;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "text-patcher")]
#[command(about = "Declarative literal text patching for source trees", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply patch sets to a workspace
    Apply {
        /// Path to workspace root (auto-detected if not specified)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Specific patch set to apply (otherwise applies all in patches/)
        #[arg(short, long)]
        patches: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which patches are applied, pending, or failing
    Status {
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        #[arg(short, long)]
        patches: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Fail unless every patch is already applied
    Verify {
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        #[arg(short, long)]
        patches: Option<PathBuf>,
    },

    /// List available patch sets and their patches
    List {
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Apply {
            workspace,
            patches,
            dry_run,
            diff,
            json,
        } => cmd_apply(workspace, patches, dry_run, diff, json)?,

        Commands::Status {
            workspace,
            patches,
            json,
        } => cmd_status(workspace, patches, json)?,

        Commands::Verify { workspace, patches } => cmd_verify(workspace, patches)?,

        Commands::List { workspace } => cmd_list(workspace)?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Diagnostics go to stderr so stdout stays clean for reports and JSON.
fn init_logging(verbose: bool) {
    let default = if verbose { "text_patcher=debug" } else { "text_patcher=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Helper: Discover all .toml patch sets in a patches/ directory.
///
/// Discovery order:
/// 1. `<workspace>/patches`
/// 2. `./patches` relative to the current working directory
fn discover_patch_files(workspace: &Path) -> Result<Vec<PathBuf>> {
    let cwd_patches_dir = env::current_dir().ok().map(|cwd| cwd.join("patches"));
    let candidate_dirs: Vec<PathBuf> = std::iter::once(workspace.join("patches"))
        .chain(cwd_patches_dir)
        .collect();

    for patches_dir in candidate_dirs {
        if !patches_dir.exists() {
            continue;
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&patches_dir).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
            {
                files.push(entry.path().to_path_buf());
            }
        }

        files.sort();

        if !files.is_empty() {
            return Ok(files);
        }
    }

    anyhow::bail!(
        "No .toml patch sets found in either ./patches or {}/patches",
        workspace.display()
    )
}

fn select_patch_files(workspace: &Path, patches: Option<PathBuf>) -> Result<Vec<PathBuf>> {
    match patches {
        Some(path) => Ok(vec![path]),
        None => discover_patch_files(workspace),
    }
}

/// Resolve workspace path
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. TEXT_PATCHER_WORKSPACE environment variable
/// 3. Nearest ancestor of the current directory with a package.json
/// 4. Current directory
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return Ok(path.canonicalize()?);
    }

    if let Ok(env_path) = env::var("TEXT_PATCHER_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: TEXT_PATCHER_WORKSPACE is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    let current = env::current_dir()?;
    if let Some(found) = current
        .ancestors()
        .find(|dir| dir.join("package.json").is_file())
    {
        println!(
            "{}",
            format!("Auto-detected workspace: {}", found.display()).dimmed()
        );
        return Ok(found.to_path_buf());
    }

    Ok(current)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{}", change).red(),
                ChangeTag::Insert => format!("+{}", change).green(),
                ChangeTag::Equal => format!(" {}", change).normal(),
            };
            print!("{}", line);
            if change.missing_newline() {
                println!();
            }
        }
    }
}

fn print_outcome(outcome: &PatchOutcome, dry_run: bool) {
    let id = &outcome.patch_id;
    match &outcome.result {
        Ok(PatchResult::Applied { file }) => {
            let verb = if dry_run { "Would apply to" } else { "Applied to" };
            println!("{} {}: {} {}", "✓".green(), id, verb, file.display());
        }
        Ok(PatchResult::Unchanged { file }) => {
            println!(
                "{} {}: Already applied to {}",
                "⊙".yellow(),
                id,
                file.display()
            );
        }
        Err(ApplicationError::FileNotFound { file }) => {
            println!("{} {}: File not found: {}", "⊘".cyan(), id, file.display());
        }
        Err(ApplicationError::PatternNotFound { file, source }) => {
            eprintln!("{} {}: No match in {}", "⊘".cyan(), id, file.display());
            eprintln!("  {}", source);
            if let PatchError::PatternNotFound {
                near_miss: Some(nm),
                ..
            } = source
            {
                if nm.whitespace_only {
                    eprintln!("  Possible cause: indentation or spacing changed");
                }
            }
        }
        Err(e) => {
            eprintln!("{} {}: Error - {}", "✗".red(), id, e);
            match e {
                ApplicationError::Patch {
                    source: PatchError::UnboundedSpan { .. },
                    ..
                } => {
                    eprintln!("  {}", "CONFLICT: span has no terminator; file left untouched".red());
                }
                ApplicationError::Patch {
                    source: PatchError::AmbiguousMatch { .. },
                    ..
                } => {
                    eprintln!("  {}", "CONFLICT: block is not unique".red());
                    eprintln!("  Action: Extend the block with surrounding lines");
                }
                _ => {}
            }
        }
    }
}

fn print_summary(summary: &Summary) {
    println!("{}", "Summary:".bold());
    println!("  {} patched", format!("{}", summary.patched).green());
    println!("  {} already applied", format!("{}", summary.unchanged).yellow());
    println!("  {} not found", format!("{}", summary.not_found).cyan());
    println!("  {} failed", format!("{}", summary.errors).red());
}

fn cmd_apply(
    workspace: Option<PathBuf>,
    patches: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    json: bool,
) -> Result<i32> {
    let workspace = resolve_workspace(workspace)?;
    let patch_files = select_patch_files(&workspace, patches)?;
    let mode = if dry_run {
        ApplyMode::Check
    } else {
        ApplyMode::Write
    };

    if !json {
        println!("Workspace: {}", workspace.display());
        println!();
    }

    let mut report = Report::new(&[]);

    for patch_file in patch_files {
        let config = load_from_path(&patch_file)?;

        if !json {
            println!("Loading patches from {}...", patch_file.display());
            if dry_run {
                println!("{}", "  [DRY RUN - nothing will be written]".cyan());
            }
        }

        let run = run_batch(&config, &workspace, mode);

        if !json {
            for outcome in &run.outcomes {
                print_outcome(outcome, dry_run);
            }
            if show_diff {
                for staged in &run.staged {
                    display_diff(&staged.file, &staged.original, &staged.patched);
                }
            }
            println!();
        }

        report.extend(&run.outcomes);
    }

    if json {
        println!("{}", report.to_json()?);
    } else {
        print_summary(&report.summary);
    }

    Ok(report.summary.exit_code())
}

fn cmd_status(workspace: Option<PathBuf>, patches: Option<PathBuf>, json: bool) -> Result<i32> {
    let workspace = resolve_workspace(workspace)?;
    let patch_files = select_patch_files(&workspace, patches)?;

    let mut report = Report::new(&[]);
    let mut applied = Vec::new();
    let mut pending = Vec::new();
    let mut problems = Vec::new();

    for patch_file in patch_files {
        let config = load_from_path(&patch_file)?;
        let outcomes = check_patches(&config, &workspace);

        for outcome in &outcomes {
            let label = format!("{} ({})", outcome.patch_id, outcome.file.display());
            match &outcome.result {
                Ok(PatchResult::Unchanged { .. }) => applied.push(label),
                Ok(PatchResult::Applied { .. }) => pending.push(label),
                Err(e) => problems.push((label, e.to_string())),
            }
        }
        report.extend(&outcomes);
    }

    if json {
        println!("{}", report.to_json()?);
        return Ok(0);
    }

    println!("{}", "Patch Status Report".bold());
    println!("Workspace: {}", workspace.display());
    println!();

    if !applied.is_empty() {
        println!(
            "{} {} ({} targets)",
            "✓".green(),
            "APPLIED".green().bold(),
            applied.len()
        );
        for label in &applied {
            println!("  - {}", label);
        }
        println!();
    }

    if !pending.is_empty() {
        println!(
            "{} {} ({} targets)",
            "⊙".yellow(),
            "NOT APPLIED".yellow().bold(),
            pending.len()
        );
        for label in &pending {
            println!("  - {}", label);
        }
        println!();
    }

    if !problems.is_empty() {
        println!(
            "{} {} ({} targets)",
            "✗".red(),
            "PROBLEMS".red().bold(),
            problems.len()
        );
        for (label, reason) in &problems {
            println!("  - {} ({})", label, reason.dimmed());
        }
        println!();
    }

    Ok(0)
}

fn cmd_verify(workspace: Option<PathBuf>, patches: Option<PathBuf>) -> Result<i32> {
    let workspace = resolve_workspace(workspace)?;
    let patch_files = select_patch_files(&workspace, patches)?;

    println!("{}", "Verifying patches...".bold());
    println!("Workspace: {}", workspace.display());
    println!();

    let mut verified = 0;
    let mut mismatch = 0;

    for patch_file in patch_files {
        let config = load_from_path(&patch_file)?;

        for outcome in check_patches(&config, &workspace) {
            match outcome.result {
                Ok(PatchResult::Unchanged { .. }) => {
                    println!(
                        "{} {}: Verified ({})",
                        "✓".green(),
                        outcome.patch_id,
                        outcome.file.display()
                    );
                    verified += 1;
                }
                Ok(PatchResult::Applied { file }) => {
                    eprintln!("{} {}: MISMATCH", "✗".red(), outcome.patch_id);
                    eprintln!("  Expected: patch already applied");
                    eprintln!("  Found: patch not yet applied");
                    eprintln!("  Location: {}", file.display());
                    mismatch += 1;
                }
                Err(e) => {
                    eprintln!("{} {}: MISMATCH", "✗".red(), outcome.patch_id);
                    eprintln!("  Error: {}", e);
                    mismatch += 1;
                }
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} verified", format!("{}", verified).green());
    println!("  {} mismatch", format!("{}", mismatch).red());

    Ok(if mismatch > 0 { 1 } else { 0 })
}

fn cmd_list(workspace: Option<PathBuf>) -> Result<i32> {
    let workspace = resolve_workspace(workspace)?;

    for patch_file in discover_patch_files(&workspace)? {
        let config = load_from_path(&patch_file)?;
        let name = if config.meta.name.is_empty() {
            patch_file.display().to_string()
        } else {
            config.meta.name.clone()
        };
        println!("{} {}", name.bold(), format!("({})", patch_file.display()).dimmed());
        if let Some(description) = &config.meta.description {
            println!("  {}", description);
        }
        for patch in &config.patches {
            let targets = patch.targets();
            let target_label = match targets.as_slice() {
                [one] => one.to_string(),
                many => format!("{} files", many.len()),
            };
            println!(
                "  - {} [{}] -> {}",
                patch.id,
                patch.rule.kind().cyan(),
                target_label
            );
        }
        println!();
    }

    Ok(0)
}
