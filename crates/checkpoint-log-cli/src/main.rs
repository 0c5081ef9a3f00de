use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use checkpoint_log_core::{
    export, export_file_name, filter, local_today, newest_first, summary_line, summary_stats,
    validate, LogFilter, LogKind, LogStore, UserIdentity, UserProfile,
};
use checkpoint_log_store_sqlite::SqliteKeyValueStore;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use time::UtcOffset;
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "cli.v1";
const LOG_ENV: &str = "CKPT_LOG";

#[derive(Debug, Parser)]
#[command(name = "ckpt")]
#[command(about = "Checkpoint operations log CLI")]
struct Cli {
    #[arg(long, env = "CKPT_DB", default_value = "./checkpoint_log.sqlite3")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Db {
        #[command(subcommand)]
        command: Box<DbCommand>,
    },
    Profile {
        #[command(subcommand)]
        command: Box<ProfileCommand>,
    },
    CheckIn(PostArgs),
    Acknowledge(PostArgs),
    Task {
        #[command(subcommand)]
        command: Box<TaskCommand>,
    },
    Logs {
        #[command(subcommand)]
        command: Box<LogsCommand>,
    },
    Posts {
        #[command(subcommand)]
        command: Box<PostsCommand>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    SchemaVersion,
    Migrate(DbMigrateArgs),
    Export(DbExportArgs),
    Backup(DbBackupArgs),
    Restore(DbRestoreArgs),
    IntegrityCheck,
}

#[derive(Debug, Args)]
struct DbMigrateArgs {
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct DbExportArgs {
    #[arg(long)]
    out: PathBuf,
    /// Date stamped into the export file names; defaults to today.
    #[arg(long)]
    date: Option<String>,
}

#[derive(Debug, Args)]
struct DbBackupArgs {
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct DbRestoreArgs {
    #[arg(long = "in")]
    input: PathBuf,
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    Show,
    Set(ProfileSetArgs),
}

#[derive(Debug, Args)]
struct ProfileSetArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    badge: String,
    #[arg(long, default_value = "")]
    position: String,
}

#[derive(Debug, Args)]
struct PostArgs {
    #[arg(long)]
    post: String,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    Complete(TaskCompleteArgs),
}

#[derive(Debug, Args)]
struct TaskCompleteArgs {
    #[arg(long)]
    task_id: String,
    #[arg(long)]
    title: String,
    /// Free-text remarks stored beside the entry; not covered by its token.
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Subcommand)]
enum LogsCommand {
    List(LogsListArgs),
    Verify(KindArgs),
    Stats(KindArgs),
    Summary(KindArgs),
    Export(LogsExportArgs),
    ResetDay(LogsResetDayArgs),
}

#[derive(Debug, Args)]
struct KindArgs {
    #[arg(long, value_enum, default_value_t = KindArg::CheckIn)]
    kind: KindArg,
}

#[derive(Debug, Args)]
struct LogsListArgs {
    #[command(flatten)]
    kind: KindArgs,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    badge: Option<String>,
    #[arg(long, default_value_t = false, conflicts_with = "date")]
    today: bool,
}

#[derive(Debug, Args)]
struct LogsExportArgs {
    #[command(flatten)]
    kind: KindArgs,
    /// Directory receiving the export file.
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct LogsResetDayArgs {
    #[command(flatten)]
    kind: KindArgs,
    #[arg(long)]
    date: Option<String>,
}

#[derive(Debug, Subcommand)]
enum PostsCommand {
    Acknowledged,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    CheckIn,
    TaskCompletion,
}

impl From<KindArg> for LogKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::CheckIn => LogKind::CheckIn,
            KindArg::TaskCompletion => LogKind::TaskCompletion,
        }
    }
}

type Store = LogStore<SqliteKeyValueStore>;

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let backing = SqliteKeyValueStore::open(&cli.db)?;
    tracing::debug!(db = %cli.db.display(), "opened checkpoint log database");

    match cli.command {
        Command::Db { command } => run_db(*command, backing),
        Command::Profile { command } => run_profile(*command, &mut open_log_store(backing)?),
        Command::CheckIn(args) => run_check_in(&args, &mut open_log_store(backing)?),
        Command::Acknowledge(args) => run_acknowledge(&args, &mut open_log_store(backing)?),
        Command::Task { command } => match *command {
            TaskCommand::Complete(args) => {
                run_task_complete(&args, &mut open_log_store(backing)?)
            }
        },
        Command::Logs { command } => run_logs(*command, &mut open_log_store(backing)?),
        Command::Posts { command } => match *command {
            PostsCommand::Acknowledged => run_posts_acknowledged(&open_log_store(backing)?),
        },
    }
}

fn open_log_store(mut backing: SqliteKeyValueStore) -> Result<Store> {
    backing.migrate()?;
    Ok(LogStore::new(backing))
}

fn run_db(command: DbCommand, mut store: SqliteKeyValueStore) -> Result<()> {
    match command {
        DbCommand::SchemaVersion => run_db_schema_version(&store),
        DbCommand::Migrate(args) => run_db_migrate(&args, &mut store),
        DbCommand::Export(args) => run_db_export(&args, &mut store),
        DbCommand::Backup(args) => run_db_backup(&args, &mut store),
        DbCommand::Restore(args) => run_db_restore(&args, &mut store),
        DbCommand::IntegrityCheck => run_db_integrity_check(&store),
    }
}

fn run_db_schema_version(store: &SqliteKeyValueStore) -> Result<()> {
    let status = store.schema_status()?;
    emit_json(serde_json::json!({
        "current_version": status.current_version,
        "target_version": status.target_version,
        "pending_versions": status.pending_versions,
        "up_to_date": status.pending_versions.is_empty()
    }))
}

fn run_db_migrate(args: &DbMigrateArgs, store: &mut SqliteKeyValueStore) -> Result<()> {
    let before = store.schema_status()?;
    if args.dry_run {
        return emit_json(serde_json::json!({
            "dry_run": true,
            "current_version": before.current_version,
            "target_version": before.target_version,
            "would_apply_versions": before.pending_versions
        }));
    }

    store.migrate()?;
    let after = store.schema_status()?;
    emit_json(serde_json::json!({
        "dry_run": false,
        "before_version": before.current_version,
        "applied_versions": before.pending_versions,
        "after_version": after.current_version,
        "target_version": after.target_version,
        "up_to_date": after.pending_versions.is_empty()
    }))
}

fn run_db_export(args: &DbExportArgs, store: &mut SqliteKeyValueStore) -> Result<()> {
    store.migrate()?;
    let date = args.date.clone().unwrap_or_else(local_today);
    let manifest = store.export_snapshot(&args.out, &date)?;
    emit_json(serde_json::json!({
        "out_dir": args.out,
        "manifest": manifest
    }))
}

fn run_db_backup(args: &DbBackupArgs, store: &mut SqliteKeyValueStore) -> Result<()> {
    store.migrate()?;
    store.backup_database(&args.out)?;
    emit_json(serde_json::json!({
        "backup_path": args.out,
        "status": "ok"
    }))
}

fn run_db_restore(args: &DbRestoreArgs, store: &mut SqliteKeyValueStore) -> Result<()> {
    store.restore_database(&args.input)?;
    let status = store.schema_status()?;
    emit_json(serde_json::json!({
        "restored_from": args.input,
        "current_version": status.current_version,
        "target_version": status.target_version,
        "pending_versions": status.pending_versions
    }))
}

fn run_db_integrity_check(store: &SqliteKeyValueStore) -> Result<()> {
    let report = store.integrity_check()?;
    emit_json(serde_json::to_value(&report).context("failed to serialize integrity report")?)
}

fn current_identity(store: &Store) -> Result<UserIdentity> {
    Ok(store.profile()?.as_ref().map_or_else(UserIdentity::sentinel, UserProfile::identity))
}

fn run_profile(command: ProfileCommand, store: &mut Store) -> Result<()> {
    match command {
        ProfileCommand::Show => {
            let profile = store.profile()?;
            let identity = current_identity(store)?;
            emit_json(serde_json::json!({
                "profile": profile,
                "identity": identity
            }))
        }
        ProfileCommand::Set(args) => {
            let profile = UserProfile {
                name: args.name.trim().to_string(),
                badge_number: args.badge.trim().to_string(),
                position: args.position.trim().to_string(),
            };
            store.save_profile(&profile)?;
            emit_json(serde_json::json!({
                "profile": profile,
                "identity": profile.identity()
            }))
        }
    }
}

fn run_check_in(args: &PostArgs, store: &mut Store) -> Result<()> {
    let identity = current_identity(store)?;
    let entry = store.check_in(Some(&identity), &args.post)?;
    emit_json(serde_json::json!({
        "entry": entry,
        "valid": validate(&entry)
    }))
}

fn run_acknowledge(args: &PostArgs, store: &mut Store) -> Result<()> {
    let identity = current_identity(store)?;
    let entry = store.acknowledge_post(Some(&identity), &args.post)?;
    emit_json(serde_json::json!({
        "post_id": args.post,
        "already_acknowledged": entry.is_none(),
        "entry": entry
    }))
}

fn run_task_complete(args: &TaskCompleteArgs, store: &mut Store) -> Result<()> {
    let identity = current_identity(store)?;
    let entry =
        store.complete_task(Some(&identity), &args.task_id, &args.title, args.notes.as_deref())?;
    emit_json(serde_json::json!({
        "entry": entry,
        "valid": validate(&entry)
    }))
}

fn run_logs(command: LogsCommand, store: &mut Store) -> Result<()> {
    match command {
        LogsCommand::List(args) => run_logs_list(&args, store),
        LogsCommand::Verify(args) => run_logs_verify(&args, store),
        LogsCommand::Stats(args) => run_logs_stats(&args, store),
        LogsCommand::Summary(args) => run_logs_summary(&args, store),
        LogsCommand::Export(args) => run_logs_export(&args, store),
        LogsCommand::ResetDay(args) => run_logs_reset_day(&args, store),
    }
}

fn run_logs_list(args: &LogsListArgs, store: &Store) -> Result<()> {
    let kind = LogKind::from(args.kind.kind);
    let date = if args.today { Some(local_today()) } else { args.date.clone() };
    let criteria =
        LogFilter { search_term: args.search.clone(), date, user_badge: args.badge.clone() };

    let entries = newest_first(&filter(&store.load(kind)?, &criteria));
    emit_json(serde_json::json!({
        "kind": kind,
        "count": entries.len(),
        "entries": entries
    }))
}

fn run_logs_verify(args: &KindArgs, store: &Store) -> Result<()> {
    let kind = LogKind::from(args.kind);
    let results = store.verify(kind)?;
    let invalid = results.iter().filter(|item| !item.valid).count();
    emit_json(serde_json::json!({
        "kind": kind,
        "total": results.len(),
        "invalid": invalid,
        "all_valid": invalid == 0,
        "results": results
    }))
}

fn run_logs_stats(args: &KindArgs, store: &Store) -> Result<()> {
    let kind = LogKind::from(args.kind);
    let today = local_today();
    let stats = summary_stats(&store.load(kind)?, &today);
    emit_json(serde_json::json!({
        "kind": kind,
        "today": today,
        "stats": stats
    }))
}

fn run_logs_summary(args: &KindArgs, store: &Store) -> Result<()> {
    let kind = LogKind::from(args.kind);
    let offset = UtcOffset::current_local_offset().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "local offset unavailable; rendering summary in UTC");
        UtcOffset::UTC
    });
    let lines = newest_first(&store.load(kind)?)
        .iter()
        .map(|entry| summary_line(entry, offset))
        .collect::<Vec<_>>();
    emit_json(serde_json::json!({
        "kind": kind,
        "lines": lines
    }))
}

fn run_logs_export(args: &LogsExportArgs, store: &Store) -> Result<()> {
    let kind = LogKind::from(args.kind.kind);
    let entries = store.load(kind)?;
    let text = export(&entries)?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create export directory {}", args.out.display()))?;
    let path = args.out.join(export_file_name(kind, &local_today()));
    fs::write(&path, text)
        .with_context(|| format!("failed to write export file {}", path.display()))?;

    emit_json(serde_json::json!({
        "kind": kind,
        "path": path,
        "entries": entries.len()
    }))
}

fn run_logs_reset_day(args: &LogsResetDayArgs, store: &mut Store) -> Result<()> {
    let kind = LogKind::from(args.kind.kind);
    let date = args.date.clone().unwrap_or_else(local_today);
    let before = store.load(kind)?.len();
    let remaining = store.reset_day(kind, &date)?;
    tracing::info!(kind = kind.as_str(), date = %date, "reset day");
    emit_json(serde_json::json!({
        "kind": kind,
        "date": date,
        "discarded": before - remaining.len(),
        "remaining": remaining.len()
    }))
}

fn run_posts_acknowledged(store: &Store) -> Result<()> {
    let posts = store.acknowledged_posts()?;
    emit_json(serde_json::json!({
        "count": posts.len(),
        "posts": posts
    }))
}
