//! quizdesk CLI
//!
//! Command-line front-end of the tutoring platform admin console.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use quizdesk_client::{ApiClient, ClientError, Console};
use quizdesk_core::{
    filter_users, format_size, format_timestamp, normalize_tag, Config, CreatedTraining,
    EgeTable, HardFilter, ImageSlot, NewQuestionForm, QuestionType, RestorePhase, Selection,
    TagVocabulary, TokenStore, TopicSelection, UploadFile, UploadKind,
};
use quizdesk_report::{
    json::JsonGenerator, HistoryMarkdown, HistoryReport, MarkdownGenerator, WorkReport,
};
use tracing_subscriber::EnvFilter;

/// quizdesk - admin console for the tutoring platform
///
/// Manages students, the topic catalog, the question pool, trainings, the
/// EGE conversion table and database backups.
#[derive(Parser, Debug)]
#[command(name = "quizdesk")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: quizdesk.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Backend API base URL, overrides the config file
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with the admin password and store the token
    Login {
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Check that the stored token is still accepted
    Verify,
    /// Ask the backend to send a password recovery message
    RecoverPassword,
    /// Students
    #[command(subcommand)]
    Users(UsersCommand),
    /// Volumes, topics and tags
    #[command(subcommand)]
    Topics(TopicsCommand),
    /// Question pool
    #[command(subcommand)]
    Pool(PoolCommand),
    /// Trainings
    #[command(subcommand)]
    Training(TrainingCommand),
    /// EGE score conversion table
    #[command(subcommand)]
    Ege(EgeCommand),
    /// Backups and restore
    #[command(subcommand)]
    Backup(BackupCommand),
    /// Show a completed work by its share token
    Stats {
        /// Share token
        token: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Render JSON instead of Markdown
    #[arg(long)]
    json: bool,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// List students, optionally filtered by name or telegram id
    List {
        /// Filter text
        filter: Option<String>,
    },
    /// Rename a student
    Rename { telegram_id: i64, name: String },
    /// Delete a student and their work history
    Delete { telegram_id: i64 },
    /// Show a student's completed works
    Stats {
        telegram_id: i64,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand, Debug)]
enum TopicsCommand {
    /// Print the volume/topic tree
    List,
    /// Create a topic in a volume (a new volume name creates the volume)
    Create { volume: String, name: String },
    /// Delete a topic
    Delete { topic_id: u64 },
    /// Delete every topic of a volume
    DeleteVolume { volume: String },
    /// Add a tag to a topic
    AddTag { topic_id: u64, tag: String },
    /// Remove a tag from a topic
    RemoveTag { topic_id: u64, tag: String },
    /// Download the topic table as an Excel workbook
    Export {
        #[arg(default_value = "topics.xlsx")]
        output: PathBuf,
    },
    /// Replace the topic table from an Excel workbook
    Import { file: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SlotArg {
    Question,
    Answer,
}

impl From<SlotArg> for ImageSlot {
    fn from(slot: SlotArg) -> Self {
        match slot {
            SlotArg::Question => Self::Question,
            SlotArg::Answer => Self::Answer,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TypeArg {
    Ege,
    Topic,
}

impl From<TypeArg> for QuestionType {
    fn from(kind: TypeArg) -> Self {
        match kind {
            TypeArg::Ege => Self::Ege,
            TypeArg::Topic => Self::Topic,
        }
    }
}

#[derive(Subcommand, Debug)]
enum PoolCommand {
    /// Search questions by id, text or tag
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    /// Show one question
    Show { id: u64 },
    /// Add a question
    Create {
        #[arg(long)]
        text: String,
        #[arg(long)]
        answer: String,
        #[arg(long, value_enum, default_value = "ege")]
        r#type: TypeArg,
        #[arg(long, default_value_t = 1)]
        level: u8,
        #[arg(long, default_value_t = 1)]
        full_mark: u8,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        rotate: bool,
        #[arg(long)]
        selfcheck: bool,
        /// PNG shown with the question
        #[arg(long)]
        question_image: Option<PathBuf>,
        /// PNG shown with the answer
        #[arg(long)]
        answer_image: Option<PathBuf>,
    },
    /// Edit a question; only the given fields change
    Edit {
        id: u64,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        answer: Option<String>,
        #[arg(long)]
        level: Option<u8>,
        #[arg(long)]
        full_mark: Option<u8>,
        #[arg(long)]
        rotate: Option<bool>,
        #[arg(long)]
        selfcheck: Option<bool>,
        /// Tag to add (repeatable)
        #[arg(long)]
        add_tag: Vec<String>,
        /// Tag to remove (repeatable)
        #[arg(long)]
        remove_tag: Vec<String>,
    },
    /// Deactivate a question
    Delete { id: u64 },
    /// Upload a PNG into an image slot
    SetImage {
        id: u64,
        #[arg(value_enum)]
        slot: SlotArg,
        file: PathBuf,
    },
    /// Remove the image from a slot
    RemoveImage {
        id: u64,
        #[arg(value_enum)]
        slot: SlotArg,
    },
    /// Download the Excel import template
    Template {
        #[arg(default_value = "pool_template.xlsx")]
        output: PathBuf,
    },
    /// Bulk-import questions from an Excel workbook
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum TrainingCommand {
    /// Create a training from per-tag counts
    ByTopics {
        /// TAG=N (repeatable)
        #[arg(long = "tag", value_name = "TAG=N", required = true)]
        tags: Vec<String>,
        #[arg(long, default_value = "")]
        name: String,
        /// Send the link to this student afterwards
        #[arg(long, value_name = "TELEGRAM_ID")]
        send_to: Option<i64>,
    },
    /// Create a training whose questions carry every given tag
    HardFilter {
        /// Tag (repeatable, at least two)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, default_value_t = quizdesk_core::DEFAULT_HARD_COUNT)]
        count: i64,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, value_name = "TELEGRAM_ID")]
        send_to: Option<i64>,
    },
    /// Suggest known tags matching a fragment
    Tags { fragment: String },
    /// List trainings
    List,
    /// Delete a training
    Delete { id: u64 },
    /// Send a training link to a student
    Send { id: u64, telegram_id: i64 },
}

#[derive(Subcommand, Debug)]
enum EgeCommand {
    /// Print the conversion table
    Show,
    /// Change rows and save
    Set {
        /// INPUT=OUTPUT (repeatable)
        #[arg(value_name = "INPUT=OUTPUT", required = true)]
        rows: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum BackupCommand {
    /// Show the backup schedule
    Settings,
    /// Change the backup schedule; omitted fields keep their value
    Configure {
        /// Local time HH:MM, empty to disable
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        chat_id: Option<String>,
        #[arg(long)]
        yadisk_token: Option<String>,
    },
    /// Run a backup now
    Run,
    /// List archives on the remote disk
    List,
    /// Restore the database from a remote archive
    RestoreRemote { path: String },
    /// Restore the database from a local ZIP archive
    RestoreFile { file: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads configuration and the stored token, then runs the command.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    config.validate()?;

    let store = TokenStore::new(&config.token_file);
    let mut client = ApiClient::from_config(&config)?;
    if let Some(token) = store.load()? {
        client.set_token(Some(token));
    }

    let result = match args.command {
        Command::Login { password } => login(&mut client, &store, password).await,
        Command::Logout => {
            store.clear()?;
            println!("Токен удалён");
            Ok(())
        }
        Command::Verify => {
            client.verify().await?;
            println!("Токен действителен");
            Ok(())
        }
        Command::RecoverPassword => {
            client.recover_password().await?;
            println!("Запрос на восстановление пароля отправлен");
            Ok(())
        }
        Command::Stats { token, output } => {
            let detail = client.work_stats(&token).await?;
            let report = WorkReport::from_detail(
                &detail,
                client.base_url(),
                config.backup_utc_offset_hours,
            )?;
            let rendered = if output.json {
                JsonGenerator::new(&report).generate_pretty()?
            } else {
                MarkdownGenerator::new(&report).generate()
            };
            emit(&rendered, output.output.as_deref())
        }
        command => {
            let mut console = Console::new(client, &config);
            dispatch(&mut console, &config, command).await
        }
    };

    result.map_err(|e| {
        let rejected = e
            .downcast_ref::<ClientError>()
            .is_some_and(ClientError::is_auth_rejection);
        if rejected {
            if let Err(clear_err) = store.clear() {
                tracing::warn!(error = %clear_err, "Failed to clear stored token");
            }
        }
        e
    })
}

fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(Path::new(path))?,
        None => Config::load()?,
    };
    Ok(config)
}

async fn login(
    client: &mut ApiClient,
    store: &TokenStore,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            eprint!("Пароль: ");
            std::io::stderr().flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        bail!("Введите пароль");
    }
    let token = client.login(&password).await?;
    store.save(&token)?;
    println!("Вход выполнен");
    Ok(())
}

/// Writes rendered output to a file or stdout.
fn emit(rendered: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Сохранено в {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn save_download(bytes: &[u8], path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Сохранено в {} ({})", path.display(), format_size(bytes.len() as u64));
    Ok(())
}

/// Splits `KEY=VALUE`.
fn split_pair(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| anyhow!("Ожидалось значение вида KEY=VALUE: {raw}"))
}

async fn dispatch(console: &mut Console, config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Users(cmd) => users(console, config, cmd).await,
        Command::Topics(cmd) => topics(console, cmd).await,
        Command::Pool(cmd) => pool(console, config, cmd).await,
        Command::Training(cmd) => training(console, config, cmd).await,
        Command::Ege(cmd) => ege(console, cmd).await,
        Command::Backup(cmd) => backup(console, cmd).await,
        Command::Login { .. }
        | Command::Logout
        | Command::Verify
        | Command::RecoverPassword
        | Command::Stats { .. } => Ok(()),
    }
}

// ============================================================================
// Users
// ============================================================================

async fn users(console: &mut Console, config: &Config, cmd: UsersCommand) -> anyhow::Result<()> {
    match cmd {
        UsersCommand::List { filter } => {
            let users = console.users().await?;
            let shown = filter_users(&users, filter.as_deref().unwrap_or(""));
            if shown.is_empty() {
                println!("Ученики не найдены");
            }
            for user in shown {
                println!("{:>12}  {}", user.telegram_id, user.name);
            }
        }
        UsersCommand::Rename { telegram_id, name } => {
            console.rename_user(telegram_id, &name).await?;
            println!("Имя обновлено");
        }
        UsersCommand::Delete { telegram_id } => {
            console.delete_user(telegram_id).await?;
            println!("Ученик удалён");
        }
        UsersCommand::Stats {
            telegram_id,
            output,
        } => {
            let users = console.users().await?;
            let student = users
                .iter()
                .find(|u| u.telegram_id == telegram_id)
                .map(|u| u.name.as_str());
            let stats = console.client().user_stats(telegram_id).await?;
            let history =
                HistoryReport::from_stats(student, &stats, config.backup_utc_offset_hours);
            let rendered = if output.json {
                JsonGenerator::new(&history).generate_pretty()?
            } else {
                HistoryMarkdown::new(&history).generate()
            };
            emit(&rendered, output.output.as_deref())?;
        }
    }
    Ok(())
}

// ============================================================================
// Topics
// ============================================================================

async fn topics(console: &mut Console, cmd: TopicsCommand) -> anyhow::Result<()> {
    match cmd {
        TopicsCommand::List => {
            let tree = console.catalog_tree().await?;
            for volume in tree.volumes() {
                println!("{volume}");
                for topic in tree.topics(volume) {
                    let tags: Vec<String> = topic
                        .tags
                        .iter()
                        .map(|t| format!("{} ({})", t.tag, t.count))
                        .collect();
                    println!("  [{}] {}: {}", topic.id, topic.name, tags.join(", "));
                }
            }
        }
        TopicsCommand::Create { volume, name } => {
            let mut tree = console.catalog_tree().await?;
            let volume = if tree.has_volume(&volume) {
                volume
            } else {
                tree.add_pending_volume(&volume)?
            };
            let id = console.create_topic(&mut tree, &name, &volume).await?;
            println!("Тема создана: {id}");
        }
        TopicsCommand::Delete { topic_id } => {
            let mut tree = console.catalog_tree().await?;
            console.delete_topic(&mut tree, topic_id).await?;
            println!("Тема удалена");
        }
        TopicsCommand::DeleteVolume { volume } => {
            let mut tree = console.catalog_tree().await?;
            let deleted = console.delete_volume(&mut tree, &volume).await?;
            println!("Том удалён, тем удалено: {deleted}");
        }
        TopicsCommand::AddTag { topic_id, tag } => {
            let mut tree = console.catalog_tree().await?;
            console.add_topic_tag(&mut tree, topic_id, &tag).await?;
            println!("Тег «{}» добавлен", normalize_tag(&tag));
        }
        TopicsCommand::RemoveTag { topic_id, tag } => {
            let mut tree = console.catalog_tree().await?;
            console.remove_topic_tag(&mut tree, topic_id, &tag).await?;
            println!("Тег удалён");
        }
        TopicsCommand::Export { output } => {
            let bytes = console.client().export_topics().await?;
            save_download(&bytes, &output)?;
        }
        TopicsCommand::Import { file } => {
            let file = UploadFile::load(&file, UploadKind::Xlsx)?;
            let response = console.import_topics(&file).await?;
            println!("{}", response.message);
        }
    }
    Ok(())
}

// ============================================================================
// Pool
// ============================================================================

#[allow(clippy::too_many_lines)]
async fn pool(console: &mut Console, config: &Config, cmd: PoolCommand) -> anyhow::Result<()> {
    match cmd {
        PoolCommand::Search { query } => {
            let index = console.pool_index().await?;
            let page = index.search(&query, config.pool_display_limit);
            for row in &page.items {
                println!("{:>6}  {}  [{}]", row.id, row.text, row.tags_list.join(", "));
            }
            match page.narrow_hint() {
                Some(hint) => println!("{hint}"),
                None => println!("Найдено: {}", page.total),
            }
        }
        PoolCommand::Show { id } => {
            let question = console.client().question(id).await?;
            println!("#{} ({})", question.id, question.question_type.label());
            println!("Текст: {}", question.text);
            println!("Ответ: {}", question.answer);
            println!("Уровень: {}  Балл: {}", question.level, question.full_mark);
            println!("Теги: {}", question.tags_list.join(", "));
            println!(
                "Перемешивать: {}  Самопроверка: {}",
                question.is_rotate != 0,
                question.is_selfcheck != 0
            );
            println!(
                "Изображения: вопрос {}, ответ {}",
                question.question_image, question.answer_image
            );
        }
        PoolCommand::Create {
            text,
            answer,
            r#type,
            level,
            full_mark,
            tags,
            rotate,
            selfcheck,
            question_image,
            answer_image,
        } => {
            let form = NewQuestionForm {
                text,
                answer,
                question_type: r#type.into(),
                level,
                full_mark,
                tag_lines: tags.join("\n"),
                rotate,
                selfcheck,
            };
            let question_image = question_image
                .map(|p| UploadFile::load(p, UploadKind::Png))
                .transpose()?;
            let answer_image = answer_image
                .map(|p| UploadFile::load(p, UploadKind::Png))
                .transpose()?;
            let mut index = console.pool_index().await?;
            let id = console
                .create_question(
                    &mut index,
                    &form,
                    question_image.as_ref(),
                    answer_image.as_ref(),
                )
                .await?;
            println!("Вопрос создан: {id}");
        }
        PoolCommand::Edit {
            id,
            text,
            answer,
            level,
            full_mark,
            rotate,
            selfcheck,
            add_tag,
            remove_tag,
        } => {
            let mut selection = Selection::new();
            let Some(mut draft) = console.load_question(&mut selection, id).await? else {
                bail!("Вопрос {id} не загружен");
            };
            if let Some(text) = text {
                draft.set_text(&text);
            }
            if let Some(answer) = answer {
                draft.set_answer(&answer);
            }
            if let Some(level) = level {
                draft.set_level(level)?;
            }
            if let Some(full_mark) = full_mark {
                draft.set_full_mark(full_mark)?;
            }
            if let Some(rotate) = rotate {
                draft.set_rotate(rotate);
            }
            if let Some(selfcheck) = selfcheck {
                draft.set_selfcheck(selfcheck);
            }
            for tag in &add_tag {
                draft.add_tag(tag)?;
            }
            for tag in &remove_tag {
                draft.remove_tag(tag);
            }
            let mut index = console.pool_index().await?;
            if console.save_question(&mut index, &mut draft).await? {
                println!("Вопрос сохранён");
            } else {
                println!("Нет изменений");
            }
        }
        PoolCommand::Delete { id } => {
            let mut index = console.pool_index().await?;
            let mut selection = Selection::new();
            console.delete_question(&mut index, &mut selection, id).await?;
            println!("Вопрос удалён");
        }
        PoolCommand::SetImage { id, slot, file } => {
            let file = UploadFile::load(&file, UploadKind::Png)?;
            let mut selection = Selection::new();
            let Some(mut draft) = console.load_question(&mut selection, id).await? else {
                bail!("Вопрос {id} не загружен");
            };
            console.replace_image(&mut draft, slot.into(), &file).await?;
            println!("Изображение загружено");
        }
        PoolCommand::RemoveImage { id, slot } => {
            let mut selection = Selection::new();
            let Some(mut draft) = console.load_question(&mut selection, id).await? else {
                bail!("Вопрос {id} не загружен");
            };
            console.remove_image(&mut draft, slot.into()).await?;
            println!("Изображение удалено");
        }
        PoolCommand::Template { output } => {
            let bytes = console.client().pool_template().await?;
            save_download(&bytes, &output)?;
        }
        PoolCommand::Import { file } => {
            let file = UploadFile::load(&file, UploadKind::Xlsx)?;
            let result = console.client().import_pool(&file).await?;
            println!("{} (импортировано: {})", result.message, result.imported_count);
        }
    }
    Ok(())
}

// ============================================================================
// Trainings
// ============================================================================

async fn send_if_requested(
    console: &Console,
    training: &CreatedTraining,
    telegram_id: Option<i64>,
) -> anyhow::Result<()> {
    if let Some(telegram_id) = telegram_id {
        let request = quizdesk_core::SendTrainingRequest::for_training(training, telegram_id);
        console.client().send_training(&request).await?;
        println!("Ссылка отправлена ученику {telegram_id}");
    }
    Ok(())
}

async fn training(
    console: &mut Console,
    config: &Config,
    cmd: TrainingCommand,
) -> anyhow::Result<()> {
    match cmd {
        TrainingCommand::ByTopics {
            tags,
            name,
            send_to,
        } => {
            let catalog = console.catalog().await?;
            let mut selection = TopicSelection::new();
            for raw in &tags {
                let (tag, count) = split_pair(raw)?;
                let tag = normalize_tag(tag);
                let requested: i64 = count
                    .parse()
                    .with_context(|| format!("Некорректное количество: {count}"))?;
                let accepted = selection.set_count_from_catalog(&catalog, &tag, requested);
                if i64::from(accepted) != requested.max(0) {
                    println!("«{tag}»: доступно только {accepted}");
                }
            }
            let created = console
                .create_training_by_topics(&mut selection, &name)
                .await?;
            println!("Тренировка создана: {} ({})", created.name, created.share_target());
            send_if_requested(console, &created, send_to).await?;
        }
        TrainingCommand::HardFilter {
            tags,
            count,
            name,
            send_to,
        } => {
            let mut filter = HardFilter::new();
            for (i, tag) in tags.iter().enumerate() {
                if i >= filter.slots().len() {
                    filter.add_slot();
                }
                filter.set_slot(i, tag);
            }
            filter.set_count(count);
            let created = console.create_training_hard_filter(&filter, &name).await?;
            println!("Тренировка создана: {} ({})", created.name, created.share_target());
            send_if_requested(console, &created, send_to).await?;
        }
        TrainingCommand::Tags { fragment } => {
            let catalog = console.catalog().await?;
            let vocabulary = TagVocabulary::from_catalog(&catalog);
            let mut filter = HardFilter::new();
            filter.set_slot(0, &fragment);
            for tag in filter.suggestions(0, &vocabulary, config.suggestion_limit) {
                println!("{tag}");
            }
        }
        TrainingCommand::List => {
            for work in console.client().hand_works().await? {
                let created =
                    format_timestamp(work.created_at.as_deref(), config.backup_utc_offset_hours);
                println!(
                    "{:>6}  {}  ({} вопр., {})  {}",
                    work.id,
                    work.name,
                    work.questions_count,
                    created,
                    work.link.as_deref().unwrap_or(&work.identificator)
                );
            }
        }
        TrainingCommand::Delete { id } => {
            console.client().delete_hand_work(id).await?;
            println!("Тренировка удалена");
        }
        TrainingCommand::Send { id, telegram_id } => {
            let work = console
                .client()
                .hand_works()
                .await?
                .into_iter()
                .find(|w| w.id == id)
                .ok_or_else(|| anyhow!("Тренировка {id} не найдена"))?;
            let training = CreatedTraining {
                id: work.id,
                name: work.name,
                identificator: work.identificator,
                link: work.link,
            };
            send_if_requested(console, &training, Some(telegram_id)).await?;
        }
    }
    Ok(())
}

// ============================================================================
// EGE
// ============================================================================

async fn ege(console: &Console, cmd: EgeCommand) -> anyhow::Result<()> {
    let rows = console.client().ege_table().await?;
    let mut table = EgeTable::from_rows(&rows);
    match cmd {
        EgeCommand::Show => {
            for (input, output) in table.rows() {
                println!("{input:>3} → {output}");
            }
        }
        EgeCommand::Set { rows } => {
            for raw in &rows {
                let (input, output) = split_pair(raw)?;
                let input: u32 = input
                    .parse()
                    .with_context(|| format!("Некорректный первичный балл: {input}"))?;
                if table.value(input).is_none() {
                    bail!("Нет строки для первичного балла {input}");
                }
                if !table.edit(input, output) {
                    eprintln!("{input}: значение «{output}» вне диапазона 1-100");
                }
            }
            console.save_ege_table(&table).await?;
            println!("Таблица сохранена");
        }
    }
    Ok(())
}

// ============================================================================
// Backups
// ============================================================================

async fn backup(console: &mut Console, cmd: BackupCommand) -> anyhow::Result<()> {
    match cmd {
        BackupCommand::Settings => {
            let form = console.backup_form().await?;
            let time = if form.local_time.is_empty() {
                "отключено"
            } else {
                form.local_time.as_str()
            };
            println!("Время (UTC{:+}): {time}", console.backup_offset_hours());
            println!("Чат: {}", form.chat_id);
            println!(
                "Токен Яндекс.Диска: {}",
                if form.yadisk_token.is_empty() { "не задан" } else { "задан" }
            );
        }
        BackupCommand::Configure {
            time,
            chat_id,
            yadisk_token,
        } => {
            let mut form = console.backup_form().await?;
            if let Some(time) = time {
                form.local_time = time;
            }
            if let Some(chat_id) = chat_id {
                form.chat_id = chat_id;
            }
            if let Some(token) = yadisk_token {
                form.yadisk_token = token;
            }
            let saved = console.save_backup_settings(&form).await?;
            println!("Настройки сохранены (UTC: {})", saved.time);
        }
        BackupCommand::Run => {
            let response = console.client().run_backup_now().await?;
            println!("{}", response.message);
        }
        BackupCommand::List => {
            let backups = console.client().remote_backups().await?;
            if backups.is_empty() {
                println!("Архивов нет");
            }
            for backup in backups {
                println!(
                    "{}  {}  {}",
                    backup.path,
                    format_size(backup.size),
                    backup.modified.as_deref().unwrap_or("—")
                );
            }
        }
        BackupCommand::RestoreRemote { path } => {
            let response = console.restore_from_remote(&path).await?;
            println!("{}", response.message);
        }
        BackupCommand::RestoreFile { file } => {
            let file = UploadFile::load(&file, UploadKind::ZipArchive)?;
            let mut sink = |phase: RestorePhase, percent: u8| {
                let label = match phase {
                    RestorePhase::Uploading => "Загрузка",
                    RestorePhase::Processing => "Обработка",
                    RestorePhase::Done => "Готово",
                    RestorePhase::Idle => "",
                };
                eprint!("\r{label}: {percent:>3}%   ");
            };
            let result = console.restore_from_archive(&file, &mut sink).await;
            eprintln!();
            println!("{}", result?.message);
        }
    }
    Ok(())
}
