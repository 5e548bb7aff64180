//! `articlehub` terminal front end.
//!
//! # Responsibility
//! - Drive the session provider, article store and editor from the command line.
//! - Print the same view-models a graphical front end renders.
//!
//! Backend selection comes from the `ARTICLEHUB_*` environment variables.

use articlehub_core::content::image::mime_from_extension;
use articlehub_core::view::{
    article_cards, delete_failure_message, format_long_date, save_failure_message, ArticleCard,
    ArticleDetail, DELETE_CONFIRMATION, EMPTY_LIST_HINT, EMPTY_LIST_TITLE,
};
use articlehub_core::{
    core_version, init_logging, ping, AppConfig, AppContext, ArticleEditor, ArticleId, ImageInput,
    PickedFile,
};
use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "articlehub", version, about = "Write and manage articles")]
struct Cli {
    /// Sign in with this email before running the command.
    #[arg(long, global = true, env = "ARTICLEHUB_EMAIL")]
    email: Option<String>,
    #[arg(long, global = true, env = "ARTICLEHUB_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Write rolling log files to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List your articles, newest first.
    List,
    /// Show one article.
    Show { id: String },
    /// Create an article.
    Create(DraftArgs),
    /// Edit an existing article.
    Edit {
        id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Delete an article.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    SignIn,
    SignUp {
        #[arg(long)]
        display_name: String,
    },
    Ping,
}

#[derive(Debug, Args)]
struct DraftArgs {
    #[arg(long)]
    title: Option<String>,
    /// Defaults to the signed-in display name when creating.
    #[arg(long)]
    author: Option<String>,
    /// Markup content, or `@path` to read it from a file.
    #[arg(long)]
    content: Option<String>,
    /// Cover image URL; an empty value removes the cover.
    #[arg(long)]
    cover: Option<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long = "untag")]
    removed_tags: Vec<String>,
    /// Image URL or local image file appended to the content.
    #[arg(long = "image")]
    images: Vec<String>,
    #[arg(long)]
    publish: bool,
    #[arg(long, conflicts_with = "publish")]
    unpublish: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult {
    if let Command::Ping = cli.command {
        println!("articlehub_core ping={}", ping());
        println!("articlehub_core version={}", core_version());
        return Ok(());
    }

    let config = AppConfig::from_env()?;
    if let Some(dir) = &cli.log_dir {
        let dir = absolute(dir)?;
        init_logging(config.log_level, &dir.to_string_lossy())?;
    }
    let mut app = AppContext::bootstrap(&config).await?;

    match &cli.command {
        Command::SignIn => {
            let (email, password) = credentials(&cli.email, &cli.password)?;
            let session = app.session.sign_in(email, password).await?;
            println!("Signed in as {}", session.identity.display_name);
            return Ok(());
        }
        Command::SignUp { display_name } => {
            let (email, password) = credentials(&cli.email, &cli.password)?;
            match app.session.sign_up(email, password, display_name).await? {
                Some(session) => println!("Signed up as {}", session.identity.display_name),
                None => println!("Check your email to confirm the account."),
            }
            return Ok(());
        }
        _ => {}
    }

    if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        app.session.sign_in(email, password).await?;
    }

    match cli.command {
        Command::List => list(&mut app).await,
        Command::Show { id } => show(&mut app, &ArticleId::new(id)).await,
        Command::Create(draft) => create(&mut app, draft).await,
        Command::Edit { id, draft } => edit(&mut app, &ArticleId::new(id), draft).await,
        Command::Delete { id, yes } => delete(&mut app, &ArticleId::new(id), yes).await,
        Command::SignIn | Command::SignUp { .. } | Command::Ping => Ok(()),
    }
}

async fn list(app: &mut AppContext) -> CliResult {
    let articles = app.articles.list().await?;
    if articles.is_empty() {
        println!("{EMPTY_LIST_TITLE}");
        println!("{EMPTY_LIST_HINT}");
        return Ok(());
    }
    for card in article_cards(articles) {
        print_card(&card);
    }
    Ok(())
}

fn print_card(card: &ArticleCard) {
    println!("{}  [{}]  {}", card.id, card.status.label(), card.title);
    println!("    {}", card.excerpt);
    let mut tags = card.tags.join(", ");
    if let Some(overflow) = card.overflow_label() {
        tags.push(' ');
        tags.push_str(&overflow);
    }
    println!("    by {} on {}  tags: {}", card.author, card.date, tags);
}

async fn show(app: &mut AppContext, id: &ArticleId) -> CliResult {
    app.articles.list().await?;
    let article = app
        .articles
        .get(id)
        .ok_or_else(|| format!("article not found: {id}"))?;
    let detail = ArticleDetail::from_article(article);

    println!("{}  [{}]", detail.title, detail.status.label());
    println!("{}", detail.byline);
    println!("{}", detail.published_line);
    if let Some(updated) = &detail.updated_line {
        println!("{updated}");
    }
    if let Some(cover) = &detail.cover_image {
        println!("Cover: {cover}");
    }
    if !detail.tags.is_empty() {
        println!("Tags: {}", detail.tags.join(", "));
    }
    println!();
    println!("{}", detail.content);
    Ok(())
}

async fn create(app: &mut AppContext, draft: DraftArgs) -> CliResult {
    let mut editor = ArticleEditor::new();
    if let Some(identity) = app.session.identity() {
        editor.set_author(identity.display_name);
    }
    apply_draft(&mut editor, draft)?;
    save(app, &editor).await
}

async fn edit(app: &mut AppContext, id: &ArticleId, draft: DraftArgs) -> CliResult {
    app.articles.list().await?;
    let article = app
        .articles
        .get(id)
        .ok_or_else(|| format!("article not found: {id}"))?;
    let mut editor = ArticleEditor::for_article(article);
    apply_draft(&mut editor, draft)?;
    save(app, &editor).await
}

async fn save(app: &mut AppContext, editor: &ArticleEditor) -> CliResult {
    match editor.save(&mut app.articles).await {
        Ok(article) => {
            println!(
                "Saved {} ({}), updated {}",
                article.id,
                article.title,
                format_long_date(article.updated_at)
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", save_failure_message());
            Err(err.into())
        }
    }
}

async fn delete(app: &mut AppContext, id: &ArticleId, yes: bool) -> CliResult {
    if !yes && !confirm(DELETE_CONFIRMATION)? {
        println!("Cancelled.");
        return Ok(());
    }
    app.articles.list().await?;
    match app.articles.delete(id).await {
        Ok(()) => {
            println!("Deleted {id}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", delete_failure_message());
            Err(err.into())
        }
    }
}

fn apply_draft(editor: &mut ArticleEditor, draft: DraftArgs) -> CliResult {
    if let Some(title) = draft.title {
        editor.set_title(title);
    }
    if let Some(author) = draft.author {
        editor.set_author(author);
    }
    if let Some(content) = draft.content {
        editor.set_content(read_content(&content)?);
    }
    if let Some(cover) = draft.cover {
        editor.set_cover_image(cover);
    }
    for tag in &draft.removed_tags {
        editor.remove_tag(tag);
    }
    for tag in &draft.tags {
        editor.add_tag(tag);
    }
    for image in &draft.images {
        editor.insert_image(image_input(image)?)?;
    }
    if draft.publish {
        editor.set_published(true);
    }
    if draft.unpublish {
        editor.set_published(false);
    }
    Ok(())
}

fn read_content(value: &str) -> CliResult<String> {
    match value.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(value.to_string()),
    }
}

fn image_input(value: &str) -> CliResult<ImageInput> {
    let is_reference = ["http://", "https://", "data:"]
        .iter()
        .any(|prefix| value.starts_with(prefix));
    if is_reference {
        return Ok(ImageInput::Url(value.to_string()));
    }

    let path = Path::new(value);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| value.to_string());
    Ok(ImageInput::File(PickedFile {
        mime_type: mime_from_extension(&name).to_string(),
        name,
        bytes: std::fs::read(path)?,
    }))
}

fn credentials<'a>(
    email: &'a Option<String>,
    password: &'a Option<String>,
) -> CliResult<(&'a str, &'a str)> {
    match (email.as_deref(), password.as_deref()) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err("--email and --password are required".into()),
    }
}

fn confirm(prompt: &str) -> CliResult<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn absolute(dir: &Path) -> CliResult<PathBuf> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}
