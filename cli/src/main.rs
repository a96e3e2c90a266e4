use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kniga::auth::{AuthState, AuthStatus, GuardView, protect};
use kniga::config::DEFAULT_API_URL;
use kniga::net::{ApiClient, ApiError};
use kniga::pages::admin::{AdminBooks, AdminCategories, AdminReviews, BookForm, Overview};
use kniga::pages::favorite::{FavoriteToggle, ProductPage};
use kniga::pages::login::LoginForm;
use kniga::pages::profile::ProfileFavorites;
use kniga::pages::register::RegisterForm;
use kniga::pages::review::{ReviewForm, ReviewPage};
use kniga::pages::{PageError, admin, admin_login, catalog, login, profile, register, review};
use kniga::session::{FileStorage, TokenStore};
use kniga::util::{FixedConfirm, Notice, RecordingNavigator};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Page(#[from] PageError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Failed(String),
    #[error("not signed in; run `kniga-cli login` first")]
    NotSignedIn,
    #[error("cancelled")]
    Cancelled,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "kniga-cli", about = "КнигаЪ catalog CLI")]
struct Cli {
    #[arg(long, env = "KNIGA_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// JSON file holding the session between invocations.
    #[arg(long, env = "KNIGA_SESSION_FILE", default_value = ".kniga-session.json")]
    session_file: PathBuf,

    /// Answer yes to every confirmation prompt.
    #[arg(long, short = 'y', global = true, default_value_t = false)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to `--password`.
        #[arg(long)]
        confirm_password: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Page to land on afterwards.
        #[arg(long)]
        from: Option<String>,
    },
    /// Show the signed-in user, validating the stored token.
    Whoami,
    Logout,
    Dashboard,
    Categories,
    Category {
        slug: String,
    },
    Book {
        book_id: i64,
    },
    Favorite(FavoriteCommand),
    Review(ReviewCommand),
    Comment(CommentCommand),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct FavoriteCommand {
    #[command(subcommand)]
    command: FavoriteSubcommand,
}

#[derive(Subcommand, Debug)]
enum FavoriteSubcommand {
    List,
    Toggle { book_id: i64 },
    Remove { book_id: i64 },
}

#[derive(Args, Debug)]
struct ReviewCommand {
    #[command(subcommand)]
    command: ReviewSubcommand,
}

#[derive(Subcommand, Debug)]
enum ReviewSubcommand {
    /// Reviews written by the signed-in user.
    Mine,
    Show {
        review_id: i64,
    },
    Create {
        book_id: i64,
        #[arg(long)]
        rating: i32,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    Edit {
        review_id: i64,
        #[arg(long)]
        rating: Option<i32>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete {
        review_id: i64,
    },
}

#[derive(Args, Debug)]
struct CommentCommand {
    #[command(subcommand)]
    command: CommentSubcommand,
}

#[derive(Subcommand, Debug)]
enum CommentSubcommand {
    Add { review_id: i64, content: String },
    Edit { review_id: i64, comment_id: i64, content: String },
    Delete { review_id: i64, comment_id: i64 },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Overview,
    Books,
    AddBook(AddBookArgs),
    DeleteBook { book_id: i64 },
    Categories,
    AddCategory { name: String },
    Reviews,
    DeleteReview { review_id: i64 },
    Users,
    User { user_id: i64 },
}

#[derive(Args, Debug)]
struct AddBookArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    isbn: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    year: String,
    #[arg(long, default_value = "")]
    image_url: String,
    #[arg(long)]
    category_id: Option<i64>,
    #[arg(long, default_value = "1")]
    copies: String,
}

/// Host handles shared by every command.
struct CliContext {
    api: ApiClient,
    navigator: RecordingNavigator,
    confirm: FixedConfirm,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();
    let tokens = TokenStore::new(std::sync::Arc::new(FileStorage::open(&cli.session_file)));
    let api = ApiClient::new(cli.api_url, tokens)?;
    let ctx = CliContext { api, navigator: RecordingNavigator::new(), confirm: FixedConfirm(cli.yes) };

    let result = run(&ctx, cli.command).await;
    if let Some(path) = ctx.navigator.last() {
        eprintln!("-> {path}");
    }
    result
}

async fn run(ctx: &CliContext, command: Command) -> Result<(), CliError> {
    let api = &ctx.api;
    let nav = &ctx.navigator;
    match command {
        Command::Register { username, email, password, confirm_password } => {
            let form = RegisterForm {
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                username,
                email,
                password,
            };
            let (user, notice) = register::submit(api, &form, nav).await?;
            print_json(&user)?;
            report(notice)
        }
        Command::Login { email, password, from } => {
            let response = login::submit(api, &LoginForm { email, password }, from.as_deref(), nav).await?;
            print_json(&response.user)
        }
        Command::Whoami => whoami(ctx).await,
        Command::Logout => {
            AuthState::new(api.clone()).logout(nav);
            Ok(())
        }
        Command::Dashboard => {
            let dashboard = kniga::pages::dashboard::Dashboard::load(api).await;
            print_json(&dashboard)
        }
        Command::Categories => print_json(&catalog::categories(api).await?),
        Command::Category { slug } => print_json(&catalog::category_books(api, &slug).await?),
        Command::Book { book_id } => {
            let page = ProductPage::load(api, book_id).await?;
            print_json(&page.book)?;
            print_json(&page.reviews)?;
            println!("favorite: {}", page.favorite.is_favorite());
            Ok(())
        }
        Command::Favorite(favorite) => run_favorite(ctx, favorite.command).await,
        Command::Review(review) => run_review(ctx, review.command).await,
        Command::Comment(comment) => run_comment(ctx, comment.command).await,
        Command::Admin(admin) => run_admin(ctx, admin.command).await,
    }
}

async fn whoami(ctx: &CliContext) -> Result<(), CliError> {
    let mut auth = AuthState::new(ctx.api.clone());
    match protect(&mut auth, &ctx.navigator).await {
        GuardView::Children => match auth.status() {
            AuthStatus::Authenticated(user) => print_json(user),
            AuthStatus::Loading | AuthStatus::Anonymous => Err(CliError::NotSignedIn),
        },
        GuardView::Placeholder | GuardView::Nothing => Err(CliError::NotSignedIn),
    }
}

async fn run_favorite(ctx: &CliContext, command: FavoriteSubcommand) -> Result<(), CliError> {
    match command {
        FavoriteSubcommand::List => {
            let page = ProfileFavorites::load(ctx.api.clone()).await?;
            print_json(&page.items())
        }
        FavoriteSubcommand::Toggle { book_id } => {
            let mut toggle = FavoriteToggle::load(ctx.api.clone(), book_id).await;
            report(toggle.toggle().await)
        }
        FavoriteSubcommand::Remove { book_id } => {
            let mut page = ProfileFavorites::load(ctx.api.clone()).await?;
            report(page.remove(book_id).await)
        }
    }
}

async fn run_review(ctx: &CliContext, command: ReviewSubcommand) -> Result<(), CliError> {
    match command {
        ReviewSubcommand::Mine => print_json(&profile::my_reviews(&ctx.api).await?),
        ReviewSubcommand::Show { review_id } => {
            let page = ReviewPage::load(ctx.api.clone(), review_id).await?;
            print_json(page.review())
        }
        ReviewSubcommand::Create { book_id, rating, title, content } => {
            let form = ReviewForm { rating, title, content };
            let created = review::create(&ctx.api, book_id, &form, &ctx.navigator).await?;
            print_json(&created)
        }
        ReviewSubcommand::Edit { review_id, rating, title, content } => {
            let mut page = ReviewPage::load(ctx.api.clone(), review_id).await?;
            let mut form = page.edit_form();
            if let Some(rating) = rating {
                form.rating = rating;
            }
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(content) = content {
                form.content = content;
            }
            report(page.update(&form, &ctx.navigator).await)
        }
        ReviewSubcommand::Delete { review_id } => {
            let page = ReviewPage::load(ctx.api.clone(), review_id).await?;
            confirmed(page.delete(&ctx.confirm, &ctx.navigator).await)
        }
    }
}

async fn run_comment(ctx: &CliContext, command: CommentSubcommand) -> Result<(), CliError> {
    match command {
        CommentSubcommand::Add { review_id, content } => {
            let mut page = ReviewPage::load(ctx.api.clone(), review_id).await?;
            page.add_comment(&content).await?;
            print_json(&page.review().comments)
        }
        CommentSubcommand::Edit { review_id, comment_id, content } => {
            let mut page = ReviewPage::load(ctx.api.clone(), review_id).await?;
            page.edit_comment(comment_id, &content).await?;
            print_json(&page.review().comments)
        }
        CommentSubcommand::Delete { review_id, comment_id } => {
            let mut page = ReviewPage::load(ctx.api.clone(), review_id).await?;
            if !page.delete_comment(comment_id, &ctx.confirm).await? {
                return Err(CliError::Cancelled);
            }
            print_json(&page.review().comments)
        }
    }
}

async fn run_admin(ctx: &CliContext, command: AdminSubcommand) -> Result<(), CliError> {
    let api = &ctx.api;
    match command {
        AdminSubcommand::Login { email, password } => {
            let response = admin_login::submit(api, &LoginForm { email, password }, &ctx.navigator).await?;
            print_json(&response.user)
        }
        AdminSubcommand::Logout => {
            admin_login::logout(api, &ctx.navigator);
            Ok(())
        }
        AdminSubcommand::Overview => print_json(&Overview::load(api).await?),
        AdminSubcommand::Books => print_json(&AdminBooks::load(api.clone()).await?.books()),
        AdminSubcommand::AddBook(args) => {
            let form = BookForm {
                title: args.title,
                author: args.author,
                isbn: args.isbn,
                description: args.description,
                publication_year: args.year,
                image_url: args.image_url,
                category_id: args.category_id,
                total_copies: args.copies,
            };
            let mut page = AdminBooks::load(api.clone()).await?;
            report(page.create(&form).await)
        }
        AdminSubcommand::DeleteBook { book_id } => {
            let mut page = AdminBooks::load(api.clone()).await?;
            confirmed(page.delete(book_id, &ctx.confirm).await)
        }
        AdminSubcommand::Categories => print_json(&AdminCategories::load(api.clone()).await?.categories()),
        AdminSubcommand::AddCategory { name } => {
            let mut page = AdminCategories::load(api.clone()).await?;
            report(page.create(&name).await)
        }
        AdminSubcommand::Reviews => print_json(&AdminReviews::load(api.clone()).await?.reviews()),
        AdminSubcommand::DeleteReview { review_id } => {
            let mut page = AdminReviews::load(api.clone()).await?;
            confirmed(page.delete(review_id, &ctx.confirm).await)
        }
        AdminSubcommand::Users => print_json(&admin::users(api).await?),
        AdminSubcommand::User { user_id } => print_json(&admin::user(api, user_id).await?),
    }
}

/// Print a toast; error toasts become a failing exit status.
fn report(notice: Notice) -> Result<(), CliError> {
    if notice.is_error() {
        return Err(CliError::Failed(notice.description));
    }
    println!("{notice}");
    Ok(())
}

fn confirmed(notice: Option<Notice>) -> Result<(), CliError> {
    notice.map_or(Err(CliError::Cancelled), report)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;
