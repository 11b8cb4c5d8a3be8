mod output;
mod token;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use quill_client::{
    AllPosts, ClientError, Comments, Feed, HttpClient, MediaLibrary, PageSource, PublishedPosts,
    SearchResults, Users,
};
use quill_contract::page::{DEFAULT_TAKE, MAX_TAKE};
use quill_contract::{
    CreateCommentRequest, CreatePostRequest, ExternalLoginRequest, FeedQuery, PageCursor, Role,
    SortField, SortOrder, UpdatePostRequest,
};
use std::path::PathBuf;
use token::TokenFile;

#[derive(Parser)]
#[command(author, version, about = "Manage a quill site from the command line", long_about = None)]
struct Cli {
    /// Server base URL.
    #[arg(short, long, env = "QUILL_SERVER", default_value = "http://localhost:3000")]
    server: String,

    #[arg(long, env = "QUILL_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    #[arg(long, env = "QUILL_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderBy {
    Created,
    Updated,
    Title,
}

impl From<OrderBy> for SortField {
    fn from(value: OrderBy) -> Self {
        match value {
            OrderBy::Created => SortField::CreatedAt,
            OrderBy::Updated => SortField::UpdatedAt,
            OrderBy::Title => SortField::Title,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Asc,
    Desc,
}

impl From<Direction> for SortOrder {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Asc => SortOrder::Asc,
            Direction::Desc => SortOrder::Desc,
        }
    }
}

/// Paging flags shared by every listing command.
#[derive(clap::Args, Clone, Copy)]
struct Paging {
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
    skip: i64,

    #[arg(long, default_value_t = DEFAULT_TAKE, value_parser = clap::value_parser!(i64).range(1..=MAX_TAKE))]
    take: i64,

    /// Fetch every page.
    #[arg(long)]
    all: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a token issued by the identity broker, or submit a
    /// verified profile as the broker (needs the broker secret).
    Login {
        #[arg(long, conflicts_with_all = ["provider_id", "name", "avatar"])]
        token: Option<String>,

        #[arg(long, default_value = "cli")]
        provider: String,

        #[arg(long, required_unless_present = "token")]
        provider_id: Option<String>,

        #[arg(long, required_unless_present = "token")]
        name: Option<String>,

        #[arg(long)]
        avatar: Option<String>,

        #[arg(long, env = "QUILL_BROKER_SECRET", hide_env_values = true)]
        broker_secret: Option<String>,
    },

    Logout,

    Status,

    /// List posts. Drafts are included with --drafts (admin only).
    Feed {
        #[command(flatten)]
        paging: Paging,

        #[arg(long, value_enum)]
        order_by: Option<OrderBy>,

        #[arg(long, value_enum)]
        order: Option<Direction>,

        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        drafts: bool,
    },

    /// Posts whose title or content contains TERM.
    Search {
        term: String,

        #[command(flatten)]
        paging: Paging,
    },

    /// Show a post by numeric id or by slug.
    Get { target: String },

    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, conflicts_with = "content_file")]
        content: Option<String>,

        #[arg(long)]
        content_file: Option<PathBuf>,

        #[arg(long)]
        slug: Option<String>,

        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        #[arg(long)]
        thumbnail: Option<i64>,
    },

    Update {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long, conflicts_with = "content_file")]
        content: Option<String>,

        #[arg(long)]
        content_file: Option<PathBuf>,

        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        #[arg(long)]
        thumbnail: Option<i64>,
    },

    /// Toggle the published flag.
    Publish { id: i64 },

    Delete { id: i64 },

    /// Comments of a post.
    Comments {
        post_id: i64,

        #[arg(long)]
        chief: Option<bool>,

        #[command(flatten)]
        paging: Paging,
    },

    Comment {
        post_id: i64,

        message: String,

        /// Pin as a chief comment (admins only).
        #[arg(long)]
        chief: bool,
    },

    DeleteComment { id: i64 },

    /// Comments across all posts.
    Moderation {
        #[arg(long)]
        chief: Option<bool>,

        #[command(flatten)]
        paging: Paging,
    },

    Users {
        #[command(flatten)]
        paging: Paging,
    },

    /// Change a user's role (super-admin only).
    Role {
        user_id: i64,

        role: Role,
    },

    Media {
        #[command(flatten)]
        paging: Paging,
    },

    Upload {
        file: PathBuf,

        #[arg(long)]
        post_id: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        if let Some(hint) = err.downcast_ref::<ClientError>().and_then(output::hint) {
            eprintln!("  {}", hint.dimmed());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let tokens = TokenFile::new(cli.token_file)?;
    let client = HttpClient::new(&cli.server, &cli.api_key);
    if let Some(token) = tokens.load()? {
        client.set_token(token).await;
    }

    match cli.command {
        Commands::Login {
            token: Some(token),
            ..
        } => {
            client.set_token(token.trim().to_string()).await;
            let user = client.me().await?;
            tokens.save(token.trim())?;
            output::success(&format!(
                "Logged in as {} ({}), token saved to {:?}",
                user.name,
                user.role,
                tokens.path()
            ));
        }

        Commands::Login {
            token: None,
            provider,
            provider_id,
            name,
            avatar,
            broker_secret,
        } => {
            let Some(broker_secret) = broker_secret.filter(|s| !s.is_empty()) else {
                bail!(
                    "signing in with a profile needs the identity broker secret \
                     (--broker-secret or QUILL_BROKER_SECRET); otherwise pass --token"
                );
            };
            let (Some(provider_id), Some(name)) = (provider_id, name) else {
                bail!("--provider-id and --name are required without --token");
            };
            let auth = client
                .external_login(
                    &broker_secret,
                    &ExternalLoginRequest {
                        provider,
                        provider_id,
                        name,
                        avatar,
                    },
                )
                .await?;
            tokens.save(&auth.token)?;
            output::success(&format!(
                "Logged in as {} ({}), token saved to {:?}",
                auth.user.name,
                auth.user.role,
                tokens.path()
            ));
        }

        Commands::Logout => {
            if tokens.clear()? {
                output::success("Logged out");
            } else {
                println!("Not logged in");
            }
        }

        Commands::Status => {
            println!("Server: {}", client.base_url());
            if client.token().await.is_none() {
                println!("Not logged in (token file {:?})", tokens.path());
                return Ok(());
            }
            match client.me().await {
                Ok(user) => {
                    println!("Signed in:");
                    output::user_line(&user);
                }
                Err(err) if err.is_unauthorized() => {
                    println!("Saved token is no longer valid; log in again");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Commands::Feed {
            paging,
            order_by,
            order,
            search,
            drafts,
        } => {
            let query = FeedQuery {
                order_by: order_by.map(Into::into),
                order: order.map(Into::into),
                search_string: search,
                ..Default::default()
            };
            if drafts {
                list(AllPosts { client, query }, paging, output::post_line).await?;
            } else {
                list(PublishedPosts { client, query }, paging, output::post_line).await?;
            }
        }

        Commands::Search { term, paging } => {
            list(SearchResults { client, term }, paging, output::post_line).await?;
        }

        Commands::Get { target } => {
            let post = match target.parse::<i64>() {
                Ok(id) => client.get_post(id).await?,
                Err(_) => client.get_post_by_slug(&target).await?,
            };
            output::post_details(&post);
        }

        Commands::Create {
            title,
            content,
            content_file,
            slug,
            tags,
            thumbnail,
        } => {
            let post = client
                .create_post(&CreatePostRequest {
                    title,
                    content: read_content(content, content_file)?,
                    slug,
                    thumbnail_id: thumbnail,
                    tags,
                })
                .await?;
            output::success("Draft created");
            output::post_line(&post);
        }

        Commands::Update {
            id,
            title,
            content,
            content_file,
            tags,
            thumbnail,
        } => {
            let req = UpdatePostRequest {
                title,
                content: read_content(content, content_file)?,
                thumbnail_id: thumbnail,
                tags,
            };
            if req.is_empty() {
                bail!("nothing to update; pass --title, --content, --tags or --thumbnail");
            }
            let post = client.update_post(id, &req).await?;
            output::success("Post updated");
            output::post_line(&post);
        }

        Commands::Publish { id } => {
            let post = client.toggle_publish(id).await?;
            let state = if post.is_published() { "published" } else { "unpublished" };
            output::success(&format!("Post #{} {}", post.id, state));
        }

        Commands::Delete { id } => {
            client.delete_post(id).await?;
            output::success(&format!("Post #{} deleted", id));
        }

        Commands::Comments {
            post_id,
            chief,
            paging,
        } => {
            let source = Comments {
                client,
                post_id: Some(post_id),
                chief,
            };
            list(source, paging, output::comment_line).await?;
        }

        Commands::Comment {
            post_id,
            message,
            chief,
        } => {
            let comment = client
                .create_comment(post_id, &CreateCommentRequest { message, chief })
                .await?;
            output::success("Comment added");
            output::comment_line(&comment);
        }

        Commands::DeleteComment { id } => {
            client.delete_comment(id).await?;
            output::success(&format!("Comment #{} deleted", id));
        }

        Commands::Moderation { chief, paging } => {
            let source = Comments {
                client,
                post_id: None,
                chief,
            };
            list(source, paging, output::comment_line).await?;
        }

        Commands::Users { paging } => {
            list(Users { client }, paging, output::user_line).await?;
        }

        Commands::Role { user_id, role } => {
            let user = client.set_role(user_id, role).await?;
            output::success("Role updated");
            output::user_line(&user);
        }

        Commands::Media { paging } => {
            list(MediaLibrary { client }, paging, output::media_line).await?;
        }

        Commands::Upload { file, post_id } => {
            let bytes = std::fs::read(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string());
            let media = client.upload_media(&name, bytes, post_id).await?;
            output::success(&format!("Uploaded as {}", client.media_url(&media)));
        }
    }

    Ok(())
}

/// One page at `--skip`, or every page with `--all`.
async fn list<T, S>(source: S, paging: Paging, print: fn(&T)) -> Result<()>
where
    T: Clone + Send,
    S: PageSource<T>,
{
    if paging.all {
        let mut feed = Feed::new(source, paging.take);
        let items = feed.fetch_all().await?;
        items.iter().for_each(print);
        output::summary(items.len(), feed.total());
    } else {
        let page = source
            .fetch_page(PageCursor::new(paging.skip, paging.take))
            .await?;
        if page.items.is_empty() {
            println!("Nothing here");
        }
        page.items.iter().for_each(print);
        output::summary(page.items.len(), Some(page.total));
    }
    Ok(())
}

fn read_content(inline: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (inline, file) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Failed to read {:?}", path)),
        (None, None) => Ok(None),
    }
}
