//! # sync-cli
//!
//! CLI tool for exercising the twablet sync core.
//!
//! ## Commands
//!
//! - `tweets`: Load a tweet timeline (home, mentions, search, ...)
//! - `users`: Load friends or followers
//! - `lists`: Load list subscriptions, ownerships or memberships
//! - `tweet`: Show, favorite, unfavorite or retweet one tweet
//! - `post`: Post a status update
//! - `user`: Show, follow or unfollow one user
//!
//! ## Example
//!
//! ```bash
//! # Two pages of the home timeline
//! twablet tweets home --pages 2
//!
//! # Search without touching the network
//! twablet --mock tweets search --q rust
//!
//! # Reply to a tweet
//! twablet post "Agreed!" --reply-to 1234
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{item, list};

/// CLI tool for exercising the twablet sync core.
#[derive(Parser, Debug)]
#[command(name = "twablet")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: twablet.toml in the config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use canned replies instead of the Twitter API (for testing/demo)
    #[arg(long, global = true)]
    mock: bool,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a tweet timeline
    Tweets {
        /// Timeline to load
        #[arg(value_enum)]
        timeline: Timeline,

        /// Search terms (search only)
        #[arg(long)]
        q: Option<String>,

        /// Search result type: mixed, recent or popular
        #[arg(long)]
        result_type: Option<String>,

        /// User whose favorites or tweets to load
        #[arg(long)]
        user_id: Option<String>,

        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },

    /// Load a user collection
    Users {
        /// Collection to load
        #[arg(value_enum)]
        collection: UserCollection,

        /// Owner of the collection
        #[arg(long)]
        user_id: String,

        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },

    /// Load a list collection
    Lists {
        /// Collection to load
        #[arg(value_enum)]
        collection: ListCollection,

        /// Owner of the collection
        #[arg(long)]
        user_id: String,

        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },

    /// Act on one tweet
    Tweet {
        /// Action to perform
        #[arg(value_enum)]
        action: TweetAction,

        /// Tweet id
        id: String,
    },

    /// Post a status update
    Post {
        /// Status text
        text: String,

        /// Tweet being replied to
        #[arg(long)]
        reply_to: Option<String>,
    },

    /// Act on one user
    User {
        /// Action to perform
        #[arg(value_enum)]
        action: UserAction,

        /// User id
        user_id: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Timeline {
    Home,
    Mentions,
    Search,
    Favorites,
    UserTimeline,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum UserCollection {
    Friends,
    Followers,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ListCollection {
    Subscriptions,
    Ownerships,
    Memberships,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum TweetAction {
    Show,
    Favorite,
    Unfavorite,
    Retweet,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum UserAction {
    Show,
    Follow,
    Unfollow,
}

impl From<Timeline> for twablet_sync_types::TweetListKind {
    fn from(timeline: Timeline) -> Self {
        match timeline {
            Timeline::Home => Self::Home,
            Timeline::Mentions => Self::Mentions,
            Timeline::Search => Self::Search,
            Timeline::Favorites => Self::Favorites,
            Timeline::UserTimeline => Self::UserTimeline,
        }
    }
}

impl From<UserCollection> for twablet_sync_types::UserListKind {
    fn from(collection: UserCollection) -> Self {
        match collection {
            UserCollection::Friends => Self::Friends,
            UserCollection::Followers => Self::Followers,
        }
    }
}

impl From<ListCollection> for twablet_sync_types::ListListKind {
    fn from(collection: ListCollection) -> Self {
        match collection {
            ListCollection::Subscriptions => Self::Subscriptions,
            ListCollection::Ownerships => Self::Ownerships,
            ListCollection::Memberships => Self::Memberships,
        }
    }
}

impl From<TweetAction> for twablet_sync_types::TweetItemKind {
    fn from(action: TweetAction) -> Self {
        match action {
            TweetAction::Show => Self::Show,
            TweetAction::Favorite => Self::Favorite,
            TweetAction::Unfavorite => Self::Unfavorite,
            TweetAction::Retweet => Self::Retweet,
        }
    }
}

impl From<UserAction> for twablet_sync_types::UserItemKind {
    fn from(action: UserAction) -> Self {
        match action {
            UserAction::Show => Self::Show,
            UserAction::Follow => Self::Follow,
            UserAction::Unfollow => Self::Unfollow,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries results.
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let session = config::Session::open(cli.config.as_deref(), cli.mock)?;

    match cli.command {
        Commands::Tweets {
            timeline,
            q,
            result_type,
            user_id,
            pages,
        } => {
            let args = list::TweetArgs {
                q,
                result_type,
                user_id,
            };
            list::tweets(&session, timeline.into(), &args, pages).await?;
        }
        Commands::Users {
            collection,
            user_id,
            pages,
        } => {
            list::users(&session, collection.into(), &user_id, pages).await?;
        }
        Commands::Lists {
            collection,
            user_id,
            pages,
        } => {
            list::lists(&session, collection.into(), &user_id, pages).await?;
        }
        Commands::Tweet { action, id } => {
            item::tweet(&session, action.into(), &id).await?;
        }
        Commands::Post { text, reply_to } => {
            item::post(&session, &text, reply_to.as_deref()).await?;
        }
        Commands::User { action, user_id } => {
            item::user(&session, action.into(), &user_id).await?;
        }
    }

    Ok(())
}
