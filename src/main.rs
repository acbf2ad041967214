//! PerfectPick Likes - command line client
//!
//! Runs single storage operations against the configured Neo4j instance.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use perfectpick_likes::neo4j::NewLike;
use perfectpick_likes::{AppState, Config};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "likes")]
#[command(about = "Likes, ratings and wishlists on the PerfectPick graph")]
struct Cli {
    /// Path to a YAML config file (defaults to ./config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// A media item on the command line
#[derive(Args)]
struct MediaArgs {
    /// Media id
    #[arg(long)]
    media: String,

    /// Media type code (MOV, SON, BOO)
    #[arg(long = "type")]
    media_type: String,
}

/// A user/media pair on the command line
#[derive(Args)]
struct PairArgs {
    /// User id
    #[arg(long)]
    user: i64,

    #[command(flatten)]
    media: MediaArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and create constraints/indexes
    Init,

    /// Create a user node
    CreateUser { id: i64 },

    /// Delete a user and all its relationships
    DeleteUser { id: i64 },

    /// Create a media node
    CreateMedia(MediaArgs),

    /// Delete a media item and all its relationships
    DeleteMedia(MediaArgs),

    /// Set a like (LK), dislike (DLK) or block (BLK)
    Like {
        #[command(flatten)]
        pair: PairArgs,

        #[arg(long = "like", default_value = "LK")]
        like_type: String,
    },

    /// Record a like from a JSON body ({"user_id", "media_id", "media_type", "like_type", ...})
    RecordLike { json: String },

    /// Remove a preference
    Unlike(PairArgs),

    /// Show one preference
    GetLike(PairArgs),

    /// Remove preference, rating and wishlist entry for a pair
    Clear(PairArgs),

    /// List a user's preferences grouped by media type
    UserLikes {
        id: i64,
        #[arg(long = "type")]
        media_type: Option<String>,
        #[arg(long = "like")]
        like_type: Option<String>,
    },

    /// List the preferences on one media item
    MediaLikes {
        #[command(flatten)]
        media: MediaArgs,
        #[arg(long = "like")]
        like_type: Option<String>,
    },

    /// Rate a media item (-1 clears the rating)
    Rate {
        #[command(flatten)]
        pair: PairArgs,

        #[arg(long, allow_hyphen_values = true)]
        rating: f64,
    },

    /// Show the average rating of a media item
    Average(MediaArgs),

    /// Show one user's rating of a media item
    Rating(PairArgs),

    /// Apply a wishlist action (ADD or RMV)
    Wishlist {
        #[command(flatten)]
        pair: PairArgs,

        #[arg(long, default_value = "ADD")]
        action: String,
    },

    /// List a user's wishlist
    GetWishlist {
        id: i64,
        #[arg(long = "type")]
        media_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,perfectpick_likes=debug".into());
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = Config::from_yaml_and_env(cli.config.as_deref())?;
    let state = AppState::new(config).await?;
    let likes = &state.likes;

    match cli.command {
        Commands::Init => {
            let config = &state.config;
            tracing::info!(
                uri = %config.neo4j_uri,
                database = config.neo4j_database.as_deref().unwrap_or("<default>"),
                max_connections = config.max_connections,
                "Schema ready"
            );
        }
        Commands::CreateUser { id } => likes.create_user(id).await?,
        Commands::DeleteUser { id } => likes.delete_user(id).await?,
        Commands::CreateMedia(m) => likes.create_media(&m.media, &m.media_type).await?,
        Commands::DeleteMedia(m) => likes.delete_media(&m.media, &m.media_type).await?,
        Commands::Like { pair, like_type } => {
            likes
                .set_like(pair.user, &pair.media.media, &pair.media.media_type, &like_type)
                .await?
        }
        Commands::RecordLike { json } => {
            let like: NewLike = serde_json::from_str(&json).context("Invalid like JSON")?;
            likes.record_like(&like).await?
        }
        Commands::Unlike(p) => {
            likes
                .delete_like(p.user, &p.media.media, &p.media.media_type)
                .await?
        }
        Commands::GetLike(p) => print_json(
            &likes
                .get_specific_like(p.user, &p.media.media, &p.media.media_type)
                .await?,
        )?,
        Commands::Clear(p) => {
            likes
                .clear_relations(p.user, &p.media.media, &p.media.media_type)
                .await?
        }
        Commands::UserLikes {
            id,
            media_type,
            like_type,
        } => print_json(
            &likes
                .get_user_likes(id, media_type.as_deref(), like_type.as_deref())
                .await?,
        )?,
        Commands::MediaLikes { media, like_type } => print_json(
            &likes
                .get_media_likes(&media.media, &media.media_type, like_type.as_deref())
                .await?,
        )?,
        Commands::Rate { pair, rating } => {
            likes
                .set_rating(pair.user, &pair.media.media, &pair.media.media_type, rating)
                .await?
        }
        Commands::Average(m) => print_json(&likes.get_average(&m.media, &m.media_type).await?)?,
        Commands::Rating(p) => print_json(
            &likes
                .get_rating(&p.media.media, &p.media.media_type, p.user)
                .await?,
        )?,
        Commands::Wishlist { pair, action } => {
            likes
                .update_wishlist(pair.user, &pair.media.media, &pair.media.media_type, &action)
                .await?
        }
        Commands::GetWishlist { id, media_type } => {
            print_json(&likes.get_wishlist(id, media_type.as_deref()).await?)?
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
