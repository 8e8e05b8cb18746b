//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    config::AppConfig,
    ports::{
        AuthRepo, BlobStore, ChannelRepo, ClockPort, ConversationRepo, MailerPort, MemberRepo,
        MessageRepo, OrderRepo, RandomPort, ReactionRepo, UserRepo, WorkspaceRepo,
    },
    sqlite::SqliteRepositories,
};
use crate::use_cases::{
    self,
    chat::{
        Access, ChannelOps, ConversationOps, MemberOps, MessageOps, ReactionOps, WorkspaceOps,
    },
};

/// Main application state.
///
/// Holds the repositories and use cases. Passed to HTTP/WebSocket handlers
/// via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
    pub config: AppConfig,
}

/// Port traits injected directly.
pub struct Repositories {
    pub user: Arc<dyn UserRepo>,
    pub auth: Arc<dyn AuthRepo>,
    pub workspace: Arc<dyn WorkspaceRepo>,
    pub member: Arc<dyn MemberRepo>,
    pub channel: Arc<dyn ChannelRepo>,
    pub conversation: Arc<dyn ConversationRepo>,
    pub message: Arc<dyn MessageRepo>,
    pub reaction: Arc<dyn ReactionRepo>,
    pub order: Arc<dyn OrderRepo>,
}

impl From<SqliteRepositories> for Repositories {
    fn from(repos: SqliteRepositories) -> Self {
        Self {
            user: repos.user,
            auth: repos.auth,
            workspace: repos.workspace,
            member: repos.member,
            channel: repos.channel,
            conversation: repos.conversation,
            message: repos.message,
            reaction: repos.reaction,
            order: repos.order,
        }
    }
}

/// Container for all use cases.
pub struct UseCases {
    pub auth: use_cases::AuthUseCases,
    pub chat: use_cases::ChatUseCases,
    pub order: use_cases::OrderUseCases,
    pub upload: use_cases::UploadUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        repos: impl Into<Repositories>,
        mailer: Arc<dyn MailerPort>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        config: AppConfig,
    ) -> Self {
        let repositories: Repositories = repos.into();
        let access = Access::new(repositories.member.clone());

        let chat = use_cases::ChatUseCases::new(
            WorkspaceOps::new(
                repositories.workspace.clone(),
                repositories.member.clone(),
                access.clone(),
                blobs.clone(),
                clock.clone(),
                random.clone(),
            ),
            MemberOps::new(
                repositories.member.clone(),
                repositories.user.clone(),
                access.clone(),
                blobs.clone(),
            ),
            ChannelOps::new(
                repositories.channel.clone(),
                access.clone(),
                blobs.clone(),
                clock.clone(),
            ),
            ConversationOps::new(
                repositories.conversation.clone(),
                repositories.member.clone(),
                access.clone(),
                clock.clone(),
            ),
            MessageOps::new(
                repositories.message.clone(),
                repositories.member.clone(),
                repositories.user.clone(),
                repositories.channel.clone(),
                repositories.conversation.clone(),
                repositories.reaction.clone(),
                access.clone(),
                blobs.clone(),
                clock.clone(),
            ),
            ReactionOps::new(
                repositories.reaction.clone(),
                repositories.message.clone(),
                access,
                clock.clone(),
            ),
        );

        let auth = use_cases::AuthUseCases::new(
            repositories.user.clone(),
            repositories.auth.clone(),
            mailer,
            clock.clone(),
            random.clone(),
            config.session_ttl,
        );
        let order = use_cases::OrderUseCases::new(repositories.order.clone(), clock, random);
        let upload = use_cases::UploadUseCases::new(blobs, config.max_upload_bytes);

        Self {
            repositories,
            use_cases: UseCases {
                auth,
                chat,
                order,
                upload,
            },
            config,
        }
    }
}
