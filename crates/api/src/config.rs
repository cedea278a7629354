use chrono::Duration;
use curio_core::types::Id;
use curio_core::voting::VotingPolicy;
use curio_edits::ModerationPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
    /// Moderation tunables (vote thresholds, voting periods, update limit).
    pub moderation: ModerationConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            moderation: ModerationConfig::from_env(),
        }
    }
}

/// Moderation tunables loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Unanimous votes needed for early resolution (0 disables the
    /// threshold path).
    pub vote_application_threshold: u32,
    /// How long an edit stays open before the expiry sweep settles it.
    pub voting_period_secs: i64,
    /// Minimum age before a destructive edit may resolve early.
    pub destructive_voting_period_secs: i64,
    /// How many times a creator may amend a pending edit.
    pub edit_update_limit: i32,
    /// Applied edits needed to earn the vote role.
    pub vote_promotion_threshold: i64,
    /// User id that authors system comments (apply failures).
    pub system_user_id: Id,
    /// Seconds between expiry-sweep runs.
    pub close_edits_interval_secs: u64,
}

impl ModerationConfig {
    /// Load moderation settings from environment variables.
    ///
    /// | Env Var                          | Required | Default  |
    /// |----------------------------------|----------|----------|
    /// | `VOTE_APPLICATION_THRESHOLD`     | no       | `3`      |
    /// | `VOTING_PERIOD_SECS`             | no       | `345600` |
    /// | `DESTRUCTIVE_VOTING_PERIOD_SECS` | no       | `172800` |
    /// | `EDIT_UPDATE_LIMIT`              | no       | `1`      |
    /// | `VOTE_PROMOTION_THRESHOLD`       | no       | `10`     |
    /// | `SYSTEM_USER_ID`                 | **yes**  | --       |
    /// | `CLOSE_EDITS_INTERVAL_SECS`      | no       | `300`    |
    pub fn from_env() -> Self {
        let defaults = ModerationPolicy::default();

        let vote_application_threshold: u32 = std::env::var("VOTE_APPLICATION_THRESHOLD")
            .unwrap_or_else(|_| defaults.voting.application_threshold.to_string())
            .parse()
            .expect("VOTE_APPLICATION_THRESHOLD must be a valid u32");

        let voting_period_secs: i64 = std::env::var("VOTING_PERIOD_SECS")
            .unwrap_or_else(|_| defaults.voting.voting_period.num_seconds().to_string())
            .parse()
            .expect("VOTING_PERIOD_SECS must be a valid i64");

        let destructive_voting_period_secs: i64 = std::env::var("DESTRUCTIVE_VOTING_PERIOD_SECS")
            .unwrap_or_else(|_| {
                defaults
                    .voting
                    .destructive_voting_period
                    .num_seconds()
                    .to_string()
            })
            .parse()
            .expect("DESTRUCTIVE_VOTING_PERIOD_SECS must be a valid i64");

        let edit_update_limit: i32 = std::env::var("EDIT_UPDATE_LIMIT")
            .unwrap_or_else(|_| defaults.edit_update_limit.to_string())
            .parse()
            .expect("EDIT_UPDATE_LIMIT must be a valid i32");

        let vote_promotion_threshold: i64 = std::env::var("VOTE_PROMOTION_THRESHOLD")
            .unwrap_or_else(|_| defaults.vote_promotion_threshold.to_string())
            .parse()
            .expect("VOTE_PROMOTION_THRESHOLD must be a valid i64");

        let system_user_id: Id = std::env::var("SYSTEM_USER_ID")
            .expect("SYSTEM_USER_ID must be set in the environment")
            .parse()
            .expect("SYSTEM_USER_ID must be a valid UUID");

        let close_edits_interval_secs: u64 = std::env::var("CLOSE_EDITS_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("CLOSE_EDITS_INTERVAL_SECS must be a valid u64");

        Self {
            vote_application_threshold,
            voting_period_secs,
            destructive_voting_period_secs,
            edit_update_limit,
            vote_promotion_threshold,
            system_user_id,
            close_edits_interval_secs,
        }
    }

    /// Build the service-level policy from the loaded settings.
    pub fn policy(&self) -> ModerationPolicy {
        ModerationPolicy {
            voting: VotingPolicy {
                application_threshold: self.vote_application_threshold,
                voting_period: Duration::seconds(self.voting_period_secs),
                destructive_voting_period: Duration::seconds(self.destructive_voting_period_secs),
            },
            edit_update_limit: self.edit_update_limit,
            vote_promotion_threshold: self.vote_promotion_threshold,
        }
    }
}
