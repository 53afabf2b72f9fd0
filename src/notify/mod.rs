// src/notify/mod.rs

//! Terminal deploy notifications.
//!
//! Exactly one [`DeployEvent`] is sent per confirmed deploy run, whether it
//! succeeded or not. Delivery problems are logged and never change the
//! outcome of the run.

pub mod slack;

use std::future::Future;
use std::pin::Pin;

use tracing::{info, warn};

use crate::config::DeployConfig;
use crate::errors::{Result, RolloutError};
use crate::types::Phase;

pub use slack::SlackNotifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    Succeeded {
        app: String,
        host: String,
        release: String,
    },
    Failed {
        app: String,
        host: String,
        phase: Phase,
        error: String,
    },
}

impl DeployEvent {
    pub fn message(&self) -> String {
        match self {
            DeployEvent::Succeeded { app, host, release } => {
                format!("{app} deployed to {host} (release {release}).")
            }
            DeployEvent::Failed {
                app,
                host,
                phase,
                error,
            } => format!("{app} deployment to {host} failed during {phase}: {error}"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeployEvent::Succeeded { .. })
    }
}

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Delivers the terminal event of a run.
pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, event: &'a DeployEvent) -> NotifyFuture<'a>;
}

/// Used when no webhook is configured: the event only reaches the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify<'a>(&'a self, event: &'a DeployEvent) -> NotifyFuture<'a> {
        Box::pin(async move {
            info!(success = event.is_success(), "{}", event.message());
            Ok::<_, RolloutError>(())
        })
    }
}

/// Notifier for a configuration: Slack when a webhook is set, log otherwise.
pub fn notifier_for(config: &DeployConfig) -> Result<Box<dyn Notifier>> {
    match &config.notify.slack_webhook_url {
        Some(url) => Ok(Box::new(SlackNotifier::new(
            url.clone(),
            config.notify.slack_channel.clone(),
        )?)),
        None => Ok(Box::new(LogNotifier)),
    }
}

/// Send `event`, logging instead of failing if delivery does not work.
pub async fn deliver(notifier: &dyn Notifier, event: &DeployEvent) {
    if let Err(e) = notifier.notify(event).await {
        warn!(error = %e, "failed to deliver deploy notification");
    }
}
