//! Background refresh and update fan-out
//!
//! Two independent periodic tasks share one shutdown signal:
//! - refresh: re-fetch the snapshot into the cache
//! - update: read the first page and publish it to subscribers
//!
//! A tick that is already running when shutdown arrives completes first.

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use token_core::{PaginatedResponse, ServiceConfig, Token, TokenFilter};

use crate::engine::AggregationEngine;

pub type TokenPage = PaginatedResponse<Token>;

pub struct TokenRefresher {
    config: ServiceConfig,
    updates: broadcast::Sender<TokenPage>,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl TokenRefresher {
    pub fn new(config: ServiceConfig) -> Self {
        let (updates, _) = broadcast::channel(config.update_channel_capacity.max(1));
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            updates,
            shutdown,
            handles: Vec::new(),
        }
    }

    /// Receive every page published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TokenPage> {
        self.updates.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    pub fn start(&mut self, engine: Arc<AggregationEngine>) {
        if self.is_running() {
            warn!("Token refresher already running");
            return;
        }

        self.shutdown.send_replace(false);

        info!(
            "Starting token refresher (refresh every {:?}, updates every {:?})",
            self.config.refresh_interval(),
            self.config.update_interval()
        );

        self.handles.push(self.spawn_refresh(Arc::clone(&engine)));
        self.handles.push(self.spawn_updates(engine));
    }

    fn spawn_refresh(&self, engine: Arc<AggregationEngine>) -> JoinHandle<()> {
        let period = self.config.refresh_interval();
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("Periodic snapshot refresh");
                        engine.refresh_cache().await;
                    }
                    _ = shutdown.changed() => break,
                }
            }

            debug!("Refresh task stopped");
        })
    }

    fn spawn_updates(&self, engine: Arc<AggregationEngine>) -> JoinHandle<()> {
        let period = self.config.update_interval();
        let filter = TokenFilter::new().limit(self.config.update_page_size);
        let updates = self.updates.clone();
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let page = engine.get_tokens(&filter).await;
                        let count = page.data.len();

                        match updates.send(page) {
                            Ok(receivers) => debug!("Published {} tokens to {} subscribers", count, receivers),
                            Err(_) => debug!("No update subscribers"),
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }

            debug!("Update task stopped");
        })
    }

    /// Signal both tasks and wait for them to finish
    pub async fn stop(&mut self) {
        if !self.is_running() {
            return;
        }

        self.shutdown.send_replace(true);

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!("Refresher task ended abnormally: {}", e);
            }
        }

        info!("Token refresher stopped");
    }
}
