mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod tracing;

use ::tracing::info;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::{self, TraceLayer};
use workload_mutator::ReviewContext;

use crate::api::{
    handlers::{mutate_handler, readiness_handler},
    state::ApiServerState,
};
use crate::config::{Config, TlsConfig};

pub struct WorkloadWebhook {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<TlsConfig>,
}

impl WorkloadWebhook {
    /// Build the server out of the configuration. The review context is created
    /// here, once, and shared by every request.
    pub fn new_from_config(config: Config) -> Result<Self> {
        let review_context = ReviewContext::new(config.mutation_settings, config.failure_policy);
        info!(
            node_selector_key = review_context.settings().node_selector_key.as_str(),
            node_selector_value = review_context.settings().node_selector_value.as_str(),
            toleration_key = review_context.settings().toleration_key.as_str(),
            toleration_value = review_context.settings().toleration_value.as_str(),
            strategy = %review_context.settings().strategy,
            failure_policy = %review_context.failure_policy(),
            "mutation settings loaded"
        );

        let state = Arc::new(ApiServerState { review_context });

        let router = Router::new()
            .route("/mutate", post(mutate_handler))
            .route("/readiness", get(readiness_handler))
            .with_state(state)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().level(::tracing::Level::INFO))
                    .on_response(trace::DefaultOnResponse::new().level(::tracing::Level::INFO)),
            );

        Ok(Self {
            router,
            addr: config.addr,
            tls_config: config.tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        match self.tls_config {
            Some(tls_config) => {
                let rustls_config =
                    certs::create_tls_config_and_watch_certificate_changes(tls_config).await?;
                info!(address = self.addr.to_string().as_str(), "started HTTPS server");
                axum_server::bind_rustls(self.addr, rustls_config)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = self.addr.to_string().as_str(), "started HTTP server");
                axum_server::bind(self.addr)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        Ok(())
    }
}
