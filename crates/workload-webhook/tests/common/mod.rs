use axum::Router;
use std::net::SocketAddr;
use workload_mutator::settings::{FailurePolicy, MutationSettings};
use workload_webhook::{config::Config, WorkloadWebhook};

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        tls_config: None,
        mutation_settings: MutationSettings::default(),
        failure_policy: FailurePolicy::Deny,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) fn app(config: Config) -> Router {
    let server = WorkloadWebhook::new_from_config(config).unwrap();

    server.router()
}
