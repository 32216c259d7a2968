use clap::builder::PossibleValue;
use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("WORKLOAD_WEBHOOK_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("WORKLOAD_WEBHOOK_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("WORKLOAD_WEBHOOK_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("WORKLOAD_WEBHOOK_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("WORKLOAD_WEBHOOK_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("WORKLOAD_WEBHOOK_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("settings")
            .long("settings")
            .value_name("SETTINGS_FILE")
            .env("WORKLOAD_WEBHOOK_SETTINGS")
            .help("YAML file holding the mutation settings"),
        Arg::new("node-selector-key")
            .long("node-selector-key")
            .value_name("KEY")
            .env("WORKLOAD_WEBHOOK_NODE_SELECTOR_KEY")
            .help("Node label key the Deployments are pinned to [default: workload]"),
        Arg::new("node-selector-value")
            .long("node-selector-value")
            .value_name("VALUE")
            .env("WORKLOAD_WEBHOOK_NODE_SELECTOR_VALUE")
            .help("Node label value the Deployments are pinned to [default: true]"),
        Arg::new("toleration-key")
            .long("toleration-key")
            .value_name("KEY")
            .env("WORKLOAD_WEBHOOK_TOLERATION_KEY")
            .help("Key of the taint carried by the workload nodes [default: workload]"),
        Arg::new("toleration-value")
            .long("toleration-value")
            .value_name("VALUE")
            .env("WORKLOAD_WEBHOOK_TOLERATION_VALUE")
            .help("Value of the taint carried by the workload nodes [default: true]"),
        Arg::new("patch-strategy")
            .long("patch-strategy")
            .value_name("STRATEGY")
            .env("WORKLOAD_WEBHOOK_PATCH_STRATEGY")
            .value_parser([
                PossibleValue::new("overwrite"),
                PossibleValue::new("merge"),
            ])
            .help("Overwrite the node selector and tolerations, or merge into the existing ones [default: overwrite]"),
        Arg::new("failure-policy")
            .long("failure-policy")
            .value_name("POLICY")
            .env("WORKLOAD_WEBHOOK_FAILURE_POLICY")
            .default_value("deny")
            .value_parser([PossibleValue::new("deny"), PossibleValue::new("allow")])
            .help("Answer given to reviews that cannot be processed"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
