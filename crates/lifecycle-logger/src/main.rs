#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{collections::HashMap, env, io, path::PathBuf, process::ExitCode};

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use lifecycle_logger::{
    config::{self, ENV_PREFIX},
    lifecycle::{
        audit::{AuditRecord, RequestInfo},
        LifeCycleToken,
    },
    logger::Formatter,
    pipeline::Pipeline,
};

fn main() -> ExitCode {
    let config_dir = env::var(format!("{ENV_PREFIX}CONFIG_DIR"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from);
    let config = config::get_config(&config_dir);

    let filter = EnvFilter::builder()
        .with_default_directive(config.log_level.as_level_filter().into())
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .event_format(Formatter)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {e}");
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let token = LifeCycleToken::from_argv(env::args().skip(1));
    info!(
        token = %token,
        parent = token.parent().map(LifeCycleToken::as_str),
        protocol = %config.transport_protocol,
        "Lifecycle logger started"
    );

    let audit = config.lifecycle_token_dir.as_deref().map(|dir| {
        let environment = env::vars().collect::<HashMap<_, _>>();
        AuditRecord::create(&token, dir, &RequestInfo::from_carrier(&environment))
    });

    let pipeline = Pipeline::from_config(&config, token);
    let result = pipeline.run(io::stdin().lock(), io::stdout().lock());

    if let Some(audit) = audit {
        audit.remove();
    }

    match result {
        Ok(stats) => {
            debug!(?stats, "Lifecycle logger finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to process input: {e}");
            ExitCode::FAILURE
        }
    }
}
