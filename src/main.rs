use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

use flowcast::client::{ForecastClient, ForecastSource};
use flowcast::config::Config;
use flowcast::logging::{log, obj, v_str, Domain, Level};
use flowcast::report::{render_model, render_state};
use flowcast::session::{Session, SessionState};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    cfg.validate()?;
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("api_base", v_str(&cfg.api_base)),
            ("timeout_secs", json!(cfg.timeout_secs)),
            ("interval_minutes", json!(cfg.interval_minutes)),
        ]),
    );

    let client = Arc::new(ForecastClient::new(&cfg)?);
    match client.health().await {
        Ok(h) => log(
            Level::Info,
            Domain::System,
            "health",
            obj(&[("status", v_str(&h.status)), ("model_loaded", json!(h.model_loaded))]),
        ),
        Err(err) => log(
            Level::Warn,
            Domain::System,
            "health_failed",
            obj(&[("msg", v_str(&err.to_string()))]),
        ),
    }

    let mut session = Session::new(client);
    if let Some(model) = session.load_model_info().await {
        println!("{}", render_model(model));
    }

    let state = session.run_once().await.clone();
    print!("{}", render_state(&state, session.model(), cfg.interval_minutes));

    if let SessionState::Failed(_) = state {
        std::process::exit(1);
    }
    Ok(())
}
