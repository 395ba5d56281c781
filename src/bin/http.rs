#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::net::SocketAddr;

    use anyhow::Context;
    use resource_payroll::{PayrollCalculator, PayrollConfig, http_api};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("resource_payroll=info")),
        )
        .init();

    let addr: SocketAddr = std::env::var("PAYROLL_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()
        .context("PAYROLL_HTTP_ADDR is not a socket address")?;

    let config = match std::env::var("PAYROLL_CONFIG") {
        Ok(path) => PayrollConfig::load(&path)
            .with_context(|| format!("failed to load payroll config from {path}"))?,
        Err(_) => {
            tracing::warn!("PAYROLL_CONFIG not set; using default slabs and an empty rate table");
            PayrollConfig::default()
        }
    };

    let state = http_api::AppState::new(PayrollCalculator::new(config));
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
