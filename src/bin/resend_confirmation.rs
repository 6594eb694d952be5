//! Re-sends the signup confirmation email for one account.
//!
//! Usage: cargo run --bin resend_confirmation -- <email>

use better_days_closet::infra::config::PlatformSettings;
use better_days_closet::infra::platform::PlatformClient;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!(
        "Usage: cargo run --bin resend_confirmation -- <email>\n\
         \n\
         Requires env vars:\n\
           SUPABASE_URL, SUPABASE_ANON_KEY, SUPABASE_SERVICE_ROLE_KEY\n"
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage();
        return ExitCode::SUCCESS;
    }

    let email = match args.first().map(|a| a.trim()) {
        Some(email) if is_plausible_email(email) => email.to_string(),
        Some(other) => {
            error!("'{}' does not look like an email address", other);
            return ExitCode::FAILURE;
        }
        None => {
            usage();
            return ExitCode::FAILURE;
        }
    };

    match run(&email).await {
        Ok(()) => {
            info!("Confirmation email re-sent to {}", email);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to resend confirmation to {}: {:#}", email, e);
            ExitCode::FAILURE
        }
    }
}

async fn run(email: &str) -> anyhow::Result<()> {
    let platform = PlatformClient::new(PlatformSettings::from_env()?)?;
    platform.resend_signup_confirmation(email).await?;
    Ok(())
}

fn is_plausible_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
