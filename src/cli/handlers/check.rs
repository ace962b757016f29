//! `check`: backend reachability and push readiness

use anyhow::{bail, Result};

use super::super::CliContext;
use crate::push::is_secure_origin;
use crate::services::{CheckOutcome, HealthApi};

pub struct CheckHandler<'a> {
    context: &'a CliContext,
}

impl<'a> CheckHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_check(&self) -> Result<()> {
        let config = self.context.config();
        println!("API: {}", config.api.base_url);

        let report = HealthApi::new(self.context.api_client()?)
            .check_connection()
            .await;
        print_outcome("Health check", &report.health);
        print_outcome("VAPID key", &report.vapid_key);

        let origin = config.push.origin_url()?;
        if is_secure_origin(&origin) {
            println!("Push origin {}: secure", origin);
        } else {
            println!("Push origin {}: not secure, browsers will refuse push", origin);
        }

        if !report.is_ok() {
            bail!("API connection failed");
        }
        println!("API connected successfully");
        Ok(())
    }
}

fn print_outcome(label: &str, outcome: &CheckOutcome) {
    match &outcome.result {
        Ok(detail) => println!("{} ({}): OK, {}", label, outcome.path, detail),
        Err(reason) => println!("{} ({}): FAILED, {}", label, outcome.path, reason),
    }
}

super::traits::impl_context_handler!(CheckHandler<'a>);
