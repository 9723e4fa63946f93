//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use x_autopost_adapters::x::credentials_valid;

use crate::args::DoctorArgs;
use crate::config::AppConfig;
use crate::wiring::{build_poster, open_stores};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    settings: CheckResult,
    credentials: CheckResult,
    x: CheckResult,
    state: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        settings: CheckResult::error("Not checked"),
        credentials: CheckResult::error("Not checked"),
        x: CheckResult::error("Not checked"),
        state: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.settings = check_settings(config);
        report.credentials = check_credentials(config);
        report.x = check_x(config);
        report.state = check_state(config).await;
    }

    // Determine overall status
    let checks = [
        &report.config,
        &report.settings,
        &report.credentials,
        &report.x,
        &report.state,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_settings(config: &AppConfig) -> CheckResult {
    match config.settings(x_autopost_domain::Credentials::empty()) {
        Ok(settings) => {
            let updates = if settings.update_posting_enabled {
                format!("every {}s at most", settings.update_interval.as_secs())
            } else {
                "disabled".to_string()
            };

            CheckResult::ok(format!(
                "Content type: {}, Updates: {}, Max hashtags: {}",
                settings.tracked_content_type, updates, settings.hashtags.max_hashtags
            ))
            .with_details(serde_json::json!({
                "dry_run": settings.dry_run,
                "update_template": settings.update_template,
                "default_hashtags": settings.hashtags.default_hashtags,
                "use_taxonomy": settings.hashtags.use_taxonomy,
            }))
        }
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

fn check_credentials(config: &AppConfig) -> CheckResult {
    if config.x.backend == "stub" {
        return CheckResult::ok("Stub backend, credentials not used");
    }

    let envs = config.x.credential_envs();
    if let Some((name, _)) = envs.iter().find(|(_, env_var)| env_var.trim().is_empty()) {
        return CheckResult::error(format!("No env var configured for {}", name));
    }

    // Presence only; values are never printed
    let missing: Vec<&str> = envs
        .iter()
        .filter(|(_, env_var)| {
            std::env::var(env_var)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .map(|(_, env_var)| *env_var)
        .collect();

    if !missing.is_empty() {
        return CheckResult::warn(format!("Not set: {}", missing.join(", ")))
            .with_details(serde_json::json!({ "missing": missing }));
    }

    let credentials = config.x.load_credentials();
    if credentials_valid(&credentials, config.x.strict_credentials) {
        CheckResult::ok(format!(
            "All credentials set (strict: {})",
            config.x.strict_credentials
        ))
    } else {
        CheckResult::error("Credentials are set but malformed")
    }
}

fn check_x(config: &AppConfig) -> CheckResult {
    match build_poster(config) {
        Ok(_) if config.x.backend == "stub" => {
            CheckResult::warn("Backend: stub (nothing will be posted)")
        }
        Ok(_) => CheckResult::ok(format!(
            "Backend: {}, API: {}, base_url: {}",
            config.x.backend, config.x.api_version, config.x.base_url
        )),
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

async fn check_state(config: &AppConfig) -> CheckResult {
    let db_path = &config.general.state_db_path;

    match open_stores(config).await {
        Ok(stores) => match stores.state.rate_limit_notice().await {
            Ok(Some(_)) => CheckResult::warn(format!(
                "{} (rate-limit notice pending, see 'x-autopost notice show')",
                db_path.display()
            )),
            Ok(None) => CheckResult::ok(db_path.display().to_string()),
            Err(e) => CheckResult::error(format!("Failed to read state: {}", e)),
        },
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("x-autopost Doctor Report");
    println!("========================");
    println!();

    print_check("Config", &report.config);
    print_check("Settings", &report.settings);
    print_check("Credentials", &report.credentials);
    print_check("X API", &report.x);
    print_check("State", &report.state);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready! Try: x-autopost test-post");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
