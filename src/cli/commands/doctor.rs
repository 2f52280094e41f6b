//! Doctor command - verify configuration before serving.

use crate::cli::Output;
use crate::config::{mask_secret, Settings};
use console::style;
use std::path::{Path, PathBuf};

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&str>) -> anyhow::Result<()> {
    Output::header("vsrelay doctor");
    println!();

    let config_path: PathBuf = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let checks = collect_checks(settings, &config_path);
    for check in &checks {
        check.print();
    }
    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before serving.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! The relay is ready to serve.");
    }

    Ok(())
}

fn collect_checks(settings: &Settings, config_path: &Path) -> Vec<CheckResult> {
    vec![
        check_api_key(settings),
        check_api_base(settings),
        check_vector_store(settings),
        check_timeout(settings),
        check_config_file(config_path),
    ]
}

fn check_api_key(settings: &Settings) -> CheckResult {
    match settings.openai.api_key.as_deref().map(str::trim) {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_secret(key)))
        }
        Some(key) if !key.is_empty() => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        _ => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

fn check_api_base(settings: &Settings) -> CheckResult {
    match url::Url::parse(&settings.openai.api_base) {
        Ok(url) if url.scheme() == "https" => CheckResult::ok("API base", url.as_str()),
        Ok(url) if url.scheme() == "http" => CheckResult::warning(
            "API base",
            url.as_str(),
            "Plain HTTP sends the API key unencrypted",
        ),
        Ok(url) => CheckResult::error(
            "API base",
            &format!("unsupported scheme '{}'", url.scheme()),
            "Use an http(s) URL such as https://api.openai.com/v1",
        ),
        Err(e) => CheckResult::error(
            "API base",
            &format!("invalid URL: {}", e),
            "Set openai.api_base or OPENAI_BASE_URL",
        ),
    }
}

fn check_vector_store(settings: &Settings) -> CheckResult {
    match settings.relay.default_vector_store() {
        Some(id) if id.starts_with("vs_") => {
            let mode = if settings.relay.pin_vector_store {
                "pinned"
            } else {
                "default"
            };
            CheckResult::ok("Vector store", &format!("{} ({})", id, mode))
        }
        Some(id) => CheckResult::warning(
            "Vector store",
            id,
            "Vector store ids usually start with vs_",
        ),
        None if settings.relay.pin_vector_store => CheckResult::error(
            "Vector store",
            "pinned but not set",
            "Set relay.vector_store_id or VECTOR_STORE_ID",
        ),
        None => CheckResult::warning(
            "Vector store",
            "no default; every request must send vector_store_id",
            "Set relay.vector_store_id or VECTOR_STORE_ID",
        ),
    }
}

fn check_timeout(settings: &Settings) -> CheckResult {
    match settings.openai.timeout_secs {
        0 => CheckResult::error(
            "Upstream timeout",
            "0s",
            "Set openai.timeout_secs to a positive value",
        ),
        secs => CheckResult::ok("Upstream timeout", &format!("{}s", secs)),
    }
}

/// Check if the config file in use exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults and environment",
            "Create with: vsrelay config init",
        )
    }
}
