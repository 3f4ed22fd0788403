//! `parley status` — Show the effective configuration.

use parley_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: &Path, check: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_at(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    let base_url = config
        .api_url
        .clone()
        .or_else(|| parley_providers::default_base_url(&config.provider))
        .unwrap_or_else(|| "(unset — api_url required)".into());
    let budget = if config.history_token_budget == 0 {
        "unlimited".to_string()
    } else {
        format!("~{} tokens", config.history_token_budget)
    };

    println!("💬 Parley Status");
    println!("================");
    println!("  Config file:  {}", config_path.display());
    println!("  Provider:     {}", config.provider);
    println!("  Endpoint:     {base_url}");
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Model:        {}", config.model_name);
    println!("  Temperature:  {}", config.temperature);
    println!("  Max tokens:   {}", config.max_tokens);
    println!("  Timeout:      {}s", config.request_timeout_secs);
    println!("  History:      last {} exchanges, {budget}", config.history_window_k);
    println!(
        "  Log:          {} ({})",
        config.log.backend,
        config.log.resolved_path().display()
    );

    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `parley onboard` first");
    }

    if check {
        let provider = parley_providers::build_from_config(&config)?;
        match provider.health_check().await {
            Ok(true) => println!("  ✅ {} reachable", provider.name()),
            Ok(false) => println!("  ❌ {} answered with an error status", provider.name()),
            Err(e) => println!("  ❌ {} unreachable: {e}", provider.name()),
        }
    }

    Ok(())
}
