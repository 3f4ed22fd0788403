//! `parley pricing` — List model pricing.

use parley_config::AppConfig;
use std::path::Path;

/// Built-in prices with any `[pricing]` overrides from config applied.
pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_at(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let table = parley_agent::pricing_from_config(&config);
    let models = table.models();

    println!("💰 Model Pricing (per 1M tokens)");
    println!("─────────────────────────────────────────────────────");
    println!("{:<40} {:>10} {:>10}", "Model", "Input", "Output");
    println!("{:<40} {:>10} {:>10}", "─────", "─────", "──────");

    for name in &models {
        if let Some(p) = table.get(name) {
            let marker = if config.pricing.contains_key(name) { " *" } else { "" };
            println!(
                "{:<40} ${:>8.3} ${:>8.3}{marker}",
                name, p.input_per_m, p.output_per_m
            );
        }
    }

    println!();
    println!("  {} models with pricing data", table.len());
    if !config.pricing.is_empty() {
        println!("  * overridden in config");
    }

    Ok(())
}
