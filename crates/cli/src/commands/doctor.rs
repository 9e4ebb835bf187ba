//! `mathwise doctor` — Diagnose configuration and provider health.

use mathwise_agent::ReactAgent;
use mathwise_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    println!("🩺 Mathwise Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `mathwise onboard` to create one)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid (provider: {}, model: {})", config.provider, config.model);
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue found. Fix the config and re-run.");
            return Ok(());
        }
    };

    match config.check_api_key() {
        Ok(()) if config.needs_api_key() => println!("  ✅ API key configured"),
        Ok(()) => println!("  ✅ Local provider, no API key needed"),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    if issues == 0 {
        match ReactAgent::from_config(&config) {
            Ok(agent) => {
                println!("  ✅ Tools ready: {}", agent.tools().names().join(", "));
            }
            Err(e) => {
                println!("  ❌ Agent could not be built: {e}");
                issues += 1;
            }
        }

        match mathwise_providers::router::build_from_config(&config) {
            Ok(provider) => match provider.health_check().await {
                Ok(true) => {
                    println!("  ✅ Provider '{}' reachable", provider.name());
                    match provider.list_models().await {
                        Ok(models) if models.iter().any(|m| m == &config.model) => {
                            println!("  ✅ Model '{}' available", config.model);
                        }
                        Ok(models) if models.is_empty() => {
                            println!("  ⚠️  Provider did not list its models, skipping model check");
                        }
                        Ok(_) => {
                            println!("  ❌ Model '{}' not offered by '{}'", config.model, provider.name());
                            issues += 1;
                        }
                        Err(e) => println!("  ⚠️  Could not list models: {e}"),
                    }
                }
                Ok(false) => {
                    println!("  ⚠️  Provider '{}' answered but reported unhealthy", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ Provider not configured: {e}");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
