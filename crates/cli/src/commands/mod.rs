pub mod chat;
pub mod doctor;
pub mod onboard;
pub mod serve;

use mathwise_config::AppConfig;

/// Stop with a visible banner when the provider needs a key and none is set.
pub(crate) fn require_api_key(config: &AppConfig) -> anyhow::Result<()> {
    if let Err(e) = config.check_api_key() {
        eprintln!();
        eprintln!("  ERROR: {e}");
        eprintln!();
        eprintln!("  Add it to a .env file in this directory:");
        eprintln!("    GROQ_API_KEY=gsk_...");
        eprintln!();
        eprintln!("  Or set it in your shell, or as api_key in:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        eprintln!("  Get a Groq key at: https://console.groq.com/keys");
        eprintln!();
        return Err(e.into());
    }
    Ok(())
}
