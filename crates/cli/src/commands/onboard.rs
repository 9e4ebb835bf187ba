//! `mathwise onboard` — First-time setup.

use mathwise_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🧮 Mathwise — First-Time Setup");
    println!("==============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    println!("\n📝 Next steps:");
    println!("   1. Put your key in a .env file: GROQ_API_KEY=gsk_...");
    println!("   2. Run: mathwise chat     (terminal)");
    println!("      or:  mathwise serve    (browser)");
    println!("   3. Run `mathwise doctor` if anything looks wrong.\n");

    Ok(())
}
