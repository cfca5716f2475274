use anyhow::Result;

use crate::core::config::AppConfig;

pub fn init() -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    let path = AppConfig::default().save()?;
    println!("Generated config at {}", path.display());
    println!("  Fill in the [auth] table, or set MBU_TENANT_ID, MBU_CLIENT_ID and MBU_CLIENT_SECRET.");
    Ok(())
}

pub fn check() -> Result<()> {
    let path = AppConfig::config_path();
    if !path.exists() {
        println!("No config file at {} (using defaults)", path.display());
    }

    let config = AppConfig::load()?;
    let issues = config.validate();
    if issues.is_empty() {
        println!("Config OK");
        let credentials = [
            ("tenant_id", &config.auth.tenant_id),
            ("client_id", &config.auth.client_id),
            ("client_secret", &config.auth.client_secret),
        ];
        for (name, value) in credentials {
            if value.is_none() {
                println!("  note: {} is not set", name);
            }
        }
        Ok(())
    } else {
        for issue in &issues {
            eprintln!("  {}", issue);
        }
        anyhow::bail!("{} config issue(s) found", issues.len())
    }
}

pub fn path() -> Result<()> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}
