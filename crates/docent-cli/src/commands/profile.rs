//! Profile command implementation.

use crate::cli::{ProfileAction, ProfileArgs, ProfileSetArgs};
use crate::config::{Config, Profile};
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the profile command.
pub fn execute_profile(args: ProfileArgs, config: &mut Config, formatter: &Formatter) -> Result<()> {
    match args.action {
        ProfileAction::List => list_profiles(config, formatter),
        ProfileAction::Show => show_active_profile(config, formatter),
        ProfileAction::Switch { name } => switch_profile(config, name, formatter),
        ProfileAction::Set(args) => set_profile(config, args, formatter),
        ProfileAction::Delete { name } => delete_profile(config, name, formatter),
    }
}

/// List all profiles.
fn list_profiles(config: &Config, formatter: &Formatter) -> Result<()> {
    if config.profiles.is_empty() {
        println!("{}", formatter.info("No profiles configured"));
        return Ok(());
    }

    println!("Available profiles:");
    for (name, profile) in &config.profiles {
        if name == &config.active_profile {
            println!("* {}", formatter.success(name));
        } else {
            println!("  {}", name);
        }
        print_profile(profile, "    ");
    }

    Ok(())
}

/// Show the active profile.
fn show_active_profile(config: &Config, formatter: &Formatter) -> Result<()> {
    let profile = config.get_active_profile()?;

    println!("Active profile: {}", formatter.success(&config.active_profile));
    print_profile(profile, "  ");

    Ok(())
}

fn print_profile(profile: &Profile, indent: &str) {
    println!("{}Provider: {:?}", indent, profile.llm.kind);
    println!("{}Model: {}", indent, profile.llm.model);
    if let Some(endpoint) = &profile.llm.endpoint {
        println!("{}Endpoint: {}", indent, endpoint);
    }
    match (&profile.store.fixture, &profile.store.uri) {
        (Some(fixture), _) => println!("{}Fixture: {}", indent, fixture.display()),
        (None, Some(uri)) => println!("{}MongoDB: {} ({})", indent, uri, profile.store.database),
        (None, None) => println!("{}Data source: none", indent),
    }
}

/// Switch to a different profile.
fn switch_profile(config: &mut Config, name: String, formatter: &Formatter) -> Result<()> {
    config.switch_profile(name.clone())?;
    config.save()?;
    println!(
        "{}",
        formatter.success(&format!("Switched to profile '{}'", name))
    );
    Ok(())
}

/// Create or update a profile.
fn set_profile(config: &mut Config, args: ProfileSetArgs, formatter: &Formatter) -> Result<()> {
    let existing = config.profiles.get(&args.name).cloned();
    let action = if existing.is_some() { "Updated" } else { "Created" };

    let profile = apply_settings(existing.unwrap_or_default(), &args);
    profile.llm.validate()?;

    config.set_profile(args.name.clone(), profile);
    config.save()?;

    println!(
        "{}",
        formatter.success(&format!("{} profile '{}'", action, args.name))
    );

    Ok(())
}

/// Overlay the options given on the command line.
fn apply_settings(mut profile: Profile, args: &ProfileSetArgs) -> Profile {
    if let Some(provider) = args.provider {
        profile.llm.kind = provider.into();
    }
    if let Some(model) = &args.model {
        profile.llm.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        profile.llm.endpoint = Some(endpoint.clone());
    }
    if let Some(var) = &args.api_key_env {
        profile.llm.api_key_env = var.clone();
    }
    if let Some(uri) = &args.uri {
        profile.store.uri = Some(uri.clone());
    }
    if let Some(database) = &args.database {
        profile.store.database = database.clone();
    }
    if let Some(fixture) = &args.fixture {
        profile.store.fixture = Some(fixture.clone());
    }
    profile
}

/// Delete a profile.
fn delete_profile(config: &mut Config, name: String, formatter: &Formatter) -> Result<()> {
    if name == config.active_profile {
        return Err(CliError::NotPermitted(
            "Cannot delete the active profile".to_string(),
        ));
    }

    if config.profiles.remove(&name).is_some() {
        config.save()?;
        println!(
            "{}",
            formatter.success(&format!("Deleted profile '{}'", name))
        );
    } else {
        println!(
            "{}",
            formatter.warning(&format!("Profile '{}' does not exist", name))
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ProviderArg;
    use crate::config::OutputFormat;
    use docent_llm::ProviderKind;
    use tempfile::TempDir;

    fn temp_config(dir: &TempDir) -> Config {
        Config::load_from(dir.path().join("config.toml")).unwrap()
    }

    #[test]
    fn test_set_and_switch_profile() {
        let dir = TempDir::new().unwrap();
        let mut config = temp_config(&dir);
        let formatter = Formatter::new(OutputFormat::Table, false);

        let args = ProfileSetArgs {
            name: "local".to_string(),
            provider: Some(ProviderArg::Ollama),
            model: Some("llama3".to_string()),
            fixture: Some("firm.json".into()),
            ..ProfileSetArgs::default()
        };
        set_profile(&mut config, args, &formatter).unwrap();

        let profile = &config.profiles["local"].clone();
        assert_eq!(profile.llm.kind, ProviderKind::Ollama);
        assert_eq!(profile.llm.model, "llama3");

        switch_profile(&mut config, "local".to_string(), &formatter).unwrap();
        let reloaded = temp_config(&dir);
        assert_eq!(reloaded.active_profile, "local");
        assert_eq!(reloaded.profiles["local"], *profile);
    }

    #[test]
    fn test_set_keeps_unspecified_fields() {
        let mut profile = Profile::default();
        profile.store.uri = Some("mongodb://db:27017".to_string());

        let args = ProfileSetArgs {
            name: "default".to_string(),
            model: Some("gpt-4o".to_string()),
            ..ProfileSetArgs::default()
        };
        let updated = apply_settings(profile, &args);
        assert_eq!(updated.llm.model, "gpt-4o");
        assert_eq!(updated.store.uri.as_deref(), Some("mongodb://db:27017"));
        assert_eq!(updated.store.database, "RAG");
    }

    #[test]
    fn test_set_rejects_invalid_provider_settings() {
        let dir = TempDir::new().unwrap();
        let mut config = temp_config(&dir);
        let formatter = Formatter::new(OutputFormat::Table, false);

        let args = ProfileSetArgs {
            name: "broken".to_string(),
            model: Some(String::new()),
            ..ProfileSetArgs::default()
        };
        assert!(set_profile(&mut config, args, &formatter).is_err());
        assert!(!config.profiles.contains_key("broken"));
    }

    #[test]
    fn test_delete_active_profile() {
        let mut config = Config::default();
        let formatter = Formatter::new(OutputFormat::Table, false);

        let result = delete_profile(&mut config, "default".to_string(), &formatter);
        assert!(matches!(result, Err(CliError::NotPermitted(_))));
    }
}
