//! Collection parameters and the discovery token, from flags, config or prompts.

use crate::cli::CollectArgs;
use crate::console::Console;
use anyhow::{bail, ensure, Context, Result};
use prowl_core::{AppConfig, CollectionConfig, DiscoveryToken, MAX_YEARS};

const TOKEN_INSTRUCTIONS: [&str; 6] = [
    "1. Sign in at https://www.producthunt.com/",
    "2. Open https://api.producthunt.com/v2/oauth/applications",
    "3. Create an application (any name and redirect URI will do)",
    "4. Copy its 'Developer token', a long string",
    "5. Paste it below without a 'Bearer ' prefix",
    "The token is saved to the configuration file for later runs.",
];

/// Split a comma separated word list, dropping blanks.
pub fn parse_blacklist(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Fill in the collection settings, asking for whatever no flag provided.
pub fn collection_params(
    console: &Console,
    defaults: &CollectionConfig,
    args: &CollectArgs,
) -> Result<CollectionConfig> {
    let mut params = defaults.clone();

    if args.years.is_none() || args.blacklist.is_none() {
        console.header("Collection settings");
    }

    params.years = match args.years {
        Some(years) => years,
        None => console.number("How many years back?", defaults.years)?,
    };
    ensure!(
        (1..=MAX_YEARS).contains(&params.years),
        "years must be between 1 and {MAX_YEARS}"
    );

    params.blacklist = match &args.blacklist {
        Some(words) => parse_blacklist(words),
        None => parse_blacklist(&console.text(
            "Blacklisted words, comma separated",
            &defaults.blacklist.join(", "),
        )?),
    };

    params.max_makers = match args.max_makers {
        Some(max) => max,
        None => console.number("Maximum number of makers", defaults.max_makers)?,
    };

    params.max_products = match args.max_products {
        Some(max) => max,
        None => console.number("Maximum number of products", defaults.max_products)?,
    };
    ensure!(params.max_products >= 1, "max products must be at least 1");

    Ok(params)
}

/// Token from the flag, the config (including `PROWL_TOKEN`), or a prompt.
///
/// A prompted token is written back to the configuration file.
pub fn discovery_token(
    console: &Console,
    config: &AppConfig,
    args: &CollectArgs,
) -> Result<DiscoveryToken> {
    if let Some(token) = &args.token {
        return DiscoveryToken::new(token).context("invalid --token value");
    }

    if !config.discovery.token.trim().is_empty() {
        return DiscoveryToken::new(&config.discovery.token)
            .context("invalid token in configuration");
    }

    if !console.interactive() {
        bail!("no discovery API token; pass --token or set PROWL_TOKEN");
    }

    console.header("Discovery API token");
    console.line("No token is configured. To get one:");
    for step in TOKEN_INSTRUCTIONS {
        console.line(step);
    }

    let token = DiscoveryToken::new(console.secret("Developer token")?)?;
    save_token(&token);
    Ok(token)
}

fn save_token(token: &DiscoveryToken) {
    let result = AppConfig::load().and_then(|mut stored| {
        stored.discovery.token = token.as_str().to_string();
        stored.save()
    });

    match (result, AppConfig::config_path()) {
        (Ok(()), Ok(path)) => tracing::info!("Token saved to {}", path.display()),
        (Ok(()), Err(_)) => tracing::info!("Token saved"),
        (Err(e), _) => tracing::warn!("Could not save the token: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blacklist() {
        assert_eq!(
            parse_blacklist(" AI, crypto ,,nft "),
            vec!["AI".to_string(), "crypto".to_string(), "nft".to_string()]
        );
        assert!(parse_blacklist("").is_empty());
        assert!(parse_blacklist(" , ").is_empty());
    }

    #[test]
    fn test_flags_override_defaults() {
        let console = Console::new(true);
        let args = CollectArgs {
            years: Some(1),
            blacklist: Some("cat, dog".to_string()),
            max_makers: Some(4),
            max_products: Some(50),
            ..CollectArgs::default()
        };

        let params = collection_params(&console, &CollectionConfig::default(), &args).unwrap();

        assert_eq!(params.years, 1);
        assert_eq!(params.blacklist, vec!["cat".to_string(), "dog".to_string()]);
        assert_eq!(params.max_makers, 4);
        assert_eq!(params.max_products, 50);
        assert_eq!(params.max_empty_pages, 10);
    }

    #[test]
    fn test_assume_yes_takes_defaults() {
        let console = Console::new(true);
        let params = collection_params(
            &console,
            &CollectionConfig::default(),
            &CollectArgs::default(),
        )
        .unwrap();

        assert_eq!(params.years, 3);
        assert!(params.blacklist.is_empty());
        assert_eq!(params.max_makers, 10);
        assert_eq!(params.max_products, 5000);
    }

    #[test]
    fn test_zero_years_rejected() {
        let console = Console::new(true);
        let args = CollectArgs {
            years: Some(0),
            ..CollectArgs::default()
        };
        assert!(collection_params(&console, &CollectionConfig::default(), &args).is_err());
    }

    #[test]
    fn test_years_beyond_limit_rejected() {
        let console = Console::new(true);
        let args = CollectArgs {
            years: Some(1_000_000),
            ..CollectArgs::default()
        };
        let err = collection_params(&console, &CollectionConfig::default(), &args).unwrap_err();
        assert!(err.to_string().contains("between 1 and 100"));
    }

    #[test]
    fn test_token_flag_wins_and_strips_bearer() {
        let console = Console::new(true);
        let mut config = AppConfig::default();
        config.discovery.token = "from-config".to_string();
        let args = CollectArgs {
            token: Some("Bearer from-flag".to_string()),
            ..CollectArgs::default()
        };

        let token = discovery_token(&console, &config, &args).unwrap();
        assert_eq!(token.as_str(), "from-flag");
    }

    #[test]
    fn test_missing_token_is_an_error_without_prompts() {
        let console = Console::new(true);
        let result = discovery_token(&console, &AppConfig::default(), &CollectArgs::default());
        assert!(result.is_err());
    }
}
