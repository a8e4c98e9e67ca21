//
//  quayctl
//  cli/config.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! CLI configuration commands
//!
//! Reads and edits `config.toml`. The token is never printed back.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;
use serde_json::json;

use crate::config::{Config, CONFIG_KEYS};
use crate::output::print_field;

use super::GlobalOptions;

const REDACTED: &str = "********";

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Print the configuration file location
    Path,

    /// Print every configured setting
    #[command(visible_alias = "list")]
    Show,

    /// Print one setting
    Get(KeyArgs),

    /// Change one setting
    Set(SetArgs),

    /// Remove one setting
    Unset(KeyArgs),
}

#[derive(Args, Debug)]
pub struct KeyArgs {
    /// One of: host, token, username, validate_certs, timeout_secs
    pub key: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// One of: host, token, username, validate_certs, timeout_secs
    pub key: String,

    pub value: String,
}

impl ConfigCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            ConfigSubcommand::Path => self.path(global),
            ConfigSubcommand::Show => self.show(global),
            ConfigSubcommand::Get(args) => self.get(args, global),
            ConfigSubcommand::Set(args) => self.set(args, global),
            ConfigSubcommand::Unset(args) => self.unset(args, global),
        }
    }

    fn path(&self, global: &GlobalOptions) -> Result<()> {
        let path = Config::config_path()?;
        if global.json {
            global.output().write_json(&json!({ "path": path }))
        } else {
            println!("{}", path.display());
            Ok(())
        }
    }

    fn show(&self, global: &GlobalOptions) -> Result<()> {
        let config = Config::load()?;
        let output = global.output();

        if global.json {
            let entries: serde_json::Map<String, serde_json::Value> = CONFIG_KEYS
                .iter()
                .map(|key| (key.to_string(), json!(displayed(&config, key))))
                .collect();
            return output.write_json(&entries);
        }

        for key in CONFIG_KEYS {
            let value = displayed(&config, key).unwrap_or_else(|| style("(not set)").dim().to_string());
            print_field(key, &value, output.color_enabled());
        }
        Ok(())
    }

    fn get(&self, args: &KeyArgs, global: &GlobalOptions) -> Result<()> {
        check_key(&args.key)?;
        let config = Config::load()?;
        let value = displayed(&config, &args.key);

        if global.json {
            global
                .output()
                .write_json(&json!({ "key": args.key, "value": value }))
        } else {
            if let Some(v) = value {
                println!("{v}");
            }
            Ok(())
        }
    }

    fn set(&self, args: &SetArgs, global: &GlobalOptions) -> Result<()> {
        let mut config = Config::load()?;
        config.set(&args.key, &args.value)?;
        config.save()?;

        let shown = if args.key == "token" { REDACTED } else { args.value.as_str() };
        if global.json {
            global
                .output()
                .write_json(&json!({ "success": true, "key": args.key, "value": shown }))
        } else {
            global
                .output()
                .write_success(&format!("Set {} = {}", style(&args.key).cyan(), shown));
            Ok(())
        }
    }

    fn unset(&self, args: &KeyArgs, global: &GlobalOptions) -> Result<()> {
        let mut config = Config::load()?;
        config.unset(&args.key)?;
        config.save()?;

        if global.json {
            global
                .output()
                .write_json(&json!({ "success": true, "key": args.key }))
        } else {
            global
                .output()
                .write_success(&format!("Unset {}", style(&args.key).cyan()));
            Ok(())
        }
    }
}

fn check_key(key: &str) -> Result<()> {
    if !CONFIG_KEYS.contains(&key) {
        anyhow::bail!(
            "Unknown config key '{}'. Valid keys: {}",
            key,
            CONFIG_KEYS.join(", ")
        );
    }
    Ok(())
}

/// The value as shown to the user, with the token masked.
fn displayed(config: &Config, key: &str) -> Option<String> {
    let value = config.get(key)?;
    Some(if key == "token" { REDACTED.to_string() } else { value })
}
