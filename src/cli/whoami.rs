//
//  quayctl
//  cli/whoami.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Identity check
//!
//! Signs in with the configured credentials and prints the account the
//! registry sees, which makes it a quick way to test a token or password.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct WhoamiCommand {}

impl WhoamiCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let mut engine = global.connect().await?;
        let result = engine.who_am_i().await;
        let username = engine.finish(result).await?;

        let output = global.output();
        if global.json {
            return output.write_json(&json!({ "username": username }));
        }
        match username {
            Some(name) => output.write_info(&name),
            None => output.write_warning("Not signed in; requests are anonymous"),
        }
        Ok(())
    }
}
