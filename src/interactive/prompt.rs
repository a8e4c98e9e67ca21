//
//  quayctl
//  interactive/prompt.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Interactive Prompts
//!
//! Wraps `dialoguer` for the few places where `quayctl` asks the user
//! something, currently only the password for an interactive sign-in.
//!
//! # Example
//!
//! ```no_run
//! use quayctl::interactive::{can_prompt, prompt_password};
//!
//! if can_prompt() {
//!     let password = prompt_password("Password for admin").unwrap();
//! }
//! ```

use anyhow::Result;
use console::Term;
use dialoguer::Password;

/// Whether a prompt can be shown: stderr must be a terminal.
pub fn can_prompt() -> bool {
    Term::stderr().is_term()
}

/// Reads a password without echoing it.
///
/// # Errors
///
/// Fails if the terminal interaction fails (e.g. stdin closed).
pub fn prompt_password(message: &str) -> Result<String> {
    let password = Password::new().with_prompt(message).interact()?;
    Ok(password)
}
