//
//  quayctl
//  cli/api.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Direct API access command
//!
//! Sends one request to any `/api/v1/` endpoint through the same session,
//! classification and check mode as the other commands. Useful for
//! endpoints no command covers yet, or for debugging.
//!
//! ## Examples
//!
//! ```bash
//! # Read an organization
//! quayctl api GET organization/acme
//!
//! # Create a repository
//! quayctl api POST repository -f namespace=acme -f repository=app \
//!     -f visibility=private -f description=""
//!
//! # Treat a 404 as a normal answer
//! quayctl api GET repository/acme/missing --ok-status 404
//! ```

use std::fs;

use anyhow::{bail, Context, Result};
use clap::Args;
use reqwest::Method;
use serde_json::{Map, Value};

use crate::api::common::{ApiError, Classified, StatusSet};
use crate::api::endpoint::Endpoint;

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct ApiCommand {
    /// HTTP method: GET, POST, PUT or DELETE
    pub method: String,

    /// Path relative to /api/v1/, optionally with a query string
    pub path: String,

    /// Body field as key=value; values are parsed as JSON when possible (repeatable)
    #[arg(long, short = 'f', action = clap::ArgAction::Append)]
    pub field: Vec<String>,

    /// Read the JSON body from a file ("-" for stdin)
    #[arg(long, conflicts_with = "field")]
    pub input: Option<String>,

    /// Extra status codes to accept as success, comma separated
    #[arg(long, value_delimiter = ',')]
    pub ok_status: Vec<u16>,
}

impl ApiCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let method = parse_method(&self.method)?;
        let endpoint = parse_path(&self.path);
        let body = self.build_body()?;

        if global.check && method != Method::GET {
            global.output().write_info(&format!(
                "check mode: skipping {} {}",
                method,
                endpoint.template()
            ));
            return Ok(());
        }

        let mut engine = global.connect().await?;
        let acceptable = StatusSet::new(self.ok_status.iter().copied());
        let result = engine
            .client()
            .request(method, &endpoint, body.as_ref(), &acceptable)
            .await;
        let (url, classified) = engine.finish(result).await?;

        let response = match classified {
            Classified::Success(response) => response,
            Classified::ClientError(response) => {
                return Err(
                    ApiError::client_request(format!("Request to {} failed", url.path()), &response)
                        .into(),
                );
            }
        };

        match response.json() {
            Ok(Value::Null) => Ok(()),
            Ok(value) => global.output().write_value(&value),
            Err(_) => {
                global.output().write_info(&response.text());
                Ok(())
            }
        }
    }

    fn build_body(&self) -> Result<Option<Value>> {
        if let Some(input) = &self.input {
            let content = if input == "-" {
                let mut buffer = String::new();
                std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)?;
                buffer
            } else {
                fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))?
            };
            let value: Value = serde_json::from_str(&content)
                .with_context(|| format!("{input} is not valid JSON"))?;
            return Ok(Some(value));
        }

        if self.field.is_empty() {
            return Ok(None);
        }

        let mut body = Map::new();
        for field in &self.field {
            let (key, value) = parse_field(field)?;
            body.insert(key, value);
        }
        Ok(Some(Value::Object(body)))
    }
}

fn parse_method(method: &str) -> Result<Method> {
    match method.to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        _ => bail!("Unsupported HTTP method: {}", method),
    }
}

/// Splits `path?query` into an endpoint with query parameters.
fn parse_path(path: &str) -> Endpoint {
    let (path, query) = path.split_once('?').unwrap_or((path, ""));
    url::form_urlencoded::parse(query.as_bytes())
        .fold(Endpoint::new(path), |endpoint, (key, value)| {
            endpoint.query(key.into_owned(), value)
        })
}

fn parse_field(field: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = field.split_once('=') else {
        bail!("Invalid field format: {}. Expected key=value", field);
    };
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
