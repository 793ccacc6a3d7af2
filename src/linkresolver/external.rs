//! External resolver contract and out-of-process implementation (spec §4.5, §6, §9).
//!
//! The protocol runs one newline-terminated JSON message at a time over a child process's
//! stdin/stdout. Grounded on `noet-core::watch`'s use of `tokio::process` for a long-lived child
//! collaborator the compiler talks to over a pipe, adapted from file-watch notifications to a
//! request/response protocol.

use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::{Child, ChildStdin, ChildStdout, Command},
};

use crate::error::{CatalogError, Result};

#[derive(Debug, Deserialize)]
struct Startup {
    #[serde(rename = "bundleIdentifier")]
    bundle_identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedInformation {
    pub kind: String,
    pub url: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub language: String,
    #[serde(default)]
    pub available_languages: Vec<String>,
}

/// Contract every resolver (in-process or out-of-process) implements (spec §4.5, §9
/// "protocol-based polymorphism over consumers and resolvers").
pub trait ExternalResolver: Send {
    fn resolve_topic(&mut self, url: &str) -> Result<ResolvedInformation>;
    fn resolve_symbol(&mut self, precise_id: &str) -> Result<ResolvedInformation>;
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Request {
    Topic { topic: String },
    Symbol { symbol: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Response {
    Error { #[serde(rename = "errorMessage")] error_message: String },
    Resolved { #[serde(rename = "resolvedInformation")] resolved_information: ResolvedInformation },
}

/// An external resolver that is a child process speaking the out-of-process protocol (spec §6).
pub struct OutOfProcessResolver {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    bundle_identifier: String,
}

impl OutOfProcessResolver {
    /// Spawn `command` and perform the startup handshake (spec §6: "resolver writes `{
    /// bundleIdentifier }`" as its very first message, exactly once; sending it again is an
    /// error"). `expected_bundle_identifier` is the catalog id this resolver was registered
    /// under; the resolver's own startup line must match it.
    pub async fn spawn(command: &str, args: &[String], expected_bundle_identifier: impl Into<String>) -> Result<Self> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| CatalogError::ExternalResolver(format!("failed to spawn resolver: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CatalogError::ExternalResolver("resolver stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CatalogError::ExternalResolver("resolver stdout unavailable".into()))?;

        let mut resolver = OutOfProcessResolver {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            bundle_identifier: expected_bundle_identifier.into(),
        };
        resolver.handshake().await?;
        Ok(resolver)
    }

    /// Read and validate the resolver's startup line (spec §6, §7 "external resolver
    /// misbehavior ... is fatal"). The resolver, not the driver, speaks first.
    async fn handshake(&mut self) -> Result<()> {
        let mut line = String::new();
        let bytes = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| CatalogError::ExternalResolver(format!("failed to read startup line: {e}")))?;
        if bytes == 0 {
            return Err(CatalogError::ExternalResolver(
                "resolver exited before sending its startup bundle identifier".into(),
            ));
        }
        let startup: Startup = serde_json::from_str(line.trim())
            .map_err(|e| CatalogError::ExternalResolver(format!("invalid startup message: {e}")))?;
        if startup.bundle_identifier != self.bundle_identifier {
            return Err(CatalogError::ExternalResolver(format!(
                "resolver startup bundle identifier '{}' does not match expected '{}'",
                startup.bundle_identifier, self.bundle_identifier
            )));
        }
        Ok(())
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_response(&mut self) -> Result<ResolvedInformation> {
        let mut line = String::new();
        let bytes = self.stdout.read_line(&mut line).await?;
        if bytes == 0 {
            return Err(CatalogError::ExternalResolver("resolver process exited".into()));
        }
        let trimmed = line.trim();
        if serde_json::from_str::<Startup>(trimmed).is_ok() {
            return Err(CatalogError::ExternalResolver(
                "resolver re-sent its startup bundle identifier after the handshake".into(),
            ));
        }
        let response: Response = serde_json::from_str(trimmed)
            .map_err(|e| CatalogError::ExternalResolver(format!("invalid response: {e}")))?;
        match response {
            Response::Error { error_message } => Err(CatalogError::ExternalResolver(error_message)),
            Response::Resolved { resolved_information } => Ok(resolved_information),
        }
    }

    async fn request(&mut self, request: Request) -> Result<ResolvedInformation> {
        let line = serde_json::to_string(&request)?;
        self.write_line(&line).await?;
        self.read_response().await
    }
}

/// Async adapter satisfying the synchronous [`ExternalResolver`] contract. External resolvers are
/// invoked serially (spec §5: "their channel ... is not full-duplex"), so blocking the resolving
/// thread on the resolver's own future is acceptable here and mirrors how the driver already
/// treats external resolution as a single-writer operation.
impl ExternalResolver for OutOfProcessResolver {
    fn resolve_topic(&mut self, url: &str) -> Result<ResolvedInformation> {
        let request = Request::Topic { topic: url.to_string() };
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(self.request(request)))
    }

    fn resolve_symbol(&mut self, precise_id: &str) -> Result<ResolvedInformation> {
        let request = Request::Symbol { symbol: precise_id.to_string() };
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(self.request(request)))
    }
}

impl Drop for OutOfProcessResolver {
    /// spec §5: "the out-of-process resolver is terminated on drop."
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_information_round_trips_through_json() {
        let info = ResolvedInformation {
            kind: "symbol".into(),
            url: "doc://Other/documentation/OtherLib/Thing".into(),
            title: "Thing".into(),
            abstract_text: Some("A thing.".into()),
            language: "swift".into(),
            available_languages: vec!["swift".into()],
        };
        let json = serde_json::to_string(&info).expect("serialize");
        let back: ResolvedInformation = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(info, back);
    }

    #[test]
    fn error_response_parses_as_error_variant() {
        let response: Response = serde_json::from_str(r#"{"errorMessage": "not found"}"#).expect("parse");
        assert!(matches!(response, Response::Error { .. }));
    }
}
