//! Email addressing and content
//!
//! - Address validation (non-empty, exactly one `@`, non-empty local and domain parts)
//! - [`RecipientList`], an immutable recipient list edited through [`RecipientCommand`]s
//! - Subject and body templating

use crate::error::{Result, ValidationError};
use crate::types::ReportKind;

/// Check one address against the accepted shape
///
/// Leading and trailing whitespace is ignored. Anything beyond this structural
/// check is left to the mail server.
pub fn is_valid_address(address: &str) -> bool {
    let address = address.trim();
    if address.is_empty() || address.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = address.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

/// Return every invalid address, in input order
pub fn invalid_addresses<'a>(addresses: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    addresses
        .into_iter()
        .filter(|a| !is_valid_address(a))
        .cloned()
        .collect()
}

/// Validate To and CC lists together
///
/// Fails fast for the whole request: every offending address from both
/// lists is reported at once. An empty To list is a missing required field.
pub fn validate_recipients(to: &[String], cc: &[String]) -> Result<()> {
    if to.is_empty() {
        return Err(ValidationError::missing("to").into());
    }
    let offending = invalid_addresses(to.iter().chain(cc.iter()));
    if !offending.is_empty() {
        return Err(ValidationError::InvalidAddresses {
            addresses: offending,
        }
        .into());
    }
    Ok(())
}

/// Trim addresses and drop blanks and case-insensitive duplicates
pub fn normalize_addresses(addresses: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    addresses
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .filter(|a| seen.insert(a.to_lowercase()))
        .collect()
}

/// Command applied to a recipient list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecipientCommand {
    /// Add an address (ignored if already present)
    Add(String),
    /// Remove an address
    Remove(String),
}

/// Immutable list of recipient addresses
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipientList {
    addresses: Vec<String>,
}

impl RecipientList {
    /// Build from raw addresses, normalizing them
    pub fn new(addresses: &[String]) -> Self {
        Self {
            addresses: normalize_addresses(addresses),
        }
    }

    /// Apply one command, returning the new list
    pub fn apply(&self, command: RecipientCommand) -> Self {
        let mut addresses = self.addresses.clone();
        match command {
            RecipientCommand::Add(address) => {
                let address = address.trim().to_string();
                if !address.is_empty()
                    && !addresses.iter().any(|a| a.eq_ignore_ascii_case(&address))
                {
                    addresses.push(address);
                }
            }
            RecipientCommand::Remove(address) => {
                let address = address.trim();
                addresses.retain(|a| !a.eq_ignore_ascii_case(address));
            }
        }
        Self { addresses }
    }

    /// Addresses in insertion order
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Addresses that fail validation
    pub fn invalid(&self) -> Vec<String> {
        invalid_addresses(self.addresses.iter())
    }

    /// Consume into the address vector
    pub fn into_vec(self) -> Vec<String> {
        self.addresses
    }
}

/// Values substituted into subject and body templates
#[derive(Clone, Copy, Debug)]
pub struct TemplateContext<'a> {
    /// Student display name
    pub student_name: &'a str,
    /// Academic term
    pub term: &'a str,
    /// Kind of document
    pub report_kind: ReportKind,
}

/// Substitute `{student_name}`, `{term}`, `{report_kind}` and `{report_title}`
///
/// Single pass over the template: substituted values are never rescanned, and
/// unknown placeholders are kept as written.
pub fn render_template(template: &str, ctx: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            rest = tail;
            break;
        };
        let value = match &tail[1..close] {
            "student_name" => Some(ctx.student_name),
            "term" => Some(ctx.term),
            "report_kind" => Some(ctx.report_kind.label()),
            "report_title" => Some(ctx.report_kind.title()),
            _ => None,
        };
        match value {
            Some(value) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Final body: rendered fixed template followed by the optional addendum
pub fn compose_body(template: &str, ctx: &TemplateContext<'_>, addendum: Option<&str>) -> String {
    let mut body = render_template(template, ctx);
    if let Some(extra) = addendum.map(str::trim).filter(|s| !s.is_empty()) {
        body.push_str("\n\n");
        body.push_str(extra);
    }
    body
}

/// Subject: the override when present and non-blank, otherwise the default template
///
/// Overrides are rendered too, so a shared bulk subject may use placeholders.
pub fn compose_subject(
    default_template: &str,
    override_subject: Option<&str>,
    ctx: &TemplateContext<'_>,
) -> String {
    let template = override_subject
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default_template);
    render_template(template, ctx)
}
