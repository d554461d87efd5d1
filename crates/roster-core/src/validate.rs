//! Input validation for person payloads.
//!
//! Validation runs before any store access. All violations are collected,
//! not just the first.

use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::person::PersonInput;

/// Local part `@` a dotted domain or a bracketed IPv4 address.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^([a-zA-Z0-9_\-\.]+)@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.)|(([a-zA-Z0-9\-]+\.)+))([a-zA-Z]{2,4}|[0-9]{1,3})(\]?)$",
  )
  .expect("valid email regex")
});

pub fn is_valid_email(email: &str) -> bool { EMAIL_RE.is_match(email) }

// ─── Violations ──────────────────────────────────────────────────────────────

/// One rule a payload broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
  EmptyName,
  MalformedEmail,
  ZeroId,
}

impl Violation {
  pub fn message(self) -> &'static str {
    match self {
      Self::EmptyName => "Name cannot be null or Empty",
      Self::MalformedEmail => "Wrong format Email",
      Self::ZeroId => "Id cannot be zero",
    }
  }
}

/// A non-empty set of violations. Displays as the messages joined by `,`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
  pub fn iter(&self) -> impl Iterator<Item = Violation> + '_ { self.0.iter().copied() }

  pub fn contains(&self, v: Violation) -> bool { self.0.contains(&v) }
}

impl fmt::Display for Violations {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let messages: Vec<&str> = self.iter().map(Violation::message).collect();
    f.write_str(&messages.join(","))
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

fn collect(violations: Vec<Violation>) -> Result<(), Violations> {
  if violations.is_empty() { Ok(()) } else { Err(Violations(violations)) }
}

fn field_violations(input: &PersonInput) -> Vec<Violation> {
  let mut out = Vec::new();
  if input.name.is_empty() {
    out.push(Violation::EmptyName);
  }
  if let Some(email) = input.email.as_deref()
    && !email.is_empty()
    && !is_valid_email(email)
  {
    out.push(Violation::MalformedEmail);
  }
  out
}

/// Rules for a create payload. `id` is ignored.
pub fn validate_new(input: &PersonInput) -> Result<(), Violations> {
  collect(field_violations(input))
}

/// Rules for an update payload: the create rules plus a non-zero `id`.
pub fn validate_update(input: &PersonInput) -> Result<(), Violations> {
  let mut violations = field_violations(input);
  if input.id == 0 {
    violations.push(Violation::ZeroId);
  }
  collect(violations)
}
