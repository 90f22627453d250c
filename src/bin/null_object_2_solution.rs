// Null Object 2/4: The Solution
// The client checks for an absent user before touching the record and
// prints nothing for an unknown user. Correct, but every call site that
// reads a record has to repeat the same check.

use colored::Colorize;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const REGISTRY_FIXTURE: &str = include_str!("../../fixtures/tax_registry.toml");

#[derive(Error, Debug)]
enum DemoError {
    #[error("Failed to parse tax registry: {0}")]
    Fixture(#[from] toml::de::Error),

    #[error("User #{0} appears more than once in the tax registry")]
    DuplicateUser(i64),

    #[error("Failed to write tax report: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// Tax records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct UserTaxes {
    account: String,
    income_tax: i64,
    property_tax: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Taxes<'a> {
    account: &'a str,
    income_tax: i64,
    property_tax: i64,
}

impl UserTaxes {
    fn new(account: impl Into<String>, income_tax: i64, property_tax: i64) -> Self {
        Self {
            account: account.into(),
            income_tax,
            property_tax,
        }
    }

    fn user_taxes(&self) -> Taxes<'_> {
        Taxes {
            account: &self.account,
            income_tax: self.income_tax,
            property_tax: self.property_tax,
        }
    }
}

impl fmt::Display for Taxes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Taxes for {}.", self.account)?;
        writeln!(
            f,
            "IncomeTax: {} RUB, PropertyTax: {} RUB",
            self.income_tax, self.property_tax
        )
    }
}

// ============================================================================
// Repository
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFixture {
    report_ids: Vec<i64>,
    #[serde(rename = "user")]
    users: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserEntry {
    id: i64,
    account: String,
    income_tax: i64,
    property_tax: i64,
}

impl RegistryFixture {
    fn from_toml(source: &str) -> Result<Self, DemoError> {
        let fixture: RegistryFixture = toml::from_str(source)?;
        debug!(users = fixture.users.len(), "loaded tax registry fixture");
        Ok(fixture)
    }
}

struct TaxesRepository {
    user_taxes: BTreeMap<i64, UserTaxes>,
}

impl TaxesRepository {
    fn new(users: &[UserEntry]) -> Result<Self, DemoError> {
        let mut user_taxes = BTreeMap::new();
        for user in users {
            let record = UserTaxes::new(user.account.as_str(), user.income_tax, user.property_tax);
            if user_taxes.insert(user.id, record).is_some() {
                return Err(DemoError::DuplicateUser(user.id));
            }
        }
        Ok(Self { user_taxes })
    }

    fn find_user(&self, user_id: i64) -> Option<&UserTaxes> {
        self.user_taxes.get(&user_id)
    }
}

// ============================================================================
// Client
// ============================================================================

struct Account<'a> {
    user_id: i64,
    taxes_repository: &'a TaxesRepository,
}

impl<'a> Account<'a> {
    fn new(user_id: i64, taxes_repository: &'a TaxesRepository) -> Self {
        Self {
            user_id,
            taxes_repository,
        }
    }

    /// Writes a debug dump of the lookup to `out` and returns the report,
    /// or an empty string for an unknown user.
    fn print_taxes(&self, out: &mut impl Write) -> io::Result<String> {
        let user_taxes = self.taxes_repository.find_user(self.user_id);
        debug!(user_id = self.user_id, found = user_taxes.is_some(), "looked up user taxes");
        write_debug(&user_taxes, out)?;

        let Some(user_taxes) = user_taxes else {
            debug!(user_id = self.user_id, "no tax record for user");
            return Ok(String::new());
        };
        Ok(user_taxes.user_taxes().to_string())
    }
}

fn write_debug<T: fmt::Debug + ?Sized>(value: &T, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "DEBUG===>")?;
    writeln!(out, "{:#?}", value)?;
    writeln!(out, "<===DEBUG")
}

fn run(fixture: &RegistryFixture, out: &mut impl Write) -> Result<(), DemoError> {
    let repository = TaxesRepository::new(&fixture.users)?;

    for (index, &user_id) in fixture.report_ids.iter().enumerate() {
        if index > 0 {
            write!(out, "\n\n")?;
        }
        let account = Account::new(user_id, &repository);
        let report = account.print_taxes(out)?;
        write!(out, "{report}")?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Everything the binary writes to stdout.
fn demo(out: &mut impl Write) -> Result<(), DemoError> {
    let fixture = RegistryFixture::from_toml(REGISTRY_FIXTURE)?;
    run(&fixture, out)
}

fn main() -> Result<(), DemoError> {
    init_tracing();
    eprintln!("{}", "=== Null Object: The Solution ===".bold());

    let stdout = io::stdout();
    demo(&mut stdout.lock())
}

// ============================================================================
// Tests
// ============================================================================
