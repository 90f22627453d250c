// Null Object 1/4: The Problem
// The repository answers "no such user" with an absent value and the client
// uses the answer without looking. A known user prints a report; an unknown
// user takes the program down.

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

    /// Writes a debug dump of the lookup to `out` and returns the report.
    ///
    /// # Panics
    ///
    /// Panics when the user is not in the repository.
    fn print_taxes(&self, out: &mut impl Write) -> io::Result<String> {
        let user_taxes = self.taxes_repository.find_user(self.user_id);
        debug!(user_id = self.user_id, found = user_taxes.is_some(), "looked up user taxes");
        write_debug(&user_taxes, out)?;

        // No check: the lookup result is used as if it were always there.
        let taxes = user_taxes.unwrap().user_taxes();
        Ok(taxes.to_string())
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
    eprintln!("{}", "=== Null Object: The Problem ===".bold());

    let stdout = io::stdout();
    demo(&mut stdout.lock())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    fn sample_repository() -> TaxesRepository {
        let fixture = RegistryFixture::from_toml(REGISTRY_FIXTURE).unwrap();
        TaxesRepository::new(&fixture.users).unwrap()
    }

    #[test]
    fn test_find_known_user() {
        let repository = sample_repository();
        assert_eq!(
            repository.find_user(2),
            Some(&UserTaxes::new("User#2", 7, 15))
        );
    }

    #[test]
    fn test_find_unknown_user_is_absent() {
        let repository = sample_repository();
        assert_eq!(repository.find_user(4), None);
    }

    #[test]
    fn test_report_for_known_user() {
        let repository = sample_repository();
        let mut out = Vec::new();
        let report = Account::new(1, &repository).print_taxes(&mut out).unwrap();

        assert_eq!(report, "Taxes for User#1.\nIncomeTax: 5 RUB, PropertyTax: 10 RUB\n");
        let dump = String::from_utf8(out).unwrap();
        assert!(dump.starts_with("DEBUG===>\nSome("));
        assert!(dump.contains("\"User#1\""));
        assert!(dump.ends_with("<===DEBUG\n"));
    }

    #[test]
    #[should_panic(expected = "called `Option::unwrap()` on a `None` value")]
    fn test_report_for_unknown_user_panics() {
        let repository = sample_repository();
        let mut out = Vec::new();
        let _ = Account::new(4, &repository).print_taxes(&mut out);
    }

    #[test]
    fn test_debug_dump_written_before_failure() {
        let repository = sample_repository();
        let mut out = Vec::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            Account::new(4, &repository).print_taxes(&mut out)
        }));

        assert!(result.is_err());
        assert_eq!(String::from_utf8(out).unwrap(), "DEBUG===>\nNone\n<===DEBUG\n");
    }

    #[test]
    #[should_panic(expected = "called `Option::unwrap()` on a `None` value")]
    fn test_run_with_fixture_fails_on_unknown_user() {
        let fixture = RegistryFixture::from_toml(REGISTRY_FIXTURE).unwrap();
        let mut out = Vec::new();
        let _ = run(&fixture, &mut out);
    }

    #[test]
    fn test_run_with_known_users_only() {
        let mut fixture = RegistryFixture::from_toml(REGISTRY_FIXTURE).unwrap();
        fixture.report_ids = vec![3];
        let mut out = Vec::new();
        run(&fixture, &mut out).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.ends_with("Taxes for User#3.\nIncomeTax: 10 RUB, PropertyTax: 20 RUB\n"));
    }

    #[test]
    fn test_demo_stdout_stops_at_unknown_user() {
        let mut out = Vec::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| demo(&mut out)));

        assert!(result.is_err());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "DEBUG===>\n\
             Some(\n\
             \x20   UserTaxes {\n\
             \x20       account: \"User#1\",\n\
             \x20       income_tax: 5,\n\
             \x20       property_tax: 10,\n\
             \x20   },\n\
             )\n\
             <===DEBUG\n\
             Taxes for User#1.\n\
             IncomeTax: 5 RUB, PropertyTax: 10 RUB\n\
             \n\nDEBUG===>\n\
             None\n\
             <===DEBUG\n"
        );
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let source = r#"
            report_ids = [1]

            [[user]]
            id = 1
            account = "A"
            income_tax = 1
            property_tax = 1

            [[user]]
            id = 1
            account = "B"
            income_tax = 2
            property_tax = 2
        "#;
        let fixture = RegistryFixture::from_toml(source).unwrap();
        assert!(matches!(
            TaxesRepository::new(&fixture.users),
            Err(DemoError::DuplicateUser(1))
        ));
    }
}
