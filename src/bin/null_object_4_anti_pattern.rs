// Null Object 4/4: The Anti-Pattern
// Same do-nothing record as the pattern, but the interface also answers
// "are you the null one?". The client branches on that flag and rebuilds
// the defaults by hand, which is exactly the check the pattern removed.

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

/// Anything the client can ask for a user's taxes.
trait UserTaxesRecord: fmt::Debug {
    fn user_taxes(&self) -> Taxes<'_>;
    fn is_null(&self) -> bool;
}

impl UserTaxes {
    fn new(account: impl Into<String>, income_tax: i64, property_tax: i64) -> Self {
        Self {
            account: account.into(),
            income_tax,
            property_tax,
        }
    }
}

impl UserTaxesRecord for UserTaxes {
    fn user_taxes(&self) -> Taxes<'_> {
        Taxes {
            account: &self.account,
            income_tax: self.income_tax,
            property_tax: self.property_tax,
        }
    }

    fn is_null(&self) -> bool {
        false
    }
}

/// Stands in for a user the repository does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NullUserTaxes;

impl UserTaxesRecord for NullUserTaxes {
    fn user_taxes(&self) -> Taxes<'_> {
        Taxes {
            account: "Unknown",
            income_tax: 0,
            property_tax: 0,
        }
    }

    fn is_null(&self) -> bool {
        true
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

    /// Returns the user's record, or [`NullUserTaxes`] for an unknown id.
    fn find_user(&self, user_id: i64) -> &dyn UserTaxesRecord {
        if let Some(user_taxes) = self.user_taxes.get(&user_id) {
            return user_taxes;
        }
        &NullUserTaxes
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
    fn print_taxes(&self, out: &mut impl Write) -> io::Result<String> {
        let user_taxes = self.taxes_repository.find_user(self.user_id);
        debug!(user_id = self.user_id, record = ?user_taxes, "looked up user taxes");
        write_debug(user_taxes, out)?;

        // The null record already carries these defaults; they are
        // recomputed here and its own values are never read.
        let (user_name, income_tax, property_tax) = if !user_taxes.is_null() {
            let taxes = user_taxes.user_taxes();
            (taxes.account, taxes.income_tax, taxes.property_tax)
        } else {
            debug!(user_id = self.user_id, "tax record is the null record");
            ("unknown", 0, 0)
        };

        Ok(format!(
            "Taxes for {user_name}.\nIncomeTax: {income_tax} RUB, PropertyTax: {property_tax} RUB\n"
        ))
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
    eprintln!("{}", "=== Null Object: The Anti-Pattern ===".bold());

    let stdout = io::stdout();
    demo(&mut stdout.lock())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_repository() -> TaxesRepository {
        let fixture = RegistryFixture::from_toml(REGISTRY_FIXTURE).unwrap();
        TaxesRepository::new(&fixture.users).unwrap()
    }

    fn unknown() -> Taxes<'static> {
        Taxes {
            account: "Unknown",
            income_tax: 0,
            property_tax: 0,
        }
    }

    #[test]
    fn test_find_known_user() {
        let repository = sample_repository();
        assert_eq!(
            repository.find_user(2).user_taxes(),
            UserTaxes::new("User#2", 7, 15).user_taxes()
        );
    }

    #[test]
    fn test_find_unknown_user_returns_null_record() {
        let repository = sample_repository();
        assert_eq!(repository.find_user(4).user_taxes(), unknown());
        assert_eq!(format!("{:?}", repository.find_user(4)), "NullUserTaxes");
    }

    #[test]
    fn test_is_null_flag() {
        let repository = sample_repository();
        assert!(!repository.find_user(1).is_null());
        assert!(repository.find_user(4).is_null());
    }

    #[test]
    fn test_report_for_known_user() {
        let repository = sample_repository();
        let mut out = Vec::new();
        let report = Account::new(1, &repository).print_taxes(&mut out).unwrap();

        assert_eq!(report, "Taxes for User#1.\nIncomeTax: 5 RUB, PropertyTax: 10 RUB\n");
        let dump = String::from_utf8(out).unwrap();
        assert!(dump.starts_with("DEBUG===>\nUserTaxes {"));
        assert!(dump.ends_with("<===DEBUG\n"));
    }

    #[test]
    fn test_report_for_unknown_user() {
        let repository = sample_repository();
        let mut out = Vec::new();
        let report = Account::new(4, &repository).print_taxes(&mut out).unwrap();

        // The caller's hand-made default wins over the record's own "Unknown".
        assert_eq!(report, "Taxes for unknown.\nIncomeTax: 0 RUB, PropertyTax: 0 RUB\n");
        assert_eq!(repository.find_user(4).user_taxes().account, "Unknown");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "DEBUG===>\nNullUserTaxes\n<===DEBUG\n"
        );
    }

    #[test]
    fn test_run_with_fixture() {
        let fixture = RegistryFixture::from_toml(REGISTRY_FIXTURE).unwrap();
        let mut out = Vec::new();
        run(&fixture, &mut out).unwrap();

        let output = String::from_utf8(out).unwrap();
        let (known, missing) = output.split_once("\n\n\n").unwrap();
        assert!(known.ends_with("Taxes for User#1.\nIncomeTax: 5 RUB, PropertyTax: 10 RUB"));
        assert_eq!(
            missing,
            "DEBUG===>\nNullUserTaxes\n<===DEBUG\n\
             Taxes for unknown.\nIncomeTax: 0 RUB, PropertyTax: 0 RUB\n"
        );
    }

    #[test]
    fn test_empty_registry_reports_everyone_as_unknown() {
        let repository = TaxesRepository::new(&[]).unwrap();
        assert_eq!(repository.find_user(1).user_taxes(), unknown());
    }

    #[test]
    fn test_demo_stdout() {
        let mut out = Vec::new();
        demo(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "DEBUG===>\n\
             UserTaxes {\n\
             \x20   account: \"User#1\",\n\
             \x20   income_tax: 5,\n\
             \x20   property_tax: 10,\n\
             }\n\
             <===DEBUG\n\
             Taxes for User#1.\n\
             IncomeTax: 5 RUB, PropertyTax: 10 RUB\n\
             \n\nDEBUG===>\n\
             NullUserTaxes\n\
             <===DEBUG\n\
             Taxes for unknown.\n\
             IncomeTax: 0 RUB, PropertyTax: 0 RUB\n"
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
