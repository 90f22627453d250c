// Decorator Pattern: Coffee House
// Every drink starts as an espresso; add-ons wrap it and extend both the
// price and the ingredient list without touching the drink they wrap.

use colored::Colorize;
use serde::Deserialize;
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const MENU_FIXTURE: &str = include_str!("../../fixtures/coffee_menu.toml");

#[derive(Error, Debug)]
enum DemoError {
    #[error("Failed to parse coffee menu: {0}")]
    Fixture(#[from] toml::de::Error),

    #[error("Coffee menu has no drinks")]
    EmptyMenu,

    #[error("Failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// Component interface
// ============================================================================

trait Coffee {
    fn cost(&self) -> f64;
    fn ingredients(&self) -> String;
}

// Lets a chain assembled at runtime be wrapped again like any other drink.
impl<C: Coffee + ?Sized> Coffee for Box<C> {
    fn cost(&self) -> f64 {
        (**self).cost()
    }

    fn ingredients(&self) -> String {
        (**self).ingredients()
    }
}

// Concrete component
#[derive(Debug, Clone, Copy)]
struct Espresso;

impl Coffee for Espresso {
    fn cost(&self) -> f64 {
        100.0
    }

    fn ingredients(&self) -> String {
        "Espresso".to_string()
    }
}

// ============================================================================
// Decorators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum AddOn {
    Milk,
    Whip,
    Chocolate,
}

impl AddOn {
    fn surcharge(self) -> f64 {
        match self {
            AddOn::Milk => 20.0,
            AddOn::Whip => 30.0,
            AddOn::Chocolate => 50.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            AddOn::Milk => "Milk",
            AddOn::Whip => "Whip",
            AddOn::Chocolate => "Chocolate",
        }
    }

    fn wrap(self, coffee: Box<dyn Coffee>) -> Box<dyn Coffee> {
        match self {
            AddOn::Milk => Box::new(Milk::new(coffee)),
            AddOn::Whip => Box::new(Whip::new(coffee)),
            AddOn::Chocolate => Box::new(Chocolate::new(coffee)),
        }
    }
}

struct Milk<C> {
    coffee: C,
}

impl<C: Coffee> Milk<C> {
    fn new(coffee: C) -> Self {
        Self { coffee }
    }
}

impl<C: Coffee> Coffee for Milk<C> {
    fn cost(&self) -> f64 {
        self.coffee.cost() + AddOn::Milk.surcharge()
    }

    fn ingredients(&self) -> String {
        format!("{}, {}", self.coffee.ingredients(), AddOn::Milk.label())
    }
}

struct Whip<C> {
    coffee: C,
}

impl<C: Coffee> Whip<C> {
    fn new(coffee: C) -> Self {
        Self { coffee }
    }
}

impl<C: Coffee> Coffee for Whip<C> {
    fn cost(&self) -> f64 {
        self.coffee.cost() + AddOn::Whip.surcharge()
    }

    fn ingredients(&self) -> String {
        format!("{}, {}", self.coffee.ingredients(), AddOn::Whip.label())
    }
}

struct Chocolate<C> {
    coffee: C,
}

impl<C: Coffee> Chocolate<C> {
    fn new(coffee: C) -> Self {
        Self { coffee }
    }
}

impl<C: Coffee> Coffee for Chocolate<C> {
    fn cost(&self) -> f64 {
        self.coffee.cost() + AddOn::Chocolate.surcharge()
    }

    fn ingredients(&self) -> String {
        format!("{}, {}", self.coffee.ingredients(), AddOn::Chocolate.label())
    }
}

/// Wraps a fresh espresso in `add_ons`, innermost first.
fn brew(add_ons: &[AddOn]) -> Box<dyn Coffee> {
    add_ons
        .iter()
        .fold(Box::new(Espresso) as Box<dyn Coffee>, |coffee, add_on| {
            add_on.wrap(coffee)
        })
}

// ============================================================================
// Menu fixture
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Menu {
    #[serde(rename = "drink")]
    drinks: Vec<DrinkSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DrinkSpec {
    name: String,
    #[serde(default)]
    add_ons: Vec<AddOn>,
}

impl Menu {
    fn from_toml(source: &str) -> Result<Self, DemoError> {
        let menu: Menu = toml::from_str(source)?;
        if menu.drinks.is_empty() {
            return Err(DemoError::EmptyMenu);
        }
        debug!(drinks = menu.drinks.len(), "loaded coffee menu");
        Ok(menu)
    }
}

fn receipt<C: Coffee + ?Sized>(coffee: &C) -> String {
    format!("{}\n{}\n", coffee.ingredients(), coffee.cost())
}

// ============================================================================
// Example: Decorator chains built from the menu (trait objects)
// ============================================================================

fn run(menu: &Menu, out: &mut impl Write) -> io::Result<()> {
    for drink in &menu.drinks {
        let coffee = brew(&drink.add_ons);
        debug!(drink = %drink.name, cost = coffee.cost(), "brewed");
        out.write_all(receipt(coffee.as_ref()).as_bytes())?;
    }
    Ok(())
}

// ============================================================================
// Example: Decorator chains written in code (generics, no boxing)
// ============================================================================

fn generic_chain_example() -> Vec<String> {
    let espresso = Espresso;
    let cappuccino = Whip::new(Milk::new(espresso));
    let mut receipts = vec![receipt(&espresso), receipt(&cappuccino)];

    // An already decorated drink is wrapped again; the new layer owns it.
    let cappuccino_with_chocolate = Chocolate::new(cappuccino);
    receipts.push(receipt(&cappuccino_with_chocolate));
    receipts
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
    let menu = Menu::from_toml(MENU_FIXTURE)?;
    run(&menu, out)?;
    Ok(())
}

fn main() -> Result<(), DemoError> {
    init_tracing();
    eprintln!("{}", "=== Decorator Pattern ===".bold());

    let stdout = io::stdout();
    demo(&mut stdout.lock())?;

    for printed in generic_chain_example() {
        debug!(receipt = %printed.trim_end().replace('\n', " / "), "generic chain");
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
