// Strategy Pattern: Image Filters
// A filter holds one interchangeable processing strategy. Swapping the
// strategy between calls is the whole mechanism for changing the algorithm.

use colored::Colorize;
use serde::Deserialize;
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const FILTERS_FIXTURE: &str = include_str!("../../fixtures/image_filters.toml");

#[derive(Error, Debug)]
enum DemoError {
    #[error("Failed to parse filter plan: {0}")]
    Fixture(#[from] toml::de::Error),

    #[error("Filter plan for '{image}' lists no filters")]
    EmptyPlan { image: String },

    #[error("Failed to write filter output: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TestImage {
    name: String,
}

impl TestImage {
    fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// ============================================================================
// Strategies
// ============================================================================

trait FilterStrategy {
    fn name(&self) -> &str;

    /// Processes `image` and hands it back.
    fn process(&self, image: TestImage, out: &mut dyn Write) -> io::Result<TestImage>;
}

struct SepiaFilter;

impl FilterStrategy for SepiaFilter {
    fn name(&self) -> &str {
        "SEPIA"
    }

    fn process(&self, image: TestImage, out: &mut dyn Write) -> io::Result<TestImage> {
        writeln!(out, "Apply SEPIA filter to image")?;
        Ok(image)
    }
}

struct BwFilter;

impl FilterStrategy for BwFilter {
    fn name(&self) -> &str {
        "B&W"
    }

    fn process(&self, image: TestImage, out: &mut dyn Write) -> io::Result<TestImage> {
        writeln!(out, "Apply B&W filter to image")?;
        Ok(image)
    }
}

struct DistortionFilter;

impl FilterStrategy for DistortionFilter {
    fn name(&self) -> &str {
        "DISTORTION"
    }

    fn process(&self, image: TestImage, out: &mut dyn Write) -> io::Result<TestImage> {
        writeln!(out, "Apply DISTORTION filter to image")?;
        Ok(image)
    }
}

// Strategy as closure
struct FnFilter<F> {
    name: &'static str,
    apply: F,
}

impl<F> FnFilter<F>
where
    F: Fn(&TestImage, &mut dyn Write) -> io::Result<()>,
{
    fn new(name: &'static str, apply: F) -> Self {
        Self { name, apply }
    }
}

impl<F> FilterStrategy for FnFilter<F>
where
    F: Fn(&TestImage, &mut dyn Write) -> io::Result<()>,
{
    fn name(&self) -> &str {
        self.name
    }

    fn process(&self, image: TestImage, out: &mut dyn Write) -> io::Result<TestImage> {
        (self.apply)(&image, out)?;
        Ok(image)
    }
}

// ============================================================================
// Context
// ============================================================================

#[derive(Default)]
struct Filter {
    strategy: Option<Box<dyn FilterStrategy>>,
}

impl Filter {
    fn new() -> Self {
        Self::default()
    }

    fn set_strategy(&mut self, strategy: Box<dyn FilterStrategy>) {
        debug!(
            from = self.strategy_name().unwrap_or("none"),
            to = strategy.name(),
            "switching filter strategy"
        );
        self.strategy = Some(strategy);
    }

    fn clear_strategy(&mut self) {
        self.strategy = None;
    }

    fn strategy_name(&self) -> Option<&str> {
        self.strategy.as_deref().map(|strategy| strategy.name())
    }

    /// Runs the current strategy on `image`. Without one the image comes
    /// back untouched and nothing is written.
    fn apply_filter(&self, image: TestImage, out: &mut dyn Write) -> io::Result<TestImage> {
        let Some(strategy) = self.strategy.as_deref() else {
            debug!(image = %image.name, "no filter strategy set");
            return Ok(image);
        };
        strategy.process(image, out)
    }
}

// ============================================================================
// Filter plan fixture
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FilterKind {
    Sepia,
    Bw,
    Distortion,
}

impl FilterKind {
    fn strategy(self) -> Box<dyn FilterStrategy> {
        match self {
            FilterKind::Sepia => Box::new(SepiaFilter),
            FilterKind::Bw => Box::new(BwFilter),
            FilterKind::Distortion => Box::new(DistortionFilter),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterPlan {
    image: String,
    filters: Vec<FilterKind>,
}

impl FilterPlan {
    fn from_toml(source: &str) -> Result<Self, DemoError> {
        let plan: FilterPlan = toml::from_str(source)?;
        if plan.filters.is_empty() {
            return Err(DemoError::EmptyPlan { image: plan.image });
        }
        debug!(image = %plan.image, filters = plan.filters.len(), "loaded filter plan");
        Ok(plan)
    }
}

// ============================================================================
// Example: Switching strategies at runtime
// ============================================================================

fn run(plan: &FilterPlan, out: &mut dyn Write) -> io::Result<()> {
    let mut image = TestImage::new(plan.image.as_str());
    let mut filter = Filter::new();

    for kind in &plan.filters {
        filter.set_strategy(kind.strategy());
        image = filter.apply_filter(image, out)?;
    }
    Ok(())
}

// ============================================================================
// Example: Empty context and closure strategy
// ============================================================================

fn closure_strategy_example() -> io::Result<String> {
    let mut out = Vec::new();
    let mut filter = Filter::new();
    let image = TestImage::new("closure.png");

    // Nothing assigned yet: a no-op.
    let image = filter.apply_filter(image, &mut out)?;

    filter.set_strategy(Box::new(FnFilter::new("INVERT", |_image, out| {
        writeln!(out, "Apply INVERT filter to image")
    })));
    let image = filter.apply_filter(image, &mut out)?;

    // Back to a no-op once the strategy is cleared.
    filter.clear_strategy();
    filter.apply_filter(image, &mut out)?;

    Ok(String::from_utf8_lossy(&out).into_owned())
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
fn demo(out: &mut dyn Write) -> Result<(), DemoError> {
    let plan = FilterPlan::from_toml(FILTERS_FIXTURE)?;
    run(&plan, out)?;
    Ok(())
}

fn main() -> Result<(), DemoError> {
    init_tracing();
    eprintln!("{}", "=== Strategy Pattern ===".bold());

    let stdout = io::stdout();
    demo(&mut stdout.lock())?;

    let closure_output = closure_strategy_example()?;
    debug!(output = %closure_output.trim_end(), "closure strategy");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
