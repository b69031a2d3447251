//! Species page parser
//!
//! Extracts a [`PageRecord`] from raw page markup through five independent
//! field extractors that all read the same parsed document. Markup details
//! live entirely in [`PageSelectors`], so a site redesign means new
//! selectors (or a new [`PageParser`] implementation), not pipeline changes.

use crate::config::SelectorConfig;
use crate::model::{MetricLabel, Metrics, PageRecord, ParseFailure};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Turns a page body into a record
pub trait PageParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<PageRecord, ParseFailure>;
}

/// Compiles a CSS selector, naming it in the error
pub fn compile_selector(name: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Compiled selectors for the five page extractors
#[derive(Debug, Clone)]
pub struct PageSelectors {
    pub catalog_id: Selector,
    pub content_region: Selector,
    pub heading: Selector,
    pub category_tag: Selector,
    pub metrics_table: Selector,
    pub metrics_cell: Selector,
    pub generation: Selector,
}

impl PageSelectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            catalog_id: compile_selector("catalog-id", &config.catalog_id)?,
            content_region: compile_selector("content-region", &config.content_region)?,
            heading: compile_selector("heading", &config.heading)?,
            category_tag: compile_selector("category-tag", &config.category_tag)?,
            metrics_table: compile_selector("metrics-table", &config.metrics_table)?,
            metrics_cell: compile_selector("metrics-cell", &config.metrics_cell)?,
            generation: compile_selector("generation", &config.generation)?,
        })
    }
}

/// Selector-driven parser for species pages
#[derive(Debug, Clone)]
pub struct SpeciesPageParser {
    selectors: PageSelectors,
}

impl SpeciesPageParser {
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            selectors: PageSelectors::compile(config)?,
        })
    }

    pub fn with_selectors(selectors: PageSelectors) -> Self {
        Self { selectors }
    }

    /// Parses with the default selectors
    ///
    /// # Example
    ///
    /// ```
    /// use dex_harvest::harvest::{PageParser, SpeciesPageParser};
    ///
    /// let parser = SpeciesPageParser::with_defaults().unwrap();
    /// assert!(parser.parse("<html></html>").is_err());
    /// ```
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(&SelectorConfig::default())
    }
}

impl PageParser for SpeciesPageParser {
    fn parse(&self, raw: &str) -> Result<PageRecord, ParseFailure> {
        let document = Html::parse_document(raw);
        let s = &self.selectors;

        let catalog_id = extract_catalog_id(&document, &s.catalog_id)?;
        let name = extract_name(&document, &s.content_region, &s.heading)?;
        let (primary_category, secondary_category) =
            extract_categories(&document, &s.category_tag)?;
        let metrics = extract_metrics(&document, &s.metrics_table, &s.metrics_cell)?;
        let generation_tag = extract_generation_tag(&document, &s.generation)?;

        if let Some(warning) = metrics.check_sum(catalog_id) {
            tracing::warn!("Data quality: {}", warning);
        }

        Ok(PageRecord {
            catalog_id,
            name,
            primary_category,
            secondary_category,
            metrics,
            generation_tag,
        })
    }
}

/// Concatenated text of an element with whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses `#0006`-style catalog numbers
fn parse_catalog_number(text: &str) -> Option<u32> {
    let digits = text.trim().trim_start_matches('#');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Locates the single catalog number in the summary region
///
/// The number may be repeated in the region, but every occurrence must
/// agree.
pub fn extract_catalog_id(document: &Html, selector: &Selector) -> Result<u32, ParseFailure> {
    const FIELD: &str = "catalogId";

    let mut found: Option<u32> = None;
    for element in document.select(selector) {
        let text = element_text(element);
        let value = parse_catalog_number(&text)
            .ok_or_else(|| ParseFailure::new(FIELD, format!("'{}' is not a number", text)))?;

        match found {
            Some(existing) if existing != value => {
                return Err(ParseFailure::new(
                    FIELD,
                    format!("conflicting catalog numbers {} and {}", existing, value),
                ));
            }
            _ => found = Some(value),
        }
    }

    match found {
        None => Err(ParseFailure::new(
            FIELD,
            "no catalog number in summary region",
        )),
        Some(0) => Err(ParseFailure::new(FIELD, "catalog number must be >= 1")),
        Some(id) => Ok(id),
    }
}

/// First heading of the main content region, minus a trailing `(qualifier)`
pub fn extract_name(
    document: &Html,
    region: &Selector,
    heading: &Selector,
) -> Result<String, ParseFailure> {
    const FIELD: &str = "name";

    let region = document
        .select(region)
        .next()
        .ok_or_else(|| ParseFailure::new(FIELD, "main content region not found"))?;
    let heading = region
        .select(heading)
        .next()
        .ok_or_else(|| ParseFailure::new(FIELD, "no heading in main content region"))?;

    let text = element_text(heading);
    let name = match text.rfind(" (") {
        Some(idx) if text.ends_with(')') => text[..idx].trim_end().to_string(),
        _ => text,
    };

    if name.is_empty() {
        return Err(ParseFailure::new(FIELD, "heading is empty"));
    }
    Ok(name)
}

/// Primary and optional secondary category from the tag list
///
/// A single tag is valid data: the secondary category is then `None`.
pub fn extract_categories(
    document: &Html,
    tag: &Selector,
) -> Result<(String, Option<String>), ParseFailure> {
    let mut tags = document
        .select(tag)
        .map(element_text)
        .filter(|text| !text.is_empty());

    let primary = tags
        .next()
        .ok_or_else(|| ParseFailure::new("categories", "category tag list is empty"))?;
    let secondary = tags.next();

    Ok((primary, secondary))
}

/// Reads the seven ordered metric cells
pub fn extract_metrics(
    document: &Html,
    table: &Selector,
    cell: &Selector,
) -> Result<Metrics, ParseFailure> {
    const FIELD: &str = "metrics";

    let table = document
        .select(table)
        .next()
        .ok_or_else(|| ParseFailure::new(FIELD, "metrics table not found"))?;

    let cells: Vec<String> = table.select(cell).map(element_text).take(Metrics::LEN).collect();
    if cells.len() < Metrics::LEN {
        return Err(ParseFailure::new(
            FIELD,
            format!("expected {} metric cells, found {}", Metrics::LEN, cells.len()),
        ));
    }

    let mut values = [0u32; 7];
    for ((slot, text), label) in values.iter_mut().zip(&cells).zip(MetricLabel::ALL) {
        *slot = text.parse().map_err(|_| {
            ParseFailure::new(FIELD, format!("{} cell '{}' is not a number", label, text))
        })?;
    }

    Ok(Metrics::new(values))
}

/// First contiguous digit run of the generation annotation
pub fn extract_generation_tag(document: &Html, selector: &Selector) -> Result<u32, ParseFailure> {
    const FIELD: &str = "generationTag";

    let annotation = document
        .select(selector)
        .next()
        .map(element_text)
        .ok_or_else(|| ParseFailure::new(FIELD, "generation annotation not found"))?;

    let digits: String = annotation
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return Err(ParseFailure::new(
            FIELD,
            format!("no digits in '{}'", annotation),
        ));
    }

    match digits.parse::<u32>() {
        Ok(0) => Err(ParseFailure::new(FIELD, "generation must be >= 1")),
        Ok(tag) => Ok(tag),
        Err(e) => Err(ParseFailure::new(FIELD, format!("'{}': {}", digits, e))),
    }
}
