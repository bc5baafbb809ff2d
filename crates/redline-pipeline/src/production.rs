//! Production units: the work quantities listed in the callout.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::types::PipelineConfig;

/// Box colour for footage units.
pub const FOOTAGE_COLOR: Rgba<u8> = Rgba(PipelineConfig::DEFAULT_LINE_COLOR);
/// Box colour for count units (coral).
pub const COUNT_COLOR: Rgba<u8> = Rgba([255, 127, 80, 255]);

/// Work categories in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Strand footage.
    Strand,
    /// Cable footage.
    Cable,
    /// Overlash footage.
    Overlash,
    /// Anchor count.
    Anchors,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 4] = [Self::Strand, Self::Cable, Self::Overlash, Self::Anchors];

    /// Billing code printed in the callout.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Strand => "C300-01",
            Self::Cable => "C300-02",
            Self::Overlash => "C300-03",
            Self::Anchors => "C300-04",
        }
    }

    /// Anchors are counted; everything else is measured in feet.
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Anchors)
    }

    /// Fill colour of the unit's box.
    #[must_use]
    pub const fn color(self) -> Rgba<u8> {
        if self.is_count() {
            COUNT_COLOR
        } else {
            FOOTAGE_COLOR
        }
    }
}

/// Quantities entered for one job. Zero means "not performed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quantities {
    /// Strand footage.
    pub strand: f64,
    /// Cable footage.
    pub cable: f64,
    /// Overlash footage.
    pub overlash: f64,
    /// Number of anchors.
    pub anchors: f64,
}

impl Quantities {
    /// The quantity recorded for `category`.
    #[must_use]
    pub const fn get(&self, category: Category) -> f64 {
        match category {
            Category::Strand => self.strand,
            Category::Cable => self.cable,
            Category::Overlash => self.overlash,
            Category::Anchors => self.anchors,
        }
    }
}

/// One labelled box in the callout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionUnit {
    /// Billing code, e.g. `C300-01`.
    pub name: String,
    /// Formatted quantity.
    pub qty: String,
    /// Full label drawn in the box.
    pub text: String,
    /// Box fill colour (RGBA).
    pub color: [u8; 4],
}

impl ProductionUnit {
    /// Build the unit for `category` with raw quantity `value`.
    #[must_use]
    pub fn new(category: Category, value: f64) -> Self {
        let name = category.code().to_string();
        let (qty, text) = if category.is_count() {
            let qty = format_count(value);
            let text = format!("{name} = {qty}");
            (qty, text)
        } else {
            let qty = format_footage(value);
            let text = format!("{name} = {qty}'");
            (qty, text)
        };
        Self {
            name,
            qty,
            text,
            color: category.color().0,
        }
    }

    /// The fill colour as a pixel value.
    #[must_use]
    pub const fn fill(&self) -> Rgba<u8> {
        Rgba(self.color)
    }
}

/// The date and units listed in one callout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    /// Work-performed date, already validated (`MM/DD/YYYY`).
    pub date: String,
    /// Units in category order.
    pub units: Vec<ProductionUnit>,
}

impl Production {
    /// One unit per non-zero quantity, in [`Category::ALL`] order.
    #[must_use]
    pub fn from_quantities(date: impl Into<String>, quantities: &Quantities) -> Self {
        let units = Category::ALL
            .into_iter()
            .filter(|&c| quantities.get(c).abs() > 0.0)
            .map(|c| ProductionUnit::new(c, quantities.get(c)))
            .collect();
        Self {
            date: date.into(),
            units,
        }
    }
}

/// Two decimals, dropping an all-zero fraction (`12.00` -> `12`).
#[must_use]
pub fn format_footage(value: f64) -> String {
    let fixed = format!("{value:.2}");
    match fixed.strip_suffix(".00") {
        Some(whole) => whole.to_string(),
        None => fixed,
    }
}

/// Whole count, truncating any fraction.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_count(value: f64) -> String {
    (value.trunc() as i64).to_string()
}
