//! Fundamentals screening engine for the dragon table
//!
//! Holds the working set of [`StockFundamentals`] for the selected sector
//! plus the active filter thresholds and sort key, and recomputes the
//! filtered/sorted view whenever either changes. The engine does no I/O and
//! never touches presentation; it hands plain record slices to a registered
//! view callback.

pub mod debounce;

use crate::api::types::StockFundamentals;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use debounce::Debouncer;

/// The five screenable fundamentals metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    MarketValue,
    Revenue,
    NetProfit,
    GrossMargin,
    DebtRatio,
}

impl MetricField {
    pub const ALL: [MetricField; 5] = [
        MetricField::MarketValue,
        MetricField::Revenue,
        MetricField::NetProfit,
        MetricField::GrossMargin,
        MetricField::DebtRatio,
    ];

    /// Field name as it appears on the wire and in filter inputs
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::MarketValue => "market_value",
            MetricField::Revenue => "revenue",
            MetricField::NetProfit => "net_profit",
            MetricField::GrossMargin => "gross_margin",
            MetricField::DebtRatio => "debt_ratio",
        }
    }

    /// The record's value for this metric, if reported
    pub fn value_of(&self, stock: &StockFundamentals) -> Option<f64> {
        match self {
            MetricField::MarketValue => stock.market_value,
            MetricField::Revenue => stock.revenue,
            MetricField::NetProfit => stock.net_profit,
            MetricField::GrossMargin => stock.gross_margin,
            MetricField::DebtRatio => stock.debt_ratio,
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "market_value" => Ok(MetricField::MarketValue),
            "revenue" => Ok(MetricField::Revenue),
            "net_profit" => Ok(MetricField::NetProfit),
            "gross_margin" => Ok(MetricField::GrossMargin),
            "debt_ratio" => Ok(MetricField::DebtRatio),
            other => Err(AppError::InvalidField(other.to_string())),
        }
    }
}

/// Sort direction for the active sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The single active sort key and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: MetricField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Initial table state: market value, largest first
    fn default() -> Self {
        SortSpec {
            field: MetricField::MarketValue,
            direction: SortDirection::Descending,
        }
    }
}

/// Per-metric minimum thresholds; an unset entry imposes no constraint
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub market_value: Option<f64>,
    pub revenue: Option<f64>,
    pub net_profit: Option<f64>,
    pub gross_margin: Option<f64>,
    pub debt_ratio: Option<f64>,
}

impl FilterSet {
    pub fn get(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::MarketValue => self.market_value,
            MetricField::Revenue => self.revenue,
            MetricField::NetProfit => self.net_profit,
            MetricField::GrossMargin => self.gross_margin,
            MetricField::DebtRatio => self.debt_ratio,
        }
    }

    fn set(&mut self, field: MetricField, threshold: Option<f64>) {
        match field {
            MetricField::MarketValue => self.market_value = threshold,
            MetricField::Revenue => self.revenue = threshold,
            MetricField::NetProfit => self.net_profit = threshold,
            MetricField::GrossMargin => self.gross_margin = threshold,
            MetricField::DebtRatio => self.debt_ratio = threshold,
        }
    }

    fn clear(&mut self) {
        *self = FilterSet::default();
    }

    /// True iff the record meets every set threshold. A record missing a
    /// thresholded metric fails that filter.
    fn passes(&self, stock: &StockFundamentals) -> bool {
        MetricField::ALL.iter().all(|field| match self.get(*field) {
            None => true,
            Some(min) => match field.value_of(stock) {
                Some(value) => value >= min,
                None => false,
            },
        })
    }
}

/// Whether filter/sort state survives a sector switch.
///
/// The observed behavior preserves filters across sectors in some paths and
/// not others, so the choice is a constructor-time policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicy {
    /// Keep filters and sort when a new dataset is loaded (default)
    Sticky,
    /// Clear filters and reset the sort on every dataset load
    ResetOnLoad,
}

type ViewCallback = Box<dyn Fn(&[StockFundamentals]) + Send + Sync>;

/// Filter/sort engine for one sector's fundamentals table
pub struct ScreeningEngine {
    dataset: Vec<StockFundamentals>,
    filters: FilterSet,
    sort: SortSpec,
    policy: FilterPolicy,
    on_view: Option<ViewCallback>,
}

impl ScreeningEngine {
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            dataset: Vec::new(),
            filters: FilterSet::default(),
            sort: SortSpec::default(),
            policy,
            on_view: None,
        }
    }

    /// Register the callback that receives each recomputed view
    pub fn set_view_callback<F>(&mut self, callback: F)
    where
        F: Fn(&[StockFundamentals]) + Send + Sync + 'static,
    {
        self.on_view = Some(Box::new(callback));
    }

    /// Replace the working set wholesale for a newly selected sector
    pub fn load_dataset(&mut self, records: Vec<StockFundamentals>) {
        if self.policy == FilterPolicy::ResetOnLoad {
            self.filters.clear();
            self.sort = SortSpec::default();
        }
        self.dataset = records;
        self.notify();
    }

    /// Set or clear the minimum threshold for one metric.
    ///
    /// `raw` is the filter input's text: `None` or empty clears the
    /// threshold, and a value that does not parse as a number is stored as
    /// "no constraint". That permissive fallback mirrors the table's
    /// long-standing behavior and is kept on purpose.
    pub fn set_filter(&mut self, field: &str, raw: Option<&str>) -> Result<()> {
        let field = MetricField::from_str(field)?;

        let threshold = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok());
        self.filters.set(field, threshold);

        self.notify();
        Ok(())
    }

    /// Toggle the sort key: the active field flips direction, a new field
    /// starts descending.
    pub fn toggle_sort(&mut self, field: &str) -> Result<()> {
        let field = MetricField::from_str(field)?;

        if self.sort.field == field {
            self.sort.direction = self.sort.direction.flip();
        } else {
            self.sort = SortSpec {
                field,
                direction: SortDirection::Descending,
            };
        }

        self.notify();
        Ok(())
    }

    /// Clear every threshold
    pub fn reset_filters(&mut self) {
        self.filters.clear();
        self.notify();
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// The filtered, ordered view of the current dataset.
    ///
    /// Pure with respect to engine state: no I/O, no mutation. Records
    /// missing the sort field sort to the low end in either direction.
    pub fn compute_view(&self) -> Vec<StockFundamentals> {
        let mut view: Vec<StockFundamentals> = self
            .dataset
            .iter()
            .filter(|stock| self.filters.passes(stock))
            .cloned()
            .collect();

        let field = self.sort.field;
        view.sort_by(|a, b| {
            let a_key = field.value_of(a).unwrap_or(f64::NEG_INFINITY);
            let b_key = field.value_of(b).unwrap_or(f64::NEG_INFINITY);
            let ordering = a_key.total_cmp(&b_key);
            match self.sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        view
    }

    fn notify(&self) {
        if let Some(callback) = &self.on_view {
            let view = self.compute_view();
            callback(&view);
        }
    }
}
