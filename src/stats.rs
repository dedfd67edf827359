use crate::model::Record;
use statrs::statistics::{Data, Median, Statistics};

/// Summary line for the rows currently on screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSummary {
    pub rows: usize,
    pub mean_price: f64,
    pub median_price: f64,
    pub max_quality: f64,
}

pub fn summarize(view: &[Record]) -> ViewSummary {
    if view.is_empty() {
        return ViewSummary::default();
    }

    let prices: Vec<f64> = view.iter().map(|r| r.item_price).collect();
    let max_quality = view.iter().map(|r| r.quality).fold(f64::MIN, f64::max);

    ViewSummary {
        rows: view.len(),
        mean_price: prices.iter().mean(),
        median_price: Data::new(prices).median(),
        max_quality,
    }
}
