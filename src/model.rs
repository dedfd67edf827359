use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// One parsed item row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    pub item_name: String,
    pub item_price: f64,
    pub quality: f64,
    pub accuracy: f64,
    pub damage: f64,
    pub defense: f64,
    pub bonus1_name: String,
    pub bonus1_value: f64,
    pub bonus2_name: String,
    pub bonus2_value: f64,
    pub color: ItemColor,
    pub auction_ends: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemColor {
    Yellow,
    Orange,
    Red,
    Other(String),
}

impl ItemColor {
    pub const KNOWN: [ItemColor; 3] = [ItemColor::Yellow, ItemColor::Orange, ItemColor::Red];

    /// Exact, case-sensitive match on the sheet's color names.
    pub fn parse(s: &str) -> Self {
        match s {
            "Yellow" => ItemColor::Yellow,
            "Orange" => ItemColor::Orange,
            "Red" => ItemColor::Red,
            other => ItemColor::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ItemColor::Yellow => "Yellow",
            ItemColor::Orange => "Orange",
            ItemColor::Red => "Red",
            ItemColor::Other(s) => s,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            ItemColor::Yellow => 1,
            ItemColor::Orange => 2,
            ItemColor::Red => 3,
            ItemColor::Other(_) => 0,
        }
    }
}

impl Default for ItemColor {
    fn default() -> Self {
        ItemColor::Other(String::new())
    }
}

impl fmt::Display for ItemColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ItemColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Output columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    ItemName,
    ItemPrice,
    Quality,
    Accuracy,
    Damage,
    Defense,
    Bonus1Name,
    Bonus1Value,
    Bonus2Name,
    Bonus2Value,
    Color,
    AuctionEnds,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::ItemName,
        Column::ItemPrice,
        Column::Quality,
        Column::Accuracy,
        Column::Damage,
        Column::Defense,
        Column::Bonus1Name,
        Column::Bonus1Value,
        Column::Bonus2Name,
        Column::Bonus2Value,
        Column::Color,
        Column::AuctionEnds,
    ];

    /// Header name as it appears in the sheet.
    pub fn header(self) -> &'static str {
        match self {
            Column::ItemName => "ItemName",
            Column::ItemPrice => "ItemPrice",
            Column::Quality => "Quality",
            Column::Accuracy => "Accuracy",
            Column::Damage => "Damage",
            Column::Defense => "Defense",
            Column::Bonus1Name => "Bonus1Name",
            Column::Bonus1Value => "Bonus1Value",
            Column::Bonus2Name => "Bonus2Name",
            Column::Bonus2Value => "Bonus2Value",
            Column::Color => "Color",
            Column::AuctionEnds => "AuctionEnds",
        }
    }

    pub fn from_header(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.header() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortConfig {
    pub key: Option<Column>,
    pub direction: SortDirection,
}

impl SortConfig {
    /// Selecting the active ascending key flips it to descending; anything
    /// else selects `column` ascending.
    pub fn toggle(&mut self, column: Column) {
        self.direction = if self.key == Some(column) && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.key = Some(column);
    }
}

/// Active filter and sort configuration. Threshold and term inputs are kept
/// as typed so the UI can bind to them directly.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub name_filter: String,
    pub min_quality: String,
    pub min_accuracy: String,
    pub min_damage: String,
    pub min_defense: String,
    pub bonus1_filter: String,
    pub bonus1_min: String,
    pub bonus2_filter: String,
    pub bonus2_min: String,
    pub colors: BTreeSet<ItemColor>,
    pub sort: SortConfig,
}

impl QueryState {
    pub fn color_enabled(&self, color: &ItemColor) -> bool {
        self.colors.contains(color)
    }

    pub fn set_color_enabled(&mut self, color: ItemColor, enabled: bool) {
        if enabled {
            self.colors.insert(color);
        } else {
            self.colors.remove(&color);
        }
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            name_filter: String::new(),
            min_quality: String::new(),
            min_accuracy: String::new(),
            min_damage: String::new(),
            min_defense: String::new(),
            bonus1_filter: String::new(),
            bonus1_min: String::new(),
            bonus2_filter: String::new(),
            bonus2_min: String::new(),
            colors: ItemColor::KNOWN.into_iter().collect(),
            sort: SortConfig::default(),
        }
    }
}
