use crate::model::{Column, QueryState, Record, SortDirection};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Filter then sort `records` according to `query`. The input is untouched;
/// ties keep their original relative order.
pub fn evaluate(records: &[Record], query: &QueryState) -> Vec<Record> {
    let filter = Filter::new(query);
    let filtered = records.iter().filter(|r| filter.matches(r));

    let Some(key) = query.sort.key else {
        return filtered.cloned().collect();
    };

    let mut keyed: Vec<(SortValue, &Record)> =
        filtered.map(|r| (sort_value(r, key), r)).collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ord = a.cmp(b);
        match query.sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });

    keyed.into_iter().map(|(_, r)| r.clone()).collect()
}

/// Distinct non-empty bonus names from both slots, sorted.
pub fn bonus_names(records: &[Record]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for r in records {
        for name in [&r.bonus1_name, &r.bonus2_name] {
            if !name.is_empty() {
                names.insert(name.clone());
            }
        }
    }
    names.into_iter().collect()
}

/// Parsed form of the query's text inputs.
struct Filter<'a> {
    query: &'a QueryState,
    name_terms: Vec<String>,
    bonus1_terms: Vec<String>,
    bonus2_terms: Vec<String>,
    min_quality: Option<f64>,
    min_accuracy: Option<f64>,
    min_damage: Option<f64>,
    min_defense: Option<f64>,
    bonus1_min: Option<f64>,
    bonus2_min: Option<f64>,
}

impl<'a> Filter<'a> {
    fn new(query: &'a QueryState) -> Self {
        Self {
            query,
            name_terms: terms(&query.name_filter),
            bonus1_terms: terms(&query.bonus1_filter),
            bonus2_terms: terms(&query.bonus2_filter),
            min_quality: threshold(&query.min_quality),
            min_accuracy: threshold(&query.min_accuracy),
            min_damage: threshold(&query.min_damage),
            min_defense: threshold(&query.min_defense),
            bonus1_min: threshold(&query.bonus1_min),
            bonus2_min: threshold(&query.bonus2_min),
        }
    }

    fn matches(&self, r: &Record) -> bool {
        any_term(&self.name_terms, &r.item_name)
            && at_least(r.quality, self.min_quality)
            && at_least(r.accuracy, self.min_accuracy)
            && at_least(r.damage, self.min_damage)
            && at_least(r.defense, self.min_defense)
            && any_term(&self.bonus1_terms, &r.bonus1_name)
            && any_term(&self.bonus2_terms, &r.bonus2_name)
            && at_least(r.bonus1_value, self.bonus1_min)
            && at_least(r.bonus2_value, self.bonus2_min)
            && self.query.color_enabled(&r.color)
    }
}

/// Comma-separated OR terms, trimmed and lowercased.
fn terms(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn any_term(terms: &[String], value: &str) -> bool {
    if terms.is_empty() {
        return true;
    }
    let value = value.to_lowercase();
    terms.iter().any(|t| value.contains(t.as_str()))
}

/// Blank input means no constraint. Anything else that is not a number
/// becomes NaN, which no record reaches.
fn threshold(input: &str) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    Some(s.parse::<f64>().unwrap_or(f64::NAN))
}

fn at_least(value: f64, min: Option<f64>) -> bool {
    min.is_none_or(|m| value >= m)
}

#[derive(Debug, PartialEq)]
enum SortValue {
    Number(f64),
    Text(String),
    Rank(i64),
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Rank(a), SortValue::Rank(b)) => a.cmp(b),
            // a single key always yields one variant
            _ => Ordering::Equal,
        }
    }
}

fn sort_value(r: &Record, key: Column) -> SortValue {
    match key {
        Column::ItemName => SortValue::Text(r.item_name.clone()),
        Column::ItemPrice => SortValue::Number(r.item_price),
        Column::Quality => SortValue::Number(r.quality),
        Column::Accuracy => SortValue::Number(r.accuracy),
        Column::Damage => SortValue::Number(r.damage),
        Column::Defense => SortValue::Number(r.defense),
        Column::Bonus1Name => SortValue::Text(r.bonus1_name.clone()),
        Column::Bonus1Value => SortValue::Number(r.bonus1_value),
        Column::Bonus2Name => SortValue::Text(r.bonus2_name.clone()),
        Column::Bonus2Value => SortValue::Number(r.bonus2_value),
        Column::Color => SortValue::Rank(i64::from(r.color.rank())),
        Column::AuctionEnds => SortValue::Rank(auction_instant(&r.auction_ends)),
    }
}

/// Milliseconds since the Unix epoch for `HH:MM:SS - DD/MM/YY`, years in the
/// 2000s. Anything else is 0.
pub fn auction_instant(s: &str) -> i64 {
    parse_auction_ends(s).unwrap_or(0)
}

fn parse_auction_ends(s: &str) -> Option<i64> {
    let (time, date) = s.trim().split_once(" - ")?;

    let mut t = time.trim().split(':');
    let hour = two_digits(t.next()?)?;
    let min = two_digits(t.next()?)?;
    let sec = two_digits(t.next()?)?;
    if t.next().is_some() {
        return None;
    }

    let mut d = date.trim().split('/');
    let day = two_digits(d.next()?)?;
    let month = two_digits(d.next()?)?;
    let year = two_digits(d.next()?)?;
    if d.next().is_some() {
        return None;
    }

    let when = NaiveDate::from_ymd_opt(2000 + year as i32, month, day)?.and_hms_opt(hour, min, sec)?;
    Some(when.and_utc().timestamp_millis())
}

fn two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse;
    use crate::model::ItemColor;
    use rstest::rstest;

    fn item(name: &str, color: ItemColor) -> Record {
        Record {
            item_name: name.into(),
            color,
            ..Default::default()
        }
    }

    fn names(rows: &[Record]) -> Vec<&str> {
        rows.iter().map(|r| r.item_name.as_str()).collect()
    }

    fn sample() -> Vec<Record> {
        vec![
            Record { quality: 3.0, damage: 20.0, bonus1_name: "Critical Hit".into(), bonus1_value: 5.0, ..item("Iron Sword", ItemColor::Red) },
            Record { quality: 8.0, damage: 12.0, bonus2_name: "Fire Damage".into(), bonus2_value: 2.0, ..item("Battle Axe", ItemColor::Yellow) },
            Record { quality: 5.0, damage: 7.0, bonus1_name: "Lifesteal".into(), bonus1_value: 9.0, ..item("Short Bow", ItemColor::Orange) },
            Record { quality: 9.0, damage: 30.0, ..item("Great Sword", ItemColor::Other("Purple".into())) },
        ]
    }

    #[test]
    fn default_query_keeps_known_colors_in_order() {
        let rows = sample();
        let out = evaluate(&rows, &QueryState::default());
        assert_eq!(names(&out), ["Iron Sword", "Battle Axe", "Short Bow"]);
    }

    #[test]
    fn unknown_color_passes_once_enabled() {
        let mut q = QueryState::default();
        q.set_color_enabled(ItemColor::Other("Purple".into()), true);
        assert_eq!(evaluate(&sample(), &q).len(), 4);
    }

    #[rstest]
    #[case::or_terms("sword,axe", &["Iron Sword", "Battle Axe"])]
    #[case::case_folded("SWORD", &["Iron Sword"])]
    #[case::spaced_terms(" bow , nothing ", &["Short Bow"])]
    #[case::no_match("dagger", &[])]
    #[case::only_commas(",,", &["Iron Sword", "Battle Axe", "Short Bow"])]
    fn name_filter(#[case] filter: &str, #[case] expected: &[&str]) {
        let q = QueryState { name_filter: filter.into(), ..Default::default() };
        assert_eq!(names(&evaluate(&sample(), &q)), expected);
    }

    #[test]
    fn bonus_filters_match_their_own_slot() {
        let q = QueryState { bonus1_filter: "crit, life".into(), ..Default::default() };
        assert_eq!(names(&evaluate(&sample(), &q)), ["Iron Sword", "Short Bow"]);

        let q = QueryState { bonus2_filter: "fire".into(), bonus2_min: "2".into(), ..Default::default() };
        assert_eq!(names(&evaluate(&sample(), &q)), ["Battle Axe"]);

        let q = QueryState { bonus1_filter: "fire".into(), ..Default::default() };
        assert!(evaluate(&sample(), &q).is_empty());
    }

    #[test]
    fn bonus_minimum_value() {
        let q = QueryState { bonus1_min: "6".into(), ..Default::default() };
        assert_eq!(names(&evaluate(&sample(), &q)), ["Short Bow"]);
    }

    #[rstest]
    #[case::blank("", 3)]
    #[case::whitespace("   ", 3)]
    #[case::unparsable("lots", 0)]
    #[case::inclusive("5", 2)]
    #[case::above_all("100", 0)]
    fn quality_threshold(#[case] min: &str, #[case] expected: usize) {
        let q = QueryState { min_quality: min.into(), ..Default::default() };
        assert_eq!(evaluate(&sample(), &q).len(), expected);
    }

    #[test]
    fn unparsable_thresholds_exclude_everything() {
        let rows = parse("ItemName,Quality,Bonus2Value,Color\nSword,10,4,Red\nAxe,1,0,Red");
        let q = QueryState { min_quality: "abc".into(), ..Default::default() };
        assert!(evaluate(&rows, &q).is_empty());

        let q = QueryState { bonus2_min: "x1".into(), ..Default::default() };
        assert!(evaluate(&rows, &q).is_empty());

        let q = QueryState { min_quality: " ".into(), ..Default::default() };
        assert_eq!(evaluate(&rows, &q).len(), 2);
    }

    #[test]
    fn extra_threshold_never_grows_result() {
        let rows = sample();
        let base = QueryState { min_quality: "4".into(), ..Default::default() };
        let before = evaluate(&rows, &base).len();
        for (field, value) in [("accuracy", "1"), ("damage", "10"), ("defense", "0")] {
            let mut q = base.clone();
            match field {
                "accuracy" => q.min_accuracy = value.into(),
                "damage" => q.min_damage = value.into(),
                _ => q.min_defense = value.into(),
            }
            assert!(evaluate(&rows, &q).len() <= before);
        }
    }

    #[test]
    fn color_sort_is_stable() {
        let rows = vec![
            item("a", ItemColor::Red),
            item("b", ItemColor::Yellow),
            item("c", ItemColor::Orange),
            item("d", ItemColor::Yellow),
            item("e", ItemColor::Red),
            item("f", ItemColor::Orange),
        ];
        let mut q = QueryState::default();
        q.sort.toggle(Column::Color);
        assert_eq!(names(&evaluate(&rows, &q)), ["b", "d", "c", "f", "a", "e"]);

        q.sort.toggle(Column::Color);
        assert_eq!(names(&evaluate(&rows, &q)), ["a", "e", "c", "f", "b", "d"]);
    }

    #[test]
    fn numeric_and_text_sorts() {
        let mut q = QueryState::default();
        q.sort.toggle(Column::Damage);
        q.sort.toggle(Column::Damage);
        assert_eq!(names(&evaluate(&sample(), &q)), ["Iron Sword", "Battle Axe", "Short Bow"]);

        q.sort.toggle(Column::ItemName);
        assert_eq!(names(&evaluate(&sample(), &q)), ["Battle Axe", "Iron Sword", "Short Bow"]);
    }

    #[test]
    fn unparsable_auction_ends_sort_first() {
        let rows = vec![
            Record { auction_ends: "12:00:00 - 02/01/25".into(), ..item("late", ItemColor::Red) },
            Record { auction_ends: "soon".into(), ..item("bad", ItemColor::Red) },
            Record { auction_ends: "23:59:59 - 01/01/25".into(), ..item("early", ItemColor::Red) },
            Record { auction_ends: String::new(), ..item("blank", ItemColor::Red) },
        ];
        let mut q = QueryState::default();
        q.sort.toggle(Column::AuctionEnds);
        assert_eq!(names(&evaluate(&rows, &q)), ["bad", "blank", "early", "late"]);
    }

    #[rstest]
    #[case::valid("00:00:00 - 01/01/00", 946_684_800_000)]
    #[case::with_time("01:02:03 - 01/01/00", 946_684_800_000 + 3_723_000)]
    #[case::bad_month("10:00:00 - 01/13/24", 0)]
    #[case::bad_hour("24:00:00 - 01/01/24", 0)]
    #[case::four_digit_year("10:00:00 - 01/01/2024", 0)]
    #[case::no_separator("10:00:00 01/01/24", 0)]
    fn auction_instants(#[case] input: &str, #[case] expected: i64) {
        assert_eq!(auction_instant(input), expected);
    }

    #[test]
    fn evaluate_does_not_mutate_input() {
        let rows = sample();
        let copy = rows.clone();
        let mut q = QueryState::default();
        q.sort.toggle(Column::Quality);
        let _ = evaluate(&rows, &q);
        assert_eq!(rows, copy);
    }

    #[test]
    fn bonus_names_are_distinct_and_sorted() {
        let mut rows = sample();
        rows.push(Record { bonus2_name: "Critical Hit".into(), ..Default::default() });
        assert_eq!(bonus_names(&rows), ["Critical Hit", "Fire Damage", "Lifesteal"]);
    }

    #[test]
    fn end_to_end_min_quality_and_red() {
        let rows = parse("ItemName,ItemPrice,Quality,Color\nSword,5000,10,Red\nAxe,1500000,5,Yellow");
        let mut q = QueryState { min_quality: "6".into(), ..Default::default() };
        q.set_color_enabled(ItemColor::Yellow, false);
        q.set_color_enabled(ItemColor::Orange, false);
        let out = evaluate(&rows, &q);
        assert_eq!(names(&out), ["Sword"]);
        assert_eq!(crate::ui::format_price(out[0].item_price), "5k");
    }
}
