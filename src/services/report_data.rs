// src/services/report_data.rs
//
// Typed view of the analytics payload. `ReportData::from_value` is the only
// place that looks at raw JSON: it resolves legacy field names and shapes once,
// so the painter works on plain structs with explicit optionality.
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use super::format::{self, sanitize};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportData {
    pub meta: ReportMeta,
    pub blocks: ReportBlocks,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportMeta {
    pub generated_at: Option<String>,
    pub seller_name: Option<String>,
    pub department: Option<String>,
    pub offered_item: Option<String>,
    pub days: Option<f64>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportBlocks {
    pub missed_but_winnable: Option<MissedButWinnable>,
    pub ai: Option<AiInsights>,
    pub price_band: Option<PriceBand>,
    pub categories: Option<Vec<Tally>>,
    pub top_sellers: Option<Vec<DepartmentSellers>>,
    pub top_states: Option<Vec<Tally>>,
    pub all_departments: Option<AllDepartments>,
    pub low_competition: Option<LowCompetition>,
    pub seller_bids: Option<SellerBids>,
    pub missed_value: Option<EstimatedMissedValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WinRecord {
    pub bid_number: Option<String>,
    pub seller_name: Option<String>,
    pub offered_item: Option<String>,
    pub quantity: Option<f64>,
    pub total_price: Option<f64>,
    pub org: Option<String>,
    pub dept: Option<String>,
    pub ministry: Option<String>,
    pub ended_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissedButWinnable {
    pub recent_wins: Vec<WinRecord>,
    pub market_wins: Vec<WinRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketMatch {
    pub bid_number: Option<String>,
    pub org: Option<String>,
    pub dept: Option<String>,
    pub quantity: Option<f64>,
    pub price_hint: Option<f64>,
    pub confidence: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LikelyWin {
    pub offered_item: Option<String>,
    pub reason: Option<String>,
    pub confidence: Option<String>,
    pub matches: Vec<MarketMatch>,
}

/// A named count, e.g. wins with one organisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Affinity {
    pub name: String,
    pub wins: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffinitySignals {
    pub organizations: Vec<Affinity>,
    pub departments: Vec<Affinity>,
    pub ministries: Vec<Affinity>,
    pub quantity_range: Option<ValueRange>,
    pub price_range: Option<ValueRange>,
    pub quantity_notes: Vec<String>,
    pub price_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Guidance {
    pub note: Option<String>,
    pub next_steps: Vec<String>,
    pub expansion_areas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiInsights {
    pub strategy_summary: Option<String>,
    pub likely_wins: Vec<LikelyWin>,
    pub signals: AffinitySignals,
    pub guidance: Guidance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceBand {
    pub highest: Option<f64>,
    pub lowest: Option<f64>,
    pub average: Option<f64>,
}

/// Label plus volume; categories, states and departments all use it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedSeller {
    pub rank: Option<u64>,
    pub seller_name: Option<String>,
    pub participation_count: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepartmentSellers {
    pub department: Option<String>,
    pub total: Option<f64>,
    pub sellers: Vec<RankedSeller>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllDepartments {
    Unavailable { reason: Option<String> },
    Listed(Vec<Tally>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LowCompetitionBid {
    pub bid_number: Option<String>,
    pub quantity: Option<f64>,
    pub organisation: Option<String>,
    pub department: Option<String>,
    pub ministry: Option<String>,
    pub bid_end: Option<String>,
    pub seller_count: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LowCompetition {
    pub count: Option<f64>,
    pub generated_at: Option<String>,
    pub bids: Vec<LowCompetitionBid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BidSummary {
    pub wins: Option<f64>,
    pub lost: Option<f64>,
    pub total_bid_value: Option<f64>,
    pub qualified_bid_value: Option<f64>,
    pub average_order_value: Option<f64>,
}

impl BidSummary {
    /// Wins over decided bids, `None` when nothing was decided.
    pub fn win_rate(&self) -> Option<f64> {
        let wins = self.wins?;
        let lost = self.lost?;
        let decided = wins + lost;
        (decided > 0.0).then(|| wins / decided * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRow {
    pub name: String,
    pub bid_count: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    pub month: String,
    pub bid_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BidHistoryRow {
    pub participated_on: Option<String>,
    pub offered_item: Option<String>,
    pub seller_status: Option<String>,
    pub rank: Option<String>,
    pub total_price: Option<f64>,
    pub organisation: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SellerBids {
    pub summary: Option<BidSummary>,
    pub departments: Vec<RevenueRow>,
    pub states: Vec<RevenueRow>,
    pub monthly: Vec<MonthlyTotal>,
    pub history: Vec<BidHistoryRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissedValueItem {
    pub bid_number: Option<String>,
    pub offered_item: Option<String>,
    pub department: Option<String>,
    pub estimated_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimatedMissedValue {
    pub days: Option<f64>,
    pub total: Option<f64>,
    pub results: Vec<MissedValueItem>,
}

impl ReportData {
    /// Normalize a raw payload. Never fails: anything missing, null or of the
    /// wrong type becomes `None` or an empty list.
    pub fn from_value(root: &Value) -> Self {
        let data = root.get("data").unwrap_or(&Value::Null);
        Self {
            meta: meta(root),
            blocks: ReportBlocks {
                missed_but_winnable: object(data, &["missedButWinnable"]).map(missed_but_winnable),
                ai: ai_block(root, data),
                price_band: price_band(data),
                categories: categories(data),
                top_sellers: top_sellers(data),
                top_states: top_states(data),
                all_departments: field(data, &["allDepartments"]).and_then(all_departments),
                low_competition: field(data, &["lowCompetitionBids"]).and_then(low_competition),
                seller_bids: object(data, &["sellerBids"]).map(seller_bids),
                missed_value: object(data, &["estimatedMissedValue"]).map(missed_value),
            },
        }
    }
}

impl<'de> Deserialize<'de> for ReportData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|raw| Self::from_value(&raw))
    }
}

/// Toggleable document sections, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    MissedTenders,
    BuyerInsights,
    MarketOverview,
    CategoryAnalysis,
    RivalryScore,
    StatesAnalysis,
    LowCompetition,
    BidsSummary,
    EstimatedMissedValue,
    DepartmentsAnalysis,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::MissedTenders,
        Section::BuyerInsights,
        Section::MarketOverview,
        Section::CategoryAnalysis,
        Section::RivalryScore,
        Section::StatesAnalysis,
        Section::LowCompetition,
        Section::BidsSummary,
        Section::EstimatedMissedValue,
        Section::DepartmentsAnalysis,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Section::MissedTenders => "missedTenders",
            Section::BuyerInsights => "buyerInsights",
            Section::MarketOverview => "marketOverview",
            Section::CategoryAnalysis => "categoryAnalysis",
            Section::RivalryScore => "rivalryScore",
            Section::StatesAnalysis => "statesAnalysis",
            Section::LowCompetition => "lowCompetition",
            Section::BidsSummary => "bidsSummary",
            Section::EstimatedMissedValue => "estimatedMissedValue",
            Section::DepartmentsAnalysis => "departmentsAnalysis",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

/// Which sections to emit. Unknown keys are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFilter {
    sections: BTreeSet<Section>,
}

impl SectionFilter {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sections = BTreeSet::new();
        for key in keys {
            match Section::from_key(key.as_ref()) {
                Some(section) => {
                    sections.insert(section);
                }
                None => debug!(key = key.as_ref(), "ignoring unknown report section"),
            }
        }
        Self { sections }
    }

    pub fn all() -> Self {
        Self { sections: Section::ALL.into_iter().collect() }
    }

    pub fn includes(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }

    /// Included sections in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = Section> + '_ {
        self.sections.iter().copied()
    }
}

/// Section keys requested by the caller. Advisory: a missing or malformed
/// list means no sections, never a rejected request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub include_sections: Vec<String>,
}

impl FilterOptions {
    pub fn from_value(value: &Value) -> Self {
        let include_sections = match field(value, &["includeSections", "include_sections"]) {
            Some(Value::Array(keys)) => keys
                .iter()
                .filter_map(|key| match key {
                    Value::String(key) => Some(key.clone()),
                    other => {
                        debug!(key = %other, "ignoring non-string report section");
                        None
                    }
                })
                .collect(),
            Some(other) => {
                debug!(value = %other, "includeSections is not a list, ignoring it");
                Vec::new()
            }
            None => Vec::new(),
        };
        Self { include_sections }
    }
}

impl<'de> Deserialize<'de> for FilterOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|raw| Self::from_value(&raw))
    }
}

/// Deserializes any scalar as cleaned text; anything unusable becomes `None`.
pub fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Value::deserialize(deserializer).map(|raw| as_text(&raw))
}

impl From<&FilterOptions> for SectionFilter {
    fn from(options: &FilterOptions) -> Self {
        SectionFilter::from_keys(&options.include_sections)
    }
}

// ---------------------------------------------------------------------------
// raw JSON access

fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| value.get(*k)).find(|v| !v.is_null())
}

fn path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .try_fold(value, |v, k| v.get(*k))
        .filter(|v| !v.is_null())
}

fn object<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    field(value, keys).filter(|v| v.is_object())
}

fn number(value: &Value, keys: &[&str]) -> Option<f64> {
    field(value, keys).and_then(as_number)
}

fn text(value: &Value, keys: &[&str]) -> Option<String> {
    field(value, keys).and_then(as_text)
}

/// Array items, or the values of an object used as a list.
fn items(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(list)) => list.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => Vec::new(),
    }
}

fn records(value: Option<&Value>) -> Vec<&Value> {
    items(value).into_iter().filter(|v| v.is_object()).collect()
}

/// Strings from either a list or a single scalar.
fn notes(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(list)) => list.iter().filter_map(as_text).collect(),
        Some(other) => as_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

pub fn as_text(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(list) => list.iter().filter_map(as_text).collect::<Vec<_>>().join(", "),
        Value::Object(_) => return value_range(value).map(|r| r.describe()),
        Value::Null => return None,
    };
    let cleaned = sanitize(&raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

fn value_range(value: &Value) -> Option<ValueRange> {
    let range = ValueRange {
        min: number(value, &["min", "from"]),
        max: number(value, &["max", "to"]),
    };
    (range.min.is_some() || range.max.is_some()).then_some(range)
}

impl ValueRange {
    pub fn describe(&self) -> String {
        format!("{}-{}", format::count(self.min), format::count(self.max))
    }
}

// ---------------------------------------------------------------------------
// blocks

fn meta(root: &Value) -> ReportMeta {
    let meta = root.get("meta").unwrap_or(&Value::Null);
    let params = field(meta, &["params_used", "params"]).unwrap_or(&Value::Null);
    ReportMeta {
        generated_at: text(meta, &["report_generated_at", "generated_at"]),
        seller_name: text(params, &["sellerName", "seller_name"]),
        department: text(params, &["department", "dept"]),
        offered_item: text(params, &["offeredItem", "offered_item"]),
        days: number(params, &["days"]),
        email: text(params, &["email", "userEmail"]),
    }
}

fn win_record(v: &Value) -> WinRecord {
    WinRecord {
        bid_number: text(v, &["bid_number", "bidNumber"]),
        seller_name: text(v, &["seller_name", "seller"]),
        offered_item: text(v, &["offered_item", "item"]),
        quantity: number(v, &["quantity", "qty"]),
        total_price: number(v, &["total_price", "price"]),
        org: text(v, &["org", "organisation", "organization"]),
        dept: text(v, &["dept", "department"]),
        ministry: text(v, &["ministry"]),
        ended_at: text(v, &["ended_at", "bid_end_ts", "end_date"]),
    }
}

fn missed_but_winnable(v: &Value) -> MissedButWinnable {
    MissedButWinnable {
        recent_wins: records(field(v, &["recentWins", "recent_wins"])).into_iter().map(win_record).collect(),
        market_wins: records(field(v, &["marketWins", "market_wins"])).into_iter().map(win_record).collect(),
    }
}

fn ai_block(root: &Value, data: &Value) -> Option<AiInsights> {
    let ai = path(data, &["missedButWinnable", "ai"])
        .or_else(|| field(data, &["ai"]))
        .or_else(|| field(root, &["ai"]))
        .filter(|v| v.as_object().is_some_and(|map| !map.is_empty()))?;
    let signals = field(ai, &["signals"]).unwrap_or(&Value::Null);
    let guidance = field(ai, &["guidance"]).unwrap_or(&Value::Null);

    Some(AiInsights {
        strategy_summary: text(ai, &["strategy_summary", "summary"]),
        likely_wins: records(field(ai, &["likely_wins"])).into_iter().map(likely_win).collect(),
        signals: AffinitySignals {
            organizations: affinities(signals, &["org_affinity", "orgs"], &["org_name", "org", "organisation", "name"]),
            departments: affinities(signals, &["dept_affinity", "depts"], &["dept_name", "dept", "department", "name"]),
            ministries: affinities(signals, &["ministry_affinity", "ministries"], &["ministry_name", "ministry", "name"]),
            quantity_range: field(signals, &["quantity_range"]).and_then(value_range),
            price_range: field(signals, &["price_range"]).and_then(value_range),
            quantity_notes: notes(field(signals, &["quantity_ranges"])),
            price_notes: notes(field(signals, &["price_ranges"])),
        },
        guidance: Guidance {
            note: text(guidance, &["note"]),
            next_steps: notes(field(guidance, &["next_steps"])),
            expansion_areas: notes(field(guidance, &["expansion_areas"])),
        },
    })
}

fn likely_win(v: &Value) -> LikelyWin {
    let mut matches: Vec<MarketMatch> = records(field(v, &["matching_market_wins"]))
        .into_iter()
        .map(|m| market_match(m, None))
        .collect();
    // older payloads nest each match one level down
    for opportunity in records(field(v, &["potential_opportunities"])) {
        if let Some(m) = object(opportunity, &["matching_market_win"]) {
            matches.push(market_match(m, text(opportunity, &["confidence"])));
        }
    }
    LikelyWin {
        offered_item: text(v, &["offered_item", "item"]),
        reason: text(v, &["reason"]),
        confidence: text(v, &["confidence"]),
        matches,
    }
}

fn market_match(v: &Value, confidence: Option<String>) -> MarketMatch {
    MarketMatch {
        bid_number: text(v, &["bid_number"]),
        org: text(v, &["org", "organisation", "organization"]),
        dept: text(v, &["dept", "department"]),
        quantity: number(v, &["quantity", "qty"]),
        price_hint: number(v, &["price_hint", "total_price"]),
        confidence: text(v, &["confidence"]).or(confidence),
    }
}

fn affinities(signals: &Value, keys: &[&str], name_keys: &[&str]) -> Vec<Affinity> {
    let entries = match field(signals, keys) {
        Some(Value::Object(map)) if map.contains_key("list") => map.get("list"),
        other => other,
    };
    let parsed: Vec<Affinity> = match entries {
        Some(Value::Array(list)) => list.iter().filter_map(|e| affinity_entry(e, name_keys)).collect(),
        // `{name: count}` maps
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, count)| Affinity { name: format::clean(name), wins: as_number(count).unwrap_or(0.0) })
            .collect(),
        _ => Vec::new(),
    };
    parsed.into_iter().filter(|a| a.wins >= 0.0).collect()
}

fn affinity_entry(entry: &Value, name_keys: &[&str]) -> Option<Affinity> {
    match entry {
        Value::Object(_) => Some(Affinity {
            name: text(entry, name_keys).unwrap_or_else(|| format::PLACEHOLDER.to_string()),
            wins: number(entry, &["wins", "win_count", "count", "frequency"]).unwrap_or(0.0),
        }),
        Value::String(_) => as_text(entry).map(|name| Affinity { name, wins: 0.0 }),
        _ => None,
    }
}

fn price_band(data: &Value) -> Option<PriceBand> {
    let band = path(data, &["priceBand", "analysis"])
        .filter(|v| v.is_object())
        .or_else(|| object(data, &["priceBand"]))?;
    Some(PriceBand {
        highest: number(band, &["highest", "max"]),
        lowest: number(band, &["lowest", "min"]),
        average: number(band, &["average", "avg", "mean"]),
    })
}

fn tally(v: &Value, label_keys: &[&str], value_keys: &[&str]) -> Tally {
    Tally {
        label: text(v, label_keys).unwrap_or_else(|| format::PLACEHOLDER.to_string()),
        value: number(v, value_keys).unwrap_or(0.0),
    }
}

fn categories(data: &Value) -> Option<Vec<Tally>> {
    let listing = field(data, &["categoryListing"])?;
    let entries = match listing {
        Value::Array(_) => Some(listing),
        _ => field(listing, &["categories"]),
    };
    Some(
        records(entries)
            .into_iter()
            .map(|c| tally(c, &["category", "name"], &["times", "count"]))
            .collect(),
    )
}

fn top_sellers(data: &Value) -> Option<Vec<DepartmentSellers>> {
    let ts = field(data, &["topSellersByDept"])?;
    let departments = match ts {
        Value::Array(_) => records(Some(ts)),
        _ if field(ts, &["departments"]).is_some() => records(field(ts, &["departments"])),
        // single-department payloads
        Value::Object(_) => vec![ts],
        _ => Vec::new(),
    };
    Some(departments.into_iter().map(department_sellers).collect())
}

fn department_sellers(v: &Value) -> DepartmentSellers {
    DepartmentSellers {
        department: text(v, &["department", "dept"]),
        total: number(v, &["total"]),
        sellers: records(field(v, &["results", "sellers"]))
            .into_iter()
            .map(|s| RankedSeller {
                rank: number(s, &["rank"]).filter(|r| *r >= 1.0).map(|r| r as u64),
                seller_name: text(s, &["seller_name", "seller"]),
                participation_count: number(s, &["participation_count", "count"]).unwrap_or(0.0),
            })
            .collect(),
    }
}

fn top_states(data: &Value) -> Option<Vec<Tally>> {
    let block = field(data, &["topPerformingStates"])?;
    let entries = match block {
        Value::Array(_) => Some(block),
        _ => path(block, &["data", "results"]).or_else(|| field(block, &["results"])),
    };
    Some(
        records(entries)
            .into_iter()
            .map(|s| tally(s, &["state_name", "state"], &["total_tenders", "count"]))
            .collect(),
    )
}

fn all_departments(block: &Value) -> Option<AllDepartments> {
    let entries = match block {
        Value::Array(_) => Some(block),
        Value::Object(_) => {
            let failed = field(block, &["error"]).is_some_and(|e| !matches!(e, Value::Bool(false)));
            if failed {
                return Some(AllDepartments::Unavailable { reason: text(block, &["reason", "message"]) });
            }
            field(block, &["results"])
        }
        _ => return None,
    };
    Some(AllDepartments::Listed(
        records(entries)
            .into_iter()
            .map(|d| tally(d, &["department", "name"], &["total_tenders", "count"]))
            .collect(),
    ))
}

fn low_competition(block: &Value) -> Option<LowCompetition> {
    let (rows, count, generated_at) = match block {
        Value::Array(_) => (Some(block), None, None),
        Value::Object(_) => (
            field(block, &["results"]),
            number(block, &["count"]),
            text(block, &["generated_at"]),
        ),
        _ => return None,
    };
    Some(LowCompetition {
        count,
        generated_at,
        bids: records(rows)
            .into_iter()
            .map(|b| LowCompetitionBid {
                bid_number: text(b, &["bid_number"]),
                quantity: number(b, &["quantity", "qty"]),
                organisation: text(b, &["organisation", "org", "organization"]),
                department: text(b, &["department", "dept"]),
                ministry: text(b, &["ministry"]),
                bid_end: text(b, &["bid_end_ts", "ended_at"]),
                seller_count: number(b, &["seller_count"]),
            })
            .collect(),
    })
}

fn seller_bids(sb: &Value) -> SellerBids {
    let summary = object(sb, &["table1", "summary"]).map(|t| BidSummary {
        wins: number(t, &["win", "wins", "win_count"]),
        lost: number(t, &["lost", "losses", "lost_count"]),
        total_bid_value: number(t, &["totalBidValue", "total_bid_value"]),
        qualified_bid_value: number(t, &["qualifiedBidValue", "qualified_bid_value"]),
        average_order_value: number(t, &["averageOrderValue", "average_order_value"]),
    });
    SellerBids {
        summary,
        departments: revenue_rows(field(sb, &["departmentCount"]), "departmentCount", "revenue", &["department", "name"]),
        states: revenue_rows(field(sb, &["stateCount"]), "stateCounts", "stateRevenue", &["state", "name"]),
        monthly: monthly_totals(field(sb, &["monthlyTotals"])),
        history: records(field(sb, &["sortedRows", "rows"]))
            .into_iter()
            .map(|r| BidHistoryRow {
                participated_on: text(r, &["participated_on", "date"]),
                offered_item: text(r, &["offered_item", "item"]),
                seller_status: text(r, &["seller_status", "status"]),
                rank: text(r, &["rank"]),
                total_price: number(r, &["total_price", "price"]),
                organisation: text(r, &["organisation", "org", "organization"]),
                department: text(r, &["department", "dept"]),
            })
            .collect(),
    }
}

/// Rows either arrive as `[{name, bid_count, revenue}]` or as two parallel
/// maps keyed by name.
fn revenue_rows(value: Option<&Value>, count_key: &str, revenue_key: &str, name_keys: &[&str]) -> Vec<RevenueRow> {
    match value {
        Some(Value::Array(rows)) => rows
            .iter()
            .filter(|r| r.is_object())
            .map(|r| RevenueRow {
                name: text(r, name_keys).unwrap_or_else(|| format::PLACEHOLDER.to_string()),
                bid_count: number(r, &["bid_count", "count", "bids"]).unwrap_or(0.0),
                revenue: number(r, &["revenue"]).unwrap_or(0.0),
            })
            .collect(),
        Some(maps @ Value::Object(_)) => {
            let counts = field(maps, &[count_key]).and_then(Value::as_object);
            let revenue = field(maps, &[revenue_key]).and_then(Value::as_object);
            let mut names: Vec<&String> = Vec::new();
            for name in counts.into_iter().chain(revenue).flat_map(|m| m.keys()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            names
                .into_iter()
                .map(|name| RevenueRow {
                    name: format::clean(name),
                    bid_count: counts.and_then(|m| m.get(name)).and_then(as_number).unwrap_or(0.0),
                    revenue: revenue.and_then(|m| m.get(name)).and_then(as_number).unwrap_or(0.0),
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

fn monthly_totals(value: Option<&Value>) -> Vec<MonthlyTotal> {
    match value {
        Some(Value::Array(rows)) => rows
            .iter()
            .filter(|r| r.is_object())
            .map(|r| MonthlyTotal {
                month: text(r, &["month", "label"]).unwrap_or_else(|| format::PLACEHOLDER.to_string()),
                bid_value: number(r, &["bid_value", "value"]),
            })
            .collect(),
        Some(series @ Value::Object(_)) => {
            let labels = items(field(series, &["labels"]));
            let values = items(field(series, &["values"]));
            labels
                .iter()
                .enumerate()
                .map(|(i, label)| MonthlyTotal {
                    month: as_text(label).unwrap_or_else(|| format::PLACEHOLDER.to_string()),
                    bid_value: values.get(i).and_then(|v| as_number(v)),
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

fn missed_value(v: &Value) -> EstimatedMissedValue {
    EstimatedMissedValue {
        days: number(v, &["days"]),
        total: number(v, &["total"]),
        results: records(field(v, &["results"]))
            .into_iter()
            .map(|r| MissedValueItem {
                bid_number: text(r, &["bid_number"]),
                offered_item: text(r, &["offered_item", "item"]),
                department: text(r, &["department", "dept"]),
                estimated_value: number(r, &["estimated_value", "value", "total_price"]),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_blocks_normalize_to_none() {
        let report = ReportData::from_value(&json!({ "meta": {}, "data": {} }));
        assert_eq!(report.blocks, ReportBlocks::default());
        let report = ReportData::from_value(&json!("not even an object"));
        assert_eq!(report, ReportData::default());
    }

    #[test]
    fn meta_fields_are_read_from_params() {
        let report = ReportData::from_value(&json!({
            "meta": {
                "report_generated_at": "2024-05-01T10:00:00Z",
                "params_used": { "sellerName": "  Acme\u{2019}s  Ltd ", "department": "Defence", "days": "30" }
            }
        }));
        assert_eq!(report.meta.seller_name.as_deref(), Some("Acme's Ltd"));
        assert_eq!(report.meta.days, Some(30.0));
        assert_eq!(report.meta.offered_item, None);
    }

    #[test]
    fn wrong_types_become_none() {
        let report = ReportData::from_value(&json!({
            "data": { "priceBand": { "highest": "abc", "lowest": null, "average": [1, 2] } }
        }));
        assert_eq!(report.blocks.price_band, Some(PriceBand::default()));
    }

    #[test]
    fn affinity_aliases_resolve() {
        let report = ReportData::from_value(&json!({
            "data": { "missedButWinnable": { "ai": { "signals": {
                "org_affinity": [ { "org": "Org A", "win_count": 4 }, { "name": "Org B", "frequency": "2" } ],
                "dept_affinity": { "Dept X": 3, "Dept Y": "1" },
                "ministries": [ { "ministry_name": "Ministry Z", "wins": 5 } ],
                "quantity_range": { "from": 10, "to": 500 },
                "price_ranges": ["Rs 100 - Rs 200"]
            } } } }
        }));
        let signals = report.blocks.ai.expect("ai block").signals;
        assert_eq!(signals.organizations, vec![
            Affinity { name: "Org A".into(), wins: 4.0 },
            Affinity { name: "Org B".into(), wins: 2.0 },
        ]);
        assert_eq!(signals.departments.len(), 2);
        assert_eq!(signals.ministries[0].wins, 5.0);
        assert_eq!(signals.quantity_range, Some(ValueRange { min: Some(10.0), max: Some(500.0) }));
        assert_eq!(signals.price_notes, vec!["Rs 100 - Rs 200".to_string()]);
    }

    #[test]
    fn ai_block_is_found_at_any_supported_path() {
        let nested = ReportData::from_value(&json!({ "data": { "ai": { "strategy_summary": "x" } } }));
        assert!(nested.blocks.ai.is_some());
        let root = ReportData::from_value(&json!({ "ai": { "strategy_summary": "x" } }));
        assert!(root.blocks.ai.is_some());
        let empty = ReportData::from_value(&json!({ "data": { "ai": {} } }));
        assert!(empty.blocks.ai.is_none());
    }

    #[test]
    fn legacy_potential_opportunities_become_matches() {
        let report = ReportData::from_value(&json!({ "data": { "ai": { "likely_wins": [ {
            "offered_item": "Laptops",
            "potential_opportunities": [ { "confidence": "high", "matching_market_win": { "bid_number": "GEM/1", "org": "Org" } } ]
        } ] } } }));
        let win = &report.blocks.ai.expect("ai").likely_wins[0];
        assert_eq!(win.matches.len(), 1);
        assert_eq!(win.matches[0].confidence.as_deref(), Some("high"));
    }

    #[test]
    fn seller_bid_maps_and_rows_both_work() {
        let maps = ReportData::from_value(&json!({ "data": { "sellerBids": {
            "departmentCount": { "departmentCount": { "A": 2, "B": 1 }, "revenue": { "A": 500, "C": 100 } },
            "monthlyTotals": { "labels": ["Jan", "Feb"], "values": [100, "200"] }
        } } }));
        let sb = maps.blocks.seller_bids.expect("seller bids");
        let names: Vec<&str> = sb.departments.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(sb.departments[2].bid_count, 0.0);
        assert_eq!(sb.monthly[1].bid_value, Some(200.0));

        let rows = ReportData::from_value(&json!({ "data": { "sellerBids": {
            "stateCount": [ { "state": "Kerala", "bid_count": 3, "revenue": 900 } ]
        } } }));
        let sb = rows.blocks.seller_bids.expect("seller bids");
        assert_eq!(sb.states, vec![RevenueRow { name: "Kerala".into(), bid_count: 3.0, revenue: 900.0 }]);
    }

    #[test]
    fn win_rate_needs_decided_bids() {
        let summary = BidSummary { wins: Some(7.0), lost: Some(3.0), ..Default::default() };
        assert_eq!(summary.win_rate(), Some(70.0));
        let none = BidSummary { wins: Some(0.0), lost: Some(0.0), ..Default::default() };
        assert_eq!(none.win_rate(), None);
    }

    #[test]
    fn departments_block_reports_unavailability() {
        let report = ReportData::from_value(&json!({ "data": { "allDepartments": { "error": true, "reason": "timeout" } } }));
        assert_eq!(
            report.blocks.all_departments,
            Some(AllDepartments::Unavailable { reason: Some("timeout".into()) })
        );
    }

    #[test]
    fn filter_ignores_unknown_keys() {
        let filter = SectionFilter::from_keys(["bidsSummary", "nope", "missedTenders"]);
        assert!(filter.includes(Section::BidsSummary));
        assert!(!filter.includes(Section::StatesAnalysis));
        let order: Vec<Section> = filter.iter().collect();
        assert_eq!(order, [Section::MissedTenders, Section::BidsSummary]);
    }

    #[test]
    fn filter_options_tolerate_bad_shapes() {
        let parsed: FilterOptions = serde_json::from_value(json!({ "includeSections": ["bidsSummary", 7, null] })).unwrap();
        assert_eq!(parsed.include_sections, ["bidsSummary"]);

        for raw in [json!(null), json!({ "includeSections": null }), json!({ "includeSections": "bidsSummary" })] {
            let parsed: FilterOptions = serde_json::from_value(raw).unwrap();
            assert!(parsed.include_sections.is_empty());
        }
    }
}
