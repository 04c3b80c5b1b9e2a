// src/services/sections.rs
use super::format::{self, text_or_dash};
use super::layout::{palette, Bar, BarList, Color, Column, Font, PageBuilder, StatCard, Table, TextCard};
use super::report_data::{
    AffinitySignals, AiInsights, AllDepartments, DepartmentSellers, EstimatedMissedValue, LowCompetition,
    MissedButWinnable, PriceBand, ReportData, ReportMeta, RevenueRow, Section, SellerBids, Tally, ValueRange,
    WinRecord,
};

/// Draws one section if its block is present. Every section opens on a fresh
/// content page.
pub fn draw(section: Section, page: &mut PageBuilder, report: &ReportData) {
    let blocks = &report.blocks;
    let meta = &report.meta;
    match section {
        Section::MissedTenders => {
            if let Some(block) = &blocks.missed_but_winnable {
                missed_tenders(page, block, meta);
            }
        }
        Section::BuyerInsights => {
            if let Some(ai) = &blocks.ai {
                buyer_insights(page, ai);
            }
        }
        Section::MarketOverview => {
            if let Some(band) = &blocks.price_band {
                market_overview(page, band);
            }
        }
        Section::CategoryAnalysis => {
            if let Some(categories) = &blocks.categories {
                category_analysis(page, categories);
            }
        }
        Section::RivalryScore => {
            if let Some(departments) = &blocks.top_sellers {
                rivalry_score(page, departments, meta);
            }
        }
        Section::StatesAnalysis => {
            if let Some(states) = &blocks.top_states {
                states_analysis(page, states);
            }
        }
        Section::LowCompetition => {
            if let Some(block) = &blocks.low_competition {
                low_competition(page, block);
            }
        }
        Section::BidsSummary => {
            if let Some(block) = &blocks.seller_bids {
                bids_summary(page, block, meta);
            }
        }
        Section::EstimatedMissedValue => {
            if let Some(block) = &blocks.missed_value {
                estimated_missed_value(page, block);
            }
        }
        Section::DepartmentsAnalysis => {
            if let Some(block) = &blocks.all_departments {
                departments_analysis(page, block);
            }
        }
    }
}

fn missed_tenders(page: &mut PageBuilder, block: &MissedButWinnable, meta: &ReportMeta) {
    page.start_content_page();
    page.heading("Missed But Winnable - Market Intelligence", palette::NAVY);

    if block.recent_wins.is_empty() && block.market_wins.is_empty() {
        page.note("No missed-but-winnable tenders found in this window.");
        return;
    }

    if !block.recent_wins.is_empty() {
        page.subheading(&format!("Recent Wins by {}", text_or_dash(meta.seller_name.as_deref())));
        let rows = block
            .recent_wins
            .iter()
            .map(|w| {
                vec![
                    text_or_dash(w.bid_number.as_deref()),
                    text_or_dash(w.offered_item.as_deref()),
                    format::count(w.quantity),
                    format::currency(w.total_price),
                    text_or_dash(w.org.as_deref()),
                    text_or_dash(w.dept.as_deref()),
                    format::date(w.ended_at.as_deref()),
                ]
            })
            .collect();
        let table = Table::new(
            vec![
                Column::new("Bid Number", 24.0, 26),
                Column::new("Item", 62.0, 60),
                Column::new("Qty", 12.0, 10).right(),
                Column::new("Price", 24.0, 20).right(),
                Column::new("Organization", 32.0, 30),
                Column::new("Department", 36.0, 35),
                Column::new("End Date", 20.0, 11).center(),
            ],
            palette::NAVY,
        )
        .rows(rows);
        page.table(&table);
    }

    if !block.market_wins.is_empty() {
        page.subheading("Competitor Market Wins");
        let rows = block.market_wins.iter().map(market_win_row).collect();
        let table = Table::new(
            vec![
                Column::new("Bid", 23.0, 22),
                Column::new("Seller", 26.0, 24),
                Column::new("Item", 46.0, 46),
                Column::new("Qty", 10.0, 8).right(),
                Column::new("Price", 22.0, 20).right(),
                Column::new("Org", 30.0, 30),
                Column::new("Dept", 30.0, 30),
                Column::new("End", 18.0, 11).center(),
            ],
            palette::ORANGE,
        )
        .font_size(6.8)
        .rows(rows);
        page.table(&table);
    }
}

fn market_win_row(w: &WinRecord) -> Vec<String> {
    vec![
        text_or_dash(w.bid_number.as_deref()),
        text_or_dash(w.seller_name.as_deref()),
        text_or_dash(w.offered_item.as_deref()),
        format::count(w.quantity),
        format::currency(w.total_price),
        text_or_dash(w.org.as_deref()),
        text_or_dash(w.dept.as_deref()),
        format::date(w.ended_at.as_deref()),
    ]
}

fn buyer_insights(page: &mut PageBuilder, ai: &AiInsights) {
    page.start_content_page();
    page.heading("AI Strategy Summary", palette::BLUE);

    if let Some(summary) = &ai.strategy_summary {
        page.text_card(&TextCard::new(summary, palette::PANEL).border(palette::BLUE).min_height(36.0));
    }

    if !ai.likely_wins.is_empty() {
        page.subheading("Likely Wins - High Probability Opportunities");
    }
    for (index, win) in ai.likely_wins.iter().enumerate() {
        let title = format!("Opportunity {}: {}", index + 1, text_or_dash(win.offered_item.as_deref()));
        let body = format!("Win Probability Reason: {}", text_or_dash(win.reason.as_deref()));
        page.text_card(
            &TextCard::new(&body, palette::GREEN_TINT)
                .title(&title, palette::GREEN)
                .border(palette::GREEN)
                .min_height(20.0)
                .max_lines(6),
        );
        if win.matches.is_empty() {
            continue;
        }
        let rows = win
            .matches
            .iter()
            .map(|m| {
                let confidence = m.confidence.as_deref().or(win.confidence.as_deref());
                vec![
                    text_or_dash(m.bid_number.as_deref()),
                    text_or_dash(m.org.as_deref()),
                    text_or_dash(m.dept.as_deref()),
                    format::count(m.quantity),
                    format::currency(m.price_hint),
                    text_or_dash(confidence).to_uppercase(),
                ]
            })
            .collect();
        let table = Table::new(
            vec![
                Column::new("Bid Number", 44.0, 30),
                Column::new("Organization", 44.0, 40),
                Column::new("Department", 60.0, 40),
                Column::new("Qty", 18.0, 10).right(),
                Column::new("Price Hint", 28.0, 20).right(),
                Column::new("Confidence", 20.0, 10).center(),
            ],
            palette::GREEN,
        )
        .grid()
        .rows(rows);
        page.table(&table);
    }

    page.start_content_page();
    page.heading("Strategic Affinity Signals", palette::NAVY);
    affinity_signals(page, &ai.signals);

    page.start_content_page();
    page.heading("Strategic Roadmap & Action Items", palette::GREEN);
    let guidance = &ai.guidance;
    if guidance.note.is_none() && guidance.next_steps.is_empty() && guidance.expansion_areas.is_empty() {
        page.note("No guidance provided.");
        return;
    }
    if let Some(note) = &guidance.note {
        page.text_card(&TextCard::new(note, palette::AMBER_TINT).title("Guidance Note", palette::ORANGE));
    }
    if !guidance.next_steps.is_empty() {
        page.subheading("Next Steps - Action Plan");
        for (index, step) in guidance.next_steps.iter().enumerate() {
            let number = format!("{}.", index + 1);
            page.text_card(
                &TextCard::new(step, palette::GREEN_TINT)
                    .title(&number, palette::GREEN)
                    .border(palette::GREEN)
                    .min_height(16.0),
            );
        }
    }
    if !guidance.expansion_areas.is_empty() {
        page.subheading("Expansion Opportunities");
        for area in &guidance.expansion_areas {
            let body = format!("- {area}");
            page.text_card(&TextCard::new(&body, palette::BLUE_TINT));
        }
    }
}

fn affinity_signals(page: &mut PageBuilder, signals: &AffinitySignals) {
    let groups = [
        ("Organization Affinity", &signals.organizations),
        ("Department Affinity", &signals.departments),
        ("Ministry Affinity", &signals.ministries),
    ];
    for (title, entries) in groups {
        page.subheading(title);
        let bars = entries.iter().map(|a| Bar { label: a.name.clone(), value: a.wins }).collect();
        page.bar_list(&BarList::ranked(bars, 6, palette::NAVY));
    }

    page.subheading("Quantity & Price Range Patterns");
    let quantity = range_line("Quantity", signals.quantity_range, &signals.quantity_notes, format::count);
    let price = range_line("Price", signals.price_range, &signals.price_notes, format::currency);
    page.line(&quantity, 8.0, Font::Regular, palette::DARK_GRAY);
    page.line(&price, 8.0, Font::Regular, palette::DARK_GRAY);
}

fn range_line(label: &str, range: Option<ValueRange>, notes: &[String], show: fn(Option<f64>) -> String) -> String {
    match range {
        Some(r) => format!("{label} Range: {} to {}", show(r.min), show(r.max)),
        None if !notes.is_empty() => format!("{label} Ranges: {}", notes.join("; ")),
        None => format!("{label} Range: {} to {}", format::PLACEHOLDER, format::PLACEHOLDER),
    }
}

/// Sentence for the "Price Insights" card.
pub fn price_insight(band: &PriceBand) -> String {
    match (band.highest, band.lowest, band.average) {
        (Some(highest), Some(lowest), Some(average)) if average != 0.0 => {
            let range = highest - lowest;
            let variation = range / average * 100.0;
            format!(
                "Price range spans {} with {:.1}% variation from average. Target competitive pricing around {} to {} for optimal positioning.",
                format::currency(Some(range)),
                variation,
                format::currency(Some((lowest * 1.05).round())),
                format::currency(Some((average * 0.95).round())),
            )
        }
        _ => "Insufficient price data to compute meaningful insights.".to_string(),
    }
}

fn market_overview(page: &mut PageBuilder, band: &PriceBand) {
    page.start_content_page();
    page.heading("Price Band Analysis", palette::GREEN);

    let rows = vec![
        vec!["Highest Price".to_string(), format::currency(band.highest)],
        vec!["Average Price".to_string(), format::currency(band.average)],
        vec!["Lowest Price".to_string(), format::currency(band.lowest)],
    ];
    let table = Table::new(
        vec![Column::new("Price Category", 60.0, 30), Column::new("Amount", 122.0, 40).right()],
        palette::GREEN,
    )
    .grid()
    .font_size(8.0)
    .rows(rows);
    page.table(&table);

    let insight = price_insight(band);
    page.text_card(
        &TextCard::new(&insight, palette::BLUE_TINT)
            .title("Price Insights:", palette::BLUE)
            .border(palette::BLUE)
            .min_height(22.0),
    );
}

fn tally_bars(tallies: &[Tally]) -> Vec<Bar> {
    tallies.iter().map(|t| Bar { label: t.label.clone(), value: t.value }).collect()
}

fn category_analysis(page: &mut PageBuilder, categories: &[Tally]) {
    page.start_content_page();
    page.heading("Category-wise Tender Distribution", palette::NAVY);
    page.subheading("Tender Categories by Volume");
    page.bar_list(&BarList::ranked(tally_bars(categories), categories.len(), palette::NAVY));
}

fn rivalry_score(page: &mut PageBuilder, departments: &[DepartmentSellers], meta: &ReportMeta) {
    page.start_content_page();
    let department = text_or_dash(meta.department.as_deref());
    page.heading(&format!("Leading Competitors - {department}"), palette::ORANGE);

    if departments.is_empty() {
        page.note("No competitor data available.");
        return;
    }
    for block in departments {
        let name = text_or_dash(block.department.as_deref());
        let title = match block.total {
            Some(total) => format!("{name} ({} sellers)", format::count(Some(total))),
            None => name,
        };
        page.subheading(&title);

        let mut sellers: Vec<_> = block.sellers.iter().collect();
        sellers.sort_by(|a, b| b.participation_count.total_cmp(&a.participation_count));
        if sellers.is_empty() {
            page.note("No seller data available.");
            continue;
        }
        let rows = sellers
            .into_iter()
            .take(10)
            .enumerate()
            .map(|(position, seller)| {
                let rank = seller.rank.unwrap_or(position as u64 + 1);
                vec![
                    format::ordinal(rank),
                    text_or_dash(seller.seller_name.as_deref()),
                    format::count(Some(seller.participation_count)),
                ]
            })
            .collect();
        let table = Table::new(
            vec![
                Column::new("Rank", 18.0, 6).center(),
                Column::new("Seller Name", 120.0, 60),
                Column::new("Participation", 30.0, 14).right(),
            ],
            palette::ORANGE,
        )
        .rows(rows);
        page.table(&table);
    }
}

fn states_analysis(page: &mut PageBuilder, states: &[Tally]) {
    page.start_content_page();
    page.heading("Top Performing States by Tender Volume", palette::GREEN);
    page.subheading("State-wise Tender Distribution (Top 29)");
    page.bar_list(&BarList::ranked(tally_bars(states), 29, palette::GREEN));
}

fn low_competition(page: &mut PageBuilder, block: &LowCompetition) {
    page.start_content_page();
    page.heading("Low Competition Bids - Strategic Opportunities", palette::GREEN);

    let total = block.count.unwrap_or(block.bids.len() as f64);
    page.stat_cards(
        &[
            StatCard {
                label: "Total Low Competition Bids",
                value: format::count(Some(total)),
                accent: palette::GREEN,
                background: palette::GREEN_TINT,
            },
            StatCard {
                label: "Generated At",
                value: format::date(block.generated_at.as_deref()),
                accent: palette::DARK_GRAY,
                background: palette::GREEN_TINT,
            },
        ],
        12.0,
    );
    page.note("Note: \"-\" indicates data not available from source system. Low seller count indicates opportunity.");

    if block.bids.is_empty() {
        page.note("No low competition bids available.");
        return;
    }
    let rows = block
        .bids
        .iter()
        .take(25)
        .map(|b| {
            vec![
                text_or_dash(b.bid_number.as_deref()),
                format::count(b.quantity),
                text_or_dash(b.organisation.as_deref()),
                text_or_dash(b.department.as_deref()),
                text_or_dash(b.ministry.as_deref()),
                format::date(b.bid_end.as_deref()),
                format::count(b.seller_count),
            ]
        })
        .collect();
    let table = Table::new(
        vec![
            Column::new("Bid Number", 24.0, 23),
            Column::new("Qty", 11.0, 8).right(),
            Column::new("Organization", 33.0, 30),
            Column::new("Department", 32.0, 28),
            Column::new("Ministry", 28.0, 25),
            Column::new("Bid End Date", 20.0, 11).center(),
            Column::new("Sellers", 13.0, 6).center().tinted(|_| Some(palette::RED)),
        ],
        palette::GREEN,
    )
    .grid()
    .rows(rows);
    page.table(&table);
}

fn bid_status_tint(status: &str) -> Option<Color> {
    let status = status.to_ascii_lowercase();
    if status.contains("disqualified") {
        Some(palette::RED)
    } else if status.contains("qualified") {
        Some(palette::GREEN)
    } else {
        None
    }
}

fn bid_rank_tint(rank: &str) -> Option<Color> {
    if rank.eq_ignore_ascii_case("L1") {
        Some(palette::GREEN)
    } else if rank.eq_ignore_ascii_case("L2") {
        Some(palette::ORANGE)
    } else {
        None
    }
}

fn revenue_table(rows: &[RevenueRow], label: &'static str, widths: [f64; 3], fill: Color) -> Table {
    let body = rows
        .iter()
        .map(|r| vec![format::clean(&r.name), format::count(Some(r.bid_count)), format::currency(Some(r.revenue))])
        .collect();
    Table::new(
        vec![
            Column::new(label, widths[0], 50),
            Column::new("Bid Count", widths[1], 12).right(),
            Column::new("Revenue", widths[2], 22).right(),
        ],
        fill,
    )
    .rows(body)
}

fn by_revenue(rows: &[RevenueRow]) -> Vec<RevenueRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    sorted
}

fn bids_summary(page: &mut PageBuilder, block: &SellerBids, meta: &ReportMeta) {
    page.start_content_page();
    let seller = text_or_dash(meta.seller_name.as_deref());
    page.heading(&format!("{seller} - Bidding Performance Deep Dive"), palette::BLUE);

    let has_tables = !block.departments.is_empty() || !block.states.is_empty();
    if block.summary.is_none() && !has_tables && block.monthly.is_empty() && block.history.is_empty() {
        page.note("No bidding data available.");
        return;
    }

    if let Some(summary) = &block.summary {
        let win_rate = summary
            .win_rate()
            .map(|rate| format!("{rate:.1}%"))
            .unwrap_or_else(|| format::PLACEHOLDER.to_string());
        page.stat_cards(
            &[
                StatCard { label: "Total Wins", value: format::count(summary.wins), accent: palette::GREEN, background: palette::GREEN_TINT },
                StatCard { label: "Total Lost", value: format::count(summary.lost), accent: palette::RED, background: palette::RED_TINT },
                StatCard { label: "Win Rate", value: win_rate, accent: palette::NAVY, background: palette::BLUE_TINT },
            ],
            14.0,
        );
        page.stat_cards(
            &[
                StatCard {
                    label: "Total Bid Value",
                    value: format::currency(summary.total_bid_value),
                    accent: palette::ORANGE,
                    background: palette::AMBER_TINT,
                },
                StatCard {
                    label: "Qualified Bid Value",
                    value: format::currency(summary.qualified_bid_value),
                    accent: palette::GREEN,
                    background: palette::GREEN_TINT,
                },
                StatCard {
                    label: "Avg Order Value",
                    value: format::currency(summary.average_order_value),
                    accent: palette::PURPLE,
                    background: palette::PURPLE_TINT,
                },
            ],
            11.0,
        );
    }

    if !block.departments.is_empty() {
        page.subheading("Revenue by Department");
        let sorted = by_revenue(&block.departments);
        let mut table = revenue_table(&sorted, "Department", [120.0, 28.0, 36.0], palette::NAVY);
        let bids: f64 = sorted.iter().map(|r| r.bid_count).sum();
        let revenue: f64 = sorted.iter().map(|r| r.revenue).sum();
        table.rows.push(vec!["TOTAL".to_string(), format::count(Some(bids)), format::currency(Some(revenue))]);
        page.table(&table);
    }

    if !block.states.is_empty() {
        page.subheading("Bids by State");
        let mut sorted = by_revenue(&block.states);
        sorted.truncate(15);
        page.table(&revenue_table(&sorted, "State", [100.0, 28.0, 44.0], palette::GREEN).grid());
    }

    if !block.monthly.is_empty() {
        page.start_content_page();
        page.heading("Monthly Bidding Trends", palette::ORANGE);
        let rows = block
            .monthly
            .iter()
            .map(|m| vec![format::clean(&m.month), format::currency(m.bid_value)])
            .collect();
        let table = Table::new(
            vec![Column::new("Month", 50.0, 20), Column::new("Bid Value", 50.0, 24).right()],
            palette::ORANGE,
        )
        .rows(rows);
        page.table(&table);
    }

    if !block.history.is_empty() {
        page.start_content_page();
        page.heading("Bid-by-Bid Performance History", palette::BLUE);
        page.note("Note: \"-\" indicates data not available from source system");
        let rows = block
            .history
            .iter()
            .map(|h| {
                vec![
                    format::date(h.participated_on.as_deref()),
                    text_or_dash(h.offered_item.as_deref()),
                    text_or_dash(h.seller_status.as_deref()),
                    text_or_dash(h.rank.as_deref()),
                    format::currency(h.total_price),
                    text_or_dash(h.organisation.as_deref()),
                    text_or_dash(h.department.as_deref()),
                ]
            })
            .collect();
        let table = Table::new(
            vec![
                Column::new("Date", 20.0, 11).center(),
                Column::new("Item", 60.0, 50),
                Column::new("Status", 16.0, 14).center().tinted(bid_status_tint),
                Column::new("Rank", 12.0, 6).center().tinted(bid_rank_tint),
                Column::new("Price", 25.0, 20).right(),
                Column::new("Organization", 32.0, 30),
                Column::new("Department", 30.0, 28),
            ],
            palette::BLUE,
        )
        .rows(rows);
        page.table(&table);
    }
}

fn estimated_missed_value(page: &mut PageBuilder, block: &EstimatedMissedValue) {
    page.start_content_page();
    page.heading("Estimated Missed Value (EMV)", palette::SLATE);

    let window = block
        .days
        .map(|d| format!("{} days", format::count(Some(d))))
        .unwrap_or_else(|| format::PLACEHOLDER.to_string());
    page.stat_cards(
        &[
            StatCard { label: "Window", value: window, accent: palette::DARK_GRAY, background: palette::BACKGROUND_GRAY },
            StatCard {
                label: "Total Estimated Missed",
                value: format::currency(block.total),
                accent: palette::RED,
                background: palette::BACKGROUND_GRAY,
            },
        ],
        12.0,
    );

    if block.results.is_empty() {
        page.note("No missed-but-valuable tenders detected in this window.");
        return;
    }
    let rows = block
        .results
        .iter()
        .map(|r| {
            vec![
                text_or_dash(r.bid_number.as_deref()),
                text_or_dash(r.offered_item.as_deref()),
                text_or_dash(r.department.as_deref()),
                format::currency(r.estimated_value),
            ]
        })
        .collect();
    let table = Table::new(
        vec![
            Column::new("Bid Number", 40.0, 26),
            Column::new("Item", 70.0, 60),
            Column::new("Department", 44.0, 40),
            Column::new("Est. Value", 28.0, 20).right(),
        ],
        palette::SLATE,
    )
    .rows(rows);
    page.table(&table);
}

fn departments_analysis(page: &mut PageBuilder, block: &AllDepartments) {
    page.start_content_page();
    page.heading("All Departments - Tender Volume Overview", palette::NAVY);
    match block {
        AllDepartments::Unavailable { reason } => {
            let line = format!("Unavailable: {}", text_or_dash(reason.as_deref()));
            page.line(&line, 8.0, Font::Regular, palette::RED);
        }
        AllDepartments::Listed(list) if list.is_empty() => page.note("No department list found."),
        AllDepartments::Listed(list) => {
            page.subheading("Department-wise Tender Distribution (Top 20)");
            page.bar_list(&BarList::ranked(tally_bars(list), 20, palette::NAVY));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_insight_uses_band() {
        let band = PriceBand { highest: Some(1200.0), lowest: Some(800.0), average: Some(1000.0) };
        assert_eq!(
            price_insight(&band),
            "Price range spans Rs 400 with 40.0% variation from average. Target competitive pricing around Rs 840 to Rs 950 for optimal positioning."
        );
    }

    #[test]
    fn price_insight_needs_all_values() {
        let band = PriceBand { highest: Some(1200.0), lowest: None, average: Some(1000.0) };
        assert_eq!(price_insight(&band), "Insufficient price data to compute meaningful insights.");
        let zero_average = PriceBand { highest: Some(1.0), lowest: Some(1.0), average: Some(0.0) };
        assert_eq!(price_insight(&zero_average), "Insufficient price data to compute meaningful insights.");
    }

    #[test]
    fn status_and_rank_tints() {
        assert_eq!(bid_status_tint("Qualified"), Some(palette::GREEN));
        assert_eq!(bid_status_tint("DISQUALIFIED"), Some(palette::RED));
        assert_eq!(bid_status_tint("Pending"), None);
        assert_eq!(bid_rank_tint("l1"), Some(palette::GREEN));
        assert_eq!(bid_rank_tint("L2"), Some(palette::ORANGE));
        assert_eq!(bid_rank_tint("L3"), None);
    }

    #[test]
    fn ranges_fall_back_to_notes() {
        let line = range_line("Price", None, &["Rs 10 - Rs 20".to_string()], format::currency);
        assert_eq!(line, "Price Ranges: Rs 10 - Rs 20");
        let range = ValueRange { min: Some(5.0), max: None };
        assert_eq!(range_line("Quantity", Some(range), &[], format::count), "Quantity Range: 5 to -");
    }
}
