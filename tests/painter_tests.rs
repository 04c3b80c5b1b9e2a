use serde_json::{Value, json};
use tender_report::services::layout::{palette, DrawOp, PageKind, CONTENT_TOP, MARGIN};
use tender_report::services::painter::{generate_document, REPORT_TITLE};
use tender_report::services::report_data::{ReportData, Section, SectionFilter};

const BAR_X: f64 = MARGIN + 70.0 + 18.0 + 4.0;

fn meta() -> Value {
    json!({
        "report_generated_at": "2024-05-01T10:00:00Z",
        "params_used": { "sellerName": "Acme Supplies", "offeredItem": "Laptops, Printers", "days": 90 }
    })
}

fn report(data: Value) -> ReportData {
    ReportData::from_value(&json!({ "meta": meta(), "data": data }))
}

fn full_data() -> Value {
    json!({
        "missedButWinnable": {
            "recentWins": [ { "bid_number": "GEM/2024/B/1", "offered_item": "Laptop", "quantity": 10, "total_price": 550000, "org": "Org", "dept": "Dept", "ended_at": "2024-03-05" } ],
            "marketWins": [],
            "ai": {
                "strategy_summary": "Focus on defence laptops.",
                "likely_wins": [ { "offered_item": "Laptop", "reason": "Past wins", "confidence": "high",
                    "matching_market_wins": [ { "bid_number": "GEM/9", "org": "Army", "dept": "Defence", "quantity": 5, "price_hint": 90000 } ] } ],
                "signals": { "org_affinity": [ { "org_name": "Army", "wins": 3 } ] },
                "guidance": { "note": "Bid early", "next_steps": ["Register"], "expansion_areas": ["Tablets"] }
            }
        },
        "priceBand": { "analysis": { "highest": 1200, "lowest": 800, "average": 1000 } },
        "categoryListing": { "categories": [ { "category": "Laptops", "times": 40 }, { "category": "Printers", "times": 12 } ] },
        "topSellersByDept": { "departments": [ { "department": "Defence", "total": 3, "results": [
            { "seller_name": "Beta", "participation_count": 4 },
            { "seller_name": "Alpha", "participation_count": 9 },
            { "seller_name": "Gamma", "participation_count": 1 }
        ] } ] },
        "topPerformingStates": { "data": { "results": [ { "state_name": "Kerala", "total_tenders": 30 } ] } },
        "allDepartments": [ { "department": "Defence", "total_tenders": 12 } ],
        "lowCompetitionBids": { "count": 1, "generated_at": "2024-05-01", "results": [ { "bid_number": "GEM/5", "seller_count": 1 } ] },
        "sellerBids": { "table1": { "win": 7, "lost": 3, "totalBidValue": 1234567 } },
        "estimatedMissedValue": { "days": 30, "total": 50000, "results": [] }
    })
}

#[test]
fn absent_blocks_leave_only_the_cover() {
    let doc = generate_document(&report(json!({})), &SectionFilter::all());
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.pages[0].kind, PageKind::Cover);
    assert!(doc.contains_text("GOVERNMENT"));
    assert!(doc.contains_text("Acme Supplies"));
    assert!(doc.contains_text("Department: All"));
    assert!(doc.contains_text("Analysis Period: 90 days"));
    assert!(doc.contains_text("Report Generated: 01-May-2024"));
}

#[test]
fn empty_filter_leaves_only_the_cover() {
    let doc = generate_document(&report(full_data()), &SectionFilter::from_keys(Vec::<String>::new()));
    assert_eq!(doc.page_count(), 1);
}

#[test]
fn unknown_and_absent_sections_add_no_pages() {
    let data = report(json!({ "priceBand": { "highest": 1, "lowest": 1, "average": 1 } }));
    let doc = generate_document(&data, &SectionFilter::from_keys(["bogus", "bidsSummary"]));
    assert_eq!(doc.page_count(), 1);
}

#[test]
fn sections_follow_fixed_order() {
    let keys: Vec<&str> = Section::ALL.iter().rev().map(|s| s.key()).collect();
    let doc = generate_document(&report(full_data()), &SectionFilter::from_keys(keys));
    let texts = doc.texts();
    let position = |needle: &str| texts.iter().position(|t| *t == needle).unwrap();

    assert!(position("Missed But Winnable - Market Intelligence") < position("AI Strategy Summary"));
    assert!(position("AI Strategy Summary") < position("Price Band Analysis"));
    assert!(position("Price Band Analysis") < position("Category-wise Tender Distribution"));
    assert!(position("Low Competition Bids - Strategic Opportunities") < position("Estimated Missed Value (EMV)"));
    assert!(position("Estimated Missed Value (EMV)") < position("All Departments - Tender Volume Overview"));
}

#[test]
fn every_section_starts_on_a_content_page_with_chrome() {
    let doc = generate_document(&report(full_data()), &SectionFilter::all());
    for page in doc.pages.iter().skip(1) {
        assert_eq!(page.kind, PageKind::Content);
        assert!(page.contains_text(REPORT_TITLE));
        assert!(page.contains_text(&format!("Page {}", page.number)));
        assert!(page.contains_text("Acme Supplies"));
        assert!(page.contains_text("01-May-2024"));
    }
}

#[test]
fn generation_is_deterministic() {
    let data = report(full_data());
    let filter = SectionFilter::all();
    assert_eq!(generate_document(&data, &filter), generate_document(&data, &filter));
}

#[test]
fn bid_summary_cards() {
    let doc = generate_document(&report(full_data()), &SectionFilter::from_keys(["bidsSummary"]));
    assert_eq!(doc.page_count(), 2);
    assert!(doc.contains_text("Acme Supplies - Bidding Performance Deep Dive"));
    assert!(doc.contains_text("70.0%"));
    assert!(doc.contains_text("Rs 12,34,567"));
    // qualified and average order values are missing
    let dashes = doc.pages[1].texts().filter(|t| *t == "-").count();
    assert!(dashes >= 2);
}

#[test]
fn price_band_placeholders() {
    let data = report(json!({ "priceBand": { "highest": null, "lowest": "abc", "average": 123456 } }));
    let doc = generate_document(&data, &SectionFilter::from_keys(["marketOverview"]));
    assert!(doc.contains_text("Rs 1,23,456"));
    assert!(doc.contains_text("-"));
    assert!(doc.contains_text("Insufficient price data to compute meaningful insights."));
}

#[test]
fn competitor_ranks_are_ordinals_sorted_by_participation() {
    let doc = generate_document(&report(full_data()), &SectionFilter::from_keys(["rivalryScore"]));
    let texts = doc.texts();
    let position = |needle: &str| texts.iter().position(|t| *t == needle).unwrap();
    assert!(position("Alpha") < position("Beta"));
    assert!(position("Beta") < position("Gamma"));
    assert!(doc.contains_text("1st"));
    assert!(doc.contains_text("2nd"));
    assert!(doc.contains_text("3rd"));
}

fn bar_fills(data: Value, key: &str) -> usize {
    let doc = generate_document(&report(data), &SectionFilter::from_keys([key]));
    doc.pages
        .iter()
        .flat_map(|p| &p.ops)
        .filter(|op| matches!(op, DrawOp::Rect { x, fill: Some(c), .. } if (*x - BAR_X).abs() < 1e-9 && *c != palette::LIGHT_GRAY))
        .count()
}

#[test]
fn zero_values_draw_no_bar_fill() {
    let zeros = json!({ "categoryListing": { "categories": [ { "category": "A", "times": 0 }, { "category": "B", "times": 0 } ] } });
    assert_eq!(bar_fills(zeros, "categoryAnalysis"), 0);

    let counts = json!({ "categoryListing": { "categories": [ { "category": "A", "times": 5 }, { "category": "B", "times": 0 } ] } });
    assert_eq!(bar_fills(counts, "categoryAnalysis"), 1);
}

#[test]
fn long_history_tables_continue_with_chrome_and_header() {
    let rows: Vec<Value> = (0..80)
        .map(|i| json!({ "participated_on": "2024-01-15", "offered_item": format!("Item {i}"), "seller_status": "Qualified", "rank": "L1", "total_price": 1000 + i }))
        .collect();
    let data = report(json!({ "sellerBids": { "sortedRows": rows } }));
    let doc = generate_document(&data, &SectionFilter::from_keys(["bidsSummary"]));

    assert!(doc.page_count() > 3);
    let history_pages: Vec<_> = doc.pages.iter().filter(|p| p.contains_text("Item 79") || p.contains_text("Item 40")).collect();
    assert!(!history_pages.is_empty());
    for page in doc.pages.iter().skip(2) {
        assert!(page.contains_text(REPORT_TITLE));
        assert!(page.contains_text("Status"));
    }
    // no op is drawn into the header band on content pages except chrome
    for page in doc.pages.iter().skip(1) {
        for op in &page.ops {
            if let DrawOp::Text { y, content, .. } = op {
                if *y < CONTENT_TOP {
                    assert_eq!(content, REPORT_TITLE);
                }
            }
        }
    }
}

#[test]
fn departments_unavailable_is_reported() {
    let data = report(json!({ "allDepartments": { "error": true, "reason": "upstream timeout" } }));
    let doc = generate_document(&data, &SectionFilter::from_keys(["departmentsAnalysis"]));
    assert!(doc.contains_text("Unavailable: upstream timeout"));
}

#[test]
fn legacy_affinity_shapes_render() {
    let data = report(json!({ "ai": { "signals": {
        "orgs": [ { "org": "Navy", "win_count": 2 } ],
        "depts": { "Health": 4 }
    } } }));
    let doc = generate_document(&data, &SectionFilter::from_keys(["buyerInsights"]));
    assert!(doc.contains_text("Navy"));
    assert!(doc.contains_text("Health"));
    assert!(doc.contains_text("Strategic Roadmap & Action Items"));
    assert!(doc.contains_text("No guidance provided."));
}
