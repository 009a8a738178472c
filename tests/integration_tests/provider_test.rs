//! Live provider path against a wiremock DataForSEO
//!
//! Covers request shape (auth, chunking, payload fields) and response mapping
//! for trends, related keywords and keyword ideas.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::Value;
use trendlens::models::{CompetitionLevel, DataSource, KeywordSource, SearchIntent};
use trendlens::trends::TimeRange;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{
    envelope, idea_item, labs_result, related_item, trends_result, trends_result_over, IDEAS_PATH,
    RELATED_PATH, TRENDS_PATH,
};
use crate::common::{live_client, terms, BASIC_AUTH};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

// ============================================================================
// Trends
// ============================================================================

#[tokio::test]
async fn test_live_trend_data() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TRENDS_PATH))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(vec![trends_result(
                    &["solar panels", "heat pump"],
                    TimeRange::Months12,
                    today(),
                )])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    let points = client
        .get_trend_data_at(
            &terms(&["solar panels", "heat pump"]),
            "United States",
            TimeRange::Months12,
            today(),
        )
        .await;

    assert_eq!(points.len(), 2);
    assert_eq!(client.is_live(), Some(true));

    let solar = &points[0];
    assert_eq!(solar.keyword, "solar panels");
    assert_eq!(solar.source, DataSource::Live);
    assert_eq!(solar.time_series.len(), 12);
    assert_eq!(
        solar.time_series[..3].iter().map(|p| p.value).collect::<Vec<_>>(),
        vec![20, 30, 40]
    );
    assert_eq!(
        solar.time_series[0].date,
        NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()
    );
    assert_eq!(solar.peak_interest, 40);
    assert!((solar.average_interest - 30.0).abs() < f64::EPSILON);
    assert_eq!(
        solar.geographic_data.as_ref().unwrap().get("Texas"),
        Some(&55)
    );
    assert_eq!(
        solar.related_queries.as_deref().unwrap(),
        ["best deals".to_string(), "near me".to_string()]
    );

    let heat = &points[1];
    assert_eq!(heat.keyword, "heat pump");
    assert_eq!(heat.peak_interest, 41);
}

#[tokio::test]
async fn test_weekly_answer_is_folded_into_monthly_points() {
    let server = MockServer::start().await;

    // A year of weekly samples, the usual shape for a 12 month query
    let window = TimeRange::Months12.window(today());
    let weeks: Vec<NaiveDate> = (0..52)
        .map(|week| window.from + chrono::Duration::weeks(week))
        .filter(|start| *start <= window.to)
        .collect();
    assert_eq!(weeks.len(), 52);

    Mock::given(method("POST"))
        .and(path(TRENDS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(vec![trends_result_over(&["rust"], &weeks)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    let live = client
        .get_trend_data_at(&terms(&["rust"]), "United States", TimeRange::Months12, today())
        .await;
    let (mock_client, _) = crate::common::mock_only_client();
    let mock = mock_client
        .get_trend_data_at(&terms(&["rust"]), "United States", TimeRange::Months12, today())
        .await;

    let rust = &live[0];
    assert_eq!(rust.source, DataSource::Live);
    assert_eq!(rust.time_series.len(), TimeRange::Months12.point_count());
    assert_eq!(rust.time_series.len(), mock[0].time_series.len());
    assert_eq!(
        rust.time_series.iter().map(|p| p.date).collect::<Vec<_>>(),
        TimeRange::Months12.period_starts(today())
    );
    assert!(rust.time_series.iter().all(|p| (20..=40).contains(&p.value)));
}

#[tokio::test]
async fn test_trend_request_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TRENDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![trends_result(
            &["rust"],
            TimeRange::Months12,
            today(),
        )])))
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    client
        .get_trend_data_at(&terms(&["rust"]), "Germany", TimeRange::Months12, today())
        .await;

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let task = &bodies[0][0];
    assert_eq!(task["keywords"][0], "rust");
    assert_eq!(task["location_name"], "Germany");
    // Last 12 full months before 2024-04-15
    assert_eq!(task["date_from"], "2023-04-01");
    assert_eq!(task["date_to"], "2024-03-31");
}

#[tokio::test]
async fn test_large_keyword_set_is_chunked_into_tasks() {
    let server = MockServer::start().await;
    let keywords = ["a1", "a2", "a3", "a4", "a5", "a6"];

    Mock::given(method("POST"))
        .and(path(TRENDS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(vec![
                trends_result(&keywords[..5], TimeRange::Days90, today()),
                trends_result(&keywords[5..], TimeRange::Days90, today()),
            ])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    let points = client
        .get_trend_data_at(&terms(&keywords), "United States", TimeRange::Days90, today())
        .await;

    assert_eq!(points.len(), 6);
    assert!(points.iter().all(|p| p.source == DataSource::Live));

    let bodies = request_bodies(&server).await;
    let tasks = bodies[0].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["keywords"].as_array().unwrap().len(), 5);
    assert_eq!(tasks[1]["keywords"][0], "a6");
}

#[tokio::test]
async fn test_empty_input_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, store) = live_client(&server, Duration::from_secs(5));
    let points = client
        .get_trend_data(&[], "United States", TimeRange::Months12)
        .await;
    let related = client
        .get_related_keywords(&terms(&["", "  "]), "United States", 2)
        .await;

    assert!(points.is_empty());
    assert!(related.is_empty());
    assert_eq!(store.lookup_count(), 0);
}

// ============================================================================
// Labs
// ============================================================================

#[tokio::test]
async fn test_live_related_keywords() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RELATED_PATH))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![labs_result(vec![
            related_item("coffee beans", 5400, 0.45, "commercial"),
            related_item("coffee grinder", 2900, 0.8, "transactional"),
            related_item("Coffee Beans", 10, 0.1, "informational"),
        ])])))
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    let rows = client
        .get_related_keywords(&terms(&["coffee"]), "United States", 9)
        .await;

    assert_eq!(rows.len(), 2, "case-insensitive duplicates are dropped");
    let beans = &rows[0];
    assert_eq!(beans.keyword, "coffee beans");
    assert_eq!(beans.search_volume, 5400);
    assert_eq!(beans.competition_value(), 45);
    assert_eq!(beans.competition_level, Some(CompetitionLevel::Medium));
    assert_eq!(beans.keyword_difficulty, 41);
    assert_eq!(beans.main_intent, Some(SearchIntent::Commercial));
    assert_eq!(beans.source, KeywordSource::RelatedKeywords);
    assert_eq!(beans.provenance, DataSource::Live);

    // Depth is clamped before it goes on the wire
    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0][0]["depth"], 4);
    assert_eq!(bodies[0][0]["language_code"], "en");
}

#[tokio::test]
async fn test_live_keyword_ideas_respects_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IDEAS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![labs_result(vec![
            idea_item("espresso machine", 12000),
            idea_item("pour over kettle", 3600),
            idea_item("milk frother", 8100),
        ])])))
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    let rows = client
        .get_keyword_ideas(&terms(&["coffee", "espresso"]), "United States", 2)
        .await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].keyword, "espresso machine");
    assert_eq!(rows[0].cpc, 0.0);
    assert_eq!(rows[0].source, KeywordSource::KeywordIdeas);
    assert_eq!(rows[0].provenance, DataSource::Live);

    let bodies = request_bodies(&server).await;
    let task = &bodies[0][0];
    assert_eq!(task["keywords"].as_array().unwrap().len(), 2);
    assert_eq!(task["limit"], 2);
}
