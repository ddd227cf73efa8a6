//! End-to-end pipeline tests: mocks in, `Scout::run`, assertions on what
//! reached the sink and on the run stats.

use std::sync::Arc;
use std::time::Duration;

use recipe_common::{CategoryLabel, CategoryMode, IngredientList, NO_INFORMATION};
use recipe_scout::pipeline::trust::TrustCache;
use recipe_scout::run_log::EventKind;
use recipe_scout::testing::{candidate, MemorySink, MockVideoSource, ScriptedCompleter};
use recipe_scout::{PipelineConfig, RunOutcome, Scout};

const CONFIDENCE: &str = "You judge whether";
const CLASSIFY: &str = "You classify cooking videos";
const DETAILS: &str = "extract recipe details";

fn config() -> PipelineConfig {
    PipelineConfig::builder()
        .daily_quota(100)
        .search_queries(vec!["레시피".to_string()])
        .item_delay(Duration::ZERO)
        .build()
}

async fn run(
    source: &Arc<MockVideoSource>,
    completer: &Arc<ScriptedCompleter>,
    sink: &Arc<MemorySink>,
    config: PipelineConfig,
) -> RunOutcome {
    Scout::new(source.clone(), completer.clone(), sink.clone(), config)
        .run(TrustCache::new())
        .await
        .expect("run should start")
}

fn recipe(id: &str) -> recipe_common::CandidateItem {
    candidate(id, "UC-anon", &format!("제육볶음 레시피 {id}"), "매콤한 제육볶음 만들기")
}

// ---------------------------------------------------------------------------
// Dedup and idempotence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_run_against_populated_sink_writes_nothing() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a"), recipe("b")]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());

    let first = run(&source, &completer, &sink, config()).await;
    assert_eq!(first.stats.records_written, 2);

    let calls_after_first = completer.call_count();
    let second = run(&source, &completer, &sink, config()).await;
    assert_eq!(second.stats.records_written, 0);
    assert_eq!(second.stats.duplicates_skipped, 2);
    assert_eq!(sink.records().len(), 2);
    assert_eq!(completer.call_count(), calls_after_first, "duplicates spend no model calls");
}

#[tokio::test]
async fn same_id_twice_in_one_run_is_written_once() {
    let source = Arc::new(
        MockVideoSource::new()
            .on_search("레시피", vec![recipe("a")])
            .on_search("레시피", vec![recipe("a"), recipe("b")]),
    );
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());

    let outcome = run(&source, &completer, &sink, config()).await;

    assert_eq!(sink.written_ids(), vec!["a", "b"]);
    assert_eq!(outcome.stats.records_written, 2);
    assert_eq!(outcome.stats.duplicates_skipped, 1);
}

#[tokio::test]
async fn preexisting_ids_are_skipped() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a"), recipe("b")]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new().with_existing(["a"]));

    let outcome = run(&source, &completer, &sink, config()).await;

    assert_eq!(sink.written_ids(), vec!["b"]);
    assert_eq!(outcome.stats.duplicates_skipped, 1);
}

// ---------------------------------------------------------------------------
// Trust gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trusted_channel_bypasses_relevance_for_every_later_candidate() {
    let uploads = (0..10)
        .map(|i| candidate(&format!("up{i}"), "UC-chef", "된장찌개 레시피", ""))
        .collect();
    let off_topic_1 = candidate("v1", "UC-chef", "주말 브이로그", "오늘 하루");
    let off_topic_2 = candidate("v2", "UC-chef", "구독자 Q&A", "질문 답변");
    let source = Arc::new(
        MockVideoSource::new()
            .on_uploads("UC-chef", uploads)
            .on_search("레시피", vec![off_topic_1, off_topic_2]),
    );
    // A confidence check would reject these, so any write proves the bypass.
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.0", "한식-찌개"));
    let sink = Arc::new(MemorySink::new());

    let outcome = run(&source, &completer, &sink, config()).await;

    assert_eq!(sink.written_ids(), vec!["v1", "v2"]);
    assert_eq!(outcome.stats.channels_trusted, 1);
    assert_eq!(outcome.stats.trusted_bypasses, 2);
    assert_eq!(completer.calls_matching(CONFIDENCE), 0);
    assert_eq!(source.upload_calls(), 1, "trusted channel is not re-sampled");
    assert!(outcome.trust.is_trusted("UC-chef"));
}

#[tokio::test]
async fn channel_trusted_in_an_earlier_run_skips_sampling() {
    let source = Arc::new(
        MockVideoSource::new().on_search("레시피", vec![candidate("v1", "UC-chef", "브이로그", "")]),
    );
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.0", "한식-찌개"));
    let sink = Arc::new(MemorySink::new());
    let trust: TrustCache = ["UC-chef".to_string()].into_iter().collect();

    let outcome = Scout::new(source.clone(), completer.clone(), sink.clone(), config())
        .run(trust)
        .await
        .unwrap();

    assert_eq!(outcome.stats.records_written, 1);
    assert_eq!(source.upload_calls(), 0);
}

#[tokio::test]
async fn failed_channel_sampling_falls_back_to_relevance_checks() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a")]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());

    let outcome = run(&source, &completer, &sink, config()).await;

    assert_eq!(outcome.stats.records_written, 1);
    assert_eq!(outcome.stats.channels_trusted, 0);
    assert!(outcome.trust.is_empty());
    assert_eq!(completer.calls_matching(CONFIDENCE), 1);
}

// ---------------------------------------------------------------------------
// Keyword and confidence filter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn keyword_mismatch_short_circuits_before_scoring() {
    let source = Arc::new(
        MockVideoSource::new().on_search("레시피", vec![candidate("v1", "UC-x", "여행 브이로그", "제주도")]),
    );
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("1.0", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());

    let outcome = run(&source, &completer, &sink, config()).await;

    assert!(sink.records().is_empty());
    assert_eq!(outcome.stats.keyword_rejected, 1);
    assert_eq!(completer.calls_matching(CONFIDENCE), 0);
    assert_eq!(completer.calls_matching(CLASSIFY), 0);
}

#[tokio::test]
async fn confidence_equal_to_threshold_passes_and_just_below_fails() {
    let at = candidate("at", "UC-x", "볶음 레시피", "제육 marker-at");
    let below = candidate("below", "UC-x", "볶음 레시피", "제육 marker-below");
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![at, below]));
    let completer = Arc::new(
        ScriptedCompleter::new()
            .on(CLASSIFY, "한식-볶음")
            .on(DETAILS, r#"{"instructions": [], "hashtags": []}"#)
            .on("marker-at", "0.7")
            .on("marker-below", "0.69"),
    );
    let sink = Arc::new(MemorySink::new());

    let outcome = run(&source, &completer, &sink, config()).await;

    assert_eq!(sink.written_ids(), vec!["at"]);
    assert_eq!(outcome.stats.low_confidence_rejected, 1);
}

#[tokio::test]
async fn unparsable_confidence_counts_as_zero() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a")]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("probably yes", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());

    let outcome = run(&source, &completer, &sink, config()).await;

    assert!(sink.records().is_empty());
    assert_eq!(outcome.stats.low_confidence_rejected, 1);
}

#[tokio::test]
async fn out_of_range_confidence_is_rejected() {
    for reply in ["30%", "3/10", "2"] {
        let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a")]));
        let completer = Arc::new(ScriptedCompleter::new().recipe_defaults(reply, "한식-볶음"));
        let sink = Arc::new(MemorySink::new());

        let outcome = run(&source, &completer, &sink, config()).await;

        assert!(sink.records().is_empty(), "{reply} was accepted");
        assert_eq!(outcome.stats.low_confidence_rejected, 1);
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn closed_vocabulary_rejects_unlisted_category() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a")]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "일식-초밥"));
    let sink = Arc::new(MemorySink::new());
    let mut config = config();
    config.category_vocabulary = vec!["한식-볶음".into(), "양식-파스타".into()];

    let outcome = run(&source, &completer, &sink, config).await;

    assert!(sink.records().is_empty());
    assert_eq!(outcome.stats.category_rejected, 1);
    assert_eq!(completer.calls_matching(DETAILS), 0, "rejected before extraction");
}

#[tokio::test]
async fn dynamic_mode_records_new_label_and_learns_the_dish() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a")]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-김치찌개"));
    let sink = Arc::new(MemorySink::new());
    let mut config = config();
    config.category_mode = CategoryMode::Dynamic;

    let outcome = run(&source, &completer, &sink, config).await;

    let records = sink.records();
    assert_eq!(records[0].category.as_str(), "한식-김치찌개");
    assert!(outcome
        .discovered_categories
        .contains(&CategoryLabel::coerce("한식-김치찌개")));
    assert_eq!(outcome.stats.categories_discovered, 1);
    assert!(outcome.keywords.matches("김치찌개 끓이는 법"));
    assert!(outcome
        .log
        .events()
        .any(|e| matches!(e, EventKind::KeywordLearned { keyword } if keyword == "김치찌개")));
}

#[tokio::test]
async fn dynamic_mode_coerces_free_text_without_learning_from_it() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a"), recipe("b")]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "This is a stir-fry"));
    let sink = Arc::new(MemorySink::new());
    let mut config = config();
    config.category_mode = CategoryMode::Dynamic;

    let outcome = run(&source, &completer, &sink, config).await;

    let records = sink.records();
    assert_eq!(records[0].category.as_str(), "Other-This is a stir-fry");
    assert_eq!(outcome.stats.categories_discovered, 1);
    assert_eq!(outcome.stats.keywords_learned, 0);
    assert!(!outcome.keywords.matches("a stir-fry"));
}

#[tokio::test]
async fn learned_keyword_admits_later_candidates() {
    // The second title carries no configured keyword, only the learned dish name.
    let first = candidate("a", "UC-x", "제육볶음 레시피", "");
    let second = candidate("b", "UC-y", "오늘은 볶음 먹방", "");
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![first, second]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());

    let outcome = run(&source, &completer, &sink, config()).await;

    assert_eq!(sink.written_ids(), vec!["a", "b"]);
    assert_eq!(outcome.stats.keywords_learned, 1);
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn record_fields_are_extracted_from_the_document() {
    let item = candidate(
        "a",
        "UC-x",
        "제육볶음 레시피",
        "준비 시간은 15분입니다\n300g 돼지고기\n대충 썰어주세요\n2개 양파",
    );
    let source = Arc::new(
        MockVideoSource::new()
            .on_search("레시피", vec![item])
            .on_views("a", 4200),
    );
    let completer = Arc::new(
        ScriptedCompleter::new()
            .on(CONFIDENCE, "0.95")
            .on(CLASSIFY, "한식-볶음")
            .on(
                DETAILS,
                r##"{"instructions": ["고기를 재운다", "센 불에 볶는다"], "hashtags": ["제육볶음", "#집밥"]}"##,
            ),
    );
    let sink = Arc::new(MemorySink::new());

    run(&source, &completer, &sink, config()).await;

    let record = &sink.records()[0];
    assert_eq!(record.url, "https://youtu.be/a");
    assert_eq!(record.cook_time_minutes, 15);
    assert_eq!(
        record.ingredients,
        IngredientList::Found(vec!["300g 돼지고기".into(), "2개 양파".into()])
    );
    assert_eq!(record.instructions, "1. 고기를 재운다\n2. 센 불에 볶는다");
    assert_eq!(record.hashtags, "#제육볶음 #집밥");
    assert_eq!(record.views, 4200);
    assert!(record.purchase_links.is_empty());
}

#[tokio::test]
async fn missing_fields_fall_back_to_sentinels() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a")]));
    let completer = Arc::new(
        ScriptedCompleter::new()
            .on(CONFIDENCE, "0.9")
            .on(CLASSIFY, "한식-볶음")
            .failing_on(DETAILS),
    );
    let sink = Arc::new(MemorySink::new());

    run(&source, &completer, &sink, config()).await;

    let record = &sink.records()[0];
    assert_eq!(record.cook_time_minutes, 0);
    assert_eq!(record.ingredients.render(), NO_INFORMATION);
    assert_eq!(record.instructions, "");
    assert_eq!(record.hashtags, "");
    assert_eq!(record.views, 0);
}

#[tokio::test]
async fn require_ingredients_skips_candidates_without_them() {
    let with = candidate("with", "UC-x", "제육 레시피", "300g 돼지고기");
    let without = candidate("without", "UC-x", "제육 레시피", "양념이 핵심");
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![with, without]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());
    let mut config = config();
    config.require_ingredients = true;

    let outcome = run(&source, &completer, &sink, config).await;

    assert_eq!(sink.written_ids(), vec!["with"]);
    assert_eq!(outcome.stats.missing_ingredients, 1);
}

#[tokio::test]
async fn partner_id_adds_purchase_links() {
    let item = candidate("a", "UC-x", "제육 레시피", "300g 돼지고기\n2개 양파");
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![item]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());
    let mut config = config();
    config.coupang_partner_id = Some("AF123".into());

    run(&source, &completer, &sink, config).await;

    let links = &sink.records()[0].purchase_links;
    let names: Vec<&str> = links.iter().map(|l| l.ingredient.as_str()).collect();
    assert_eq!(names, vec!["돼지고기", "양파"]);
    assert!(links.iter().all(|l| l.url.contains("affid=AF123")));
}

#[tokio::test]
async fn foreign_documents_are_translated_before_scoring() {
    let item = candidate("a", "UC-x", "Easy pasta recipe", "Boil the pasta for 10 minutes");
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![item]));
    let completer = Arc::new(
        ScriptedCompleter::new()
            .on("translator", "파스타를 10분 동안 삶으세요")
            .recipe_defaults("0.9", "양식-파스타"),
    );
    let sink = Arc::new(MemorySink::new());

    run(&source, &completer, &sink, config()).await;

    assert_eq!(completer.calls_matching("translator"), 1);
    let scored = completer
        .calls()
        .into_iter()
        .find(|c| c.system.contains(CONFIDENCE))
        .unwrap();
    assert!(scored.user.contains("파스타를"));
    assert_eq!(sink.records()[0].cook_time_minutes, 10);
}

// ---------------------------------------------------------------------------
// Fail-forward and termination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn translation_failure_abandons_only_that_candidate() {
    let foreign = candidate("en", "UC-x", "Pasta recipe", "Boil water");
    let korean = recipe("ko");
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![foreign, korean]));
    let completer = Arc::new(
        ScriptedCompleter::new()
            .failing_on("translator")
            .recipe_defaults("0.9", "한식-볶음"),
    );
    let sink = Arc::new(MemorySink::new());

    let outcome = run(&source, &completer, &sink, config()).await;

    assert_eq!(sink.written_ids(), vec!["ko"]);
    assert_eq!(outcome.stats.stage_failures, 1);
    assert!(outcome.log.events().any(|e| matches!(
        e,
        EventKind::CandidateFailed { video_id, stage, .. } if video_id == "en" && stage == "translate"
    )));
}

#[tokio::test]
async fn sink_write_failure_continues_the_run() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a"), recipe("b")]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new().failing_on("a"));

    let outcome = run(&source, &completer, &sink, config()).await;

    assert_eq!(sink.written_ids(), vec!["b"]);
    assert_eq!(outcome.stats.write_failures, 1);
    assert_eq!(outcome.stats.records_written, 1);
}

#[tokio::test]
async fn search_failure_moves_to_the_next_query() {
    let source = Arc::new(
        MockVideoSource::new()
            .failing_search("broken")
            .on_search("레시피", vec![recipe("a")]),
    );
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());
    let mut config = config();
    config.search_queries = vec!["broken".into(), "레시피".into()];

    let outcome = run(&source, &completer, &sink, config).await;

    assert_eq!(outcome.stats.search_failures, 1);
    assert_eq!(sink.written_ids(), vec!["a"]);
}

#[tokio::test]
async fn quota_stops_the_run() {
    let source = Arc::new(
        MockVideoSource::new()
            .on_search("레시피", vec![recipe("a"), recipe("b"), recipe("c")])
            .on_search("요리", vec![recipe("d")]),
    );
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());
    let mut config = config();
    config.daily_quota = 2;
    config.search_queries = vec!["레시피".into(), "요리".into()];

    let outcome = run(&source, &completer, &sink, config).await;

    assert_eq!(sink.written_ids(), vec!["a", "b"]);
    assert_eq!(outcome.stats.candidates_seen, 2);
    assert_eq!(source.searches().len(), 1, "second query never searched");
}

#[tokio::test]
async fn page_cap_limits_pagination() {
    let source = Arc::new(
        MockVideoSource::new()
            .on_search("레시피", vec![recipe("p1")])
            .on_search("레시피", vec![recipe("p2")])
            .on_search("레시피", vec![recipe("p3")]),
    );
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());
    let mut config = config();
    config.max_pages_per_query = 2;

    let outcome = run(&source, &completer, &sink, config).await;

    assert_eq!(sink.written_ids(), vec!["p1", "p2"]);
    assert_eq!(outcome.stats.pages_fetched, 2);
    assert_eq!(
        source.searches(),
        vec![
            ("레시피".to_string(), None),
            ("레시피".to_string(), Some("레시피#1".to_string())),
        ]
    );
}

#[tokio::test]
async fn failed_snapshot_fails_the_run() {
    let source = Arc::new(MockVideoSource::new());
    let completer = Arc::new(ScriptedCompleter::new());
    let sink = Arc::new(MemorySink::new().failing_snapshot());

    let result = Scout::new(source, completer, sink, config())
        .run(TrustCache::new())
        .await;

    let err = result.err().expect("snapshot failure should end the run");
    assert!(err.to_string().contains("existing video ids"));
}

#[tokio::test]
async fn empty_run_reports_zero_counts() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", Vec::new()));
    let completer = Arc::new(ScriptedCompleter::new());
    let sink = Arc::new(MemorySink::new());

    let outcome = run(&source, &completer, &sink, config()).await;

    assert_eq!(outcome.stats.records_written, 0);
    assert_eq!(outcome.stats.candidates_seen, 0);
    assert_eq!(outcome.stats.pages_fetched, 1);
    assert!(outcome.stats.to_string().contains("Records written:    0"));
}

#[tokio::test]
async fn run_log_is_saved_with_stats() {
    let source = Arc::new(MockVideoSource::new().on_search("레시피", vec![recipe("a")]));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());
    let dir = tempfile::tempdir().unwrap();

    let outcome = run(&source, &completer, &sink, config()).await;
    let path = outcome.log.save(dir.path(), &outcome.stats).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["stats"]["records_written"], 1);
    let types: Vec<&str> = json["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["type"].as_str())
        .collect();
    assert_eq!(types, vec!["snapshot_loaded", "search_page", "record_written", "keyword_learned"]);
}

// ---------------------------------------------------------------------------
// Throttle and sampling
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn delay_follows_only_candidates_that_called_the_model() {
    let duplicate = recipe("dup");
    let off_topic = candidate("off", "UC-x", "여행 브이로그", "제주도");
    let source = Arc::new(MockVideoSource::new().on_search(
        "레시피",
        vec![duplicate, recipe("a"), off_topic, recipe("b")],
    ));
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new().with_existing(["dup"]));
    let mut config = config();
    config.item_delay = Duration::from_secs(10);

    let started = tokio::time::Instant::now();
    let outcome = run(&source, &completer, &sink, config).await;

    assert_eq!(outcome.stats.duplicates_skipped, 1);
    assert_eq!(outcome.stats.keyword_rejected, 1);
    assert_eq!(sink.written_ids(), vec!["a", "b"]);
    assert_eq!(started.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn no_delay_when_nothing_reaches_the_model() {
    let source = Arc::new(MockVideoSource::new().on_search(
        "레시피",
        vec![recipe("dup"), candidate("off", "UC-x", "여행 브이로그", "제주도")],
    ));
    let completer = Arc::new(ScriptedCompleter::new());
    let sink = Arc::new(MemorySink::new().with_existing(["dup"]));
    let mut config = config();
    config.item_delay = Duration::from_secs(10);

    let started = tokio::time::Instant::now();
    let outcome = run(&source, &completer, &sink, config).await;

    assert_eq!(outcome.stats.candidates_seen, 2);
    assert_eq!(completer.call_count(), 0);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn shuffled_pages_write_the_same_records() {
    let ids = ["a", "b", "c", "d", "e", "f"];
    let source = Arc::new(
        MockVideoSource::new().on_search("레시피", ids.iter().map(|id| recipe(id)).collect()),
    );
    let completer = Arc::new(ScriptedCompleter::new().recipe_defaults("0.9", "한식-볶음"));
    let sink = Arc::new(MemorySink::new());
    let mut config = config();
    config.shuffle_candidates = true;

    let outcome = run(&source, &completer, &sink, config).await;

    let mut written = sink.written_ids();
    written.sort();
    assert_eq!(written, ids);
    assert_eq!(outcome.stats.records_written, ids.len() as u32);
    assert_eq!(outcome.stats.candidates_seen, ids.len() as u32);
}
