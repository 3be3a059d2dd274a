use clause_congruence::alignment::report::{NOTE_AUDIO_ENDS_BEFORE_TRANSCRIPT, NOTE_NO_AUDIO};
use clause_congruence::{
    analyze, AnalysisInput, AnalysisWarning, CancelSignal, CongruenceConfig, CongruenceEngine,
    CongruenceEngineBuilder, CongruenceError, EmotionLabel, OverallScore,
};
use serde_json::json;

fn engine() -> CongruenceEngine {
    CongruenceEngineBuilder::new(CongruenceConfig::default())
        .build()
        .expect("default engine")
}

fn input(value: serde_json::Value) -> AnalysisInput {
    serde_json::from_value(value).expect("valid analysis input")
}

fn two_clause_transcript() -> serde_json::Value {
    json!({
        "words": [
            {"text": "I", "start_ms": 200, "end_ms": 400},
            {"text": "loved", "start_ms": 450, "end_ms": 1200},
            {"text": "it.", "start_ms": 1250, "end_ms": 1800},
            {"text": "Really", "start_ms": 5200, "end_ms": 5900},
            {"text": "great!", "start_ms": 6000, "end_ms": 7000}
        ],
        "duration_ms": 10000
    })
}

fn joy_vs_anger() -> AnalysisInput {
    input(json!({
        "transcript": two_clause_transcript(),
        "text_sentiment": {"segments": [
            {"start_ms": 0, "end_ms": 5000, "scores": {"joy": 0.9}},
            {"start_ms": 5000, "end_ms": 10000, "scores": {"joy": 0.7}}
        ]},
        "audio_affect": {"samples": [
            {"timestamp_ms": 2000, "scores": {"joy": 0.8}},
            {"timestamp_ms": 7000, "scores": {"anger": 0.9}}
        ]}
    }))
}

#[test]
fn text_joy_against_audio_anger_flags_second_clause() {
    let report = engine().analyze(&joy_vs_anger()).unwrap();

    assert_eq!(report.clauses.len(), 2);
    let first = &report.clauses[0];
    let second = &report.clauses[1];
    assert_eq!(first.result.clause_id, "clause-1");
    assert_eq!(first.text, "I loved it.");
    assert_eq!(second.text, "Really great!");

    assert!(first.result.score > 0.9, "clause 1 score {}", first.result.score);
    assert!(!first.result.divergent);
    assert_eq!(first.result.dominant_text_emotion, Some(EmotionLabel::Joy));
    assert_eq!(first.result.dominant_audio_emotion, Some(EmotionLabel::Joy));

    assert!(second.result.score < 0.1, "clause 2 score {}", second.result.score);
    assert!(second.result.divergent);
    assert_eq!(second.result.dominant_text_emotion, Some(EmotionLabel::Joy));
    assert_eq!(second.result.dominant_audio_emotion, Some(EmotionLabel::Anger));

    assert_eq!(report.aggregate.worst_clauses[0].clause_id, "clause-2");
    assert_eq!(report.aggregate.stats.divergent_count, 1);
    assert!(matches!(report.overall_score(), OverallScore::Scored { .. }));
    assert!(report.warnings.is_empty());
    assert!(report.notes.is_empty());
}

#[test]
fn free_function_matches_engine() {
    let data = joy_vs_anger();
    let from_fn = analyze(
        &data.transcript,
        &data.text_sentiment,
        &data.audio_affect,
        &CongruenceConfig::default(),
    )
    .unwrap();
    let from_engine = engine().analyze(&data).unwrap();
    assert_eq!(
        serde_json::to_value(&from_fn).unwrap(),
        serde_json::to_value(&from_engine).unwrap()
    );
}

#[test]
fn cancellation_returns_no_report() {
    let cancel = CancelSignal::new();
    cancel.cancel();
    let err = engine()
        .analyze_with_cancel(&joy_vs_anger(), &cancel)
        .unwrap_err();
    assert!(err.is_canceled());
    assert!(matches!(err, CongruenceError::Canceled { stage: "segmentation" }));
}

#[test]
fn elapsed_deadline_cancels() {
    let cancel = CancelSignal::new().with_deadline(std::time::Instant::now());
    let err = engine()
        .analyze_with_cancel(&joy_vs_anger(), &cancel)
        .unwrap_err();
    assert!(err.is_canceled());
}

#[test]
fn zero_duration_word_is_malformed() {
    let data = input(json!({
        "transcript": {"words": [
            {"text": "hi", "start_ms": 100, "end_ms": 100}
        ]},
        "text_sentiment": {"segments": []},
        "audio_affect": {"samples": []}
    }));
    let err = engine().analyze(&data).unwrap_err();
    assert!(matches!(err, CongruenceError::MalformedTranscript { .. }));
    assert!(err.is_fatal_input());
}

#[test]
fn overlapping_sentiment_boundaries_are_malformed() {
    let data = input(json!({
        "transcript": two_clause_transcript(),
        "text_sentiment": {"segments": [
            {"start_ms": 0, "end_ms": 5000, "scores": {"joy": 0.9}},
            {"start_ms": 4000, "end_ms": 10000, "scores": {"joy": 0.7}}
        ]},
        "audio_affect": {"samples": []}
    }));
    assert!(matches!(
        engine().analyze(&data),
        Err(CongruenceError::MalformedTranscript { .. })
    ));
}

#[test]
fn wholly_unparseable_audio_is_unknown_taxonomy() {
    let data = input(json!({
        "transcript": two_clause_transcript(),
        "text_sentiment": {"segments": [
            {"start_ms": 0, "end_ms": 10000, "scores": {"joy": 0.9}}
        ]},
        "audio_affect": {"samples": [
            {"timestamp_ms": 1000, "scores": "angry"},
            {"timestamp_ms": 2000, "scores": null}
        ]}
    }));
    let err = engine().analyze(&data).unwrap_err();
    assert!(
        matches!(err, CongruenceError::UnknownTaxonomy { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn misaligned_audio_reports_insufficient_data() {
    let data = input(json!({
        "transcript": two_clause_transcript(),
        "text_sentiment": {"segments": [
            {"start_ms": 0, "end_ms": 5000, "scores": {"joy": 0.9}},
            {"start_ms": 5000, "end_ms": 10000, "scores": {"sadness": 0.7}}
        ]},
        "audio_affect": {"samples": [
            {"start_ms": 60000, "end_ms": 61000, "scores": {"joy": 0.9}}
        ]}
    }));
    let report = engine().analyze(&data).unwrap();
    assert_eq!(report.overall_score(), OverallScore::InsufficientData);
    assert!(report.aggregate.worst_clauses.is_empty());
    assert!(report.clauses.iter().all(|c| c.alignment_confidence == 0.0));
    assert!(report.clauses.iter().all(|c| !c.result.divergent));
    assert!(report
        .warnings
        .contains(&AnalysisWarning::InsufficientData { clause_count: 2 }));
}

#[test]
fn truncated_audio_keeps_tail_clauses_with_zero_confidence() {
    let data = input(json!({
        "transcript": two_clause_transcript(),
        "text_sentiment": {"segments": [
            {"start_ms": 0, "end_ms": 5000, "scores": {"joy": 0.9}},
            {"start_ms": 5000, "end_ms": 10000, "scores": {"sadness": 0.7}}
        ]},
        "audio_affect": {"samples": [
            {"start_ms": 0, "end_ms": 4000, "scores": {"happy": 0.8}, "confidence": 0.9}
        ]}
    }));
    let report = engine().analyze(&data).unwrap();
    assert_eq!(report.clauses.len(), 2);
    assert!(report.clauses[0].alignment_confidence > 0.0);
    assert_eq!(report.clauses[1].alignment_confidence, 0.0);
    assert!(!report.clauses[1].result.divergent);
    assert_eq!(report.notes, vec![NOTE_AUDIO_ENDS_BEFORE_TRANSCRIPT.to_string()]);
    assert_eq!(report.aggregate.counts.zero_confidence, 1);
    let overall = report.overall_score().value().unwrap();
    assert!((overall - 1.0).abs() < 1e-6);
}

#[test]
fn point_sample_near_boundary_stays_in_its_own_clause() {
    let data = input(json!({
        "transcript": two_clause_transcript(),
        "text_sentiment": {"segments": [
            {"start_ms": 0, "end_ms": 5000, "scores": {"joy": 0.9}},
            {"start_ms": 5000, "end_ms": 10000, "scores": {"joy": 0.7}}
        ]},
        "audio_affect": {"samples": [
            {"timestamp_ms": 4800, "scores": {"joy": 0.8}}
        ]}
    }));
    let report = engine().analyze(&data).unwrap();

    assert_eq!(report.clauses[0].observation_count, 1);
    assert!(report.clauses[0].alignment_confidence > 0.0);
    assert_eq!(report.clauses[1].observation_count, 0);
    assert_eq!(report.clauses[1].alignment_confidence, 0.0);
    assert_eq!(report.clauses[1].result.dominant_audio_emotion, None);
    assert_eq!(report.aggregate.worst_clauses.len(), 1);
    assert_eq!(report.aggregate.worst_clauses[0].clause_id, "clause-1");
    let overall = report.overall_score().value().unwrap();
    assert!((overall - 1.0).abs() < 1e-6);
}

#[test]
fn silence_inside_point_stream_is_not_scored() {
    let data = input(json!({
        "transcript": {"words": [
            {"text": "Great", "start_ms": 100, "end_ms": 900},
            {"text": "start.", "start_ms": 1000, "end_ms": 2500},
            {"text": "Long", "start_ms": 3500, "end_ms": 4500},
            {"text": "pause.", "start_ms": 4600, "end_ms": 8500},
            {"text": "Done.", "start_ms": 9500, "end_ms": 12500}
        ], "duration_ms": 13000},
        "text_sentiment": {"segments": [
            {"start_ms": 0, "end_ms": 3000, "scores": {"joy": 0.9}},
            {"start_ms": 3000, "end_ms": 9000, "scores": {"anger": 0.8}},
            {"start_ms": 9000, "end_ms": 13000, "scores": {"joy": 0.6}}
        ]},
        "audio_affect": {"samples": [
            {"timestamp_ms": 1000, "scores": {"joy": 0.8}},
            {"timestamp_ms": 2000, "scores": {"joy": 0.8}},
            {"timestamp_ms": 12000, "scores": {"joy": 0.8}}
        ]}
    }));
    let report = engine().analyze(&data).unwrap();

    let middle = &report.clauses[1];
    assert_eq!((middle.start_ms, middle.end_ms), (3000, 9000));
    assert_eq!(middle.alignment_confidence, 0.0);
    assert_eq!(middle.observation_count, 0);
    assert!(!middle.result.divergent);
    assert_eq!(report.aggregate.stats.divergent_count, 0);
    assert_eq!(report.aggregate.counts.zero_confidence, 1);
    assert!(report
        .aggregate
        .worst_clauses
        .iter()
        .all(|worst| worst.clause_id != "clause-2"));
    let overall = report.overall_score().value().unwrap();
    assert!((overall - 1.0).abs() < 1e-6);
}

#[test]
fn missing_audio_is_noted_not_fatal() {
    let data = input(json!({
        "transcript": two_clause_transcript(),
        "text_sentiment": {"segments": [
            {"start_ms": 0, "end_ms": 10000, "scores": {"joy": 0.9}}
        ]},
        "audio_affect": {"samples": []}
    }));
    let report = engine().analyze(&data).unwrap();
    assert_eq!(report.notes, vec![NOTE_NO_AUDIO.to_string()]);
    assert_eq!(report.overall_score(), OverallScore::InsufficientData);
}

#[test]
fn unmapped_labels_are_warned_once() {
    let data = input(json!({
        "transcript": two_clause_transcript(),
        "text_sentiment": {"segments": [
            {"start_ms": 0, "end_ms": 5000, "scores": {"joy": 0.8, "boredom": 0.2}},
            {"start_ms": 5000, "end_ms": 10000, "scores": {"joy": 0.6, "boredom": 0.4}}
        ]},
        "audio_affect": {"samples": [
            {"start_ms": 0, "end_ms": 10000, "scores": {"hap": 0.7}}
        ]}
    }));
    let report = engine().analyze(&data).unwrap();
    let unmapped: Vec<&AnalysisWarning> = report
        .warnings
        .iter()
        .filter(|w| matches!(w, AnalysisWarning::UnmappedLabel { .. }))
        .collect();
    assert_eq!(unmapped.len(), 1);
    assert!(report
        .clauses
        .iter()
        .all(|c| c.text_emotion.iter().count() == EmotionLabel::COUNT));
}

#[test]
fn parallel_path_matches_sequential() {
    let words: Vec<serde_json::Value> = (0..60u64)
        .map(|i| {
            json!({
                "text": format!("w{i},"),
                "start_ms": i * 1000 + 100,
                "end_ms": i * 1000 + 800
            })
        })
        .collect();
    let samples: Vec<serde_json::Value> = (0..40u64)
        .map(|i| {
            let label = if i % 3 == 0 { "anger" } else { "joy" };
            let mut scores = serde_json::Map::new();
            scores.insert(label.to_string(), json!(0.8));
            json!({
                "start_ms": i * 1500,
                "end_ms": i * 1500 + 1500,
                "scores": scores,
                "confidence": 0.9
            })
        })
        .collect();
    let data = input(json!({
        "transcript": {"words": words},
        "text_sentiment": {"segments": []},
        "audio_affect": {"samples": samples}
    }));

    let sequential = CongruenceEngineBuilder::new(CongruenceConfig {
        parallel_clause_threshold: usize::MAX,
        ..CongruenceConfig::default()
    })
    .build()
    .unwrap()
    .analyze(&data)
    .unwrap();
    let parallel = CongruenceEngineBuilder::new(CongruenceConfig {
        parallel_clause_threshold: 1,
        ..CongruenceConfig::default()
    })
    .build()
    .unwrap()
    .analyze(&data)
    .unwrap();

    assert_eq!(sequential.clauses.len(), 60);
    assert_eq!(
        serde_json::to_value(&sequential).unwrap(),
        serde_json::to_value(&parallel).unwrap()
    );
}

#[test]
fn engine_can_be_shared_between_threads() {
    let engine = std::sync::Arc::new(engine());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = std::sync::Arc::clone(&engine);
            std::thread::spawn(move || engine.analyze(&joy_vs_anger()).map(|r| r.clauses.len()))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 2);
    }
}
