use std::collections::HashMap;

use elizaos_eliza_script::rank::rank;
use elizaos_eliza_script::script::{KeywordSource, RuleSource};
use elizaos_eliza_script::{
    compile, decompose, reassemble, ElizaEngine, EngineConfig, FallbackMode, Script, ScriptError,
    ScriptSource, TagTable,
};
use pretty_assertions::assert_eq;

fn keyword(keyword: &str, rank: u32, rules: &[(&str, &[&str])]) -> KeywordSource {
    KeywordSource {
        keyword: keyword.to_string(),
        rank,
        rules: rules
            .iter()
            .map(|(pattern, reassembly)| RuleSource {
                pattern: pattern.to_string(),
                reassembly: reassembly.iter().map(|s| s.to_string()).collect(),
            })
            .collect(),
    }
}

fn mother_script() -> Script {
    Script::from_source(ScriptSource {
        keywords: vec![keyword(
            "mother",
            10,
            &[("(0 my mother 0)", &["Tell me more about your family."])],
        )],
        ..ScriptSource::default()
    })
    .unwrap()
}

#[test]
fn test_end_to_end_mother() {
    let script = mother_script();
    let engine = ElizaEngine::with_script(mother_script());

    let found = rank("my mother is nice", &script).unwrap();
    assert_eq!(found.keyword, "mother");

    let matched = decompose("mother", "my mother is nice", &script)
        .unwrap()
        .unwrap();
    assert_eq!(matched.wildcard_fragments(), vec!["", "is nice"]);
    assert_eq!(matched.fragments.len(), 4);

    assert_eq!(
        engine.respond("my mother is nice").unwrap(),
        "Tell me more about your family."
    );
}

#[test]
fn test_no_keyword_fallback_is_deterministic() {
    let engine = ElizaEngine::with_script(mother_script());
    let first = engine.respond("hello there").unwrap();
    for _ in 0..4 {
        assert_eq!(engine.respond("hello there").unwrap(), first);
    }
}

#[test]
fn test_substitution_precedes_ranking() {
    let mut substitutions = HashMap::new();
    substitutions.insert("dont".to_string(), "do not".to_string());
    let script = Script::from_source(ScriptSource {
        substitutions,
        keywords: vec![keyword(
            "not",
            2,
            &[("(0 do not 0)", &["Why not 4 ?", "You really do not 4 ?"])],
        )],
        ..ScriptSource::default()
    })
    .unwrap();
    let engine = ElizaEngine::with_script(script);

    let trace = engine.respond_traced("I dont care").unwrap();
    assert_eq!(trace.substituted, "I do not care");
    assert_eq!(trace.keyword.unwrap().keyword, "not");
    assert_eq!(trace.response, "Why not care ?");
}

#[test]
fn test_tie_break_selects_first_occurrence() {
    let script = Script::from_source(ScriptSource {
        keywords: vec![
            keyword("father", 3, &[("(0)", &["father"])]),
            keyword("mother", 3, &[("(0)", &["mother"])]),
        ],
        ..ScriptSource::default()
    })
    .unwrap();
    let engine = ElizaEngine::with_script(script);
    for _ in 0..3 {
        assert_eq!(engine.respond("mother father").unwrap(), "mother");
    }
}

#[test]
fn test_rotation_persists_across_calls() {
    let script = Script::from_source(ScriptSource {
        keywords: vec![keyword("x", 1, &[("(0 x)", &["A 1", "B 1"])])],
        ..ScriptSource::default()
    })
    .unwrap();
    let rule = &script.keyword("x").unwrap().rules[0];
    let fragments = vec!["x".to_string()];
    let got = (0..3)
        .map(|_| reassemble(rule, &fragments).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(got, vec!["A x", "B x", "A x"]);
}

#[test]
fn test_unknown_tag_degrades_to_next_rule() {
    let script = Script::from_source(ScriptSource {
        keywords: vec![keyword(
            "feel",
            2,
            &[
                ("(0 i @nonexistent 0)", &["never"]),
                ("(0 feel 0)", &["Do you often feel 3 ?"]),
            ],
        )],
        ..ScriptSource::default()
    })
    .unwrap();
    let engine = ElizaEngine::with_script(script);
    assert_eq!(engine.respond("i feel tired").unwrap(), "Do you often feel tired ?");
}

#[test]
fn test_cardinality_invariant() {
    let mut tags = TagTable::new();
    tags.insert("family", ["mother", "father"]);
    let inputs = [
        "my mother is nice",
        "i really think my father hates me",
        "hello",
        "",
        "well well well",
    ];
    for pattern in ["(0)", "(0 my @family 0)", "(0 1 0)", "(2 0)", "(0 hello 0)"] {
        let matcher = compile(pattern, &tags).unwrap();
        for input in inputs {
            if let Some(fragments) = matcher.captures(input) {
                assert_eq!(fragments.len(), matcher.components().len(), "{pattern} on {input:?}");
            }
        }
    }
}

#[test]
fn test_spans_capture_whole_tokens_through_punctuation() {
    let script = Script::from_source(ScriptSource {
        keywords: vec![keyword(
            "like",
            3,
            &[("(0 like 1)", &["Why 3 ?"]), ("(0 like 2 0)", &["So 3 then 4 ?"])],
        )],
        ..ScriptSource::default()
    })
    .unwrap();
    let engine = ElizaEngine::with_script(script);
    assert_eq!(engine.respond("I like c++").unwrap(), "Why c++ ?");
    assert_eq!(engine.respond("we like don't-care.").unwrap(), "Why don't-care. ?");
    assert_eq!(
        engine.respond("I like rock, jazz. and more").unwrap(),
        "So rock, jazz. then and more ?"
    );

    let matcher = compile("(0 1)", &TagTable::new()).unwrap();
    assert_eq!(
        matcher.captures("my dog."),
        Some(vec!["my".to_string(), "dog.".to_string()])
    );
}

#[test]
fn test_concurrent_rotation_is_serialized_per_rule() {
    let script = Script::from_source(ScriptSource {
        keywords: vec![keyword("x", 1, &[("(0)", &["a", "b", "c"])])],
        ..ScriptSource::default()
    })
    .unwrap();
    let rule = &script.keyword("x").unwrap().rules[0];

    let outputs = std::thread::scope(|scope| {
        let handles = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..30)
                        .map(|_| reassemble(rule, &[]).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });

    // 120 draws over 3 templates: every template used exactly 40 times
    for template in ["a", "b", "c"] {
        assert_eq!(outputs.iter().filter(|o| o.as_str() == template).count(), 40);
    }
    assert_eq!(rule.rotation_cursor(), 0);
}

#[test]
fn test_load_errors_prevent_activation() {
    let empty_templates = ScriptSource {
        keywords: vec![keyword("x", 1, &[("(0)", &[])])],
        ..ScriptSource::default()
    };
    assert!(matches!(
        Script::from_source(empty_templates),
        Err(ScriptError::EmptyTemplateSet { .. })
    ));

    let duplicate = ScriptSource {
        keywords: vec![
            keyword("x", 1, &[("(0)", &["a"])]),
            keyword("x", 2, &[("(0)", &["b"])]),
        ],
        ..ScriptSource::default()
    };
    assert!(matches!(
        Script::from_source(duplicate),
        Err(ScriptError::DuplicateKeyword(_))
    ));
}

#[test]
fn test_doctor_golden_transcript() {
    let engine = ElizaEngine::with_script(Script::doctor().unwrap());
    let transcript = [
        ("hello", "How do you do. Please state your problem."),
        ("I think computers are fascinating", "Do computers worry you ?"),
        ("computer", "Why do you mention computers ?"),
        ("my mother is kind", "Tell me more about your family."),
        ("I remember my bike", "Do you often think of my bike ?"),
        ("I dont know", "Do you not really know ?"),
        ("I am sad today", "I am sorry to hear that you are sad ."),
        ("xyzzy", "Please go on."),
    ];
    for (input, expected) in transcript {
        assert_eq!(engine.respond(input).unwrap(), expected, "input: {input}");
    }
}

#[test]
fn test_doctor_round_robin_fallback() {
    let config = EngineConfig::default().with_fallback_mode(FallbackMode::RoundRobin);
    let engine = ElizaEngine::new(Script::doctor().unwrap(), &config).unwrap();
    assert_eq!(engine.respond("xyzzy").unwrap(), "Please go on.");
    assert_eq!(
        engine.respond("xyzzy").unwrap(),
        "I am not sure I understand you fully."
    );
}

#[test]
fn test_load_split_script_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("general.json"),
        r#"{"substitutions": {"mom": "mother"}, "tags": {}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("doctor.json"),
        r#"[{"keyword": "mother", "rank": 5, "rules": [{"decomp": "(0 mother 0)", "reassembly": ["Your mother 3 ?"]}]}]"#,
    )
    .unwrap();

    let config = EngineConfig {
        script_path: Some(dir.path().to_path_buf()),
        ..EngineConfig::default()
    };
    let engine = ElizaEngine::from_config(&config).unwrap();
    assert_eq!(engine.respond("Mom cooks").unwrap(), "Your mother cooks ?");
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Script::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ScriptError::Io(_)));
}
