use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clap::Parser;
use wikicorpus::engine::{
    Cli, Extractor, Identity, Normalize, RetryPolicy, Rule, RuleTable, build_opts, encode_frame,
    has_dump_prefix, is_frame_safe, parse_frames, split_blocks, target_url,
};
use wikicorpus::pipeline::{TitleOutcome, parse_title_line, read_titles};
use wikicorpus::utils::{apply_file_to_opts, parse_corpus_toml};
use wikicorpus::{
    ExtractedRecord, FetchOutcome, FetchStatus, Opts, RunReport, SkipReason, Task,
};

const WIKI: &str = "https://en.wikipedia.org/wiki/";

fn record(summary: &str, body: &str) -> ExtractedRecord {
    ExtractedRecord {
        summary: summary.to_string(),
        body: body.to_string(),
    }
}

fn ok_outcome(html: &str) -> FetchOutcome {
    FetchOutcome {
        task: Task::new("Alpha", WIKI),
        status: FetchStatus::Ok(html.to_string()),
    }
}

fn extractor() -> Extractor {
    Extractor::new(Arc::new(Identity)).unwrap()
}

// --- target_url / Task ---

#[test]
fn test_target_url_spaces_become_underscores() {
    assert_eq!(
        target_url(WIKI, "Example Topic"),
        "https://en.wikipedia.org/wiki/Example_Topic"
    );
}

#[test]
fn test_target_url_percent_encodes_reserved() {
    assert_eq!(target_url(WIKI, "AC/DC"), "https://en.wikipedia.org/wiki/AC%2FDC");
    assert_eq!(
        target_url(WIKI, "Zürich"),
        "https://en.wikipedia.org/wiki/Z%C3%BCrich"
    );
}

#[test]
fn test_target_url_is_deterministic() {
    assert_eq!(target_url(WIKI, "A B C"), target_url(WIKI, "A B C"));
}

#[test]
fn test_task_new_keeps_title() {
    let task = Task::new("Example Topic", WIKI);
    assert_eq!(task.title, "Example Topic");
    assert_eq!(task.target_url, "https://en.wikipedia.org/wiki/Example_Topic");
}

// --- has_dump_prefix ---

#[test]
fn test_has_dump_prefix_matches_file_name() {
    assert!(has_dump_prefix(Path::new("/dump/AA/wiki_00"), "wiki_"));
    assert!(!has_dump_prefix(Path::new("/dump/wiki_dir/readme.txt"), "wiki_"));
}

#[test]
fn test_has_dump_prefix_empty_accepts_all() {
    assert!(has_dump_prefix(Path::new("/dump/anything"), ""));
}

// --- parse_title_line / read_titles ---

#[test]
fn test_parse_title_line_ignores_other_fields() {
    let line = r#"{"id": "12", "url": "x", "title": "Anarchism", "text": "..."}"#;
    assert_eq!(parse_title_line(line).unwrap(), "Anarchism");
}

#[test]
fn test_parse_title_line_rejects_missing_title() {
    assert!(parse_title_line(r#"{"id": "12"}"#).is_err());
    assert!(parse_title_line("not json").is_err());
}

#[test]
fn test_read_titles_skips_blank_and_flags_malformed() {
    let input = "{\"title\": \"A\"}\n\n   \nnot json\n{\"title\": \"B\"}\n";
    let outcomes: Vec<TitleOutcome> =
        read_titles(Cursor::new(input), PathBuf::from("wiki_00")).collect();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0], TitleOutcome::Title("A".to_string()));
    match &outcomes[1] {
        TitleOutcome::Malformed { path, line, .. } => {
            assert_eq!(path, &PathBuf::from("wiki_00"));
            assert_eq!(*line, 4);
        }
        other => panic!("expected malformed, got {:?}", other),
    }
    assert_eq!(outcomes[2], TitleOutcome::Title("B".to_string()));
}

#[test]
fn test_read_titles_keeps_duplicates() {
    let input = "{\"title\": \"A\"}\n{\"title\": \"A\"}\n";
    let titles: Vec<TitleOutcome> =
        read_titles(Cursor::new(input), PathBuf::from("wiki_00")).collect();
    assert_eq!(titles.len(), 2);
}

// --- split_blocks ---

#[test]
fn test_split_blocks_two_blocks() {
    let blocks = vec!["Alpha is a city.".to_string(), "It has 3 statues.".to_string()];
    assert_eq!(
        split_blocks(blocks),
        Some(record("Alpha is a city.", "It has 3 statues."))
    );
}

#[test]
fn test_split_blocks_joins_rest_with_single_space() {
    let blocks = vec!["S.".to_string(), "One.".to_string(), "Two.".to_string()];
    assert_eq!(split_blocks(blocks), Some(record("S.", "One. Two.")));
}

#[test]
fn test_split_blocks_zero_or_one_is_none() {
    assert_eq!(split_blocks(vec![]), None);
    assert_eq!(split_blocks(vec!["Only.".to_string()]), None);
    assert_eq!(split_blocks(vec!["Only.".to_string(), String::new()]), None);
}

// --- Extractor ---

#[test]
fn test_extract_paragraphs_and_strips_citations() {
    let html = "<html><body><h1>Alpha</h1>\
        <p>Alpha is a city.[1]</p>\
        <div>navigation</div>\
        <p>It has 3 statues.[23][4]</p></body></html>";
    assert_eq!(
        extractor().extract(&ok_outcome(html)),
        Some(record("Alpha is a city.", "It has 3 statues."))
    );
}

#[test]
fn test_extract_keeps_non_numeric_brackets() {
    let html = "<p>Alpha [citation needed] is a city.</p><p>More.[a]</p>";
    assert_eq!(
        extractor().extract(&ok_outcome(html)),
        Some(record("Alpha [citation needed] is a city.", "More.[a]"))
    );
}

#[test]
fn test_extract_nested_markup_text() {
    let html = "<p><b>Alpha</b> is a <a href=\"/wiki/City\">city</a>.</p><p>Second.</p>";
    assert_eq!(
        extractor().extract(&ok_outcome(html)),
        Some(record("Alpha is a city.", "Second."))
    );
}

#[test]
fn test_extract_empty_paragraphs_do_not_count() {
    let html = "<p class=\"mw-empty-elt\">\n</p><p>[1]</p><p>Only one.</p>";
    assert_eq!(extractor().extract(&ok_outcome(html)), None);
}

#[test]
fn test_extract_no_paragraphs() {
    assert_eq!(extractor().extract(&ok_outcome("<html></html>")), None);
    assert_eq!(extractor().extract(&ok_outcome("")), None);
}

#[test]
fn test_extract_non_ok_status_is_none() {
    let ex = extractor();
    let http = FetchOutcome {
        task: Task::new("Alpha", WIKI),
        status: FetchStatus::HttpError(404),
    };
    let transport = FetchOutcome {
        task: Task::new("Alpha", WIKI),
        status: FetchStatus::TransportError("connection refused".to_string()),
    };
    assert_eq!(ex.extract(&http), None);
    assert_eq!(ex.extract(&transport), None);
}

#[test]
fn test_extract_is_pure() {
    let ex = extractor();
    let outcome = ok_outcome("<p>A.[2]</p><p>B.</p><p>C.</p>");
    assert_eq!(ex.extract(&outcome), ex.extract(&outcome));
    let short = ok_outcome("<p>A.</p>");
    assert_eq!(ex.extract(&short), ex.extract(&short));
}

struct CountingNormalizer(AtomicUsize);

impl Normalize for CountingNormalizer {
    fn normalize(&self, text: &str) -> String {
        self.0.fetch_add(1, Ordering::SeqCst);
        text.to_uppercase()
    }
}

#[test]
fn test_extract_normalizes_each_block_once() {
    let normalizer = Arc::new(CountingNormalizer(AtomicUsize::new(0)));
    let ex = Extractor::new(normalizer.clone()).unwrap();
    let got = ex.extract(&ok_outcome("<p>a</p><p>b</p><p>c</p>"));
    assert_eq!(got, Some(record("A", "B C")));
    assert_eq!(normalizer.0.load(Ordering::SeqCst), 3);
}

// --- RuleTable ---

#[test]
fn test_rule_table_applies_in_order() {
    let table = RuleTable::new(vec![
        Rule::StripPrefix("thumb".to_string()),
        Rule::Replace {
            from: " ( or )".to_string(),
            to: String::new(),
        },
        Rule::Replace {
            from: "  ".to_string(),
            to: " ".to_string(),
        },
    ]);
    assert_eq!(
        table.normalize("thumbAlpha ( or ) is  a city."),
        "Alpha is a city."
    );
}

#[test]
fn test_rule_table_strip_prefix_only_once_and_only_at_start() {
    let table = RuleTable::new(vec![Rule::StripPrefix("left".to_string())]);
    assert_eq!(table.normalize("leftleftX"), "leftX");
    assert_eq!(table.normalize("X left"), "X left");
}

#[test]
fn test_rule_table_from_toml() {
    let toml = r#"
[[rule]]
kind = "strip_prefix"
prefix = "''"

[[rule]]
kind = "replace"
from = "&amp;"
to = "&"

[[rule]]
kind = "regex"
pattern = "\\s+,"
replacement = ","
"#;
    let table = RuleTable::from_toml_str(toml).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.normalize("''Salt &amp; pepper , mixed"), "Salt & pepper, mixed");
}

#[test]
fn test_rule_table_regex_groups() {
    let toml = r#"
[[rule]]
kind = "regex"
pattern = "\\((\\w+)\\)"
replacement = "[$1]"
"#;
    let table = RuleTable::from_toml_str(toml).unwrap();
    assert_eq!(table.normalize("a (b) c"), "a [b] c");
}

#[test]
fn test_rule_table_invalid_regex_is_error() {
    let toml = "[[rule]]\nkind = \"regex\"\npattern = \"(\"\nreplacement = \"\"\n";
    assert!(RuleTable::from_toml_str(toml).is_err());
}

#[test]
fn test_rule_table_unknown_kind_is_error() {
    let toml = "[[rule]]\nkind = \"shout\"\n";
    assert!(RuleTable::from_toml_str(toml).is_err());
}

#[test]
fn test_rule_table_empty_is_identity() {
    let table = RuleTable::from_toml_str("").unwrap();
    assert!(table.is_empty());
    assert_eq!(table.normalize(" keep me "), " keep me ");
}

// --- frames ---

#[test]
fn test_encode_frame_exact_bytes() {
    assert_eq!(
        encode_frame(&record("Example Topic is a test.", "More detail here.")),
        "<start>Example Topic is a test.---->More detail here.<stop>\n"
    );
}

#[test]
fn test_parse_frames_reads_back_records() {
    let corpus = format!(
        "{}{}",
        encode_frame(&record("a", "b")),
        encode_frame(&record("c d", "e f"))
    );
    assert_eq!(
        parse_frames(&corpus).unwrap(),
        vec![record("a", "b"), record("c d", "e f")]
    );
    assert!(parse_frames("").unwrap().is_empty());
}

#[test]
fn test_parse_frames_rejects_partial_and_interleaved() {
    assert!(parse_frames("<start>a---->b<stop>\n<start>c---->d").is_err());
    assert!(parse_frames("<start>a<start>b---->c<stop>\n").is_err());
    assert!(parse_frames("<start>ab<stop>\n").is_err());
    assert!(parse_frames("junk<start>a---->b<stop>\n").is_err());
}

#[test]
fn test_frame_safe_records_read_back_unchanged() {
    let safe = record("Arrows point right.", "Body with ----> inside.");
    assert!(is_frame_safe(&safe));
    assert_eq!(parse_frames(&encode_frame(&safe)).unwrap(), vec![safe]);
}

#[test]
fn test_frame_unsafe_records_are_detected() {
    let arrow_summary = record("Arrows ----> point", "x");
    assert!(!is_frame_safe(&arrow_summary));
    assert_ne!(
        parse_frames(&encode_frame(&arrow_summary)).unwrap(),
        vec![arrow_summary]
    );
    assert!(!is_frame_safe(&record("a <start> b", "c")));
    assert!(!is_frame_safe(&record("a", "b<stop>\nc")));
    assert!(is_frame_safe(&record("a <stop> b", "c")));
}

// --- RetryPolicy ---

#[test]
fn test_backoff_grows_and_caps() {
    let policy = RetryPolicy {
        max_retries: 5,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(350),
        multiplier: 2.0,
    };
    assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
    assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
    assert_eq!(policy.backoff_for(2), Duration::from_millis(350));
    assert_eq!(policy.backoff_for(10), Duration::from_millis(350));
}

#[test]
fn test_default_policy_does_not_retry() {
    assert_eq!(RetryPolicy::default().max_retries, 0);
    assert_eq!(RetryPolicy::none().max_retries, 0);
}

// --- FetchStatus / RunReport ---

#[test]
fn test_fetch_status_skip_reasons() {
    assert_eq!(FetchStatus::Ok(String::new()).skip_reason(), None);
    assert_eq!(
        FetchStatus::HttpError(500).skip_reason(),
        Some(SkipReason::HttpError)
    );
    assert!(FetchStatus::TransportError("x".to_string()).is_transient());
    assert!(!FetchStatus::HttpError(503).is_transient());
}

#[test]
fn test_run_report_display() {
    let mut report = RunReport {
        attempted: 5,
        written: 2,
        ..Default::default()
    };
    report.skipped.insert(SkipReason::HttpError, 2);
    report.skipped.insert(SkipReason::InsufficientContent, 1);
    assert_eq!(report.skipped_total(), 3);
    assert_eq!(report.skipped_for(SkipReason::TransportError), 0);
    assert_eq!(
        report.to_string(),
        "attempted 5 | written 2 | skipped 3 (http_error: 2, insufficient_content: 1)"
    );
}

// --- Opts / config ---

#[test]
fn test_queue_capacity_defaults_to_twice_workers() {
    let opts = Opts {
        num_workers: 16,
        ..Default::default()
    };
    assert_eq!(opts.queue_capacity(), 32);
    let opts = Opts {
        num_workers: 4,
        queue_capacity: Some(0),
        ..Default::default()
    };
    assert_eq!(opts.queue_capacity(), 1);
}

#[test]
fn test_default_opts() {
    let opts = Opts::default();
    assert_eq!(opts.num_workers, 16);
    assert_eq!(opts.fetch_timeout, Duration::from_secs(30));
    assert_eq!(opts.base_url, WIKI);
    assert_eq!(opts.file_prefix, "wiki_");
    assert!(opts.rules_path.is_none());
}

#[test]
fn test_apply_file_to_opts() {
    let file = parse_corpus_toml(
        "[settings]\nworkers = 4\ntimeout = 0\nretries = 3\nretry_backoff_ms = 50\ninput_dir = \"dump\"\n",
    )
    .unwrap();
    let mut opts = Opts::default();
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.num_workers, 4);
    assert_eq!(opts.fetch_timeout, Duration::from_secs(1));
    assert_eq!(opts.retry.max_retries, 3);
    assert_eq!(opts.retry.initial_backoff, Duration::from_millis(50));
    assert_eq!(opts.input_dir, PathBuf::from("dump"));
    assert_eq!(opts.file_prefix, "wiki_");
}

#[test]
fn test_build_opts_cli_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("corpus.toml");
    std::fs::write(&config, "[settings]\nworkers = 4\nbase_url = \"http://localhost/w/\"\n").unwrap();
    let cli = Cli::parse_from([
        "wikicorpus",
        "--config",
        config.to_str().unwrap(),
        "--workers",
        "8",
        "-i",
        "dump",
    ]);
    let opts = build_opts(&cli).unwrap();
    assert_eq!(opts.num_workers, 8);
    assert_eq!(opts.base_url, "http://localhost/w/");
    assert_eq!(opts.input_dir, PathBuf::from("dump"));
}

#[test]
fn test_build_opts_missing_explicit_config_is_error() {
    let cli = Cli::parse_from(["wikicorpus", "--config", "/nonexistent/wikicorpus.toml"]);
    assert!(build_opts(&cli).is_err());
}
