//! Full-pipeline integration tests over on-disk resources.

use std::io::Write;
use std::path::Path;

use sentistream::models::PosTag;
use sentistream::AppConfig;
use sentistream::SentimentPipeline;

const LEXICON: &str = "\
# sentiment lexicon fixture
a\t00001\t0.8\t0.1\tgood#1\tof high quality
a\t00002\t0.9\t0\tgreat#1 excellent#1\tremarkably good
a\t00003\t0\t0.7\tbad#1 awful#1\tof poor quality
a\t00004\t0\t0.9\tterrible#1\tvery bad
n\t00005\t0.6\t0\twin#1\ta victory
";

const SLANG: &str = "\
gr8\tgreat
u\tyou
luv\tlove
";

const NAMES: &str = "london\nparis\n";
const INTERJECTIONS: &str = "wow\nyay\nugh\n";

const TAGGER_MODEL: &str = "\
good\tJJ
great\tJJ
excellent\tJJ
bad\tJJ
awful\tJJ
terrible\tJJ
day\tNN
win\tNN
you\tPRP
love\tVB
is\tVBZ
a\tDT
the\tDT
";

fn write_fixture(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{content}").unwrap();
    path.to_string_lossy().into_owned()
}

fn fixture_config(dir: &Path) -> AppConfig {
    let config_toml = format!(
        r#"
[resources]
lexicon_path = "{lexicon}"
slang_paths = ["{slang}"]
name_entities_path = "{names}"
interjections_path = "{interjections}"
tagger_model_path = "{tagger}"

[classifier]
classes = 5
min_score = 1.0
max_score = 9.0
c = 4.0
gamma = 0.5
cache_dir = "{cache}"

[logging]
level = "debug"
backtrace = false
"#,
        lexicon = write_fixture(dir, "lexicon.tsv", LEXICON),
        slang = write_fixture(dir, "slang.tsv", SLANG),
        names = write_fixture(dir, "names.txt", NAMES),
        interjections = write_fixture(dir, "interjections.txt", INTERJECTIONS),
        tagger = write_fixture(dir, "tagger.tsv", TAGGER_MODEL),
        cache = dir.join("cache").to_string_lossy(),
    );
    let config_path = dir.join("config.toml");
    std::fs::write(&config_path, config_toml).unwrap();
    AppConfig::from_file(&config_path).unwrap()
}

fn training_corpus() -> Vec<(String, f64)> {
    let mut corpus = Vec::new();
    for i in 0..6 {
        corpus.push((format!("great excellent day {i} :-)"), 9.0));
        corpus.push((format!("good win today {i}"), 8.0));
        corpus.push((format!("awful terrible day {i}"), 1.0));
        corpus.push((format!("bad day {i} ugh"), 2.0));
    }
    corpus
}

#[test]
fn analyze_assigns_custom_and_statistical_tags() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = SentimentPipeline::from_config(&fixture_config(dir.path())).unwrap();

    let tagged = pipeline.analyze("RT @bob: u luv London wow #win http://a.com");
    let tags: Vec<&PosTag> = tagged.iter().map(|t| &t.tag).collect();

    assert_eq!(tags[0], &PosTag::RetweetMarker);
    assert_eq!(tags[1], &PosTag::UserMention);
    // slang-corrected tokens reach the oracle in canonical form
    assert_eq!(tagged[2].token.surface, "you");
    assert_eq!(tags[2], &PosTag::Tag("PRP".to_string()));
    assert_eq!(tagged[3].token.surface, "love");
    assert_eq!(tags[3], &PosTag::Tag("VB".to_string()));
    assert_eq!(tags[4], &PosTag::ProperNoun);
    assert_eq!(tags[5], &PosTag::Interjection);
    assert_eq!(tags[6], &PosTag::Hashtag);
    assert_eq!(tags[7], &PosTag::Url);
}

#[test]
fn split_hashtag_and_mention_merge() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = SentimentPipeline::from_config(&fixture_config(dir.path())).unwrap();

    let tagged = pipeline.analyze("# test");
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].token.surface, "#test");
    assert!(tagged[0].token.merged);
    assert_eq!(tagged[0].tag, PosTag::Hashtag);

    let tagged = pipeline.analyze("@ #test");
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].token.surface, "@#test");
    assert_eq!(tagged[0].tag, PosTag::Hashtag);
}

#[test]
fn lexicon_scores_match_weighted_average() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = SentimentPipeline::from_config(&fixture_config(dir.path())).unwrap();

    // good#a: single sense (0.8, 0.1) at rank 1
    let score = pipeline.lexicon_score("good").unwrap();
    assert!((score - 0.7).abs() < 1e-12);

    // mean over two scorable tokens: (0.7 + 0.9) / 2
    let score = pipeline.lexicon_score("good great").unwrap();
    assert!((score - 0.8).abs() < 1e-12);

    assert!(pipeline.lexicon_score("the day").is_none());
}

#[test]
fn train_classify_and_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let corpus = training_corpus();

    let mut pipeline = SentimentPipeline::from_config(&config).unwrap();
    pipeline.train(&corpus).unwrap();

    let up = pipeline.classify("great excellent day").unwrap();
    let down = pipeline.classify("awful terrible day").unwrap();
    assert!(up > down, "positive class {up} should rank above negative {down}");

    // Cached artifacts exist and a fresh pipeline reproduces the model.
    assert!(dir.path().join("cache").read_dir().unwrap().count() >= 2);
    let mut second = SentimentPipeline::from_config(&config).unwrap();
    second.train(&corpus).unwrap();
    assert_eq!(pipeline.model(), second.model());
}

#[test]
fn tokenizer_drops_unmatched_input_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = SentimentPipeline::from_config(&fixture_config(dir.path())).unwrap();

    // Nothing here matches a lexical pattern: the message is dropped from
    // results (empty analysis), not an error.
    assert!(pipeline.analyze("~~ ^^ !!").is_empty());
    assert!(pipeline.lexicon_score("~~ ^^ !!").is_none());
}
