//! Integration tests for the role selector

use cv_role_selector::input::{InputManager, JobSource};
use cv_role_selector::processing::classifier::{GateOutcome, SelectionOutcome};
use cv_role_selector::{Config, RoleClassifier, TemplateKind, TemplateStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FIXTURES: &[(&str, &str)] = &[
    ("tests/fixtures/android_job.txt", "android_developer"),
    ("tests/fixtures/devops_job.md", "devops_cloud"),
    ("tests/fixtures/frontend_job.txt", "frontend_developer"),
    ("tests/fixtures/fintech_job.txt", "devops_fintech"),
    ("tests/fixtures/ai_api_job.txt", "fullstack_developer"),
    ("tests/fixtures/ml_job.txt", "ai_ml_engineer"),
    ("tests/fixtures/mixed_job.txt", "android_developer"),
];

fn bundled_classifier() -> RoleClassifier {
    RoleClassifier::from_config_with_templates(&Config::default(), PathBuf::from("templates"))
        .unwrap()
}

async fn load(path: &str) -> String {
    InputManager::new()
        .load(&JobSource::File(PathBuf::from(path)))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let text = manager.extract_text(Path::new("tests/fixtures/android_job.txt")).await.unwrap();

    assert!(text.contains("Senior Android Developer"));
    assert!(text.contains("Jetpack Compose"));
}

#[tokio::test]
async fn test_text_extraction_from_markdown() {
    let mut manager = InputManager::new();
    let text = manager.extract_text(Path::new("tests/fixtures/devops_job.md")).await.unwrap();

    assert!(text.contains("Platform Engineer"));
    assert!(text.contains("Kubernetes"));
    assert!(text.contains("Terraform"));
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_caching_functionality() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/frontend_job.txt");

    let first = manager.extract_text(path).await.unwrap();
    assert_eq!(manager.cache_size(), 1);

    let second = manager.extract_text(path).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(manager.cache_size(), 1);

    manager.clear_cache();
    assert_eq!(manager.cache_size(), 0);
}

#[tokio::test]
async fn test_inline_text_source() {
    let mut manager = InputManager::new();
    let text = manager.load(&JobSource::Text("Kotlin".to_string())).await.unwrap();
    assert_eq!(text, "Kotlin");
    assert_eq!(manager.cache_size(), 0);
}

#[tokio::test]
async fn test_unsupported_and_missing_files() {
    let mut manager = InputManager::new();
    assert!(manager.extract_text(Path::new("tests/fixtures/unsupported.xyz")).await.is_err());
    assert!(manager.extract_text(Path::new("tests/fixtures/nonexistent.txt")).await.is_err());
}

#[test]
fn test_bundled_templates_cover_every_role() {
    let classifier = bundled_classifier();
    for role in classifier.catalog().roles() {
        for kind in [TemplateKind::Cv, TemplateKind::CoverLetter] {
            assert!(
                classifier.template_store().resolve_usable(&role.key, kind).is_some(),
                "missing {} template for {}",
                kind,
                role.key
            );
        }
    }
}

#[tokio::test]
async fn test_fixtures_classify_as_expected() {
    let classifier = bundled_classifier();
    for (path, expected) in FIXTURES {
        let text = load(path).await;
        assert_eq!(&classifier.classify(&text), expected, "fixture {}", path);
    }
}

#[tokio::test]
async fn test_distinct_job_families_get_distinct_roles() {
    let classifier = bundled_classifier();
    let mut roles = HashSet::new();
    for path in [
        "tests/fixtures/android_job.txt",
        "tests/fixtures/devops_job.md",
        "tests/fixtures/frontend_job.txt",
    ] {
        roles.insert(classifier.classify(&load(path).await));
    }
    assert_eq!(roles.len(), 3);
}

#[tokio::test]
async fn test_percentages_normalize_for_fixtures() {
    let classifier = bundled_classifier();
    for (path, _) in FIXTURES {
        let percentages = classifier.percentages(&load(path).await);
        let total: f64 = percentages.values().sum();
        assert!((total - 100.0).abs() < 1e-6, "fixture {} sums to {}", path, total);
        assert!(percentages.values().all(|p| (0.0..=100.0).contains(p)));
    }
}

#[tokio::test]
async fn test_selection_follows_breakdown_ranking() {
    let classifier = bundled_classifier();

    for (path, _) in FIXTURES {
        let text = load(path).await;
        let selection = classifier.select(&text);
        let scores = classifier.scores(&text);
        let ranking: Vec<String> = classifier
            .breakdown(&text, 0.0)
            .entries
            .into_iter()
            .map(|e| e.role)
            .filter(|role| scores[role] > 0.0)
            .collect();

        // Candidates, minus any sibling tried out of turn, are a prefix of the ranking
        let redirected_to = match &selection.outcome {
            SelectionOutcome::Redirected { .. } => Some(selection.role.clone()),
            _ => None,
        };
        let in_turn: Vec<&String> = selection
            .candidates
            .iter()
            .map(|c| &c.role)
            .filter(|role| Some(*role) != redirected_to.as_ref())
            .collect();
        for (candidate, ranked) in in_turn.iter().zip(&ranking) {
            assert_eq!(*candidate, ranked, "fixture {}", path);
        }

        let (last, earlier) = selection.candidates.split_last().unwrap();
        assert!(earlier.iter().all(|c| !c.gate.is_accepted()), "fixture {}", path);
        assert!(last.gate.is_accepted(), "fixture {}", path);
        assert_eq!(last.role, selection.role);
        assert!(scores[&selection.role] > 0.0);
    }
}

#[tokio::test]
async fn test_mixed_role_flag() {
    let classifier = bundled_classifier();

    let mixed = classifier.breakdown(&load("tests/fixtures/mixed_job.txt").await, 5.0);
    assert!(mixed.mixed_role);
    assert!(mixed.entries[0].percentage < 50.0);

    for path in ["tests/fixtures/android_job.txt", "tests/fixtures/ml_job.txt"] {
        let breakdown = classifier.breakdown(&load(path).await, 5.0);
        assert_eq!(breakdown.mixed_role, breakdown.entries[0].percentage < 50.0);
        assert!(!breakdown.mixed_role);
    }
}

#[tokio::test]
async fn test_generic_devops_text_avoids_fintech_variant() {
    let classifier = bundled_classifier();
    let text = load("tests/fixtures/devops_job.md").await;
    let selection = classifier.select(&text);

    assert_eq!(selection.role, "devops_cloud");
    assert_eq!(
        selection.outcome,
        SelectionOutcome::Redirected { from: "devops_fintech".to_string() }
    );
    assert_eq!(
        selection.candidates[0].gate,
        GateOutcome::Misaligned { distinct_hits: 0, required: 2 }
    );
}

#[test]
fn test_missing_template_directory_degrades_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = RoleClassifier::from_config_with_templates(
        &Config::default(),
        dir.path().to_path_buf(),
    )
    .unwrap();

    let selection = classifier.select("Android Kotlin Gradle");
    assert_eq!(selection.role, "software_engineer");
    assert_eq!(selection.outcome, SelectionOutcome::NoTemplates);
    assert!(!selection.is_renderable());
}

#[test]
fn test_default_template_missing_uses_first_available() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("cv")).unwrap();
    std::fs::copy(
        "templates/cv/backend_developer.tex",
        dir.path().join("cv/backend_developer.tex"),
    )
    .unwrap();

    let classifier = RoleClassifier::from_config_with_templates(
        &Config::default(),
        dir.path().to_path_buf(),
    )
    .unwrap();
    let selection = classifier.select("");
    assert_eq!(selection.role, "backend_developer");
    assert_eq!(selection.outcome, SelectionOutcome::FirstAvailable);
}

#[test]
fn test_first_run_config_selects_from_installed_templates() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
    let classifier = RoleClassifier::from_config(&config).unwrap();

    let selection = classifier.select("Android Kotlin Gradle developer");
    assert_eq!(selection.role, "android_developer");
    assert_eq!(selection.outcome, SelectionOutcome::Matched);
    assert!(selection.is_renderable());

    // A second load reads the written file and reuses the same templates
    let reloaded = Config::load_from(&dir.path().join("config.toml")).unwrap();
    assert_eq!(reloaded.templates_dir(), config.templates_dir());
    assert_eq!(
        RoleClassifier::from_config(&reloaded).unwrap().classify("Kubernetes Terraform Helm"),
        "devops_cloud"
    );
}

#[test]
fn test_classifier_is_shareable_across_threads() {
    let classifier = Arc::new(bundled_classifier());
    let text = "Kubernetes, Docker, Terraform, CI/CD pipelines, AWS infrastructure";

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let classifier = Arc::clone(&classifier);
            std::thread::spawn(move || classifier.classify(text))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "devops_cloud");
    }
}
