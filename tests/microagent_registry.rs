// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Loading microagents from a project directory and matching prompts against them.

use std::path::Path;

use tempfile::TempDir;

use hindsight::microagent::{compose_prompt, evaluate, MicroagentRegistry, TriggerExpression, MICROAGENT_DIR};
use hindsight::LoadError;

fn write_agent(project: &Path, relative: &str, content: &str) {
    let path = project.join(MICROAGENT_DIR).join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn names(registry: &MicroagentRegistry, prompt: &str) -> Vec<String> {
    registry.find(prompt).into_iter().map(|a| a.name()).collect()
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_contains_is_plain_substring() {
    for prompt in ["deploy", "please deploy now", "redeployment", "Deploy", ""] {
        let expr = TriggerExpression::contains("deploy");
        assert_eq!(evaluate(prompt, &expr), prompt.contains("deploy"), "{prompt:?}");
    }
}

#[test]
fn test_combinators_follow_boolean_logic() {
    let a = TriggerExpression::contains("alpha");
    let b = TriggerExpression::contains("beta");

    for prompt in ["alpha", "beta", "alpha beta", "gamma"] {
        let pa = evaluate(prompt, &a);
        let pb = evaluate(prompt, &b);

        let and = TriggerExpression::And(vec![a.clone(), b.clone()]);
        let or = TriggerExpression::Or(vec![a.clone(), b.clone()]);
        let not = TriggerExpression::negate(a.clone());

        assert_eq!(evaluate(prompt, &and), pa && pb, "and on {prompt:?}");
        assert_eq!(evaluate(prompt, &or), pa || pb, "or on {prompt:?}");
        assert_eq!(evaluate(prompt, &not), !pa, "not on {prompt:?}");
    }
}

#[test]
fn test_empty_combinators_never_match() {
    assert!(!evaluate("anything", &TriggerExpression::And(vec![])));
    assert!(!evaluate("anything", &TriggerExpression::Or(vec![])));
    assert!(!evaluate("anything", &TriggerExpression::Never));
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_missing_directory_yields_empty_registry() {
    let project = TempDir::new().unwrap();
    let registry = MicroagentRegistry::load(project.path()).unwrap();
    assert!(registry.is_empty());
    assert!(registry.find("please deploy now").is_empty());
}

#[test]
fn test_metadata_and_plain_files() {
    let project = TempDir::new().unwrap();
    write_agent(
        project.path(),
        "a.md",
        "---\ntriggers:\n  contains: deploy\n---\nDeploy with ./scripts/deploy.sh\n",
    );
    write_agent(project.path(), "b.md", "Just notes, no metadata.\n");

    let registry = MicroagentRegistry::load(project.path()).unwrap();
    assert_eq!(registry.len(), 2);

    assert_eq!(names(&registry, "please deploy now"), vec!["a"]);
    assert!(names(&registry, "hello").is_empty());

    let plain = registry.iter().find(|a| a.name() == "b").unwrap();
    assert!(plain.triggers().is_never());
    assert_eq!(plain.content, "Just notes, no metadata.\n");
}

#[test]
fn test_contains_wins_over_and() {
    let project = TempDir::new().unwrap();
    write_agent(
        project.path(),
        "mixed.md",
        "---\ntriggers:\n  contains: deploy\n  and:\n    - contains: never-present\n---\nbody\n",
    );

    let registry = MicroagentRegistry::load(project.path()).unwrap();
    assert_eq!(names(&registry, "deploy"), vec!["mixed"]);
}

#[test]
fn test_nested_expression_from_yaml() {
    let project = TempDir::new().unwrap();
    write_agent(
        project.path(),
        "prod-deploy.md",
        r#"---
name: prod-deploy
description: Production deployment checklist
triggers:
  and:
    - contains: deploy
    - not:
        contains: staging
---
Run the production checklist first.
"#,
    );

    let registry = MicroagentRegistry::load(project.path()).unwrap();
    assert_eq!(names(&registry, "deploy to prod"), vec!["prod-deploy"]);
    assert!(names(&registry, "deploy to staging").is_empty());

    let agent = registry.iter().next().unwrap();
    assert_eq!(
        agent.frontmatter.description.as_deref(),
        Some("Production deployment checklist")
    );
}

#[test]
fn test_legacy_keyword_list() {
    let project = TempDir::new().unwrap();
    write_agent(
        project.path(),
        "git.md",
        "---\ntriggers: [commit, rebase]\n---\nPrefer small commits.\n",
    );

    let registry = MicroagentRegistry::load(project.path()).unwrap();
    assert_eq!(names(&registry, "rebase onto main"), vec!["git"]);
    assert!(names(&registry, "push").is_empty());
}

#[test]
fn test_invalid_metadata_aborts_whole_load() {
    let project = TempDir::new().unwrap();
    write_agent(project.path(), "good.md", "---\ntriggers: [ok]\n---\nfine\n");
    write_agent(project.path(), "broken.md", "---\ntriggers: {contains: [\n---\nbroken\n");

    let err = MicroagentRegistry::load(project.path()).unwrap_err();
    assert!(matches!(err, LoadError::Metadata { .. }));
    assert!(err.path().ends_with("broken.md"));
}

#[test]
fn test_compose_prompt_with_matches() {
    let project = TempDir::new().unwrap();
    write_agent(
        project.path(),
        "deploy.md",
        "---\ntriggers:\n  contains: deploy\n---\nUse blue-green.\n",
    );

    let registry = MicroagentRegistry::load(project.path()).unwrap();
    let prompt = "deploy it";
    let composed = compose_prompt(prompt, &registry.find(prompt));

    assert!(composed.starts_with("deploy it\n\n<microagent name=\"deploy\""));
    assert!(composed.contains("Use blue-green."));
    assert!(composed.ends_with("</microagent>"));

    assert_eq!(compose_prompt("hello", &registry.find("hello")), "hello");
}
