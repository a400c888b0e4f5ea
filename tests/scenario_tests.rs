//! Replays the scenarios shipped with the crate

use axiom_shell::scenario::{Scenario, ScenarioRunner};
use axiom_shell::{NullShellReport, Point, ShellConfig, Size, SurfaceState};
use std::path::PathBuf;
use std::sync::Arc;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(name)
}

#[test]
fn test_desktop_scenario_replays() {
    let scenario = Scenario::load(scenario_path("desktop.toml")).unwrap();
    let mut runner = ScenarioRunner::new(&ShellConfig::default(), Arc::new(NullShellReport));
    let outcome = runner.run(&scenario).unwrap();

    assert_eq!(outcome.focused_session.as_deref(), Some("terminal"));
    assert_eq!(outcome.focused_surface.as_deref(), Some("term"));
    assert_eq!(outcome.sessions.len(), 1);
    assert_eq!(outcome.stacking, vec!["term".to_string()]);

    let term = &outcome.sessions[0].surfaces[0];
    assert_eq!(term.state, SurfaceState::Maximized);
    assert_eq!(term.top_left, Point::new(0, 0));
    assert_eq!(term.size, Size::new(1920, 1080));
    assert_eq!(term.focus, "focused");
}

#[test]
fn test_desktop_scenario_renders_text_summary() {
    let scenario = Scenario::load(scenario_path("desktop.toml")).unwrap();
    let mut runner = ScenarioRunner::new(&ShellConfig::default(), Arc::new(NullShellReport));
    let text = runner.run(&scenario).unwrap().render_text();

    assert!(text.contains("terminal"));
    assert!(!text.contains("editor-main"));
}
