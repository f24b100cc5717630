use clap::{CommandFactory, Parser};
use scriptsync::tooling::cli::{Cli, CliContext, Commands};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["scriptsync", "extract", "a.script.json"],
        vec!["scriptsync", "extract", "a.script.json", "--target", "out"],
        vec!["scriptsync", "import", "--file", "a.script.js"],
        vec!["scriptsync", "import", "--directory", "scripts", "--watch"],
        vec![
            "scriptsync",
            "import",
            "--directory",
            "scripts",
            "--re-uuid",
            "--include-deps",
            "--validate",
            "--dry-run",
        ],
        vec!["scriptsync", "export", "--id", "abc", "--extract"],
        vec!["scriptsync", "export", "--all", "--directory", "out"],
        vec!["scriptsync", "export", "--bundle", "all.json"],
        vec!["scriptsync", "list", "--format", "json"],
        vec!["scriptsync", "--workspace", "/tmp", "--log-level", "debug", "list"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_conflicting_targets() {
    assert!(Cli::try_parse_from([
        "scriptsync",
        "import",
        "--file",
        "a.script.json",
        "--directory",
        "scripts",
    ])
    .is_err());
    assert!(Cli::try_parse_from(["scriptsync", "export", "--id", "a", "--all"]).is_err());
    assert!(Cli::try_parse_from(["scriptsync", "export", "--bundle", "b.json", "--extract"]).is_err());
}

#[test]
fn help_lists_every_command() {
    let help = Cli::command().render_long_help().to_string();
    for command in ["extract", "import", "export", "list"] {
        assert!(help.contains(command), "help is missing {command}");
    }
}

#[tokio::test]
async fn extract_command_writes_pair() {
    let temp = TempDir::new().unwrap();
    let descriptor_path = temp.path().join("Header-Injector.script.json");
    std::fs::write(
        &descriptor_path,
        r#"{
  "a1": {
    "_id": "a1",
    "name": "Header Injector",
    "context": "OAUTH2_ACCESS_TOKEN_MODIFICATION",
    "language": "JAVASCRIPT",
    "script": ["var x = 1;", "return x;"]
  }
}
"#,
    )
    .unwrap();

    let context = CliContext::new(temp.path().to_path_buf(), None)
        .unwrap()
        .with_progress(Arc::new(scriptsync::progress::RecordingProgress::new()));
    let output = context
        .execute(&Commands::Extract {
            file: "Header-Injector.script.json".into(),
            target: None,
        })
        .await
        .unwrap();

    assert!(output.starts_with("Extracted"));
    assert_eq!(
        std::fs::read_to_string(temp.path().join("Header-Injector.script.js")).unwrap(),
        "var x = 1;\nreturn x;"
    );
    let rewritten = std::fs::read_to_string(&descriptor_path).unwrap();
    assert!(rewritten.contains("\"script\": \"file://Header-Injector.script.js\""));
}
