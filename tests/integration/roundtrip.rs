use proptest::prelude::*;
use scriptsync::error::ScriptError;
use scriptsync::script::{
    body_file_name, descriptor_file_name, descriptor_path_for, detect, is_extracted,
    load_collection, write_collection, DescriptorCollection, Extractor, Representation, Resolver,
    ScriptBody, ScriptDescriptor, ScriptLanguage,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn language() -> impl Strategy<Value = ScriptLanguage> {
    prop_oneof![Just(ScriptLanguage::Javascript), Just(ScriptLanguage::Groovy)]
}

proptest! {
    #[test]
    fn naming_is_symmetric(name in "[ -~]{0,40}", lang in language()) {
        let dir = PathBuf::from("scripts");
        let body = dir.join(body_file_name(&name, lang));
        prop_assert_eq!(
            descriptor_path_for(&body),
            Some(dir.join(descriptor_file_name(&name)))
        );
    }

    #[test]
    fn extract_then_materialize_restores_lines(
        lines in prop::collection::vec("[^\r\n]{0,30}", 1..8),
        lang in language(),
    ) {
        let temp = TempDir::new().unwrap();
        let original = ScriptDescriptor::new(
            "rt-1",
            "Round Trip",
            "AUTHENTICATION_TREE_DECISION_NODE",
            lang,
            ScriptBody::Lines(lines),
        );

        let pair = Extractor::new(temp.path())
            .extract(&original, Path::new("out"))
            .unwrap();
        pair.write_descriptor().unwrap();
        prop_assert!(is_extracted(&pair.descriptor));

        let restored = Resolver::new(temp.path())
            .materialize(&pair.descriptor_path)
            .unwrap();
        prop_assert_eq!(restored, original);
    }
}

#[test]
fn header_injector_is_extracted_into_a_pair() {
    let temp = TempDir::new().unwrap();
    let descriptor = ScriptDescriptor::new(
        "a1",
        "Header Injector",
        "OAUTH2_ACCESS_TOKEN_MODIFICATION",
        ScriptLanguage::Javascript,
        ScriptBody::Lines(vec!["var x = 1;".into(), "return x;".into()]),
    );

    let pair = Extractor::new(temp.path())
        .extract(&descriptor, Path::new("out"))
        .unwrap();
    pair.write_descriptor().unwrap();

    let body_path = temp.path().join("out/Header-Injector.script.js");
    assert_eq!(pair.body_path, body_path);
    assert_eq!(
        std::fs::read_to_string(&body_path).unwrap(),
        "var x = 1;\nreturn x;"
    );

    let written = load_collection(&temp.path().join("out/Header-Injector.script.json"))
        .unwrap()
        .into_single()
        .unwrap();
    assert_eq!(
        written.body,
        ScriptBody::Text("file://out/Header-Injector.script.js".into())
    );
    assert_eq!(
        detect(&written),
        Representation::Reference(PathBuf::from("out/Header-Injector.script.js"))
    );
    assert_eq!(
        Resolver::new(temp.path())
            .body_path_for(&pair.descriptor_path)
            .unwrap(),
        Some(body_path)
    );
}

#[test]
fn detection_is_idempotent_for_extracted_descriptors() {
    let temp = TempDir::new().unwrap();
    let descriptor = ScriptDescriptor::new(
        "g1",
        "Claims Mapper",
        "OIDC_CLAIMS",
        ScriptLanguage::Groovy,
        ScriptBody::Lines(vec!["return claims".into()]),
    );
    let extractor = Extractor::new(temp.path());
    let pair = extractor.extract(&descriptor, Path::new("")).unwrap();

    assert!(is_extracted(&pair.descriptor));
    assert!(matches!(
        extractor.extract(&pair.descriptor, Path::new("")),
        Err(ScriptError::NotInline { .. })
    ));
}

#[test]
fn multi_entry_descriptor_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bundle.script.json");
    let collection: DescriptorCollection = ["one", "two"]
        .into_iter()
        .map(|id| {
            ScriptDescriptor::new(
                id,
                id,
                "OIDC_CLAIMS",
                ScriptLanguage::Javascript,
                ScriptBody::Lines(vec!["x".into()]),
            )
        })
        .collect();
    write_collection(&path, &collection).unwrap();

    assert!(matches!(
        Resolver::new(temp.path()).materialize(&path),
        Err(ScriptError::MissingSingleScript { count: 2 })
    ));
}

#[test]
fn missing_body_file_names_the_expected_path() {
    let temp = TempDir::new().unwrap();
    let descriptor = ScriptDescriptor::new(
        "m1",
        "Gone",
        "OIDC_CLAIMS",
        ScriptLanguage::Javascript,
        ScriptBody::Lines(vec!["x".into()]),
    );
    let pair = Extractor::new(temp.path())
        .extract(&descriptor, Path::new("out"))
        .unwrap();
    pair.write_descriptor().unwrap();
    std::fs::remove_file(&pair.body_path).unwrap();

    match Resolver::new(temp.path()).materialize(&pair.descriptor_path) {
        Err(ScriptError::MissingBodyFile { path, .. }) => assert_eq!(path, pair.body_path),
        other => panic!("expected missing body file, got {:?}", other),
    }
}
