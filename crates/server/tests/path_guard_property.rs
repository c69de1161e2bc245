use codelab_common::types::SearchOptions;
use codelab_server::workspace::{Workspace, WorkspaceError};
use proptest::prelude::*;

fn escaping_candidate() -> impl Strategy<Value = String> {
    let climbing = (
        prop::collection::vec("[a-z]{1,8}", 0..3),
        1usize..6,
        "[a-z]{1,8}(\\.js)?",
    )
        .prop_map(|(segments, extra, tail)| {
            let mut parts = segments.clone();
            parts.extend(vec!["..".to_string(); segments.len() + extra]);
            parts.push(format!("escape-{tail}"));
            parts.join("/")
        });
    let backslashed = climbing.clone().prop_map(|candidate| candidate.replace('/', "\\"));
    let absolute = "[a-z]{1,8}/[a-z]{1,8}".prop_map(|tail| format!("/escape-{tail}"));

    prop_oneof![climbing, backslashed, absolute]
}

fn is_escape(result: Result<impl std::fmt::Debug, WorkspaceError>) -> bool {
    matches!(result, Err(WorkspaceError::PathEscape(_)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_operation_rejects_paths_outside_the_root(candidate in escaping_candidate()) {
        let outer = tempfile::tempdir().expect("tempdir should be created");
        let root = outer.path().join("ws");
        std::fs::create_dir(&root).expect("workspace root should be created");
        std::fs::write(root.join("inside.txt"), "x").expect("fixture should be written");
        let workspace = Workspace::open(&root).expect("workspace should open");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build");

        runtime.block_on(async {
            prop_assert!(is_escape(workspace.resolve(&candidate).await), "resolve {candidate}");
            prop_assert!(is_escape(workspace.read_directory(&candidate).await), "readDirectory {candidate}");
            prop_assert!(is_escape(workspace.read_file(&candidate).await), "readFile {candidate}");
            prop_assert!(is_escape(workspace.write_file(&candidate, "pwned").await), "writeFile {candidate}");
            prop_assert!(is_escape(workspace.create_file(&candidate, None).await), "createFile {candidate}");
            prop_assert!(is_escape(workspace.create_directory(&candidate).await), "createDirectory {candidate}");
            prop_assert!(is_escape(workspace.delete_file(&candidate).await), "deleteFile {candidate}");
            prop_assert!(is_escape(workspace.delete_directory(&candidate).await), "deleteDirectory {candidate}");
            prop_assert!(is_escape(workspace.rename("inside.txt", &candidate).await), "rename to {candidate}");
            prop_assert!(is_escape(workspace.rename(&candidate, "inside.txt").await), "rename from {candidate}");
            Ok(())
        })?;

        let siblings: Vec<_> = std::fs::read_dir(outer.path())
            .expect("outer dir should be readable")
            .map(|entry| entry.expect("entry should be readable").file_name())
            .collect();
        prop_assert_eq!(siblings, vec![std::ffi::OsString::from("ws")]);
        prop_assert!(root.join("inside.txt").is_file());

        // Search never leaves the root either: it only walks from it.
        let outcome = runtime
            .block_on(workspace.search("x", &SearchOptions::default()))
            .expect("search should succeed");
        prop_assert!(outcome.results.iter().all(|result| result.file == "inside.txt"));
    }
}
