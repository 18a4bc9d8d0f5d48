mod common;

use common::TestRepo;
use pretty_assertions::assert_eq;
use silt::artifacts::merge::engine::{MergeStatus, MergeStrategy};
use silt::commands::commit::CommitOptions;
use silt::errors::Error;
use std::path::Path;

/// Base on master, divergent edits to the same file on both branches.
fn diverged_repo() -> TestRepo {
    let repo = TestRepo::init();

    repo.commit_file("test.txt", "1\n2\n3\n", "initial commit");
    repo.repo.create_branch("side").unwrap();

    repo.repo.checkout("side").unwrap();
    repo.commit_file("test.txt", "1\nb\n3\n", "side edit");

    repo.repo.checkout("master").unwrap();
    repo.commit_file("test.txt", "1\na\n3\n", "master edit");

    repo
}

#[test]
fn merging_an_ancestor_is_a_no_op() {
    let repo = TestRepo::init();

    let first = repo.commit_file("file.txt", "version 1", "first");
    repo.repo.create_branch("old").unwrap();
    repo.commit_file("file.txt", "version 2", "second");

    let result = repo.repo.merge("old", MergeStrategy::Resolve).unwrap();

    assert_eq!(result.status, MergeStatus::Merged);
    assert!(result.conflicts.is_empty());
    assert_ne!(result.commit, Some(first));
    assert_eq!(repo.read_file("file.txt"), "version 2");
}

#[test]
fn merging_a_descendant_fast_forwards() {
    let repo = TestRepo::init();

    repo.commit_file("file.txt", "version 1", "first");
    repo.repo.create_branch("side").unwrap();
    repo.repo.checkout("side").unwrap();
    let side_tip = repo.commit_file("file.txt", "version 2", "second");

    repo.repo.checkout("master").unwrap();
    let result = repo.repo.merge("side", MergeStrategy::Resolve).unwrap();

    assert_eq!(result.status, MergeStatus::Merged);
    assert_eq!(result.commit, Some(side_tip));
    assert_eq!(repo.read_file("file.txt"), "version 2");

    // master now points at the side tip
    let history = repo.repo.log(None).unwrap();
    assert_eq!(history[0].oid, side_tip);
}

#[test]
fn non_overlapping_changes_merge_into_a_two_parent_commit() {
    let repo = TestRepo::init();

    repo.commit_file("shared.txt", "base", "initial commit");
    repo.repo.create_branch("side").unwrap();

    repo.repo.checkout("side").unwrap();
    let side_tip = repo.commit_file("theirs.txt", "their change", "side commit");

    repo.repo.checkout("master").unwrap();
    let master_tip = repo.commit_file("ours.txt", "our change", "master commit");

    let result = repo.repo.merge("side", MergeStrategy::Resolve).unwrap();

    assert_eq!(result.status, MergeStatus::Merged);
    let merge_commit = result.commit.unwrap();

    assert_eq!(repo.read_file("ours.txt"), "our change");
    assert_eq!(repo.read_file("theirs.txt"), "their change");

    // merge history reaches both tips
    let history = repo.repo.log(None).unwrap();
    let oids: Vec<_> = history.iter().map(|c| c.oid).collect();
    assert_eq!(oids[0], merge_commit);
    assert!(oids.contains(&master_tip));
    assert!(oids.contains(&side_tip));
}

#[test]
fn divergent_edits_to_one_file_conflict() {
    let repo = diverged_repo();
    let head_before = repo.repo.log(None).unwrap()[0].oid;

    let result = repo.repo.merge("side", MergeStrategy::Resolve).unwrap();

    assert_eq!(result.status, MergeStatus::Conflicting);
    assert_eq!(result.conflicts, vec![Path::new("test.txt").to_path_buf()]);
    assert_eq!(result.commit, None);

    // our content stays in the working tree, the branch does not move
    assert_eq!(repo.read_file("test.txt"), "1\na\n3\n");
    assert_eq!(repo.repo.log(None).unwrap()[0].oid, head_before);
}

#[test]
fn committing_with_unresolved_conflicts_fails() {
    let repo = diverged_repo();
    repo.repo.merge("side", MergeStrategy::Resolve).unwrap();

    let result = repo.repo.commit(&CommitOptions {
        message: "premature".to_string(),
        author: Some("Test Author <test@example.com>".to_string()),
    });

    match result {
        Err(Error::UnresolvedConflict { paths }) => {
            assert_eq!(paths, vec![Path::new("test.txt").to_path_buf()]);
        }
        other => panic!("expected UnresolvedConflict, got {other:?}"),
    }
}

#[test]
fn staging_a_resolution_unblocks_the_commit() {
    let repo = diverged_repo();
    repo.repo.merge("side", MergeStrategy::Resolve).unwrap();

    repo.write_file("test.txt", "1\nresolved\n3\n");
    repo.add("test.txt");
    repo.commit("resolve the conflict");

    let head = repo.repo.log(None).unwrap()[0].oid.to_hex();
    assert_eq!(
        &repo.repo.show(&head, Path::new("test.txt")).unwrap()[..],
        b"1\nresolved\n3\n"
    );
}

#[test]
fn take_ours_resolves_conflicts_in_our_favor() {
    let repo = diverged_repo();

    let result = repo.repo.merge("side", MergeStrategy::TakeOurs).unwrap();

    assert_eq!(result.status, MergeStatus::Merged);
    assert!(result.conflicts.is_empty());
    assert!(result.commit.is_some());
    assert_eq!(repo.read_file("test.txt"), "1\na\n3\n");
    assert_eq!(
        &repo.repo.show("HEAD", Path::new("test.txt")).unwrap()[..],
        b"1\na\n3\n"
    );

    // the merge commit still joins both histories
    let history = repo.repo.log(None).unwrap();
    let messages: Vec<&str> = history.iter().map(|c| c.message.as_str()).collect();
    assert!(messages.contains(&"side edit"));
    assert!(messages.contains(&"master edit"));
}

#[test]
fn clean_changes_still_land_under_take_ours() {
    let repo = TestRepo::init();

    repo.commit_file("conflicting.txt", "base", "initial commit");
    repo.repo.create_branch("side").unwrap();

    repo.repo.checkout("side").unwrap();
    repo.commit_file("conflicting.txt", "theirs", "side conflict edit");
    repo.commit_file("clean.txt", "their clean change", "side clean add");

    repo.repo.checkout("master").unwrap();
    repo.commit_file("conflicting.txt", "ours", "master edit");

    let result = repo.repo.merge("side", MergeStrategy::TakeOurs).unwrap();

    assert_eq!(result.status, MergeStatus::Merged);
    assert_eq!(repo.read_file("conflicting.txt"), "ours");
    assert_eq!(repo.read_file("clean.txt"), "their clean change");
}

#[test]
fn a_second_merge_during_a_conflict_is_rejected() {
    let repo = diverged_repo();
    repo.repo.merge("side", MergeStrategy::Resolve).unwrap();

    let result = repo.repo.merge("side", MergeStrategy::Resolve);
    assert!(matches!(result, Err(Error::UnresolvedConflict { .. })));
}
