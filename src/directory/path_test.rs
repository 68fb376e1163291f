use super::*;
use crate::DirectoryError;
use crate::Error;

fn is_invalid_argument(result: Result<impl std::fmt::Debug>) -> bool {
    matches!(result, Err(Error::Directory(DirectoryError::InvalidArgument(_))))
}

#[test]
fn root_marker_has_no_segments() {
    assert!(segments("/").unwrap().is_empty());
}

#[test]
fn nested_path_is_split_in_order() {
    assert_eq!(segments("/pools/p1/members").unwrap(), vec!["pools", "p1", "members"]);
}

#[test]
fn relative_and_malformed_paths_are_rejected() {
    assert!(is_invalid_argument(segments("pools")));
    assert!(is_invalid_argument(segments("")));
    assert!(is_invalid_argument(segments("/pools//p1")));
    assert!(is_invalid_argument(segments("/pools/")));
}

#[test]
fn split_parent_refuses_the_root() {
    assert!(is_invalid_argument(split_parent("/")));

    let (parent, name) = split_parent("/a/b").unwrap();
    assert_eq!(parent, vec!["a"]);
    assert_eq!(name, "b");
}

#[test]
fn join_handles_root_and_nested_parents() {
    assert_eq!(join("", "a"), "/a");
    assert_eq!(join("/", "a"), "/a");
    assert_eq!(join("/a", "b"), "/a/b");
}

#[test]
fn path_builder_normalizes_base() {
    let paths = PathBuilder::new("/midonet/").unwrap();
    assert_eq!(paths.base_path(), "/midonet");
    assert_eq!(paths.path(&["pools"]), "/midonet/pools");
    assert_eq!(paths.path(&[]), "/midonet");

    let root = PathBuilder::new("/").unwrap();
    assert_eq!(root.path(&[]), "/");
    assert_eq!(root.path(&["tenants", "t1"]), "/tenants/t1");
}

#[test]
fn path_builder_rejects_relative_base() {
    assert!(PathBuilder::new("midonet").is_err());
}
