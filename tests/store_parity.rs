//! The two storage representations must agree on sibling order.
//!
//! Every scenario runs the same mutation sequence against the name-encoded
//! filesystem store and the metadata-ordinal store, then compares the
//! (ordinal-free name, ordinal) sequences both report.

use folio::config::EngineConfig;
use folio::ops::MutationService;
use folio::ordinal::{assigned_siblings, encoding};
use folio::storage::{FsStore, MetaStore};
use std::sync::Arc;
use tempfile::TempDir;

fn fs_service() -> (TempDir, MutationService) {
    let dir = TempDir::new().unwrap();
    let store = FsStore::open(dir.path(), 4, "local").unwrap();
    let service = MutationService::new(Arc::new(store), EngineConfig::default());
    (dir, service)
}

fn meta_service() -> MutationService {
    let store = MetaStore::temporary("local").unwrap();
    MutationService::new(Arc::new(store), EngineConfig::default())
}

/// Friendly order: ordinal-free names paired with their ordinals.
fn friendly_order(service: &MutationService, parent: &str) -> Vec<(String, u32)> {
    assigned_siblings(service.storage(), parent)
        .unwrap()
        .into_iter()
        .map(|(name, ordinal)| (encoding::strip(&name).to_string(), ordinal))
        .collect()
}

fn on_both(run: impl Fn(&MutationService)) -> (Vec<(String, u32)>, Vec<(String, u32)>) {
    let (_dir, fs) = fs_service();
    let meta = meta_service();
    run(&fs);
    run(&meta);
    (friendly_order(&fs, "/"), friendly_order(&meta, "/"))
}

#[test]
fn create_sequences_agree() {
    let (fs, meta) = on_both(|service| {
        service.create_file("/", "c.md", "c", None).unwrap();
        service.create_file("/", "a.md", "a", None).unwrap();
        let anchor = assigned_siblings(service.storage(), "/").unwrap()[0].0.clone();
        service.create_file("/", "b.md", "b", Some(&anchor)).unwrap();
    });
    assert_eq!(fs, meta);
    assert_eq!(
        fs,
        vec![
            ("a.md".to_string(), 0),
            ("b.md".to_string(), 1),
            ("c.md".to_string(), 2),
        ]
    );
}

#[test]
fn swaps_agree() {
    let (fs, meta) = on_both(|service| {
        service.create_file("/", "y.md", "y", None).unwrap();
        service.create_file("/", "x.md", "x", None).unwrap();
        let first = assigned_siblings(service.storage(), "/").unwrap()[0].0.clone();
        service.move_down("/", &first).unwrap();
    });
    assert_eq!(fs, meta);
    assert_eq!(fs[0].0, "y.md");
    assert_eq!(fs[1].0, "x.md");
}

#[test]
fn same_folder_paste_agrees() {
    let (fs, meta) = on_both(|service| {
        service.create_file("/", "c.md", "c", None).unwrap();
        service.create_file("/", "b.md", "b", None).unwrap();
        service.create_file("/", "a.md", "a", None).unwrap();
        let last = assigned_siblings(service.storage(), "/").unwrap()[2].0.clone();
        service.paste("/", &[last], "/", None).unwrap();
    });
    assert_eq!(fs, meta);
    assert_eq!(fs[0].0, "c.md");
}

#[test]
fn deletes_leave_identical_gaps() {
    let (fs, meta) = on_both(|service| {
        service.create_file("/", "c.md", "c", None).unwrap();
        service.create_file("/", "b.md", "b", None).unwrap();
        service.create_file("/", "a.md", "a", None).unwrap();
        let middle = assigned_siblings(service.storage(), "/").unwrap()[1].0.clone();
        service.delete("/", &[middle]).unwrap();
    });
    assert_eq!(fs, meta);
    assert_eq!(fs, vec![("a.md".to_string(), 0), ("c.md".to_string(), 2)]);
}

#[test]
fn join_and_split_agree() {
    let (fs, meta) = on_both(|service| {
        service.create_file("/", "two.md", "beta", None).unwrap();
        service.create_file("/", "one.md", "alpha", None).unwrap();
        let names: Vec<String> = assigned_siblings(service.storage(), "/")
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        service.join("/", &names).unwrap();
        let joined = assigned_siblings(service.storage(), "/").unwrap()[0].0.clone();
        service.split("/", &joined, "\n\n").unwrap();
    });
    assert_eq!(fs, meta);
    assert_eq!(
        fs,
        vec![("one.md".to_string(), 0), ("one-1.md".to_string(), 1)]
    );
}

#[test]
fn convert_agrees_and_keeps_paths_stable_in_meta() {
    let meta = meta_service();
    meta.create_file("/", "plan.md", "# Plan\n\nbody", None).unwrap();
    meta.convert_to_folder("/", "plan.md").unwrap();

    // Metadata store never encodes ordinals into names.
    assert!(meta.storage().exists("/Plan").unwrap());
    assert!(meta.storage().exists("/Plan/content.md").unwrap());
    assert_eq!(meta.storage().ordinal_of("/Plan").unwrap(), Some(0));
    assert_eq!(meta.storage().ordinal_of("/Plan/content.md").unwrap(), Some(0));

    let (_dir, fs) = fs_service();
    fs.create_file("/", "plan.md", "# Plan\n\nbody", None).unwrap();
    fs.convert_to_folder("/", "0000_plan.md").unwrap();
    assert!(fs.storage().exists("/0000_Plan/0000_content.md").unwrap());

    assert_eq!(friendly_order(&fs, "/"), friendly_order(&meta, "/"));
}

#[test]
fn cross_folder_paste_agrees() {
    let check = |service: &MutationService| {
        service.create_folder("/", "dst", None).unwrap();
        service.create_file("/", "a.md", "a", None).unwrap();
        let (dst, item) = {
            let entries = assigned_siblings(service.storage(), "/").unwrap();
            (entries[1].0.clone(), entries[0].0.clone())
        };
        let target = format!("/{}", dst);
        service.paste("/", &[item], &target, None).unwrap();
        friendly_order(service, &target)
    };

    let (_dir, fs) = fs_service();
    let meta = meta_service();
    let fs_order = check(&fs);
    let meta_order = check(&meta);
    assert_eq!(fs_order, meta_order);
    assert_eq!(fs_order, vec![("a.md".to_string(), 0)]);
}
