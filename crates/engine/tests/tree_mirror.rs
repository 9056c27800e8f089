//! Share-level mirroring scenarios against the in-memory connector.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use engine::{
    CancellationToken, ChangeDetector, EmptyDirPruner, MirrorError, MirrorRecord, TransferOptions,
    TransferOutcome, TreeMirror, VerifyMode,
};
use remote::{
    Connector, Credentials, Endpoint, MemoryClient, MemoryConnector, RemoteEntry, RemoteError,
    RemoteFilesystemClient, RemotePath, ShareDescriptor,
};

const HOST: &str = "192.168.10.83";
const SHARE: &str = "EMMC Images";

fn connect(connector: &MemoryConnector) -> MemoryClient {
    connector
        .connect(&Endpoint::new(HOST, 445), &Credentials::default())
        .expect("connect")
}

fn mirror_share(
    connector: &MemoryConnector,
    mirror: &TreeMirror,
    local: &Path,
) -> (Result<engine::MirrorStats, MirrorError>, Vec<MirrorRecord>) {
    let mut client = connect(connector);
    let mut records: Vec<MirrorRecord> = Vec::new();
    let result = mirror.mirror(
        &mut client,
        SHARE,
        &RemotePath::root(),
        local,
        &mut |record: MirrorRecord| records.push(record),
    );
    (result, records)
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read_dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn nested_tree_mirrors_to_identical_structure() {
    let connector = MemoryConnector::new();
    connector
        .add_file(HOST, SHARE, "/Autorun/Light/M42/frame_001.fit", &[1u8; 4096])
        .add_file(HOST, SHARE, "/Autorun/Light/M42/frame_002.fit", &[2u8; 5000])
        .add_file(HOST, SHARE, "/Autorun/Log/session.txt", b"started")
        .add_file(HOST, SHARE, "/readme.txt", b"hello")
        .add_directory(HOST, SHARE, "/Plan/empty");
    let temp = tempfile::tempdir().expect("tempdir");

    let (result, _) = mirror_share(&connector, &TreeMirror::default(), temp.path());
    let stats = result.expect("mirror");

    let root = temp.path();
    assert_eq!(listing(root), vec!["Autorun", "Plan", "readme.txt"]);
    assert_eq!(listing(&root.join("Autorun")), vec!["Light", "Log"]);
    assert_eq!(
        listing(&root.join("Autorun/Light/M42")),
        vec!["frame_001.fit", "frame_002.fit"]
    );
    assert_eq!(
        fs::read(root.join("Autorun/Light/M42/frame_002.fit")).expect("read"),
        vec![2u8; 5000]
    );
    assert!(root.join("Plan/empty").is_dir());
    assert_eq!(stats.files_copied, 4);
    assert_eq!(stats.directories_created, 6);
    assert_eq!(stats.bytes_copied, 4096 + 5000 + 7 + 5);
}

#[test]
fn second_run_transfers_nothing() {
    let connector = MemoryConnector::new();
    connector
        .add_file(HOST, SHARE, "/a/one.fit", &[0u8; 100])
        .add_file(HOST, SHARE, "/a/b/two.fit", &[0u8; 200])
        .add_file(HOST, SHARE, "/zero.bin", b"");
    let temp = tempfile::tempdir().expect("tempdir");
    let mirror = TreeMirror::default();

    let (first, _) = mirror_share(&connector, &mirror, temp.path());
    assert_eq!(first.expect("first").files_copied, 3);
    let retrievals = connector.retrieve_count();

    let (second, records) = mirror_share(&connector, &mirror, temp.path());
    let second = second.expect("second");
    assert_eq!(second.files_copied, 0);
    assert_eq!(second.files_skipped, 3);
    assert_eq!(second.directories_created, 0);
    assert_eq!(connector.retrieve_count(), retrievals);
    assert!(
        records
            .iter()
            .all(|record| record.outcome() == Some(&TransferOutcome::Skipped))
    );
}

#[test]
fn grown_file_is_transferred_again() {
    let connector = MemoryConnector::new();
    connector.add_file(HOST, SHARE, "/photo.jpg", &[7u8; 150]);
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("photo.jpg"), [1u8; 100]).expect("seed");

    let (result, records) = mirror_share(&connector, &TreeMirror::default(), temp.path());
    result.expect("mirror");

    let local = fs::read(temp.path().join("photo.jpg")).expect("read");
    assert_eq!(local.len(), 150);
    assert_eq!(records[0].outcome(), Some(&TransferOutcome::Copied));
    assert_eq!(records[0].size(), 150);
}

#[test]
fn interrupted_transfer_leaves_no_wrong_sized_file() {
    let connector = MemoryConnector::new();
    connector
        .add_file(HOST, SHARE, "/big.fits", &[5u8; 64 * 1024])
        .fail_retrieve_after(HOST, SHARE, "/big.fits", 20_000)
        .add_file(HOST, SHARE, "/small.fits", &[6u8; 10]);
    let temp = tempfile::tempdir().expect("tempdir");

    let (result, records) = mirror_share(&connector, &TreeMirror::default(), temp.path());
    let stats = result.expect("file failures do not abort the share");

    assert!(!temp.path().join("big.fits").exists());
    assert_eq!(listing(temp.path()), vec!["small.fits"]);
    assert_eq!(stats.files_failed, 1);
    assert_eq!(stats.files_copied, 1);
    assert!(matches!(
        records[0].outcome(),
        Some(TransferOutcome::Failed(reason)) if reason.contains("big.fits")
    ));
}

#[test]
fn zero_byte_remote_matches_only_zero_byte_local() {
    let connector = MemoryConnector::new();
    connector
        .add_file(HOST, SHARE, "/empty.txt", b"")
        .add_file(HOST, SHARE, "/stale.txt", b"");
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("empty.txt"), b"").expect("seed");
    fs::write(temp.path().join("stale.txt"), b"left over").expect("seed");

    let (result, _) = mirror_share(&connector, &TreeMirror::default(), temp.path());
    let stats = result.expect("mirror");

    assert_eq!(stats.files_skipped, 1);
    assert_eq!(stats.files_copied, 1);
    assert_eq!(fs::metadata(temp.path().join("stale.txt")).expect("meta").len(), 0);
}

#[test]
fn listing_failure_abandons_share() {
    let connector = MemoryConnector::new();
    connector
        .add_file(HOST, SHARE, "/a/first.fit", b"1")
        .add_file(HOST, SHARE, "/b/locked.fit", b"2")
        .add_file(HOST, SHARE, "/c/never.fit", b"3")
        .fail_listing(HOST, SHARE, "/b");
    let temp = tempfile::tempdir().expect("tempdir");

    let (result, _) = mirror_share(&connector, &TreeMirror::default(), temp.path());

    let error = result.expect_err("listing failure");
    assert!(matches!(error, MirrorError::List(_)));
    assert!(temp.path().join("a/first.fit").is_file());
    assert!(!temp.path().join("c").exists());
}

#[test]
fn unknown_entry_kind_is_attempted_as_file() {
    let connector = MemoryConnector::new();
    connector
        .add_other(HOST, SHARE, "/device")
        .add_file(HOST, SHARE, "/zz.fit", b"data");
    let temp = tempfile::tempdir().expect("tempdir");

    let (result, records) = mirror_share(&connector, &TreeMirror::default(), temp.path());
    let stats = result.expect("mirror");

    assert_eq!(records.len(), 2);
    assert!(matches!(
        records[0].outcome(),
        Some(TransferOutcome::Failed(_))
    ));
    assert_eq!(stats.files_copied, 1);
    assert!(temp.path().join("zz.fit").is_file());
}

#[test]
fn cancelled_mirror_stops_before_copying() {
    let connector = MemoryConnector::new();
    connector.add_file(HOST, SHARE, "/a.fit", b"data");
    let temp = tempfile::tempdir().expect("tempdir");
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mirror = TreeMirror::new(ChangeDetector::default(), TransferOptions::default(), cancel);

    let (result, records) = mirror_share(&connector, &mirror, temp.path());

    assert!(matches!(result, Err(MirrorError::Cancelled)));
    assert!(records.is_empty());
    assert!(listing(temp.path()).is_empty());
}

#[test]
fn checksum_mode_replaces_same_length_edit() {
    let connector = MemoryConnector::new();
    connector.add_file(HOST, SHARE, "/notes.txt", b"new text");
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("notes.txt"), b"old text").expect("seed");

    let (size_only, _) = mirror_share(&connector, &TreeMirror::default(), temp.path());
    assert_eq!(size_only.expect("size").files_skipped, 1);
    assert_eq!(fs::read(temp.path().join("notes.txt")).expect("read"), b"old text");

    let strict = TreeMirror::new(
        ChangeDetector::new(VerifyMode::Checksum),
        TransferOptions::default(),
        CancellationToken::new(),
    );
    let (checked, _) = mirror_share(&connector, &strict, temp.path());
    assert_eq!(checked.expect("checksum").files_copied, 1);
    assert_eq!(fs::read(temp.path().join("notes.txt")).expect("read"), b"new text");
}

#[test]
fn empty_remote_directories_are_pruned_after_mirroring() {
    let connector = MemoryConnector::new();
    connector
        .add_directory(HOST, SHARE, "/Plan/empty/deeper")
        .add_file(HOST, SHARE, "/Autorun/kept.fit", b"x");
    let temp = tempfile::tempdir().expect("tempdir");
    let run_dir = temp.path().join("20240511");
    let share_dir = run_dir.join(SHARE);
    fs::create_dir_all(&share_dir).expect("share dir");

    let (result, _) = mirror_share(&connector, &TreeMirror::default(), &share_dir);
    result.expect("mirror");
    assert!(share_dir.join("Plan/empty/deeper").is_dir());

    let pruner = EmptyDirPruner::new();
    let summary = pruner.prune(&run_dir).expect("prune");
    assert_eq!(summary.removed.len(), 3);
    assert!(!share_dir.join("Plan").exists());
    assert!(share_dir.join("Autorun/kept.fit").is_file());

    assert!(pruner.prune(&run_dir).expect("again").removed.is_empty());
}

#[test]
fn leftover_temporary_file_is_cleared_on_the_next_run() {
    let connector = MemoryConnector::new();
    connector.add_file(HOST, SHARE, "/Autorun/Light/big.fits", &[3u8; 64]);
    let temp = tempfile::tempdir().expect("tempdir");
    let light = temp.path().join("Autorun/Light");
    fs::create_dir_all(&light).expect("mkdir");
    fs::write(light.join(".big.fits.Ab12Cd"), [3u8; 10]).expect("leftover");

    let (result, _) = mirror_share(&connector, &TreeMirror::default(), temp.path());
    result.expect("mirror");

    assert_eq!(listing(&light), vec!["big.fits"]);
    assert_eq!(fs::read(light.join("big.fits")).expect("read"), vec![3u8; 64]);
}

const CHUNK: usize = 1024;
const CHUNKS: usize = 50;

/// Serves one `/big.fits` slowly, a chunk every 10 ms.
struct TrickleClient {
    endpoint: Endpoint,
    cancel_after: Option<(usize, CancellationToken)>,
    chunks_sent: usize,
}

impl TrickleClient {
    fn new(cancel_after: Option<(usize, CancellationToken)>) -> Self {
        Self {
            endpoint: Endpoint::new(HOST, 445),
            cancel_after,
            chunks_sent: 0,
        }
    }
}

impl RemoteFilesystemClient for TrickleClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn list_shares(&mut self) -> Result<Vec<ShareDescriptor>, RemoteError> {
        Ok(Vec::new())
    }

    fn list_path(
        &mut self,
        _share: &str,
        _path: &RemotePath,
    ) -> Result<Vec<RemoteEntry>, RemoteError> {
        Ok(vec![RemoteEntry::file("big.fits", (CHUNK * CHUNKS) as u64)])
    }

    fn retrieve_file(
        &mut self,
        share: &str,
        path: &RemotePath,
        sink: &mut dyn Write,
    ) -> Result<u64, RemoteError> {
        for _ in 0..CHUNKS {
            thread::sleep(Duration::from_millis(10));
            sink.write_all(&[9u8; CHUNK])
                .map_err(|source| RemoteError::Retrieve {
                    share: share.to_owned(),
                    path: path.clone(),
                    source,
                })?;
            self.chunks_sent += 1;
            if let Some((after, cancel)) = &self.cancel_after
                && self.chunks_sent == *after
            {
                cancel.cancel();
            }
        }
        Ok((CHUNK * CHUNKS) as u64)
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        Ok(())
    }
}

fn seed_same_length_copy(dir: &Path) {
    fs::write(dir.join("big.fits"), vec![1u8; CHUNK * CHUNKS]).expect("seed");
}

#[test]
fn checksum_pass_stops_promptly_on_cancellation() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed_same_length_copy(temp.path());
    let cancel = CancellationToken::new();
    let mirror = TreeMirror::new(
        ChangeDetector::new(VerifyMode::Checksum),
        TransferOptions::default(),
        cancel.clone(),
    );
    let mut client = TrickleClient::new(Some((1, cancel)));
    let mut records: Vec<MirrorRecord> = Vec::new();

    let result = mirror.mirror(
        &mut client,
        SHARE,
        &RemotePath::root(),
        temp.path(),
        &mut |record: MirrorRecord| records.push(record),
    );

    assert!(matches!(result, Err(MirrorError::Cancelled)));
    assert!(client.chunks_sent < CHUNKS, "streamed {} chunks", client.chunks_sent);
    assert!(records.is_empty());
    assert_eq!(
        fs::read(temp.path().join("big.fits")).expect("read"),
        vec![1u8; CHUNK * CHUNKS]
    );
}

#[test]
fn checksum_pass_obeys_transfer_deadline() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed_same_length_copy(temp.path());
    let mirror = TreeMirror::new(
        ChangeDetector::new(VerifyMode::Checksum),
        TransferOptions {
            retries: 0,
            timeout: Some(Duration::from_millis(20)),
        },
        CancellationToken::new(),
    );
    let mut client = TrickleClient::new(None);
    let mut records: Vec<MirrorRecord> = Vec::new();

    let stats = mirror
        .mirror(
            &mut client,
            SHARE,
            &RemotePath::root(),
            temp.path(),
            &mut |record: MirrorRecord| records.push(record),
        )
        .expect("mirror");

    assert!(client.chunks_sent < CHUNKS, "streamed {} chunks", client.chunks_sent);
    assert_eq!(stats.files_failed, 1);
    assert_eq!(stats.files_skipped, 0);
    assert_eq!(records.len(), 1);
    assert!(matches!(records[0].outcome(), Some(TransferOutcome::Failed(_))));
}
