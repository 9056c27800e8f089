//! End-to-end runs of the `share-mirror` binary over shares exported through a
//! mount root.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

const SERVER: &str = "192.168.10.83";

/// Mount root plus destination base inside one temporary directory.
struct Fixture {
    temp: TempDir,
    mount_root: PathBuf,
    dest: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let mount_root = temp.path().join("mnt");
        let dest = temp.path().join("dest");
        fs::create_dir_all(mount_root.join(SERVER)).expect("endpoint dir");
        Self {
            temp,
            mount_root,
            dest,
        }
    }

    fn write(&self, share_path: &str, data: &[u8]) {
        let path = self.mount_root.join(SERVER).join(share_path);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, data).expect("write");
    }

    fn mkdir(&self, share_path: &str) {
        fs::create_dir_all(self.mount_root.join(SERVER).join(share_path)).expect("mkdir");
    }

    fn run_dir(&self) -> PathBuf {
        self.dest.join("asiair4").join("20240511")
    }

    fn command(&self) -> Command {
        let mut command = Command::cargo_bin("share-mirror").expect("binary");
        command
            .arg("--dest")
            .arg(&self.dest)
            .arg("--mount-root")
            .arg(&self.mount_root)
            .args(["--user", "asiair", "--password", "12345678"])
            .args(["--date", "2024-05-11"])
            .env_remove("SHARE_MIRROR_LOG");
        command
    }
}

fn size_of(path: &Path) -> u64 {
    fs::metadata(path).expect("metadata").len()
}

#[test]
fn version_flag_succeeds() {
    let output = Command::cargo_bin("share-mirror")
        .expect("binary")
        .arg("--version")
        .output()
        .expect("run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("share-mirror "));
}

#[test]
fn mirrors_user_shares_and_prunes_empty_directories() {
    let fixture = Fixture::new();
    fixture.write("EMMC Images/Autorun/Light/M31/m31_0001.fit", &[1; 100]);
    fixture.write("EMMC Images/Autorun/Light/M31/m31_0002.fit", &[2; 150]);
    fixture.write("EMMC Images/readme.txt", b"");
    fixture.mkdir("Udisk/Plan/empty");
    fixture.write("IPC$/pipe", b"admin");

    let output = fixture
        .command()
        .args(["--server", &format!("{SERVER}=asiair4")])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(0), "{output:?}");

    let run_dir = fixture.run_dir();
    let m31 = run_dir.join("EMMC Images/Autorun/Light/M31");
    assert_eq!(size_of(&m31.join("m31_0001.fit")), 100);
    assert_eq!(size_of(&m31.join("m31_0002.fit")), 150);
    assert_eq!(size_of(&run_dir.join("EMMC Images/readme.txt")), 0);
    assert!(!run_dir.join("IPC$").exists());
    assert!(!run_dir.join("Udisk").exists());
    assert!(!fixture.dest.join("asiair4/.20240511.lock").exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("copied EMMC Images:/Autorun/Light/M31/m31_0001.fit"), "{stdout}");
    assert!(stdout.contains("Successfully copied share EMMC Images"), "{stdout}");
}

#[test]
fn second_run_only_copies_changed_files() {
    let fixture = Fixture::new();
    fixture.write("data/photo.jpg", &[0; 100]);
    fixture.write("data/big.fits", &[9; 4096]);
    let server = format!("{SERVER}=asiair4");

    fixture
        .command()
        .args(["--server", &server])
        .assert()
        .success();

    fixture.write("data/photo.jpg", &[0; 150]);
    let output = fixture
        .command()
        .args(["--server", &server])
        .output()
        .expect("run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("copied data:/photo.jpg"), "{stdout}");
    assert!(stdout.contains("skipped data:/big.fits"), "{stdout}");
    assert_eq!(size_of(&fixture.run_dir().join("data/photo.jpg")), 150);
}

#[test]
fn unreachable_server_does_not_fail_the_run() {
    let fixture = Fixture::new();
    fixture.write("data/a.fit", b"frame");

    let output = fixture
        .command()
        .args(["--server", "192.168.10.99=asiair9"])
        .args(["--server", &format!("{SERVER}=asiair4")])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(0));
    assert!(fixture.run_dir().join("data/a.fit").is_file());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("192.168.10.99 (asiair9): connection failed"), "{stdout}");
}

#[test]
fn configuration_file_drives_the_run() {
    let fixture = Fixture::new();
    fixture.write("data/a.fit", b"frame");
    let config = fixture.temp.path().join("share-mirror.json");
    fs::write(
        &config,
        format!(
            r#"{{
                "destination": {dest:?},
                "credentials": {{ "user": "asiair", "password": "12345678" }},
                "servers": [ {{ "address": "{SERVER}", "local_folder": "asiair4" }} ],
                "date_format": "[day][month][year repr:last_two]",
                "mount_root": {mount:?}
            }}"#,
            dest = fixture.dest.to_str().expect("utf8"),
            mount = fixture.mount_root.to_str().expect("utf8"),
        ),
    )
    .expect("write config");

    Command::cargo_bin("share-mirror")
        .expect("binary")
        .arg("--config")
        .arg(&config)
        .args(["--date", "2024-05-11", "-q"])
        .assert()
        .success();

    assert!(fixture.dest.join("asiair4/110524/data/a.fit").is_file());
}

#[test]
fn invalid_configuration_exits_with_usage_status() {
    let fixture = Fixture::new();
    let output = fixture.command().output().expect("run");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no servers configured"));
    assert!(!fixture.dest.exists());
}

#[cfg(unix)]
#[test]
fn per_file_lines_name_their_server() {
    const OTHER: &str = "192.168.10.84";
    let fixture = Fixture::new();
    fixture.write("data/a.fit", b"frame");
    let other_data = fixture.mount_root.join(OTHER).join("data");
    fs::create_dir_all(&other_data).expect("mkdir");
    fs::write(other_data.join("a.fit"), b"frame").expect("write");
    std::os::unix::fs::symlink(other_data.join("missing"), other_data.join("broken.fit"))
        .expect("symlink");

    let output = fixture
        .command()
        .args(["--server", &format!("{SERVER}=asiair4")])
        .args(["--server", &format!("{OTHER}=asiair5")])
        .output()
        .expect("run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("copied data:/a.fit from {SERVER}")), "{stdout}");
    assert!(stdout.contains(&format!("copied data:/a.fit from {OTHER}")), "{stdout}");
    assert!(
        stdout.contains(&format!("failed to copy data:/broken.fit from {OTHER}")),
        "{stdout}"
    );
}
