use assert_cmd::Command;
use chrono::{Duration, Local, TimeZone};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tempfile::TempDir;
use walkdir::WalkDir;

const ACCOUNT: &str = "me@example.com";

struct TempArchive {
    name: &'static str,
    tmp_dir: Option<TempDir>,
    store_dir: PathBuf,
    output_dir: PathBuf,
    settings: PathBuf,
    log_file: PathBuf,
}

impl TempArchive {
    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
        cmd.arg("--quiet")
            .arg("--settings")
            .arg(&self.settings)
            .arg("--output")
            .arg(&self.output_dir)
            .arg("--log-file")
            .arg(&self.log_file)
            .arg(&self.store_dir);
        cmd
    }

    fn write_settings(&self, content: &str) -> io::Result<()> {
        fs::write(&self.settings, content)
    }

    fn add_email(&self, folder: &str, file: &str, subject: &str, sent_epoch: i64) -> io::Result<()> {
        let sent = Local.timestamp_opt(sent_epoch, 0).unwrap();
        let content = format!(
            "From: someone@example.com\r\nSubject: {}\r\nDate: {}\r\n\r\nHello\r\n",
            subject,
            sent.to_rfc2822()
        );
        let dir = self.store_dir.join(ACCOUNT).join(folder);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file), content)
    }
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        let tmp_dir = self.tmp_dir.take().unwrap();
        if env::var("KEEP_TEST_DIR").is_err() {
            tmp_dir.close().unwrap();
        } else {
            #[allow(deprecated)]
            let path = tmp_dir.into_path();
            eprintln!("{}: {:?}", self.name, path);
        }
    }
}

fn setup_archive(name: &'static str) -> io::Result<TempArchive> {
    let tmp_dir = TempDir::new()?;
    let store_dir = tmp_dir.path().join("store");
    let output_dir = tmp_dir.path().join("Emails");
    let settings = tmp_dir.path().join("settings.ini");
    let log_file = tmp_dir.path().join("email-archiver.log");
    fs::create_dir_all(store_dir.join(ACCOUNT))?;
    Ok(TempArchive {
        name,
        tmp_dir: Some(tmp_dir),
        store_dir,
        output_dir,
        settings,
        log_file,
    })
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut result: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    result.sort();
    result
}

fn mtime_epoch(path: &Path) -> i64 {
    let mtime = fs::metadata(path).unwrap().modified().unwrap();
    mtime.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
}

#[test]
fn basic_export() {
    let archive = setup_archive("basic_export").unwrap();
    archive
        .write_settings("[Settings]\nEmailMaxAgeDays = 5\ndeleteOldEmails = False\n")
        .unwrap();
    let recent = (Local::now() - Duration::days(1)).timestamp();
    let nested = (Local::now() - Duration::hours(2)).timestamp();
    let old = (Local::now() - Duration::days(30)).timestamp();
    archive.add_email("Inbox", "1.eml", "Hello, World", recent).unwrap();
    archive.add_email("Inbox", "2.eml", "Ancient", old).unwrap();
    archive.add_email("Inbox/Clients: ACME", "3.eml", "", nested).unwrap();
    archive.add_email("Junk Email", "4.eml", "Spam", recent).unwrap();

    assert!(run_ok(&archive).contains("Processed 3 emails with 2 new emails discovered"));

    let inbox = archive.output_dir.join("Inbox");
    let first = inbox.join(format!("{}_Hello_World.msg", recent));
    let second = inbox
        .join("Clients ACME")
        .join(format!("{}_No_Subject_Provided.msg", nested));
    assert_eq!(list_files(&archive.output_dir), vec![first.clone(), second.clone()]);
    assert_eq!(mtime_epoch(&first), recent);
    assert_eq!(mtime_epoch(&second), nested);
    assert!(!archive.output_dir.join("Junk Email").exists());

    // A second run finds everything exported already.
    assert!(run_ok(&archive).contains("Processed 3 emails with 0 new emails discovered"));
    assert_eq!(list_files(&archive.output_dir).len(), 2);

    let log = fs::read_to_string(&archive.log_file).unwrap();
    assert!(log.contains("Number of email accounts: 1"));
    assert!(log.contains("Summary of email archive activity"));
}

#[test]
fn sweep_old_exports() {
    let archive = setup_archive("sweep_old_exports").unwrap();
    archive
        .write_settings("[Settings]\nEmailMaxAgeDays = 5\ndeleteOldEmails = True\n")
        .unwrap();
    let stale = archive.output_dir.join("Inbox").join("1_Stale.msg");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "0123456789").unwrap();
    fs::File::options()
        .write(true)
        .open(&stale)
        .unwrap()
        .set_modified(UNIX_EPOCH)
        .unwrap();

    assert!(run_ok(&archive).contains("Successfully removed 1 emails consuming 0.000MB"));
    assert!(!stale.exists());
}

#[test]
fn missing_settings() {
    let archive = setup_archive("missing_settings").unwrap();
    archive.command().assert().failure();
    assert!(!archive.output_dir.exists());
}

#[test]
fn requires_single_account() {
    let archive = setup_archive("requires_single_account").unwrap();
    archive
        .write_settings("[Settings]\nEmailMaxAgeDays = 5\ndeleteOldEmails = True\n")
        .unwrap();
    fs::create_dir_all(archive.store_dir.join("other@example.com").join("Inbox")).unwrap();
    archive.add_email("Inbox", "1.eml", "Hi", Local::now().timestamp()).unwrap();

    archive.command().assert().failure();
    assert!(!archive.output_dir.exists());
    let log = fs::read_to_string(&archive.log_file).unwrap();
    assert!(log.contains("Number of email accounts: 2"));
}

fn run_ok(archive: &TempArchive) -> String {
    let output = archive.command().assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}
