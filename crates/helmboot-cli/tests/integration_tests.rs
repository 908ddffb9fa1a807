//! Integration tests for CLI commands

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const HELM: &str = if cfg!(windows) { "helm.exe" } else { "helm" };

/// Helper to run helmboot in `dir` with a clean environment
fn helmboot(dir: &Path, args: &[&str]) -> std::process::Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_helmboot"));
    for (key, _) in std::env::vars() {
        if key.starts_with("HELMBOOT_") {
            command.env_remove(key);
        }
    }
    command
        .current_dir(dir)
        .env("HELMBOOT_CREDENTIALS", dir.join("credentials.yaml"))
        .args(args)
        .output()
        .expect("Failed to execute helmboot")
}

fn release_archive(dir: &Path) -> std::path::PathBuf {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in [
        ("release/LICENSE".to_string(), b"license".as_slice()),
        (format!("release/{}", HELM), b"#!/bin/sh\necho helm\n".as_slice()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, &path, content).unwrap();
    }
    let bytes = builder.into_inner().unwrap().finish().unwrap();

    let path = dir.join("helm-release.tar.gz");
    std::fs::write(&path, bytes).unwrap();
    path
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let temp = TempDir::new().unwrap();
        let output = helmboot(temp.path(), &["--help"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("init"));
        assert!(stdout(&output).contains("detect"));
    }

    #[test]
    fn test_unknown_command_is_usage_error() {
        let temp = TempDir::new().unwrap();
        let output = helmboot(temp.path(), &["frobnicate"]);
        assert_eq!(output.status.code(), Some(64));
    }
}

mod detect_command {
    use super::*;

    #[test]
    fn test_detect_tar_gz() {
        let temp = TempDir::new().unwrap();
        let archive = release_archive(temp.path());

        let output = helmboot(temp.path(), &["detect", archive.to_str().unwrap()]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let out = stdout(&output);
        assert!(out.contains("Compression: gz"));
        assert!(out.contains("Container: tar"));
        assert!(out.contains("Entries: 2"));
        assert!(out.contains(&format!("release/{}", HELM)));
    }

    #[test]
    fn test_detect_unrecognized() {
        let temp = TempDir::new().unwrap();
        let bogus = temp.path().join("index.html");
        std::fs::write(&bogus, "<html>Not Found</html>").unwrap();

        let output = helmboot(temp.path(), &["detect", bogus.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(4));
        assert!(stderr(&output).contains("Unrecognized archive format"));
    }
}

mod install_command {
    use super::*;

    #[test]
    fn test_install_from_local_archive() {
        let temp = TempDir::new().unwrap();
        let archive = release_archive(temp.path());
        let install_dir = temp.path().join("tools");

        let output = helmboot(
            temp.path(),
            &[
                "install",
                "--download-url",
                archive.to_str().unwrap(),
                "--install-dir",
                install_dir.to_str().unwrap(),
            ],
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let helm = install_dir.join(HELM);
        assert!(stdout(&output).contains(&helm.display().to_string()));
        assert_eq!(std::fs::read(&helm).unwrap(), b"#!/bin/sh\necho helm\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&helm).unwrap().permissions().mode();
            assert_ne!(mode & 0o100, 0);
        }
    }

    #[test]
    fn test_install_reuses_existing_binary() {
        let temp = TempDir::new().unwrap();
        let install_dir = temp.path().join("tools");
        std::fs::create_dir_all(&install_dir).unwrap();
        std::fs::write(install_dir.join(HELM), b"existing").unwrap();

        let output = helmboot(
            temp.path(),
            &[
                "install",
                "--download-url",
                temp.path().join("missing.tar.gz").to_str().unwrap(),
                "--install-dir",
                install_dir.to_str().unwrap(),
            ],
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(std::fs::read(install_dir.join(HELM)).unwrap(), b"existing");
    }

    #[test]
    fn test_install_missing_archive_is_download_error() {
        let temp = TempDir::new().unwrap();
        let output = helmboot(
            temp.path(),
            &[
                "install",
                "--download-url",
                temp.path().join("missing.tar.gz").to_str().unwrap(),
                "--install-dir",
                temp.path().join("tools").to_str().unwrap(),
            ],
        );
        assert_eq!(output.status.code(), Some(3));
        assert!(stderr(&output).contains("Download failed"));
    }
}

mod init_command {
    use super::*;

    #[test]
    fn test_init_skip() {
        let temp = TempDir::new().unwrap();
        let output = helmboot(temp.path(), &["init", "--skip"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("skipped"));
        assert!(!temp.path().join("target").exists());
    }

    #[test]
    fn test_init_skip_from_settings_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("helmboot.yaml"), "skipInit: true\n").unwrap();

        let output = helmboot(temp.path(), &["init"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("skipped"));
    }

    #[test]
    fn test_init_invalid_settings_is_config_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("helmboot.yaml"),
            "repositories:\n  - name: stable\n    url: not-a-url\n",
        )
        .unwrap();

        let output = helmboot(temp.path(), &["init"]);
        assert_eq!(output.status.code(), Some(2));
        assert!(stderr(&output).contains("Configuration error"));
    }
}

mod credentials_command {
    use super::*;

    #[test]
    fn test_set_list_remove() {
        let temp = TempDir::new().unwrap();

        let output = helmboot(
            temp.path(),
            &["credentials", "set", "private", "-u", "alice", "-p", "s3cret"],
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(!stdout(&output).contains("s3cret"));

        let output = helmboot(temp.path(), &["credentials", "list"]);
        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("private"));
        assert!(out.contains("alice"));
        assert!(!out.contains("s3cret"));

        let output = helmboot(temp.path(), &["credentials", "remove", "private"]);
        assert!(output.status.success());

        let output = helmboot(temp.path(), &["credentials", "list"]);
        assert!(stdout(&output).contains("No credentials stored"));
    }

    #[test]
    fn test_set_without_password_is_usage_error() {
        let temp = TempDir::new().unwrap();
        let output = helmboot(temp.path(), &["credentials", "set", "private"]);
        assert_eq!(output.status.code(), Some(64));
    }

    #[test]
    fn test_remove_unknown_is_config_error() {
        let temp = TempDir::new().unwrap();
        let output = helmboot(temp.path(), &["credentials", "remove", "nope"]);
        assert_eq!(output.status.code(), Some(2));
    }
}
