//! Test doubles for the runner and archive source seams

use std::cell::{Cell, RefCell};
use std::io::{self, Cursor, Read};

use helmboot_repo::{ArchiveSource, RepoError, Result as RepoResult};

use crate::runner::{CommandLine, CommandOutput, CommandRunner};

/// Records every command and fails those containing a given argument
#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<CommandLine>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn failing_on(arg: &str) -> Self {
        Self {
            calls: RefCell::default(),
            fail_on: Some(arg.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &CommandLine) -> io::Result<CommandOutput> {
        self.calls.borrow_mut().push(command.clone());
        let fails = self
            .fail_on
            .as_deref()
            .is_some_and(|needle| command.args().iter().any(|a| a == needle));
        if fails {
            return Ok(CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "Error: simulated failure\n".to_string(),
            });
        }
        Ok(CommandOutput::success())
    }
}

/// In-memory archive that counts how often it was opened
pub struct CountingSource {
    bytes: Vec<u8>,
    opens: Cell<usize>,
}

impl CountingSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            opens: Cell::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.get()
    }
}

impl ArchiveSource for &CountingSource {
    fn location(&self) -> String {
        "memory://helm.tar.gz".to_string()
    }

    fn open(&self) -> RepoResult<Box<dyn Read>> {
        self.opens.set(self.opens.get() + 1);
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }
}

/// Archive whose stream fails after `cut` bytes, like a reset connection
pub struct InterruptedSource {
    bytes: Vec<u8>,
    cut: usize,
}

impl InterruptedSource {
    pub fn new(bytes: Vec<u8>, cut: usize) -> Self {
        Self { bytes, cut }
    }
}

impl ArchiveSource for InterruptedSource {
    fn location(&self) -> String {
        "https://get.helm.sh/helm.tar.gz".to_string()
    }

    fn open(&self) -> RepoResult<Box<dyn Read>> {
        let head = Cursor::new(self.bytes[..self.cut].to_vec());
        Ok(Box::new(head.chain(ResetConnection {
            url: self.location(),
        })))
    }
}

struct ResetConnection {
    url: String,
}

impl Read for ResetConnection {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            RepoError::NetworkError {
                url: self.url.clone(),
                message: "connection reset by peer".to_string(),
            },
        ))
    }
}

/// gzip-compressed tar with regular file entries
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}
