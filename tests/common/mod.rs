use assert_fs::TempDir;
use assert_fs::prelude::*;
use silt::areas::repository::Repository;
use silt::artifacts::objects::object_id::ObjectId;
use silt::commands::commit::CommitOptions;
use std::path::PathBuf;

/// An initialized repository in a temp directory, with command output
/// discarded.
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn init() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::new(dir.path(), Box::new(std::io::sink())).unwrap();
        repo.init().unwrap();

        TestRepo { dir, repo }
    }

    pub fn write_file(&self, path: &str, content: &str) {
        self.dir.child(path).write_str(content).unwrap();
    }

    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(path)).unwrap()
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.dir.path().join(path).exists()
    }

    pub fn add(&self, path: &str) {
        self.repo.add(&[PathBuf::from(path)]).unwrap();
    }

    pub fn commit(&self, message: &str) -> ObjectId {
        self.repo
            .commit(&CommitOptions {
                message: message.to_string(),
                author: Some("Test Author <test@example.com>".to_string()),
            })
            .unwrap()
    }

    /// Write, stage, and commit a single file.
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> ObjectId {
        self.write_file(path, content);
        self.add(path);
        self.commit(message)
    }
}
