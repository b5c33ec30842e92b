pub mod filesystem;

pub use filesystem::FilesystemDocumentStore;
