use thiserror::Error;

#[derive(Debug, Error)]
pub enum KbError {
    #[error("failed to create knowledge base directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write record {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read record {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize record {path}: {source}")]
    Serde {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognised experience type: {0}")]
    InvalidExperienceType(String),
}
