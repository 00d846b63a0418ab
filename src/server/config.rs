use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8081;

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Worker threads handling connections
    #[arg(short, long, default_value_t = 10)]
    pub threads: usize,

    /// Directory served as the site root
    #[arg(short, long, default_value = ".")]
    pub document_root: PathBuf,

    /// Largest file served, in bytes (default: 128 MiB)
    #[arg(long, default_value_t = 134217728)] // 128 * 1024 * 1024
    pub max_file_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            threads: 10,
            document_root: PathBuf::from("."),
            max_file_size: 134217728,
        }
    }
}
