pub mod config;
pub mod http_status;
pub mod request_handler;

use log::{debug, error, info};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use threadpool::ThreadPool;

use config::ServerConfig;
use request_handler::handle_client;

/// Blocking static file server. Runs until the process is terminated.
pub struct HttpServer {
    config: ServerConfig,
    listener: TcpListener,
    thread_pool: ThreadPool,
}

impl HttpServer {
    pub fn new(config: &ServerConfig) -> std::io::Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)?;

        info!("Server started on {}", addr);

        Ok(Self {
            config: config.clone(),
            listener,
            thread_pool: ThreadPool::new(config.threads.max(1)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn run(&self) {
        match self.local_addr() {
            Ok(addr) => info!(
                "Serving {:?} on {} with {} threads",
                self.config.document_root, addr, self.config.threads
            ),
            Err(e) => error!("Failed to read listener address: {}", e),
        }

        let document_root = Arc::new(self.config.document_root.clone());
        let max_file_size = self.config.max_file_size;

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Ok(addr) = stream.peer_addr() {
                        debug!("New connection from {}", addr);
                    }

                    let document_root = Arc::clone(&document_root);
                    self.thread_pool.execute(move || {
                        handle_client(stream, &document_root, max_file_size);
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}
