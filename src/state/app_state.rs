use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use astra_res::ResFile;

/// A registered time signal. Res files are immutable once read, so readers
/// are shared without a lock.
#[derive(Clone)]
pub struct SignalInfo {
    pub reader: Arc<ResFile>,
    pub reader_id: String,
    pub index: usize,          // position in the file's time catalog
    pub original_name: String, // name in the file's time catalog
}

#[derive(Clone)]
pub struct AppState {
    // unique_name -> SignalInfo
    pub signals: Arc<RwLock<HashMap<String, SignalInfo>>>,
    // reader id -> document
    pub readers: Arc<RwLock<HashMap<String, Arc<ResFile>>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            signals: Arc::new(RwLock::new(HashMap::new())),
            readers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
