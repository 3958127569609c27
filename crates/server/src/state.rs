use std::sync::Arc;

use service::licenses::LicenseService;

#[derive(Clone)]
pub struct ServerState {
    pub licenses: Arc<LicenseService>,
}

impl ServerState {
    pub fn new(licenses: LicenseService) -> Self {
        Self { licenses: Arc::new(licenses) }
    }
}
