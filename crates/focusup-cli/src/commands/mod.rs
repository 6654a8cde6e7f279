pub mod config;
pub mod daemon;
pub mod page;
pub mod settings;
pub mod site;
pub mod stats;
pub mod tick;
pub mod timer;

use std::cell::RefCell;

use focusup_core::error::HostError;
use focusup_core::{now_ms, Config, ControlPanel, Coordinator, CoreClient, Database, Request, Response};

use crate::host::{CliHost, Output};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type CliCoordinator = Coordinator<Database, CliHost>;

/// Open the database, build a coordinator from the config and rehydrate it.
pub async fn load_coordinator(output: Output) -> Result<CliCoordinator, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut coordinator = Coordinator::new(db, CliHost::new(output), config.coordinator());
    coordinator.load(now_ms()).await;
    Ok(coordinator)
}

/// The coordinator answering panel requests in the same process.
pub struct InProcess(RefCell<CliCoordinator>);

impl InProcess {
    pub fn new(coordinator: CliCoordinator) -> Self {
        Self(RefCell::new(coordinator))
    }
}

impl CoreClient for InProcess {
    #[allow(clippy::await_holding_refcell_ref)]
    async fn request(&self, request: &Request) -> Result<Option<Response>, HostError> {
        let mut coordinator = self.0.borrow_mut();
        Ok(coordinator.handle_request(request.clone(), now_ms()).await)
    }
}

/// A control panel backed by its own store connection and an in-process
/// coordinator.
pub async fn open_panel() -> Result<(ControlPanel, InProcess, Database), Box<dyn std::error::Error>> {
    let client = InProcess::new(load_coordinator(Output::Human).await?);
    let store = Database::open()?;
    let panel = ControlPanel::open(&store, &client).await;
    Ok((panel, client, store))
}
