//! KuwetexCore - owns the shared components and starts the tasks

use gateway::{ConnectionRegistry, KuwetexServer, SessionContext};
use litterbox::{
    BoxTimings, CatSimulator, CleaningMonitor, DataBank, LitterBox, Shutdown, ShutdownTrigger,
};
use sensors::SensorSuite;
use shared::{Cat, KuwetexConfig, RandomSource, Result, SeededRandom};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// All long-lived state of one Kuwetex instance
pub struct KuwetexCore {
    config: KuwetexConfig,
    random: Arc<dyn RandomSource>,
    litter_box: Arc<LitterBox>,
    data_bank: Arc<DataBank>,
    registry: Arc<ConnectionRegistry>,
    trigger: Arc<ShutdownTrigger>,
    shutdown: Shutdown,
    max_visits: Option<usize>,
}

impl KuwetexCore {
    /// Build from configuration, seeding the random source if a seed is set
    pub fn new(config: KuwetexConfig) -> Self {
        let random: Arc<dyn RandomSource> = match config.simulation.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(SeededRandom::from_entropy()),
        };
        Self::with_random(config, random)
    }

    pub fn with_random(config: KuwetexConfig, random: Arc<dyn RandomSource>) -> Self {
        let (trigger, shutdown) = Shutdown::channel();
        let litter_box = Arc::new(LitterBox::new(
            SensorSuite::standard(random.clone()),
            random.clone(),
            BoxTimings::from(&config.simulation),
            shutdown.clone(),
        ));
        let data_bank = Arc::new(DataBank::new(random.clone()));

        Self {
            config,
            random,
            litter_box,
            data_bank,
            registry: Arc::new(ConnectionRegistry::new()),
            trigger: Arc::new(trigger),
            shutdown,
            max_visits: None,
        }
    }

    /// Builder: each cat stops after this many visits
    pub fn with_max_visits(mut self, visits: usize) -> Self {
        self.max_visits = Some(visits);
        self
    }

    pub fn config(&self) -> &KuwetexConfig {
        &self.config
    }

    pub fn litter_box(&self) -> &Arc<LitterBox> {
        &self.litter_box
    }

    pub fn data_bank(&self) -> &Arc<DataBank> {
        &self.data_bank
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            litter_box: self.litter_box.clone(),
            data_bank: self.data_bank.clone(),
            registry: self.registry.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Bind the server, then start the cleaning monitor, the cats and the
    /// accept loop
    pub async fn start(&self) -> Result<RunningKuwetex> {
        let server = KuwetexServer::bind(self.config.server.address()).await?;
        let local_addr = server.local_addr()?;

        let simulation = &self.config.simulation;
        let monitor = CleaningMonitor::new(
            self.litter_box.clone(),
            Duration::from_millis(simulation.cleaning_interval_ms),
            self.shutdown.clone(),
        )
        .spawn();

        let cats: Vec<Cat> = simulation
            .cats
            .iter()
            .map(|profile| Cat::from_profile(profile, self.random.as_ref()))
            .collect();
        let mut simulator = CatSimulator::new(
            self.litter_box.clone(),
            self.data_bank.clone(),
            self.random.clone(),
            simulation.max_idle_ms,
            self.shutdown.clone(),
        );
        if let Some(visits) = self.max_visits {
            simulator = simulator.with_max_visits(visits);
        }
        let cat_tasks = simulator.spawn(cats);

        let accept_loop = tokio::spawn(server.serve(self.session_context(), self.shutdown.clone()));

        info!(
            address = %local_addr,
            cats = cat_tasks.len(),
            "Kuwetex is running"
        );

        Ok(RunningKuwetex {
            local_addr,
            trigger: self.trigger.clone(),
            monitor,
            cats: cat_tasks,
            accept_loop,
        })
    }
}

impl std::fmt::Debug for KuwetexCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KuwetexCore")
            .field("config", &self.config)
            .field("max_visits", &self.max_visits)
            .finish()
    }
}

/// Handle to a started instance
#[derive(Debug)]
pub struct RunningKuwetex {
    local_addr: SocketAddr,
    trigger: Arc<ShutdownTrigger>,
    monitor: JoinHandle<usize>,
    cats: Vec<JoinHandle<usize>>,
    accept_loop: JoinHandle<Result<()>>,
}

impl RunningKuwetex {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait until every cat task has finished. Returns the total number of
    /// visits recorded.
    pub async fn wait_for_cats(&mut self) -> usize {
        let mut visits = 0;
        for task in self.cats.drain(..) {
            match task.await {
                Ok(count) => visits += count,
                Err(e) => warn!(error = %e, "Cat task failed"),
            }
        }
        visits
    }

    /// Signal shutdown and wait for every task to stop
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down Kuwetex");
        self.trigger.trigger();

        self.wait_for_cats().await;
        match self.monitor.await {
            Ok(cleanings) => info!(cleanings, "Cleaning system stopped"),
            Err(e) => warn!(error = %e, "Cleaning system task failed"),
        }
        match self.accept_loop.await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Accept loop task failed");
                Ok(())
            }
        }
    }
}
