use std::sync::Arc;

use tokio::sync::RwLock;

use crate::checks::{HttpProbe, ProbeError, UrlProbe};
use crate::config::Config;
use crate::decoder::{RqrrDecoder, SymbolDecoder};
use crate::history::HistoryStore;
use crate::observability::Metrics;
use crate::render::Renderer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub renderer: Arc<Renderer>,
    pub history: Arc<RwLock<HistoryStore>>,
    pub decoder: Arc<dyn SymbolDecoder>,
    pub probe: Arc<dyn UrlProbe>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        renderer: Renderer,
        decoder: Arc<dyn SymbolDecoder>,
        probe: Arc<dyn UrlProbe>,
    ) -> Self {
        let history = HistoryStore::with_capacity(config.history.capacity);
        Self {
            config: Arc::new(config),
            renderer: Arc::new(renderer),
            history: Arc::new(RwLock::new(history)),
            decoder,
            probe,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Production wiring: configured font, rqrr detector and a real HTTP probe
    pub fn from_config(config: Config) -> Result<Self, ProbeError> {
        let font = Renderer::load_font(config.style.font_path.as_deref());
        let renderer = Renderer::new(config.style.render_limits(), font);
        let probe = HttpProbe::new(&config.url_check.probe_config())?;

        Ok(Self::new(
            config,
            renderer,
            Arc::new(RqrrDecoder),
            Arc::new(probe),
        ))
    }
}
