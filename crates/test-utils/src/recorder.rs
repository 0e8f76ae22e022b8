use std::sync::{Arc, Mutex};

/// Something a test node did while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<Event>,
    running: usize,
    max_running: usize,
}

/// Shared log of start/finish events across all nodes of a test graph.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    inner: Arc<Mutex<Inner>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_start(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(Event::Started(id.to_string()));
        inner.running += 1;
        inner.max_running = inner.max_running.max(inner.running);
    }

    pub fn record_finish(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(Event::Finished(id.to_string()));
        inner.running -= 1;
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Ids in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(id) => Some(id),
                Event::Finished(_) => None,
            })
            .collect()
    }

    /// Ids in the order they finished.
    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Finished(id) => Some(id),
                Event::Started(_) => None,
            })
            .collect()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// Highest number of nodes that were running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.inner.lock().unwrap().max_running
    }
}
